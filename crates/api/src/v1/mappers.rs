//! Mappers between API v1 DTOs and domain types.

use crate::v1::{
    ApiV1HealthDto, ApiV1ResearchLabDto, ApiV1SearchRequestDto, ApiV1SuggestionDto,
    ApiV1UniversityDto,
};
use lab_finder_domain::{
    ExternalUrl, HealthStatus, ResearchLab, SearchRequest, Suggestion, University,
};

/// Convert a built request into its wire body.
#[must_use]
pub fn search_request_to_api_v1(request: &SearchRequest) -> ApiV1SearchRequestDto {
    ApiV1SearchRequestDto {
        query: request.query().to_string(),
        limit: request.limit(),
        region_filter: request.region_filter().map(<[String]>::to_vec),
        field_filter: request.field_filter().map(<[String]>::to_vec),
        min_similarity: request.min_similarity(),
    }
}

/// Convert a lab-detail DTO into the domain model.
///
/// Blank optional strings become `None`; an unsafe `lab_url` is dropped.
#[must_use]
pub fn research_lab_from_api_v1(dto: ApiV1ResearchLabDto) -> ResearchLab {
    ResearchLab {
        id: dto.id,
        name: dto.name,
        professor_name: present(dto.professor_name),
        department: present(dto.department),
        research_theme: dto.research_theme,
        research_content: dto.research_content,
        research_field: dto.research_field,
        speciality: present(dto.speciality),
        keywords: present(dto.keywords),
        lab_url: dto.lab_url.as_deref().and_then(ExternalUrl::parse),
        university: university_from_api_v1(dto.university),
        created_at: present(dto.created_at),
        updated_at: present(dto.updated_at),
    }
}

fn university_from_api_v1(dto: ApiV1UniversityDto) -> University {
    University {
        id: dto.id,
        name: dto.name,
        university_type: dto.university_type,
        prefecture: dto.prefecture,
        region: dto.region,
    }
}

/// Convert a suggestion DTO.
#[must_use]
pub fn suggestion_from_api_v1(dto: ApiV1SuggestionDto) -> Suggestion {
    Suggestion {
        text: dto.text,
        category: dto.category,
    }
}

/// Convert a health DTO.
#[must_use]
pub fn health_from_api_v1(dto: ApiV1HealthDto) -> HealthStatus {
    HealthStatus {
        status: dto.status,
        message: dto.message,
        version: dto.version,
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
