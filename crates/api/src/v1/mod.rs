//! API v1 DTOs and helpers.

mod errors;
mod mappers;
mod results;
mod types;

pub use errors::{error_code_to_api_v1, error_envelope_to_api_v1_error, error_message_from_body};
pub use mappers::{
    health_from_api_v1, research_lab_from_api_v1, search_request_to_api_v1,
    suggestion_from_api_v1,
};
pub use results::{raw_result_from_value, search_response_from_value, similar_labs_from_value};
pub use types::*;
