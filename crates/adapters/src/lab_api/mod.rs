//! `LabApiPort` implementations.

pub mod fixed;
pub mod http;

pub use fixed::FixedLabApi;
pub use http::{HttpLabApi, HttpLabApiConfig};
