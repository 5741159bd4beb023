//! Host-facing API: lifecycle functions returning `serde_json::Value`.

pub mod functions;

pub use functions::{error_response, respond};
