pub mod basic_auth;
pub mod metrics;
pub mod tracing;
