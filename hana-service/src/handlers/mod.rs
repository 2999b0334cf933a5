pub mod health;
pub mod info;
pub mod metrics;

pub use health::health_check;
pub use info::hana_info;
pub use metrics::metrics;
