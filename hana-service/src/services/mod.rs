pub mod credentials;
pub mod metrics;
pub mod vision;

pub use credentials::{ServiceAccountKey, TokenSource};
pub use metrics::{get_metrics, init_metrics};
pub use vision::{AnnotationService, GoogleVisionClient, MockAnnotationService, VisionError};
