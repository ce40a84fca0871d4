pub mod health;
pub mod metrics;
pub mod verification;

pub use health::health_check;
pub use metrics::metrics_endpoint;
pub use verification::{
    get_verification_state, remove_verification_document, upload_certifications,
    upload_studio_photo, upload_verification_document,
};
