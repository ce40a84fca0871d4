pub mod image;
pub mod metrics;
pub mod storage;
pub mod uploader;
pub mod verification;

pub use metrics::{get_metrics, init_metrics};
pub use storage::{Bucket, LocalStorage, PutOptions, S3Storage, Storage};
pub use uploader::{StoredObject, UploadClient, UploadError, UploadFile, UploadOptions};
pub use verification::{BatchResult, CertificationOutcome, VerificationService};
