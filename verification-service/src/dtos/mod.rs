pub mod verification;

pub use verification::{
    CertificationBatchResponse, CertificationUploadResult, DocumentUploadResponse,
    PhotoUploadResponse, VerificationStateResponse,
};
