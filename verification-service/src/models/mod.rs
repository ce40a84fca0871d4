mod verification;

pub use verification::{
    BatchStatus, DocumentField, DocumentRequirement, FieldStatus, VerificationState, REQUIREMENTS,
};
