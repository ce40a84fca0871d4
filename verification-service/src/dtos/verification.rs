use crate::models::{
    BatchStatus, DocumentField, DocumentRequirement, FieldStatus, VerificationState, REQUIREMENTS,
};
use crate::services::verification::BatchResult;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStateResponse {
    pub documents: HashMap<DocumentField, FieldStatus>,
    pub certifications: Vec<String>,
    pub certifications_status: BatchStatus,
    pub can_continue: bool,
    pub requirements: &'static [DocumentRequirement],
}

impl From<VerificationState> for VerificationStateResponse {
    fn from(state: VerificationState) -> Self {
        let can_continue = state.can_continue();

        // every slot is present in the response, idle ones included
        let documents = REQUIREMENTS
            .iter()
            .map(|req| (req.id, state.document_status(req.id)))
            .collect();

        Self {
            documents,
            certifications: state.certifications,
            certifications_status: state.certifications_status,
            can_continue,
            requirements: REQUIREMENTS,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploadResponse {
    pub field: DocumentField,
    #[serde(flatten)]
    pub status: FieldStatus,
    pub can_continue: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationUploadResult {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationBatchResponse {
    #[serde(flatten)]
    pub status: BatchStatus,
    pub results: Vec<CertificationUploadResult>,
    pub certifications: Vec<String>,
}

impl From<BatchResult> for CertificationBatchResponse {
    fn from(batch: BatchResult) -> Self {
        let results = batch
            .outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(url) => CertificationUploadResult {
                    file_name: outcome.file_name,
                    url: Some(url),
                    error: None,
                },
                Err(error) => CertificationUploadResult {
                    file_name: outcome.file_name,
                    url: None,
                    error: Some(error),
                },
            })
            .collect();

        Self {
            status: batch.status,
            results,
            certifications: batch.certifications,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUploadResponse {
    pub url: String,
    pub path: String,
    pub compressed: bool,
}
