use crate::models::{BatchStatus, DocumentField, FieldStatus, VerificationState};
use crate::services::storage::Bucket;
use crate::services::uploader::{UploadClient, UploadFile, UploadOptions};
use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use service_core::error::AppError;
use std::sync::Arc;

const MAX_DOCUMENT_SIZE_MB: u64 = 10;
const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/jpg",
];

/// Result of one file within a certifications batch.
#[derive(Debug, Clone)]
pub struct CertificationOutcome {
    pub file_name: String,
    /// Public URL on success, error message otherwise.
    pub result: Result<String, String>,
}

/// Outcome of a whole certifications batch.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub status: BatchStatus,
    pub outcomes: Vec<CertificationOutcome>,
    /// Accumulated list after merging this batch's successes.
    pub certifications: Vec<String>,
}

/// Per-owner document verification state machine.
///
/// Tracks one tagged status per document slot plus the accumulated
/// certifications list, and gates step progression on the required slots.
pub struct VerificationService {
    uploader: Arc<UploadClient>,
    sessions: DashMap<String, VerificationState>,
}

impl VerificationService {
    pub fn new(uploader: Arc<UploadClient>) -> Self {
        Self {
            uploader,
            sessions: DashMap::new(),
        }
    }

    fn document_options(folder: &str) -> UploadOptions {
        UploadOptions {
            bucket: Bucket::VerificationDocuments,
            folder: Some(folder.to_string()),
            max_size_mb: MAX_DOCUMENT_SIZE_MB,
            allowed_types: DOCUMENT_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn set_document_status(&self, owner_id: &str, field: DocumentField, status: FieldStatus) {
        self.sessions
            .entry(owner_id.to_string())
            .or_default()
            .documents
            .insert(field, status);
    }

    /// Single-document flow: uploading, then succeeded or failed. A retry
    /// re-enters uploading; last write wins when calls overlap.
    pub async fn upload_document(
        &self,
        owner_id: &str,
        field: DocumentField,
        file: UploadFile,
    ) -> FieldStatus {
        self.set_document_status(owner_id, field, FieldStatus::Uploading);

        let status = match self
            .uploader
            .upload(file, owner_id, &Self::document_options("onboarding"))
            .await
        {
            Ok(stored) => FieldStatus::Succeeded {
                url: stored.url,
                path: stored.path,
            },
            Err(e) => {
                tracing::warn!(
                    owner_id = %owner_id,
                    field = %field,
                    error = %e,
                    "Document upload failed"
                );
                FieldStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        self.set_document_status(owner_id, field, status.clone());
        status
    }

    /// Certifications batch: all uploads run concurrently, successes are
    /// appended in completion order, and the batch completes as a whole
    /// even when individual files fail. Per-file outcomes are reported so
    /// failures are visible rather than silently dropped.
    pub async fn upload_certifications(
        &self,
        owner_id: &str,
        files: Vec<UploadFile>,
    ) -> BatchResult {
        self.sessions
            .entry(owner_id.to_string())
            .or_default()
            .certifications_status = BatchStatus::Uploading;

        let options = Self::document_options("certifications");

        let mut uploads: FuturesUnordered<_> = files
            .into_iter()
            .map(|file| {
                let uploader = Arc::clone(&self.uploader);
                let options = options.clone();
                let owner = owner_id.to_string();
                async move {
                    let file_name = file.name.clone();
                    let result = uploader.upload(file, &owner, &options).await;
                    (file_name, result)
                }
            })
            .collect();

        let mut outcomes = Vec::new();
        let mut uploaded = Vec::new();
        while let Some((file_name, result)) = uploads.next().await {
            match result {
                Ok(stored) => {
                    uploaded.push(stored.url.clone());
                    outcomes.push(CertificationOutcome {
                        file_name,
                        result: Ok(stored.url),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        owner_id = %owner_id,
                        file = %file_name,
                        error = %e,
                        "Certification upload failed"
                    );
                    outcomes.push(CertificationOutcome {
                        file_name,
                        result: Err(e.to_string()),
                    });
                }
            }
        }

        let mut session = self.sessions.entry(owner_id.to_string()).or_default();
        session.certifications.extend(uploaded);
        session.certifications_status = BatchStatus::Completed;

        BatchResult {
            status: session.certifications_status.clone(),
            outcomes,
            certifications: session.certifications.clone(),
        }
    }

    /// Delete a stored document and reset its slot.
    pub async fn remove_document(
        &self,
        owner_id: &str,
        field: DocumentField,
    ) -> Result<(), AppError> {
        let path = match self.sessions.get(owner_id) {
            Some(session) => match session.documents.get(&field) {
                Some(FieldStatus::Succeeded { path, .. }) => path.clone(),
                _ => {
                    return Err(AppError::NotFound(anyhow::anyhow!(
                        "No stored document for field {}",
                        field
                    )))
                }
            },
            None => {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "No stored document for field {}",
                    field
                )))
            }
        };

        self.uploader
            .delete(Bucket::VerificationDocuments, &path)
            .await?;
        self.set_document_status(owner_id, field, FieldStatus::Idle);

        tracing::info!(owner_id = %owner_id, field = %field, path = %path, "Document removed");
        Ok(())
    }

    /// Snapshot of the owner's verification state.
    pub fn state(&self, owner_id: &str) -> VerificationState {
        self.sessions
            .get(owner_id)
            .map(|session| session.clone())
            .unwrap_or_default()
    }
}
