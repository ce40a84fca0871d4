use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Logical slot for a single verification document in the onboarding step.
///
/// Wire names match the onboarding UI contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentField {
    BusinessLicense,
    InsuranceCert,
    BankStatement,
    TaxDocument,
}

impl DocumentField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessLicense => "businessLicense",
            Self::InsuranceCert => "insuranceCert",
            Self::BankStatement => "bankStatement",
            Self::TaxDocument => "taxDocument",
        }
    }
}

impl std::fmt::Display for DocumentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one document slot.
///
/// A successful upload is the only transition that records a URL, so the
/// status and the stored value can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FieldStatus {
    Idle,
    Uploading,
    Succeeded { url: String, path: String },
    Failed { reason: String },
}

impl FieldStatus {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Status of the certifications batch as a whole.
///
/// `Completed` means the batch ran to the end; individual files may still
/// have failed and are reported per file in the batch outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Idle,
    Uploading,
    Completed,
    Failed {
        reason: String,
    },
}

/// Declarative list of document slots shown by the verification step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequirement {
    pub id: DocumentField,
    pub label: &'static str,
    pub description: &'static str,
    pub required: bool,
}

pub const REQUIREMENTS: &[DocumentRequirement] = &[
    DocumentRequirement {
        id: DocumentField::BusinessLicense,
        label: "Business License",
        description: "Valid business license or registration document",
        required: true,
    },
    DocumentRequirement {
        id: DocumentField::InsuranceCert,
        label: "Liability Insurance",
        description: "General liability insurance certificate",
        required: true,
    },
    DocumentRequirement {
        id: DocumentField::BankStatement,
        label: "Bank Statement",
        description: "Recent bank statement (last 3 months)",
        required: false,
    },
    DocumentRequirement {
        id: DocumentField::TaxDocument,
        label: "Tax Document",
        description: "W-9 form or tax registration document",
        required: true,
    },
];

/// Accumulated verification state for one owner.
#[derive(Debug, Clone, Default)]
pub struct VerificationState {
    pub documents: HashMap<DocumentField, FieldStatus>,
    pub certifications: Vec<String>,
    pub certifications_status: BatchStatus,
}

impl VerificationState {
    pub fn document_status(&self, field: DocumentField) -> FieldStatus {
        self.documents
            .get(&field)
            .cloned()
            .unwrap_or(FieldStatus::Idle)
    }

    /// The step's progression gate: every required slot holds a stored URL.
    /// Optional slots and certifications never block.
    pub fn can_continue(&self) -> bool {
        REQUIREMENTS
            .iter()
            .filter(|req| req.required)
            .all(|req| self.document_status(req.id).is_succeeded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn succeeded() -> FieldStatus {
        FieldStatus::Succeeded {
            url: "http://files.test/doc.pdf".to_string(),
            path: "u1/doc.pdf".to_string(),
        }
    }

    #[test]
    fn empty_state_cannot_continue() {
        assert!(!VerificationState::default().can_continue());
    }

    #[test]
    fn all_required_documents_unlock_progression() {
        let mut state = VerificationState::default();
        state
            .documents
            .insert(DocumentField::BusinessLicense, succeeded());
        state
            .documents
            .insert(DocumentField::InsuranceCert, succeeded());
        state
            .documents
            .insert(DocumentField::TaxDocument, succeeded());

        // bankStatement stays empty and does not block
        assert!(state.can_continue());
    }

    #[test]
    fn missing_required_document_blocks_progression() {
        let mut state = VerificationState::default();
        state
            .documents
            .insert(DocumentField::BusinessLicense, succeeded());
        state
            .documents
            .insert(DocumentField::InsuranceCert, succeeded());
        state.documents.insert(
            DocumentField::TaxDocument,
            FieldStatus::Failed {
                reason: "File size exceeds 10MB limit".to_string(),
            },
        );

        assert!(!state.can_continue());
    }

    #[test]
    fn certifications_never_gate_progression() {
        let mut state = VerificationState::default();
        for req in REQUIREMENTS.iter().filter(|r| r.required) {
            state.documents.insert(req.id, succeeded());
        }
        state.certifications_status = BatchStatus::Failed {
            reason: "backend unavailable".to_string(),
        };

        assert!(state.can_continue());
    }
}
