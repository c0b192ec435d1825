use std::fmt;

/// The kind of record an operation targeted, used in error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Resource,
    Transition,
    ConsentForm,
    ConsentItem,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Resource => "resource",
            RecordKind::Transition => "transition request",
            RecordKind::ConsentForm => "consent form",
            RecordKind::ConsentItem => "consent item",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WardError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("cannot {action} {kind} {id} while it is {from}")]
    InvalidTransition {
        kind: RecordKind,
        id: String,
        from: String,
        action: &'static str,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("incomplete required consents on {form_id}: {}", missing.join(", "))]
    IncompleteConsents {
        form_id: String,
        missing: Vec<String>,
    },

    #[error("failed to read fixture file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write fixture file: {0}")]
    FileWrite(std::io::Error),
    #[error("fixture translation error: {0}")]
    Translation(String),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
}

impl WardError {
    pub(crate) fn not_found(kind: RecordKind, id: &str) -> Self {
        WardError::NotFound {
            kind,
            id: id.to_owned(),
        }
    }

    pub(crate) fn invalid_transition(
        kind: RecordKind,
        id: &str,
        from: impl fmt::Display,
        action: &'static str,
    ) -> Self {
        WardError::InvalidTransition {
            kind,
            id: id.to_owned(),
            from: from.to_string(),
            action,
        }
    }
}

impl From<wardops_types::TextError> for WardError {
    fn from(err: wardops_types::TextError) -> Self {
        WardError::Validation(err.to_string())
    }
}

pub type WardResult<T> = std::result::Result<T, WardError>;
