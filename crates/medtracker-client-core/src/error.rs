use crate::storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortalError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {reason}")]
    Validation { reason: String, fields: Vec<String> },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl PortalError {
    pub fn missing_fields(fields: Vec<String>) -> Self {
        Self::Validation {
            reason: format!("missing required fields: {}", fields.join(", ")),
            fields,
        }
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let field = field.into();
        Self::Validation {
            reason: format!("{field}: {}", reason.into()),
            fields: vec![field],
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Validation { .. } => "validation_failed",
            Self::Transport(_) => "transport_error",
            Self::Storage(_) => "storage_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Transport(message)
            | Self::Storage(message) => message.clone(),
            Self::Validation { reason, .. } => reason.clone(),
        }
    }

    /// Static, display-ready message. Never includes backend detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Élément introuvable.".to_string(),
            Self::Conflict(_) => "Cet élément existe déjà.".to_string(),
            Self::Validation { fields, .. } if !fields.is_empty() => format!(
                "Veuillez remplir les champs obligatoires : {}.",
                fields.join(", ")
            ),
            Self::Validation { .. } => "Les données saisies sont invalides.".to_string(),
            Self::Transport(_) => {
                "Le service est momentanément indisponible. Veuillez réessayer.".to_string()
            }
            Self::Storage(_) => "Impossible d'enregistrer les données localement.".to_string(),
        }
    }
}

impl From<StorageError> for PortalError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_every_field() {
        let error = PortalError::missing_fields(vec!["title".to_string(), "date".to_string()]);
        assert_eq!(error.code(), "validation_failed");
        assert_eq!(error.message(), "missing required fields: title, date");
        assert!(error.user_message().contains("title, date"));
    }

    #[test]
    fn storage_errors_convert_into_storage_variant() {
        let error: PortalError = StorageError::Io("disk full".to_string()).into();
        assert_eq!(error.code(), "storage_error");
    }
}
