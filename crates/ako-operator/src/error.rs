//! Error types for the AKO operator

use thiserror::Error;

/// Errors that can occur during operator operations
#[derive(Error, Debug)]
pub enum OperatorError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// A secret the workload depends on is missing
    #[error("Secret {namespace}/{name} is required for starting the AKO controller")]
    MissingSecret { namespace: String, name: String },

    /// Resource quantity that cannot be parsed
    #[error("Invalid resource quantity for {field}: '{value}'")]
    InvalidQuantity { field: String, value: String },

    /// Image pull policy outside Always/IfNotPresent/Never
    #[error("Invalid image pull policy: '{0}'")]
    InvalidPullPolicy(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reconciliation failed
    #[error("Reconciliation failed: {0}")]
    ReconcileFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for operator operations
pub type Result<T> = std::result::Result<T, OperatorError>;

impl OperatorError {
    /// Check if this error is retryable without a spec change
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OperatorError::KubeError(_)
                | OperatorError::MissingSecret { .. }
                | OperatorError::ReconcileFailed(_)
        )
    }

    /// Get a suggested requeue delay for retryable errors
    pub fn requeue_delay(&self) -> Option<std::time::Duration> {
        if self.is_retryable() {
            Some(std::time::Duration::from_secs(30))
        } else {
            None
        }
    }

    /// Whether the error is an API "not found" response
    pub fn is_not_found(&self) -> bool {
        matches!(self, OperatorError::KubeError(e) if is_status(e, 404))
    }

    /// Whether the error is an API "already exists" response
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            OperatorError::KubeError(kube::Error::Api(ae))
                if ae.code == 409 && ae.reason == "AlreadyExists"
        )
    }
}

/// Check a kube error against an HTTP status code
pub(crate) fn is_status(err: &kube::Error, code: u16) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == code)
}
