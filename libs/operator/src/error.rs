/// Errors possible during reconciliation and the cleanup sweep.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any error originating from the `kube-rs` crate.
    #[error("Kubernetes reported error: {source}")]
    KubeError {
        #[from]
        source: kube::Error,
    },

    /// Registry-level error (conflict retries exhausted, function not found).
    #[error("registry error: {0}")]
    Registry(#[from] litefunctions_registry::Error),

    /// Error in the Function CRD itself, typically a missing namespace.
    #[error("invalid Function resource: {0}")]
    UserInputError(String),

    /// A span had no valid OpenTelemetry trace id attached.
    #[error("invalid trace id")]
    InvalidTraceId,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Coarse error class used as a Prometheus label; avoids leaking
    /// unbounded error text (resource names, k8s messages) into a metric.
    pub fn metric_label(&self) -> String {
        match self {
            Error::KubeError { .. } => "kube".to_string(),
            Error::Registry(_) => "registry".to_string(),
            Error::UserInputError(_) => "user_input".to_string(),
            Error::InvalidTraceId => "invalid_trace_id".to_string(),
        }
    }
}
