use actix_web::{http::header, HttpResponse, ResponseError};

/// Error kinds surfaced by the lambda/hook handlers, mapped to the HTTP
/// status table in the error handling design (decision recorded in
/// `DESIGN.md`): `INVALID_ARGUMENT`/`NOT_FOUND` from the scheduler both
/// collapse to 400, matching the original ingestor's undifferentiated
/// `http.Error(..., http.StatusBadRequest)` on every publish/reply failure.
#[derive(Debug, thiserror::Error)]
pub enum DispatcherError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("method not allowed, expected {expected}")]
    MethodMismatch { expected: String },

    #[error("activation failed: {0}")]
    ActivationFailed(String),

    #[error("broker publish failed: {0}")]
    BrokerPublish(#[from] litefunctions_broker::Error),

    #[error("timed out waiting for a response")]
    ReplyTimeout,

    #[error("upstream proxy failed: {0}")]
    UpstreamProxy(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for DispatcherError {
    fn error_response(&self) -> HttpResponse {
        match self {
            DispatcherError::MalformedRequest(msg) => HttpResponse::BadRequest().body(msg.clone()),
            DispatcherError::MethodMismatch { expected } => HttpResponse::MethodNotAllowed()
                .insert_header((header::ALLOW, expected.clone()))
                .finish(),
            DispatcherError::ActivationFailed(msg) => HttpResponse::BadRequest().body(msg.clone()),
            DispatcherError::BrokerPublish(e) => {
                HttpResponse::BadRequest().body(format!("publish failed: {e}"))
            }
            DispatcherError::ReplyTimeout => {
                HttpResponse::InternalServerError().body("timed out waiting for a response")
            }
            DispatcherError::UpstreamProxy(e) => {
                HttpResponse::BadGateway().body(format!("upstream proxy failed: {e}"))
            }
            DispatcherError::Internal(msg) => HttpResponse::InternalServerError().body(msg.clone()),
        }
    }
}

/// Maps a scheduler RPC outcome onto the dispatcher's flat error mapping:
/// any scheduler-reported status (`INVALID_ARGUMENT`, `NOT_FOUND`, ...)
/// collapses to 400; failure to reach the scheduler at all (`UNAVAILABLE`,
/// transport errors) is a genuine internal failure and maps to 500.
pub fn map_scheduler_status(status: tonic::Status) -> DispatcherError {
    use tonic::Code;
    match status.code() {
        Code::Unavailable | Code::DeadlineExceeded | Code::Internal | Code::Unknown => {
            DispatcherError::Internal(status.message().to_owned())
        }
        _ => DispatcherError::ActivationFailed(status.message().to_owned()),
    }
}

pub type Result<T> = std::result::Result<T, DispatcherError>;
