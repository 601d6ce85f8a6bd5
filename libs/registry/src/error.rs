#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("kubernetes reported error: {0}")]
    Kube(#[from] kube::Error),
    #[error("function not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
