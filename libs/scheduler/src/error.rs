#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("function not found: {0}")]
    NotFound(String),
    #[error("registry error: {0}")]
    Registry(#[from] litefunctions_registry::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for tonic::Status {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound(name) => tonic::Status::invalid_argument(format!(
                "function {name} is not registered"
            )),
            Error::Registry(litefunctions_registry::Error::NotFound(name)) => {
                tonic::Status::invalid_argument(format!("function {name} is not registered"))
            }
            Error::Registry(e) => tonic::Status::internal(e.to_string()),
        }
    }
}
