use unifit_core::auth::{AuthError, ValidationError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("{}: {}", .0.title(), .0)]
    Validation(#[from] ValidationError),

    #[error("{}", .0.user_message())]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(String),
}
