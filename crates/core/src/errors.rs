use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("quote {0} already carries an image reference")]
    ImageAlreadyAttached(String),
}
