use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("observation not found: {0}")]
    NotFound(String),
}
