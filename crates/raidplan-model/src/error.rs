use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{kind} id must not be empty")]
    EmptyId { kind: &'static str },
    #[error("invalid node id '{0}' (expected quest:<id> or level:<id>)")]
    InvalidNodeId(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
