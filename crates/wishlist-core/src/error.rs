use thiserror::Error;

/// What a `NotFound` or `AlreadyExists` failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Wish,
    FriendRequest,
    Code,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Entity::User => "User",
            Entity::Wish => "Wish",
            Entity::FriendRequest => "Friend request",
            Entity::Code => "Code",
        })
    }
}

/// Stable failure categories. Transports map these, never the messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    NotAuthorized,
    AlreadyExists,
    ValidationFailed,
    CodeMismatch,
    AlreadyVerified,
    Internal,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(Entity),

    /// Wrong owner, not friends, not self, or unverified email. Deliberately
    /// carries no reason.
    #[error("User not authorized")]
    NotAuthorized,

    #[error("{0} already exists")]
    AlreadyExists(Entity),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Code does not match")]
    CodeMismatch,

    #[error("Email is already verified")]
    AlreadyVerified,

    /// Store failure. The source is for logs only.
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NotFound(_) => ErrorKind::NotFound,
            WorkflowError::NotAuthorized => ErrorKind::NotAuthorized,
            WorkflowError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            WorkflowError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            WorkflowError::CodeMismatch => ErrorKind::CodeMismatch,
            WorkflowError::AlreadyVerified => ErrorKind::AlreadyVerified,
            WorkflowError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<anyhow::Error> for WorkflowError {
    fn from(err: anyhow::Error) -> Self {
        WorkflowError::Internal(err)
    }
}

pub type Result<T, E = WorkflowError> = std::result::Result<T, E>;
