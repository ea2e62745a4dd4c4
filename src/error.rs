use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitError {
    /// Invalid input to a constructor (empty name, no active days, ...).
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Ambiguous(String),

    #[error("Not authenticated: no user session")]
    NotAuthenticated,

    #[error("{0}")]
    Load(String),

    /// The in-memory mutation has already been applied when this is returned.
    #[error("{0}")]
    Persistence(String),

    #[error("{0}")]
    Usage(String),
}

impl HabitError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self::Ambiguous(message.into())
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::Load(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            HabitError::Validation(_) | HabitError::Usage(_) => 2,
            HabitError::NotFound(_) => 3,
            HabitError::Ambiguous(_) => 4,
            HabitError::Load(_) | HabitError::Persistence(_) => 5,
            HabitError::NotAuthenticated => 6,
        }
    }
}
