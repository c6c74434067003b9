use thiserror::Error;

/// Rejected form input. The roster is never touched when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name `{name}` must be at least {min} characters")]
    NameTooShort { name: String, min: usize },

    #[error("{subject} must be an integer between 0 and 100 (got `{raw}`)")]
    InvalidScore { subject: String, raw: String },

    #[error("a record with id `{id}` already exists")]
    DuplicateId { id: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("a record needs at least one score")]
    Empty,

    #[error("score {value} for {subject} is above 100")]
    OutOfRange { subject: String, value: u8 },

    #[error("stored grades must be exactly {expected}, found {found}")]
    Subjects { expected: String, found: String },
}
