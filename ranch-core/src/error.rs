//! Named conditions reported by the stall allocator, record stores and
//! credential store.
//!
//! None of these abort a session: the caller reports them and carries on.

use thiserror::Error;

/// Errors that can occur while managing horses, barns and users
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RanchError {
    #[error("No barns available. Please add a barn first.")]
    NoBarns,

    #[error("All barns are full. Cannot assign horse.")]
    AllBarnsFull,

    #[error("Barn '{barn}' has no empty stalls")]
    BarnFull { barn: String },

    #[error("Barn '{0}' not found")]
    BarnNotFound(String),

    #[error("Horse '{0}' not found")]
    HorseNotFound(String),

    #[error("A barn named '{0}' already exists")]
    DuplicateBarn(String),

    #[error("Number of stalls must be greater than zero")]
    InvalidStallCount,

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Username '{0}' already exists")]
    UsernameTaken(String),

    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid username or password")]
    InvalidCredentials,
}

pub type RanchResult<T> = std::result::Result<T, RanchError>;
