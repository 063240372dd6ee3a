use crate::database::DatabaseError;
use rust_decimal::Decimal;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database errors
    #[error("SQL error: {0}")]
    Sqlx(#[from] SqlxError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input: non-positive amount, self-transfer, out-of-range value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Game, membership or claim referenced does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Caller is not a member of the game, or not the game's creator
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A pending claim already exists, or a resolved claim is resolved again
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Sender's balance is less than the requested amount
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },

    /// Common-fund operation on a game without a common fund
    #[error("Feature disabled: {0}")]
    FeatureDisabled(String),

    /// Claim requested or approved while the derived fund balance cannot cover it
    #[error("The common fund cannot cover this operation")]
    EmptyFund,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// UUID parsing errors
    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a database connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            AppError::Database(DatabaseError::PoolCreation(_))
                | AppError::Database(DatabaseError::ConnectionTimeout)
        )
    }

    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Stable machine-readable error code for the presentation layer
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidArgument(_) | AppError::InvalidUuid(_) => "invalid_argument",
            AppError::InsufficientBalance { .. } => "insufficient_balance",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Conflict(_) => "conflict",
            AppError::FeatureDisabled(_) => "feature_disabled",
            AppError::EmptyFund => "empty_fund",
            AppError::Config(_) => "config",
            _ => "internal",
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Unauthorized(_) => 401,
            AppError::InvalidArgument(_) | AppError::InvalidUuid(_) => 400,
            AppError::FeatureDisabled(_) | AppError::EmptyFund => 400,
            AppError::Conflict(_) | AppError::InsufficientBalance { .. } => 409,
            AppError::Config(_) => 500,
            AppError::Database(_) | AppError::Sqlx(_) => 500,
            _ => 500,
        }
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate record
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Debit would overdraw the membership row
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },

    /// Claim is already in a terminal state
    #[error("Claim already resolved: {0}")]
    AlreadyResolved(String),

    /// Derived common-fund balance cannot cover the payout
    #[error("The common fund cannot cover this operation")]
    EmptyFund,
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Query(e) => AppError::Sqlx(e),
            RepositoryError::Duplicate(msg) => AppError::Conflict(msg),
            RepositoryError::ConstraintViolation(msg) => AppError::InvalidArgument(msg),
            RepositoryError::InvalidInput(msg) => AppError::InvalidArgument(msg),
            RepositoryError::InsufficientBalance {
                available,
                requested,
            } => AppError::InsufficientBalance {
                available,
                requested,
            },
            RepositoryError::AlreadyResolved(msg) => AppError::Conflict(msg),
            RepositoryError::EmptyFund => AppError::EmptyFund,
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::Database(db_err) => {
                // Check for common PostgreSQL error codes
                let code = db_err.code().map(|c| c.to_string());
                if code.as_deref() == Some("23505") {
                    // Unique violation
                    RepositoryError::Duplicate(db_err.message().to_string())
                } else if code.as_deref() == Some("23503") {
                    // Foreign key violation
                    RepositoryError::ConstraintViolation(db_err.message().to_string())
                } else if code.as_deref() == Some("23514") {
                    // Check constraint violation
                    RepositoryError::ConstraintViolation(db_err.message().to_string())
                } else {
                    RepositoryError::Query(err)
                }
            }
            _ => RepositoryError::Query(err),
        }
    }
}

/// Convenience function to convert Option<T> to Result<T, AppError>
pub fn option_to_result<T>(opt: Option<T>, error_msg: &str) -> AppResult<T> {
    opt.ok_or_else(|| AppError::NotFound(error_msg.to_string()))
}
