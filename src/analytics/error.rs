//! Error types for analytics operations

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur in analytics operations
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Start of the window lies after its end
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// A query parameter is outside its accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Reading incidents from the store failed
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppError> for AnalyticsError {
    fn from(err: AppError) -> Self {
        AnalyticsError::DatabaseError(err.to_string())
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidDateRange(_) | AnalyticsError::InvalidParameter(_) => {
                AppError::Validation(err.to_string())
            }
            AnalyticsError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
