use thiserror::Error;

/// Message carried by [`AppError::Conflict`] when a code is taken.
pub const VOUCHER_ALREADY_EXISTS: &str = "Voucher already exist.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Conflict(String),

    #[error("Voucher not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    pub fn voucher_already_exists() -> Self {
        AppError::Conflict(VOUCHER_ALREADY_EXISTS.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::Database(_) => ErrorKind::Internal,
        }
    }
}

/// Coarse classification of failures, for transports that need to map an
/// error onto a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Conflict,
    NotFound,
    Unauthorized,
    WrongSchema,
    BadRequest,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::WrongSchema => "wrong_schema",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Internal => "internal",
        }
    }

    /// HTTP status code conventionally used for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Conflict => 409,
            ErrorKind::NotFound => 404,
            ErrorKind::Unauthorized => 401,
            ErrorKind::WrongSchema => 422,
            ErrorKind::BadRequest => 400,
            ErrorKind::Internal => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Unauthorized.status_code(), 401);
        assert_eq!(ErrorKind::WrongSchema.status_code(), 422);
        assert_eq!(ErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
    }

    #[test]
    fn test_conflict_message() {
        let err = AppError::voucher_already_exists();
        assert_eq!(err.to_string(), "Voucher already exist.");
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_storage_failures_are_internal() {
        let err = AppError::from(anyhow::anyhow!("disk full"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.kind().to_string(), "internal");
    }
}
