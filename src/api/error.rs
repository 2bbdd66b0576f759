use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::borrow::Cow;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Internal Server Error")]
    InternalServer,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: Cow<'static, str>,
}

impl Error {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(msg.into())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Error::NotFound(msg)
            | Error::Conflict(msg)
            | Error::Unauthorized(msg)
            | Error::BadRequest(msg) => msg.clone(),
            // detail stays in the server log
            Error::InternalServer => "Internal server error".into(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody { success: false, message })
    }
}

/// Errors raised by the relationship core and the stores behind it.
///
/// The first four variants are the domain outcomes a caller is expected to
/// handle. Everything else is an internal failure and is reported to the
/// caller without detail.
#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(Cow<'static, str>),
    #[error("Invalid Argument: {0}")]
    InvalidArgument(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Already Exists: {0}")]
    AlreadyExists(Cow<'static, str>),
    // jwt errors
    #[error("JWT Error")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    // sqlx errors
    #[error("Database Error : {0}")]
    DatabaseError(Cow<'static, str>),
    #[error("Transaction Conflict: {0}")]
    TransactionConflict(Cow<'static, str>),
    #[error("Internal System Error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

#[allow(dead_code)]
#[derive(Debug)]
pub struct DbErrorMeta {
    pub code: Option<String>,
    pub constraint: Option<String>,
    pub message: String,
}

fn conflict_message(meta: &DbErrorMeta) -> Cow<'static, str> {
    match meta.constraint.as_deref() {
        Some("friend_requests_pkey") => "Request was already sent".into(),
        Some("user_friends_pkey") => "You are friends already".into(),
        _ => "Duplicate value".into(),
    }
}

/// A unique violation at commit is the same outcome the precondition reads
/// report, so it surfaces as `AlreadyExists`.
fn unique_violation(meta: DbErrorMeta) -> SystemError {
    log::warn!("Unique violation: {:?}", meta);
    SystemError::AlreadyExists(conflict_message(&meta))
}

impl From<SystemError> for Error {
    fn from(value: SystemError) -> Self {
        match value {
            SystemError::Unauthenticated(msg) => Error::Unauthorized(msg),
            SystemError::InvalidArgument(msg) => Error::BadRequest(msg),
            SystemError::NotFound(msg) => Error::NotFound(msg),
            SystemError::AlreadyExists(msg) => Error::Conflict(msg),
            _ => {
                log::error!("Internal Server Error: {:?}", value);
                Error::InternalServer
            }
        }
    }
}

impl From<sqlx::Error> for SystemError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    return unique_violation(DbErrorMeta {
                        code: db_err.code().map(|s| s.to_string()),
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    });
                }
                // serialization_failure, deadlock_detected
                Some("40001") | Some("40P01") => {
                    return SystemError::TransactionConflict(db_err.message().to_string().into());
                }
                _ => {
                    log::error!("Unhandled DB error: {:?}", db_err);
                    return SystemError::DatabaseError(db_err.message().to_string().into());
                }
            }
        }
        log::error!("{:?}", err);
        SystemError::InternalError(Box::new(err))
    }
}

impl SystemError {
    pub fn unauthenticated(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Whether the store may re-run the whole unit of work.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SystemError::TransactionConflict(_))
    }
}
