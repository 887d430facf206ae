//! Error types shared across the crate.
//!
//! Three families exist, mirroring the lifecycle of an application:
//!
//! - [`ConfigError`]: fatal, raised while the route table is being built.
//! - [`ResolveError`]: an instance could not be produced by the
//!   [`InstanceResolver`](crate::container::InstanceResolver); wrapped into
//!   [`ConfigError::Resolve`] during startup.
//! - [`HttpError`]: the structured HTTP exception. Handlers (and the parameter
//!   binder) fail with it to choose the status code and message sent to the
//!   client. Any other failure is rendered as a generic 500.

use http::StatusCode;
use std::fmt;

/// Structured HTTP-facing failure carrying a status code and a message.
///
/// The message is sent to the client verbatim as `{"message": "..."}`, so it
/// must never contain internal details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    /// Create an error with an explicit status code.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 Unauthorized.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 404 Not Found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 409 Conflict.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for HttpError {}

/// Failure to produce an instance for a scanned type.
#[derive(Debug)]
pub enum ResolveError {
    /// No provider or instance is registered for the type.
    Missing { type_name: &'static str },
    /// The type (transitively) depends on itself.
    Cycle { type_name: &'static str },
    /// The provider ran and returned an error.
    Provider {
        type_name: &'static str,
        source: anyhow::Error,
    },
    /// A stored instance does not have the requested type.
    TypeMismatch { type_name: &'static str },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Missing { type_name } => {
                write!(f, "no provider registered for {type_name}")
            }
            ResolveError::Cycle { type_name } => {
                write!(f, "dependency cycle detected while resolving {type_name}")
            }
            ResolveError::Provider { type_name, source } => {
                write!(f, "provider for {type_name} failed: {source}")
            }
            ResolveError::TypeMismatch { type_name } => {
                write!(f, "stored instance is not a {type_name}")
            }
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Provider { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Fatal startup error. Building the route table aborts on the first one.
#[derive(Debug)]
pub enum ConfigError {
    /// The package prefix list was empty.
    NoPackages,
    /// A scanned controller or interceptor could not be instantiated.
    Resolve {
        type_name: &'static str,
        reason: String,
    },
    /// A route could not be registered (bad path pattern, etc).
    InvalidRoute { path: String, reason: String },
    /// A configuration file could not be read or parsed.
    Load { path: String, reason: String },
    /// The blocking pool failed while building the application.
    Startup { reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoPackages => {
                write!(f, "cannot build routes without a package list declaration")
            }
            ConfigError::Resolve { type_name, reason } => {
                write!(f, "failed to resolve {type_name}: {reason}")
            }
            ConfigError::InvalidRoute { path, reason } => {
                write!(f, "invalid route '{path}': {reason}")
            }
            ConfigError::Load { path, reason } => {
                write!(f, "failed to load configuration '{path}': {reason}")
            }
            ConfigError::Startup { reason } => write!(f, "startup failed: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<(&'static str, ResolveError)> for ConfigError {
    fn from((type_name, err): (&'static str, ResolveError)) -> Self {
        ConfigError::Resolve {
            type_name,
            reason: err.to_string(),
        }
    }
}
