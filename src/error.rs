//! Structured error type for the working-copy engine.
//!
//! Every fallible operation returns a [`WcError`] carrying a [`ErrorKind`]
//! tag, a message, optional path/sha1/row-key context, and an underlying
//! cause. Callers recover by matching on `kind()`, never on `Display` text.

use std::fmt;
use std::path::PathBuf;

/// Named error kinds exposed at the library boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PathNotFound,
    NotWorkingCopy,
    PathUnexpectedStatus,
    BadFilename,
    IoWriteError,
    IoUnknownEol,
    WcCorrupt,
    WcDbError,
    WcLocked,
    WcMissing,
    ClientPatchBadStripCount,
    IncorrectParams,
    Cancelled,
    AuthnFailed,
}

#[derive(Debug)]
pub struct WcError {
    kind: ErrorKind,
    message: String,
    path: Option<PathBuf>,
    row_key: Option<String>,
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for WcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind_name(), self.message)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path.display())?;
        }
        if let Some(row_key) = &self.row_key {
            write!(f, " [{row_key}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for WcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn std::error::Error + 'static))
    }
}

impl WcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            row_key: None,
            cause: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_row_key(mut self, row_key: impl Into<String>) -> Self {
        self.row_key = Some(row_key.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// `path-not-found` is recoverable everywhere except status scans
    /// decide otherwise themselves (by not propagating it); `cancelled` is
    /// never recovered by this helper — callers must propagate it unchanged.
    pub fn recoverable(&self) -> bool {
        matches!(self.kind, ErrorKind::PathNotFound)
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            ErrorKind::PathNotFound => "path-not-found",
            ErrorKind::NotWorkingCopy => "not-working-copy",
            ErrorKind::PathUnexpectedStatus => "path-unexpected-status",
            ErrorKind::BadFilename => "bad-filename",
            ErrorKind::IoWriteError => "io-write-error",
            ErrorKind::IoUnknownEol => "io-unknown-eol",
            ErrorKind::WcCorrupt => "wc-corrupt",
            ErrorKind::WcDbError => "wc-db-error",
            ErrorKind::WcLocked => "wc-locked",
            ErrorKind::WcMissing => "wc-missing",
            ErrorKind::ClientPatchBadStripCount => "client-patch-bad-strip-count",
            ErrorKind::IncorrectParams => "incorrect-params",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::AuthnFailed => "authn-failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, WcError>;

pub fn io_write_error(path: impl Into<PathBuf>, source: std::io::Error) -> WcError {
    let path = path.into();
    WcError::new(
        ErrorKind::IoWriteError,
        format!("failed to write {}", path.display()),
    )
    .with_path(path)
    .with_cause(source)
}

pub fn wc_db_error(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> WcError {
    WcError::new(ErrorKind::WcDbError, message).with_cause(source)
}
