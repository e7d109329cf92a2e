use std::fmt;

#[derive(Debug)]
pub enum RaspError {
    /// `start()` called while protection is already active.
    AlreadyActive,
    /// `scan()` called while protection is not active.
    NotActive,
    /// Boot-time integrity verification failed and policy allowed continuing.
    IntegrityCheckFailed,
    /// Executable image introspection failed (read, parse, missing section).
    Image(String),
    Io(std::io::Error),
}

impl fmt::Display for RaspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive => write!(f, "protection is already active"),
            Self::NotActive => write!(f, "protection is not active"),
            Self::IntegrityCheckFailed => write!(f, "integrity check failed"),
            Self::Image(msg) => write!(f, "image introspection error: {}", msg),
            Self::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for RaspError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RaspError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

pub type RaspResult<T> = std::result::Result<T, RaspError>;
