use std::{fmt, io};

#[derive(Debug)]
pub enum Error {
    Options(String),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Options(e) => write!(f, "{e}"),
            Error::Io(e) => write!(f, "{e}"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl Error {
    /// Returns `true` if the error should be followed by the usage message.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Options(_))
    }
}
