use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn corrupt_page(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::CorruptPage {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn encoding(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Encoding {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn short_read(context: impl Into<String>, requested: usize, available: usize) -> Error {
        Error(
            ErrorKind::ShortRead {
                context: context.into(),
                requested,
                available,
            }
            .into(),
        )
    }

    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Error {
        Error(
            ErrorKind::TypeMismatch {
                expected: expected.into(),
                actual: actual.into(),
            }
            .into(),
        )
    }

    pub fn codec(codec: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Codec {
                codec: codec.into(),
                message: message.into(),
                source: None,
            }
            .into(),
        )
    }

    pub fn codec_failure<E>(codec: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Codec {
                codec: codec.into(),
                message: source.to_string(),
                source: Some(Box::new(source)),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Returns `true` if this error was raised by a decoder running past the bytes
    /// actually available in a page.
    pub fn is_short_read(&self) -> bool {
        matches!(self.kind(), ErrorKind::ShortRead { .. })
    }

    /// Returns `true` if this error reports a structurally corrupt page.
    pub fn is_corrupt_page(&self) -> bool {
        matches!(self.kind(), ErrorKind::CorruptPage { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("corrupt page: {message}")]
    CorruptPage { message: String },

    #[error("encoding error: {message}")]
    Encoding { message: String },

    #[error("short read in {context}: requested {requested} bytes, {available} available")]
    ShortRead {
        context: String,
        requested: usize,
        available: usize,
    },

    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("codec {codec} failed: {message}")]
    Codec {
        codec: String,
        message: String,
        source: Option<StdErrorBoxed>,
    },

    #[error("I/O error in {context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn test_error_kinds() {
        let e = Error::short_read("plain decoder", 8, 3);
        assert!(e.is_short_read());
        assert!(!e.is_corrupt_page());
        assert_eq!(
            e.to_string(),
            "short read in plain decoder: requested 8 bytes, 3 available"
        );

        let e = Error::corrupt_page("bad page type 17");
        assert!(e.is_corrupt_page());
        assert!(matches!(e.into_kind(), ErrorKind::CorruptPage { .. }));

        let e: Error = std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(e.kind(), ErrorKind::Io { .. }));
    }
}
