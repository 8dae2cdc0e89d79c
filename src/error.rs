use thiserror::Error;

use crate::CallState;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

/// Boxed error raised by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration : {0}")]
    Configuration(String),
    #[error("invalid argument : {0} must not be empty")]
    InvalidArgument(&'static str),
    #[error("invalid call state : expected {expected:?}, but the call is {actual:?}")]
    State {
        expected: CallState,
        actual: CallState,
    },
    #[error("token acquisition failed : {0}")]
    TokenReader(#[from] TokenReaderError),
    #[error("invalid url : {0}")]
    Url(#[from] url::ParseError),
    #[error("transport failed : {0}")]
    Transport(#[source] BoxError),
}

impl Error {
    /// Returns `true` if the error was raised by the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Returns `true` if the error reports an invalid lifecycle transition.
    pub fn is_state(&self) -> bool {
        matches!(self, Error::State { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("the proxy has no credentials, {0} signing is unavailable")]
    MissingCredentials(&'static str),
    #[error("flickr calls require a method name")]
    MissingMethod,
}

impl From<SignError> for Error {
    fn from(err: SignError) -> Self {
        match err {
            SignError::MissingCredentials(_) => Error::Configuration(err.to_string()),
            SignError::MissingMethod => Error::InvalidArgument("method"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
    #[error("response is not form-encoded ({0}): {1}")]
    Malformed(String, String),
}
