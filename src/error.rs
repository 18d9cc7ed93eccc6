use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("PDF error: {0}")]
    LoPdfError(#[from] lopdf::Error),
    #[error("PNG error: {0}")]
    PngError(#[from] png::DecodingError),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    TryFromIntError(#[from] std::num::TryFromIntError),
    /// Input rejected before any network I/O.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The signing service could not be reached or refused the request.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// A signature request is already waiting for the signing service.
    #[error("A signature request is already in progress, wait for it to finish.")]
    SubmissionInFlight,
    /// The session is not in a state that allows the requested step.
    #[error("Operation `{operation}` is not possible while the session is {state}.")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    #[error("Invalid configuration for `{key}`: {reason}")]
    Config { key: String, reason: String },
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("No PDF document was selected.")]
    MissingSourceFile,
    #[error("No private key file was selected.")]
    MissingCredential,
    #[error("The private key password is empty.")]
    EmptyPassphrase,
    #[error("Place at least one signature before signing.")]
    NoPlacement,
    #[error("The acting user is unknown.")]
    MissingUserId,
    #[error("Page {page} does not exist, the document has {page_count} page(s).")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("The rendered page size must be positive, got {width}x{height}.")]
    InvalidRenderedSize { width: f64, height: f64 },
    #[error("Stamp dimensions must be within (0, 1], got {width}x{height}.")]
    InvalidStampDimensions { width: f64, height: f64 },
    #[error("Signature placement {index} is invalid: {reason}")]
    InvalidPlacement { index: usize, reason: String },
    #[error("Unknown signature marker `{0}`.")]
    UnknownMarker(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Could not reach the signing service: {0}")]
    Transport(String),
    #[error("The signing service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Self::Other(err.to_owned())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::LoPdfError(lopdf::Error::from(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Service(ServiceError::Transport(err.to_string()))
    }
}
