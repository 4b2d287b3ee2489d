use thiserror::Error;
use wasm_bindgen::JsValue;

/// Which failure occurred, for callers that map errors to user-facing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedXml,
    EmptyTrack,
    FileTooLarge,
    UnsupportedExtension,
    InvalidEncoding,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedXml => "MalformedXml",
            Self::EmptyTrack => "EmptyTrack",
            Self::FileTooLarge => "FileTooLarge",
            Self::UnsupportedExtension => "UnsupportedExtension",
            Self::InvalidEncoding => "InvalidEncoding",
        }
    }
}

/// Failure to turn GPX text into a track.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Malformed GPX document: {0}")]
    MalformedXml(String),

    #[error("No track points found: {0}")]
    EmptyTrack(String),
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedXml(_) => ErrorKind::MalformedXml,
            Self::EmptyTrack(_) => ErrorKind::EmptyTrack,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::MalformedXml(detail) | Self::EmptyTrack(detail) => detail,
        }
    }
}

/// Failure anywhere along the upload path: guards, decoding, or extraction.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("File too large: {size_bytes} bytes exceeds maximum of {max_bytes} bytes")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("Unsupported file type: {file_name}")]
    UnsupportedExtension { file_name: String },

    #[error("Unsupported character encoding: {label}")]
    InvalidEncoding { label: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            Self::UnsupportedExtension { .. } => ErrorKind::UnsupportedExtension,
            Self::InvalidEncoding { .. } => ErrorKind::InvalidEncoding,
            Self::Parse(e) => e.kind(),
        }
    }
}

impl From<IngestError> for JsValue {
    fn from(e: IngestError) -> Self {
        let err = js_sys::Error::new(&e.to_string());
        err.set_name(e.kind().as_str());
        err.into()
    }
}

impl From<ParseError> for JsValue {
    fn from(e: ParseError) -> Self {
        IngestError::from(e).into()
    }
}
