use std::fmt;

/// Result type for vegaview-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while interpreting values that originate in a visualization spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Neither input could be read as an absolute or relative date
    MalformedTimeRange { start: String, end: String },

    /// No explicit, spec-derived or default index pattern could be resolved
    IndexResolution(String),

    /// A resource load was blocked by the external URL policy
    ExternalUrlDenied(String),

    /// An argument passed from the expression interpreter has the wrong shape
    InvalidArgument(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedTimeRange { start, end } => write!(
                f,
                "Error setting time filter: both time values must be either relative or absolute dates. start={}, end={}",
                start, end
            ),
            Error::IndexResolution(msg) => write!(f, "{}", msg),
            Error::ExternalUrlDenied(url) => write!(
                f,
                "External URLs are not enabled. Add `enable_external_urls = true` to the vegaview configuration to load {}",
                url
            ),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
