use std::fmt;

/// Result type for vegaview-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Error raised by spec-derived input (time ranges, indexes, URLs)
    Spec(vegaview_types::Error),

    /// The parser reported a fatal error before the view was built
    FatalParse(String),

    /// The engine invoked a function name outside the known table
    UnknownFunction(String),

    /// Host application misuse (e.g. init() called twice)
    Lifecycle(String),

    /// The rendering engine failed
    Engine(String),

    /// A host service failed
    Host(String),

    /// Configuration error
    Config(String),

    /// IO operation failed
    Io(std::io::Error),
}

impl Error {
    /// Only lifecycle misuse may escape to the caller; everything else is
    /// reported into the panel.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Error::Lifecycle(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spec(err) => write!(f, "{}", err),
            Error::FatalParse(msg) => write!(f, "{}", msg),
            Error::UnknownFunction(name) => {
                write!(f, "{} is not a recognized expression function", name)
            }
            Error::Lifecycle(msg) => write!(f, "Lifecycle contract violated: {}", msg),
            Error::Engine(msg) => write!(f, "Rendering error: {}", msg),
            Error::Host(msg) => write!(f, "{}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Spec(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::FatalParse(_)
            | Error::UnknownFunction(_)
            | Error::Lifecycle(_)
            | Error::Engine(_)
            | Error::Host(_)
            | Error::Config(_) => None,
        }
    }
}

impl From<vegaview_types::Error> for Error {
    fn from(err: vegaview_types::Error) -> Self {
        Error::Spec(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
