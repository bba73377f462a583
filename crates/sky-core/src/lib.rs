//! Shared primitives used across Skylight crates.

use core::fmt;
use url::Url;

/// Result alias used across the workspace.
pub type ShellResult<T> = Result<T, ShellError>;

/// Top-level error type for the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellError {
    pub code: &'static str,
    pub message: String,
}

impl ShellError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ShellError {}

/// Embedded-engine preference flags, set once at startup.
///
/// These replace process-wide preference writes: the host receives them at
/// construction instead of mutating global state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineTuning {
    pub suppresses_incremental_rendering: bool,
    pub haptic_feedback_enabled: bool,
}

/// Startup configuration passed into the page host at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub start_url: String,
    pub engine: EngineTuning,
}

impl ShellConfig {
    pub fn new(start_url: impl Into<String>) -> ShellResult<Self> {
        let config = Self {
            start_url: start_url.into(),
            engine: EngineTuning::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ShellResult<()> {
        let parsed = Url::parse(&self.start_url).map_err(|error| {
            ShellError::new(
                "config.start_url_invalid",
                format!("start URL `{}` does not parse: {error}", self.start_url),
            )
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ShellError::new(
                "config.start_url_scheme_unsupported",
                format!(
                    "start URL scheme `{}` is not supported (expected http or https)",
                    parsed.scheme()
                ),
            ));
        }

        Ok(())
    }
}

/// Classified page-load failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailureKind {
    /// TLS/certificate-level failures get the longer cache-bypass recovery path.
    SecureConnection,
    Other,
}

impl LoadFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SecureConnection => "secure-connection",
            Self::Other => "other",
        }
    }
}

/// A failed page load, classified for the retry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: LoadFailureKind,
    pub detail: String,
}

impl LoadFailure {
    pub fn new(kind: LoadFailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} load failure: {}", self.kind.as_str(), self.detail)
    }
}
