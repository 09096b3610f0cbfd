use std::path::PathBuf;
use thiserror::Error;

/// Where a request broke down before a usable HTTP response came back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Host name did not resolve
    Dns,
    /// TCP/TLS connection could not be established
    Connect,
    /// Request exceeded the configured timeout
    Timeout,
    /// Response body could not be read
    Body,
    /// 200 response whose body was not valid JSON
    Parse,
    /// Anything else reqwest reports (builder, redirect, ...)
    Request,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl TransportKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TransportKind::Dns => "DNS Resolution",
            TransportKind::Connect => "Connection",
            TransportKind::Timeout => "Timeout",
            TransportKind::Body => "Body Read",
            TransportKind::Parse => "Response Parsing",
            TransportKind::Request => "Request",
        }
    }

    /// Whether an immediate second attempt has a chance of succeeding.
    /// A malformed body will come back malformed again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportKind::Parse)
    }

    /// Classify a reqwest failure. DNS errors surface as connect errors, so
    /// the source chain is inspected for the resolver message.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportKind::Timeout;
        }
        if err.is_connect() {
            let mut source = std::error::Error::source(err);
            while let Some(inner) = source {
                let msg = inner.to_string().to_lowercase();
                if msg.contains("dns error") || msg.contains("failed to lookup") {
                    return TransportKind::Dns;
                }
                source = inner.source();
            }
            return TransportKind::Connect;
        }
        if err.is_body() || err.is_decode() {
            return TransportKind::Body;
        }
        TransportKind::Request
    }
}

/// Run-level failures. Per-request problems never end up here; they are
/// folded into `PageResult` and turned into skip/stop decisions.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("No usable server found in range {start}-{end}")]
    NoUsableServer { start: u32, end: u32 },

    #[error("No usable links found among {items} catalog items")]
    NoUsableLinks { items: usize },

    #[error("Failed to write playlist to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarvestError {
    /// Short hint printed under the error by the binary
    pub fn suggestion(&self) -> &'static str {
        match self {
            HarvestError::Config(_) | HarvestError::ConfigParse { .. } => {
                "Check the config file and command line flags."
            }
            HarvestError::ConfigIo { .. } => "Verify the --config path exists and is readable.",
            HarvestError::Client(_) => "The TLS backend could not be initialised.",
            HarvestError::NoUsableServer { .. } => {
                "All mirrors are down or empty. Widen the range or try again later."
            }
            HarvestError::NoUsableLinks { .. } => {
                "The server answered but exposes no .m3u8 sources right now."
            }
            HarvestError::Write { .. } => "Check the output directory permissions.",
        }
    }
}
