use thiserror::Error;

/// Startup-time failures: configuration that cannot be loaded or is unusable.
///
/// Per-record processing failures never surface here — they are contained
/// in the pipeline and recorded on the run summary.
#[derive(Debug, Error)]
pub enum MenuflowError {
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
