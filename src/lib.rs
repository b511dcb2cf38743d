//! xbrljson - XBRL instance to XBRL-JSON (OIM) converter
//!
//! Licensed under AGPL-3.0

pub mod builder;
pub mod emitter;
pub mod guard;
pub mod model;
pub mod prefix;
pub mod resolver;
pub mod shared;
pub mod source;

pub use builder::InstanceBuilder;
pub use emitter::{EmitMode, Emitter};
pub use guard::is_valid_json;
pub use shared::SharedInstance;
pub use source::{is_xbrl_doc, XbrlFile};

// Re-export main types
pub use model::{Context, Dts, Fact, Footnote, Instance, Period, Prefix, Unit};

/// Emission settings
#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// Indented output
    pub pretty: bool,
    /// Resolve facts on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl EmitConfig {
    /// Single-line, single-threaded output.
    pub fn compact() -> Self {
        Self {
            pretty: false,
            parallel: false,
        }
    }
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            parallel: cfg!(feature = "parallel"),
        }
    }
}

/// Builds an instance from `file` and renders it in `mode`.
pub fn convert(file: &XbrlFile, mode: EmitMode, config: EmitConfig) -> Result<String> {
    let mut instance = InstanceBuilder::new().build(file)?;
    Emitter::with_config(config).emit(&mut instance, mode)
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("File name must not be empty")]
    EmptyFileName,

    #[error("File size must be greater than 0")]
    NonPositiveSize,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed output: {0}")]
    Malformed(String),
}
