//! Error types for weaviate-mcp.
//!
//! Each layer owns its error enum. Store and resolution errors are folded
//! into envelopes by the dispatcher and only surface here from the CLI.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Argument resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Operation registration or lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An invocation run from the command line returned a failure envelope.
    #[error("{0}")]
    Invocation(String),

    /// Command-line invocation arguments were not a JSON object.
    #[error("invalid --args: {0}")]
    Arguments(String),

    /// The MCP transport stopped with an error.
    #[error("MCP server error: {0}")]
    Transport(String),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the operation registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An operation with this name is already registered.
    #[error("operation already registered: {0}")]
    Duplicate(String),

    /// No operation with this name is registered.
    #[error("unknown operation: {0}")]
    NotFound(String),
}

/// Errors raised while extracting typed arguments from an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A required argument is absent or has the wrong shape.
    #[error("missing or invalid argument '{name}'")]
    MissingOrInvalidArgument {
        /// Wire name of the argument.
        name: String,
    },

    /// An array argument contains an element of the wrong type.
    #[error("argument '{name}' must contain only strings (element {index} is not a string)")]
    InvalidArgumentElement {
        /// Wire name of the argument.
        name: String,
        /// Position of the first offending element.
        index: usize,
    },
}

/// Errors raised by the store gateway and the store client beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or did not become ready.
    #[error("store connection error: {0}")]
    Connection(String),

    /// The store rejected the operation. Joined per-object batch errors
    /// land here as one newline-separated message.
    #[error("{0}")]
    Operation(String),

    /// A store response could not be encoded as the result payload.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Joins a sequence of error messages into one [`StoreError::Operation`],
    /// preserving order. Returns `None` when there are no messages.
    pub fn join<I, S>(messages: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = messages
            .into_iter()
            .map(|m| m.as_ref().to_string())
            .collect::<Vec<_>>();
        if joined.is_empty() {
            None
        } else {
            Some(Self::Operation(joined.join("\n")))
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The store host is empty.
    #[error("store host must not be empty")]
    EmptyHost,

    /// The scheme is neither `http` nor `https`.
    #[error("unsupported scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    /// The default collection name is empty.
    #[error("default collection must not be empty")]
    EmptyDefaultCollection,

    /// The per-call store timeout is zero.
    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,

    /// An environment variable could not be parsed.
    #[error("invalid value for {var}: {value}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}
