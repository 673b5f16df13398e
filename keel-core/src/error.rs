//! Error types for core domain operations

use thiserror::Error;

/// Errors produced when validating a build identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildIdError {
    /// The identifier is empty
    #[error("build id cannot be empty")]
    Empty,

    /// The identifier exceeds the image tag length limit
    #[error("build id is {0} characters long, the maximum is 128")]
    TooLong(usize),

    /// The identifier starts with a character a tag cannot start with
    #[error("build id cannot start with '{0}'")]
    InvalidStart(char),

    /// The identifier contains a character outside `[A-Za-z0-9_.-]`
    #[error("build id contains invalid character '{ch}' at position {position}")]
    InvalidChar {
        /// The offending character
        ch: char,
        /// Zero-based character position
        position: usize,
    },
}

/// Errors produced while rendering a manifest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A placeholder token in the template has no replacement value
    #[error("unresolved placeholder __{token}__ in {manifest} (line {line})")]
    UnresolvedPlaceholder {
        /// Manifest name (usually the file name)
        manifest: String,
        /// Token name without the surrounding underscores
        token: String,
        /// One-based line number of the first occurrence
        line: usize,
    },

    /// A placeholder-shaped name in the template is not all uppercase
    #[error("mis-cased placeholder __{token}__ in {manifest} (line {line}), names must be uppercase")]
    MalformedPlaceholder {
        /// Manifest name (usually the file name)
        manifest: String,
        /// Name without the surrounding underscores
        token: String,
        /// One-based line number
        line: usize,
    },
}

/// Errors related to secret material
#[derive(Debug, Error)]
pub enum SecretError {
    /// The secret store returned a payload that is not valid UTF-8
    #[error("secret '{name}' is not valid UTF-8")]
    NotUtf8 {
        /// Name of the secret in the store
        name: String,
    },

    /// The secret store returned an empty payload
    #[error("secret '{name}' is empty")]
    Empty {
        /// Name of the secret in the store
        name: String,
    },

    /// The cluster secret document could not be serialized
    #[error("failed to serialize cluster secret '{name}': {source}")]
    Serialize {
        /// Name of the cluster secret object
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
