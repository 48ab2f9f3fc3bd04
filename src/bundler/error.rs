//! Error types for fragment generation.
//!
//! Provides error handling with contextual error chaining,
//! filesystem-specific errors, and the failure kinds of the WiX backend.
//!
//! # Features
//!
//! - **Context trait**: Add context to errors similar to anyhow
//! - **ErrorExt trait**: Filesystem operations with automatic path context
//! - **bail! macro**: Early return with formatted error messages
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_wix::bundler::{Context, ErrorExt, Result};
//! use std::path::Path;
//!
//! fn read_config(path: &Path) -> Result<toml::Value> {
//!     let contents = std::fs::read_to_string(path)
//!         .fs_context("reading config file", path)?;
//!     toml::from_str(&contents)
//!         .map_err(|e| kodegen_bundler_wix::bundler::Error::GenericError(e.to_string()))
//!         .context("parsing config TOML")
//! }
//! ```

use std::{
    fmt::Display,
    io,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Errors returned by the bundler.
///
/// Every failure is fatal to the current generation pass. Generation is
/// deterministic, so retrying with identical inputs reproduces the failure.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "reading config file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// A path does not resolve under a recognized root directory.
    #[error("Invalid path [{path}]")]
    InvalidPath {
        /// Offending path, rendered with `\` separators
        path: String,
    },

    /// A shortcut path is not under any enabled shortcut folder.
    #[error("no enabled shortcut folder contains [{path}]")]
    NoShortcutFolder {
        /// Offending shortcut path
        path: String,
    },

    /// The requested WiX toolset version has no known grammar.
    #[error("unsupported WiX toolset version {version}")]
    UnsupportedToolset {
        /// Requested toolset version
        version: String,
    },

    /// The document writer failed to emit an element.
    ///
    /// Output written before the failure is incomplete and must be discarded.
    #[error("failed writing {context}: {source}")]
    Serialization {
        /// Element or document part being written
        context: String,
        /// The underlying writer error
        #[source]
        source: io::Error,
    },

    /// Generic I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Error walking the application image.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripError(#[from] path::StripPrefixError),

    /// A path in the application image is not valid UTF-8.
    #[error("path is not UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// Semantic version parsing error.
    #[error("{0}")]
    SemverError(#[from] semver::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with bundler's Error type.
/// Works with both `Result<T, E>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Extension trait mapping writer failures into [`Error::Serialization`].
pub(crate) trait SerializeExt<T> {
    fn xml_context(self, context: impl Display) -> Result<T>;
}

impl<T> SerializeExt<T> for std::result::Result<T, std::io::Error> {
    fn xml_context(self, context: impl Display) -> Result<T> {
        self.map_err(|source| Error::Serialization {
            context: context.to_string(),
            source,
        })
    }
}

/// Macro for early return with error.
///
/// Converts the message into a [`Error::GenericError`] and returns immediately.
///
/// # Examples
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError($msg.into()))
    };
    ($err:expr $(,)?) => {
        return Err($crate::bundler::Error::GenericError($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_error() {
        let result: Result<()> = Err(Error::GenericError("inner".into()));
        let err = result.context("outer").unwrap_err();
        assert_eq!(err.to_string(), "outer: inner");
    }

    #[test]
    fn test_option_context() {
        let value: Option<u32> = None;
        let err = value.context("value is required").unwrap_err();
        assert!(matches!(err, Error::GenericError(msg) if msg == "value is required"));
    }

    #[test]
    fn test_invalid_path_message() {
        let err = Error::InvalidPath {
            path: r"FOO\bar".into(),
        };
        assert_eq!(err.to_string(), r"Invalid path [FOO\bar]");
    }
}
