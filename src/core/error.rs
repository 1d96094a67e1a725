//! Error handling for bemdeps
//!
//! Errors come in two layers:
//! - [`BemError`] - typed failures raised by the declaration parser, the level
//!   scanner and the ordering engine
//! - [`ErrorContext`] - a wrapper adding details and a suggestion for the CLI
//!
//! Orchestration code works in [`anyhow::Result`] and attaches context with
//! `.with_context(..)`; [`user_friendly_error`] recovers the typed error from an
//! [`anyhow::Error`] chain for display.
//!
//! # Examples
//!
//! ```rust,no_run
//! use bemdeps::core::{BemError, user_friendly_error};
//!
//! let error = BemError::CircularDependency {
//!     chain: "a <- b <- a".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for bemdeps operations.
///
/// # Error Categories
///
/// - **Declarations**: [`DeclParse`](BemError::DeclParse), [`InvalidFragment`](BemError::InvalidFragment)
/// - **Resolution**: [`CircularDependency`](BemError::CircularDependency),
///   [`ExpansionLimit`](BemError::ExpansionLimit)
/// - **Environment**: [`LevelNotFound`](BemError::LevelNotFound),
///   [`ConfigError`](BemError::ConfigError), [`Io`](BemError::Io)
#[derive(Error, Debug)]
pub enum BemError {
    /// A declaration file does not evaluate to a valid declaration structure.
    #[error("Failed to parse declaration file '{path}': {reason}")]
    DeclParse {
        /// Path of the offending file
        path: String,
        /// Parser message
        reason: String,
    },

    /// A declaration fragment cannot be mapped to canonical entities.
    #[error("Invalid declaration fragment: {reason}")]
    InvalidFragment {
        /// What is wrong with the fragment
        reason: String,
    },

    /// Must-dependencies form at least one cycle (strict mode only).
    ///
    /// `chain` holds every cycle, one per line, as `a <- b <- a`.
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// Rendered cycle chains
        chain: String,
    },

    /// Expansion needed more layers than allowed, i.e. a dependency chain
    /// deeper than the limit.
    #[error("Dependency expansion exceeded the limit of {iterations} layers")]
    ExpansionLimit {
        /// Layer limit that was exceeded
        iterations: usize,
    },

    /// A configured level directory does not exist.
    #[error("Level directory not found: {path}")]
    LevelNotFound {
        /// Path of the missing level
        path: String,
    },

    /// Configuration file problems.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for BemError {
    fn clone(&self) -> Self {
        match self {
            Self::DeclParse {
                path,
                reason,
            } => Self::DeclParse {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::InvalidFragment {
                reason,
            } => Self::InvalidFragment {
                reason: reason.clone(),
            },
            Self::CircularDependency {
                chain,
            } => Self::CircularDependency {
                chain: chain.clone(),
            },
            Self::ExpansionLimit {
                iterations,
            } => Self::ExpansionLimit {
                iterations: *iterations,
            },
            Self::LevelNotFound {
                path,
            } => Self::LevelNotFound {
                path: path.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// An error plus optional details and suggestion for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: BemError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    pub fn new(error: BemError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Typed [`BemError`]s anywhere in the chain get tailored suggestions; TOML
/// errors are reported as configuration problems; everything else keeps its
/// full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(bem_error) = error.chain().find_map(|cause| cause.downcast_ref::<BemError>()) {
        let mut ctx = create_error_context(bem_error.clone());
        if ctx.details.is_none() && error.chain().count() > 1 {
            ctx.details = Some(error.to_string());
        }
        return ctx;
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(BemError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of bemdeps.toml");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(BemError::Other {
        message,
    })
}

fn create_error_context(error: BemError) -> ErrorContext {
    match &error {
        BemError::DeclParse {
            path,
            ..
        } => {
            let path = path.clone();
            ErrorContext::new(error)
                .with_suggestion(format!(
                    "Fix the syntax of '{path}'; declaration files hold an object or an array of objects with mustDeps/shouldDeps/noDeps"
                ))
                .with_details("Resolution stops at the first declaration file that fails to parse")
        }
        BemError::InvalidFragment {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "A fragment is a block name or an object with block/elem/elems/mod/mods/val/vals/tech",
        ),
        BemError::CircularDependency {
            chain,
        } => {
            let details = format!("Must-dependency cycles:\n{chain}");
            ErrorContext::new(error)
                .with_suggestion("Turn one mustDeps edge of each cycle into shouldDeps, or resolve without --strict to break cycles automatically")
                .with_details(details)
        }
        BemError::ExpansionLimit {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("max_iterations bounds the longest dependency chain; raise it in bemdeps.toml"),
        BemError::LevelNotFound {
            path,
        } => {
            let suggestion = format!("Create '{path}' or remove it from the configured levels");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        BemError::ConfigError {
            ..
        } => ErrorContext::new(error).with_suggestion("Check bemdeps.toml or the --config path"),
        BemError::Io(_) | BemError::Other {
            ..
        } => ErrorContext::new(error),
    }
}
