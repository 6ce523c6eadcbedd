//! Error taxonomy shared by the property system, the registries and the
//! execution engine.

use std::fmt;

/// A single problem found while validating a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyIssue {
    /// Name of the offending property.
    pub property: String,
    /// Human-readable reason.
    pub message: String,
}

impl PropertyIssue {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PropertyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.message)
    }
}

/// Every issue found in one validation pass, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailures(pub Vec<PropertyIssue>);

impl ValidationFailures {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn issues(&self) -> &[PropertyIssue] {
        &self.0
    }

    /// Names of the offending properties.
    pub fn property_names(&self) -> Vec<&str> {
        self.0.iter().map(|i| i.property.as_str()).collect()
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid propert", self.0.len())?;
        f.write_str(if self.0.len() == 1 { "y" } else { "ies" })?;
        for issue in &self.0 {
            write!(f, "\n  {}", issue)?;
        }
        Ok(())
    }
}

/// Errors raised by the framework core.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("property '{name}' is already declared")]
    DuplicateName { name: String },

    #[error("a factory is already subscribed under '{key}'")]
    ExistingFactory { key: String },

    #[error("property '{property}' expects {expected}, got {found}")]
    TypeMismatch {
        property: String,
        expected: String,
        found: String,
    },

    #[error("cannot parse '{text}' for property '{property}': {reason}")]
    Parse {
        property: String,
        text: String,
        reason: String,
    },

    #[error("validation failed: {0}")]
    Validation(ValidationFailures),

    #[error("failed to initialize algorithm {algorithm}")]
    Initialization {
        algorithm: String,
        #[source]
        source: Box<FrameworkError>,
    },

    #[error("algorithm {algorithm} is not initialized")]
    NotInitialized { algorithm: String },

    #[error("error in execution of algorithm {algorithm} v{version}: {source}")]
    Execution {
        algorithm: String,
        version: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("algorithm {algorithm} was cancelled")]
    Cancelled { algorithm: String },

    #[error("{service} has been shut down")]
    ShutDown { service: &'static str },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl FrameworkError {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        FrameworkError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Whether this error means a name or key was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FrameworkError::NotFound { .. })
    }
}

/// Result alias used throughout the crate.
pub type FrameworkResult<T> = Result<T, FrameworkError>;
