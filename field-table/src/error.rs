//! Error types for the field table model

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for field table operations
pub type Result<T> = std::result::Result<T, FieldTableError>;

/// Broad category of a [`FieldTableError`].
///
/// Callers that only care about the class of failure (a missing key versus a
/// path that never resolved, say) match on this instead of on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required structure is missing or a uniqueness rule would be broken.
    Structure,
    /// A named module does not exist in the table.
    NotFound,
    /// An attribute or sub-parameter key is absent on an otherwise valid node.
    Key,
    /// A lookup chain went through something that cannot be indexed.
    Shape,
    /// Reading, parsing or writing the serialized document failed.
    Io,
}

/// Which kind of name a uniqueness check was guarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Module,
    Variable,
    Attribute,
    Subparam,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Module => write!(f, "module"),
            NameKind::Variable => write!(f, "variable"),
            NameKind::Attribute => write!(f, "attribute"),
            NameKind::Subparam => write!(f, "sub-parameter"),
        }
    }
}

/// Errors that can occur while building, querying or editing a field table
#[derive(Debug, Error)]
pub enum FieldTableError {
    /// A required key is absent from the document
    #[error("missing required key '{key}' at {path}")]
    MissingKey { key: &'static str, path: String },

    /// A sequence that must hold at least one entry is empty
    #[error("'{key}' at {path} must not be empty")]
    EmptySequence { key: &'static str, path: String },

    /// A document node has a shape the field table cannot hold
    #[error("invalid value at {path}: {reason}")]
    InvalidValue { path: String, reason: String },

    /// Target name already identifies a sibling
    #[error("{kind} '{name}' already exists in {scope}")]
    DuplicateName {
        kind: NameKind,
        name: String,
        scope: String,
    },

    /// Attempt to use the reserved identity key as an attribute name
    #[error("'{key}' is reserved for the variable name on '{variable}'")]
    ReservedKey { key: String, variable: String },

    /// No variable with this name in the module's varlist
    #[error("variable '{variable}' not found in module '{module}'")]
    VariableNotFound { module: String, variable: String },

    /// No module with this model_type in the modlist
    #[error("module not found: {module}")]
    ModuleNotFound { module: String },

    /// Attribute key not present on the variable
    #[error("attribute '{key}' not found on variable '{variable}'")]
    AttributeNotFound { variable: String, key: String },

    /// Sub-parameter key not present in the first sub-list entry
    #[error("sub-parameter '{key}' not found in '{list}' of variable '{variable}'")]
    SubparamNotFound {
        variable: String,
        list: String,
        key: String,
    },

    /// A chained lookup failed before reaching something indexable
    #[error("cannot resolve {path}: {source}")]
    Unresolved {
        path: String,
        #[source]
        source: Box<FieldTableError>,
    },

    /// Attribute holds a scalar where a sub-list was expected
    #[error("attribute '{key}' of variable '{variable}' is not a sub-list")]
    NotASubList { variable: String, key: String },

    /// Attribute holds a sub-list where a scalar was expected
    #[error("attribute '{key}' of variable '{variable}' is a sub-list, not a scalar")]
    NotAScalar { variable: String, key: String },

    /// Sub-list has no entries to address
    #[error("sub-list '{key}' of variable '{variable}' has no entries")]
    EmptySubList { variable: String, key: String },

    /// Failed to read or write the table file
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FieldTableError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingKey { .. }
            | Self::EmptySequence { .. }
            | Self::InvalidValue { .. }
            | Self::DuplicateName { .. }
            | Self::ReservedKey { .. }
            | Self::VariableNotFound { .. } => ErrorKind::Structure,
            Self::ModuleNotFound { .. } => ErrorKind::NotFound,
            Self::AttributeNotFound { .. } | Self::SubparamNotFound { .. } => ErrorKind::Key,
            Self::Unresolved { .. }
            | Self::NotASubList { .. }
            | Self::NotAScalar { .. }
            | Self::EmptySubList { .. } => ErrorKind::Shape,
            Self::Io { .. } | Self::Yaml(_) => ErrorKind::Io,
        }
    }

    /// Create an Io error for a file path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn missing_key(key: &'static str, path: impl Into<String>) -> Self {
        Self::MissingKey {
            key,
            path: path.into(),
        }
    }

    pub(crate) fn invalid_value(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn duplicate(kind: NameKind, name: &str, scope: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.to_string(),
            scope: scope.into(),
        }
    }

    /// Wrap a lookup failure so it reads as an unresolved path.
    pub(crate) fn unresolved(path: impl Into<String>, source: FieldTableError) -> Self {
        Self::Unresolved {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
