//! Error types for plan construction and resolution.
//!
//! Setup passes collect every [`SetupError`] they encounter and report them
//! together as a [`PassError`]. Resolution failures are per type and are
//! reported as [`ResolveError`].

use thiserror::Error;

use crate::data_type::DataType;
use crate::types::SourceType;

/// Invalid combination or value of artifact attribute fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// A string field was set to an empty value.
    #[error("field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// Two mutually exclusive fields were both set.
    #[error("'{field}' cannot be combined with '{other}'")]
    Conflict {
        field: &'static str,
        other: &'static str,
    },
}

/// A single offense found during one of the setup passes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    /// A configured type name matched no type in the universe.
    #[error("cannot resolve type name '{name}'")]
    UnresolvableName { name: String },

    /// A configured attribute has an invalid field combination.
    #[error("invalid artifact attribute for '{type_name}': {source}")]
    InvalidAttribute {
        type_name: String,
        #[source]
        source: AttributeError,
    },

    /// A configured type maps to a data type outside the exchangeable universe.
    #[error("type '{source_type}' maps to data type '{data_type}' which is not exchangeable")]
    NonExchangeable {
        source_type: SourceType,
        data_type: DataType,
    },

    /// A type carries more than one artifact annotation.
    #[error("type '{source_type}' has more than one artifact annotation")]
    DuplicateAnnotation { source_type: SourceType },

    /// The same type was configured more than once.
    #[error("type '{source_type}' is configured more than once")]
    DuplicateConfiguration { source_type: SourceType },

    /// `ensure_register` demanded a data type that does not exist.
    #[error("type '{source_type}' was registered as a data type but has no exchangeable data type")]
    MissingDataType { source_type: SourceType },

    /// A global generator factory failed to produce a generator.
    #[error("global generator factory '{factory}' failed: {message}")]
    FactoryFailed { factory: String, message: String },
}

/// Failure of a whole setup pass.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{pass} failed with {} error(s):\n{}", .errors.len(), format_errors(.errors))]
pub struct PassError {
    /// The pass that failed.
    pub pass: &'static str,
    /// Every offense found, in discovery order.
    pub errors: Vec<SetupError>,
}

impl PassError {
    pub fn new(pass: &'static str, errors: Vec<SetupError>) -> Self {
        Self { pass, errors }
    }
}

/// Error while building a generation plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error(transparent)]
    Pass(#[from] PassError),
}

impl PlanError {
    /// The setup errors behind this failure.
    pub fn errors(&self) -> &[SetupError] {
        match self {
            PlanError::Pass(pass) => &pass.errors,
        }
    }
}

/// Error raised by a generator callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GeneratorError {
    pub message: String,
}

impl GeneratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<AttributeError> for GeneratorError {
    fn from(err: AttributeError) -> Self {
        Self::new(err.to_string())
    }
}

/// Failure to resolve one type's artifact descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The type is not part of the universe.
    #[error("type '{source_type}' is not part of the type universe")]
    UnknownType { source_type: SourceType },

    /// An alias points at a type outside the universe.
    #[error("type '{source_type}' aliases unknown type '{target}'")]
    DanglingAlias {
        source_type: SourceType,
        target: SourceType,
    },

    /// Alias references form a cycle.
    #[error("alias cycle detected: {}", format_cycle(.cycle))]
    AliasCycle { cycle: Vec<SourceType> },

    /// One or more generators reported failure.
    #[error("generation of '{source_type}' failed in {}", .generators.join(", "))]
    GeneratorFailed {
        source_type: SourceType,
        generators: Vec<String>,
    },

    /// The type depends on a type whose resolution already failed.
    #[error("type '{source_type}' depends on failed type '{dependency}'")]
    Poisoned {
        source_type: SourceType,
        dependency: SourceType,
    },
}

fn format_errors(errors: &[SetupError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}. {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_cycle(cycle: &[SourceType]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
