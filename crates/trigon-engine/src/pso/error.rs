use std::fmt;

use crate::shader::ShaderStage;

/// Errors from the pipeline-state registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsoError {
    /// No entry is registered under this name.
    Missing(String),
    /// An entry already exists and the registry rejects duplicates.
    Duplicate(String),
    /// A shader was passed in the slot of another stage.
    StageMismatch {
        name: String,
        expected: ShaderStage,
        found: ShaderStage,
    },
    /// The device refused to build the pipeline, usually because the stages'
    /// interfaces do not line up.
    Pipeline { name: String, diagnostic: String },
}

impl fmt::Display for PsoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PsoError::Missing(name) => write!(f, "no pipeline state named `{name}`"),
            PsoError::Duplicate(name) => {
                write!(f, "pipeline state `{name}` is already registered")
            }
            PsoError::StageMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "pipeline state `{name}`: expected a {expected} shader, got a {found} shader"
            ),
            PsoError::Pipeline { name, diagnostic } => {
                write!(f, "pipeline state `{name}` failed validation: {diagnostic}")
            }
        }
    }
}

impl std::error::Error for PsoError {}
