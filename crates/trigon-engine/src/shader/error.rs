use std::fmt;

use super::ShaderStage;

/// A shader stage that failed to compile.
///
/// `diagnostic` holds the compiler output as it was logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    Parse {
        stage: ShaderStage,
        diagnostic: String,
    },
    Validation {
        stage: ShaderStage,
        diagnostic: String,
    },
    MissingEntryPoint {
        stage: ShaderStage,
        entry_point: &'static str,
    },
}

impl ShaderError {
    pub fn stage(&self) -> ShaderStage {
        match self {
            ShaderError::Parse { stage, .. }
            | ShaderError::Validation { stage, .. }
            | ShaderError::MissingEntryPoint { stage, .. } => *stage,
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Parse { stage, diagnostic } => {
                write!(f, "{stage} shader failed to parse:\n{diagnostic}")
            }
            ShaderError::Validation { stage, diagnostic } => {
                write!(f, "{stage} shader failed validation:\n{diagnostic}")
            }
            ShaderError::MissingEntryPoint { stage, entry_point } => write!(
                f,
                "{stage} shader has no @{} entry point named `{entry_point}`",
                stage.attribute()
            ),
        }
    }
}

impl std::error::Error for ShaderError {}
