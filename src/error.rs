use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    Parse {
        message: String,
    },
    DanglingReference {
        target: String,
        trigger: String,
        missing: String,
    },
    CyclicChain {
        target: String,
        trigger: String,
        block: String,
    },
    UnsupportedOpcode {
        opcode: String,
    },
    UnresolvedInput {
        opcode: String,
        input: String,
    },
    MissingInput {
        opcode: String,
        input: String,
    },
    UnsupportedInputType {
        opcode: String,
        input: String,
        found: &'static str,
    },
    InvalidNumericLiteral {
        literal: String,
    },
}

impl CompileError {
    pub fn parse(message: impl Into<String>) -> Self {
        CompileError::Parse {
            message: message.into(),
        }
    }

    /// Non-fatal errors degrade the offending block to an empty instruction.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CompileError::UnsupportedOpcode { .. } | CompileError::UnresolvedInput { .. }
        )
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Parse { message } => write!(f, "Parse error: {}", message),
            CompileError::DanglingReference {
                target,
                trigger,
                missing,
            } => write!(
                f,
                "Block '{}' referenced from stack '{}' in target '{}' does not exist.",
                missing, trigger, target
            ),
            CompileError::CyclicChain {
                target,
                trigger,
                block,
            } => write!(
                f,
                "Stack '{}' in target '{}' loops back through block '{}'.",
                trigger, target, block
            ),
            CompileError::UnsupportedOpcode { opcode } => {
                write!(f, "Unsupported opcode '{}'.", opcode)
            }
            CompileError::UnresolvedInput { opcode, input } => write!(
                f,
                "Input '{}' of '{}' holds a reporter block, which is not compiled yet.",
                input, opcode
            ),
            CompileError::MissingInput { opcode, input } => {
                write!(f, "'{}' is missing its '{}' input.", opcode, input)
            }
            CompileError::UnsupportedInputType {
                opcode,
                input,
                found,
            } => write!(
                f,
                "Input '{}' of '{}' cannot be a {}.",
                input, opcode, found
            ),
            CompileError::InvalidNumericLiteral { literal } => {
                write!(f, "'{}' is not a valid number.", literal)
            }
        }
    }
}

impl Error for CompileError {}

/// A compile problem pinned to the target, stack and block it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub target: String,
    pub stack: Option<String>,
    pub block: Option<String>,
    pub error: CompileError,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}", self.target)?;
        if let Some(stack) = &self.stack {
            write!(f, " / stack {}", stack)?;
        }
        if let Some(block) = &self.block {
            write!(f, " / block {}", block)?;
        }
        write!(f, "] {}", self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degradations_are_not_fatal() {
        let unsupported = CompileError::UnsupportedOpcode {
            opcode: "sound_play".to_string(),
        };
        let unresolved = CompileError::UnresolvedInput {
            opcode: "motion_movesteps".to_string(),
            input: "STEPS".to_string(),
        };
        assert!(!unsupported.is_fatal());
        assert!(!unresolved.is_fatal());
        assert!(CompileError::parse("bad").is_fatal());
        assert!(CompileError::InvalidNumericLiteral {
            literal: "abc".to_string()
        }
        .is_fatal());
    }

    #[test]
    fn diagnostic_names_its_scope() {
        let diagnostic = Diagnostic {
            target: "Sprite1".to_string(),
            stack: Some("hat".to_string()),
            block: Some("b1".to_string()),
            error: CompileError::UnsupportedOpcode {
                opcode: "sound_play".to_string(),
            },
        };
        assert_eq!(
            diagnostic.to_string(),
            "[Sprite1 / stack hat / block b1] Unsupported opcode 'sound_play'."
        );
    }
}
