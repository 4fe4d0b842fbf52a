//! Unified error handling for the Verte compiler.
//!
//! Every stage has its own small error type; this module folds them into a
//! single surface for the CLI. All errors carry a source position when one
//! exists, and no stage attempts recovery.

use std::fmt;
use std::path::PathBuf;

/// A unified error covering every phase of compilation.
#[derive(Debug)]
pub enum VerteError {
    /// File open/read failure, with the offending path.
    Io { message: String, path: PathBuf },

    /// Tokenization failed.
    Lexical {
        message: String,
        line: u32,
        column: u32,
    },

    /// Grammar violation. Taxonomically a lexical error: it carries the
    /// same position payload and aborts the same way.
    Parser {
        message: String,
        line: u32,
        column: u32,
    },

    /// Code generation failed (unknown symbol, const assignment, type
    /// mismatch, bad module-level initializer, unknown call target).
    Codegen { message: String },

    /// Object emission or linker failure.
    Link { message: String },
}

impl VerteError {
    pub fn io(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        VerteError::Io {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Short kind name, e.g. "LexicalError".
    pub fn kind(&self) -> &'static str {
        match self {
            VerteError::Io { .. } => "IOError",
            VerteError::Lexical { .. } => "LexicalError",
            VerteError::Parser { .. } => "ParserError",
            VerteError::Codegen { .. } => "CodegenError",
            VerteError::Link { .. } => "LinkError",
        }
    }

    /// Source position, when the stage tracked one.
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            VerteError::Lexical { line, column, .. } | VerteError::Parser { line, column, .. } => {
                Some((*line, *column))
            }
            _ => None,
        }
    }
}

impl fmt::Display for VerteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerteError::Io { message, path } => {
                write!(f, "IOError: {}: {}", path.display(), message)
            }
            VerteError::Lexical {
                message,
                line,
                column,
            } => write!(f, "LexicalError at {line}:{column}: {message}"),
            VerteError::Parser {
                message,
                line,
                column,
            } => write!(f, "ParserError at {line}:{column}: {message}"),
            VerteError::Codegen { message } => write!(f, "CodegenError: {message}"),
            VerteError::Link { message } => write!(f, "LinkError: {message}"),
        }
    }
}

impl std::error::Error for VerteError {}

impl From<crate::lexer::LexicalError> for VerteError {
    fn from(err: crate::lexer::LexicalError) -> Self {
        VerteError::Lexical {
            message: err.message,
            line: err.line,
            column: err.column,
        }
    }
}

impl From<crate::parser::ParserError> for VerteError {
    fn from(err: crate::parser::ParserError) -> Self {
        VerteError::Parser {
            message: err.message,
            line: err.line,
            column: err.column,
        }
    }
}

impl From<crate::codegen::compiler::CodegenError> for VerteError {
    fn from(err: crate::codegen::compiler::CodegenError) -> Self {
        VerteError::Codegen {
            message: err.message,
        }
    }
}

impl From<crate::codegen::pipeline::CompileError> for VerteError {
    fn from(err: crate::codegen::pipeline::CompileError) -> Self {
        use crate::codegen::pipeline::CompileError;

        match err {
            CompileError::Lexical(e) => e.into(),
            CompileError::Parser(e) => e.into(),
            CompileError::Codegen(e) => e.into(),
            CompileError::Link(message) => VerteError::Link { message },
            CompileError::Io(e) => VerteError::Io {
                message: e.to_string(),
                path: PathBuf::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position() {
        let err = VerteError::Lexical {
            message: "Unterminated string.".to_string(),
            line: 3,
            column: 14,
        };
        assert_eq!(err.to_string(), "LexicalError at 3:14: Unterminated string.");
        assert_eq!(err.position(), Some((3, 14)));
        assert_eq!(err.kind(), "LexicalError");
    }

    #[test]
    fn codegen_errors_have_no_position() {
        let err = VerteError::Codegen {
            message: "Unknown variable referenced: x".to_string(),
        };
        assert_eq!(err.position(), None);
        assert_eq!(
            err.to_string(),
            "CodegenError: Unknown variable referenced: x"
        );
    }

    #[test]
    fn stage_errors_convert() {
        let lex = crate::lexer::LexicalError {
            message: "Invalid escape sequence.".to_string(),
            line: 1,
            column: 5,
        };
        let err: VerteError = lex.into();
        assert_eq!(err.kind(), "LexicalError");

        let parse = crate::parser::ParserError {
            message: "Expected a primary expression.".to_string(),
            line: 2,
            column: 1,
        };
        let err: VerteError = parse.into();
        assert_eq!(err.kind(), "ParserError");
        assert_eq!(err.position(), Some((2, 1)));
    }
}
