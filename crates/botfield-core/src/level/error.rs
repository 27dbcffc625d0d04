use thiserror::Error;

use crate::registry::CreateError;

/// Structural error in a level description or while building its scene
#[derive(Error, Debug)]
pub enum LevelError {
    #[error("{file}:{line}: syntax error: {message}")]
    Syntax { file: String, line: usize, message: String },
    #[error("{file}:{line}: unknown command '{command}'")]
    UnknownCommand { file: String, line: usize, command: String },
    #[error("{file}:{line}: missing required parameter '{param}' in {command}")]
    MissingParam {
        file: String,
        line: usize,
        command: String,
        param: String,
    },
    #[error("{file}:{line}: bad value '{value}' for parameter '{param}', expected {expected}")]
    BadValue {
        file: String,
        line: usize,
        param: String,
        value: String,
        expected: &'static str,
    },
    #[error("{file}:{line}: {message}")]
    Invalid { file: String, line: usize, message: String },
    #[error("{file}:{line}: cannot create object: {source}")]
    Create {
        file: String,
        line: usize,
        #[source]
        source: CreateError,
    },
    #[error("level file not found: {0}")]
    NotFound(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
