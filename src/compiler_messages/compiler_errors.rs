use crate::ir::ir_nodes::TextLocation;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    CompilationStage,

    // Optional suggestion
    PrimarySuggestion,

    // What the analysis was looking at when it gave up
    RoutineName,
    PathName,
    BlockName,
    CalleeName,
    ExpectedArity,
    FoundArity,
    ConfigKey,
}

/// A fatal error.
///
/// Usage errors in analysed code are never `CompilerError`s; they are
/// diagnostics in the report. A `CompilerError` means the input could not be
/// analysed at all (malformed IR, unreadable config) or an internal bug.
#[derive(Debug, Clone)]
pub struct CompilerError {
    pub msg: String,
    pub location: TextLocation,
    pub error_type: ErrorType,

    // Structured detail for tooling that consumes the error
    pub metadata: HashMap<ErrorMetaDataKey, String>,
}

impl CompilerError {
    pub fn new(msg: impl Into<String>, location: TextLocation, error_type: ErrorType) -> Self {
        CompilerError {
            msg: msg.into(),
            location,
            error_type,
            metadata: HashMap::new(),
        }
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: impl Into<String>) {
        self.metadata.insert(key, value.into());
    }

    pub fn metadata_value(&self, key: &ErrorMetaDataKey) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Create a malformed IR error (the front end handed over something unusable)
    pub fn new_malformed_ir_error(msg: impl Into<String>, location: TextLocation) -> Self {
        Self::new(msg, location, ErrorType::MalformedIr)
    }

    /// Create a compiler error (internal bug, not the analysed program's fault)
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        Self::new(msg, TextLocation::default(), ErrorType::Compiler)
    }

    pub fn file_error(path: &std::path::Path, msg: impl Into<String>) -> Self {
        let mut error = Self::new(msg, TextLocation::default(), ErrorType::File);
        error.new_metadata_entry(
            ErrorMetaDataKey::PrimarySuggestion,
            format!("Check that '{}' exists and is readable", path.display()),
        );
        error
    }
}

impl Display for CompilerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", error_type_to_str(&self.error_type), self.msg)
    }
}

impl std::error::Error for CompilerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    MalformedIr,
    Config,
    File,
    Compiler,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::MalformedIr => "Malformed IR",
        ErrorType::Config => "Malformed Config",
        ErrorType::File => "File Error",
        ErrorType::Compiler => "Compiler Bug",
    }
}

/// Returns a new CompilerError for IR the analysis cannot work with.
///
/// These abort the current routine only. The driver turns them into a single
/// `MalformedRoutine` diagnostic and moves on.
///
/// Usage:
/// `return_malformed_ir_error!("message", location, {
///     CompilationStage => "Ownership Analysis",
///     PrimarySuggestion => "Declare the local before use",
/// })`;
#[macro_export]
macro_rules! return_malformed_ir_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::compiler_messages::compiler_errors::ErrorType::MalformedIr,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert(
                    $crate::compiler_messages::compiler_errors::ErrorMetaDataKey::$key,
                    String::from($value),
                ); )*
                map
            },
        })
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::compiler_messages::compiler_errors::ErrorType::MalformedIr,
            metadata: std::collections::HashMap::new(),
        })
    };
}

/// Returns a new CompilerError for a config file that doesn't make sense.
#[macro_export]
macro_rules! return_config_error {
    ($msg:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $crate::ir::ir_nodes::TextLocation::default(),
            error_type: $crate::compiler_messages::compiler_errors::ErrorType::Config,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert(
                    $crate::compiler_messages::compiler_errors::ErrorMetaDataKey::$key,
                    String::from($value),
                ); )*
                map
            },
        })
    };
}

/// Returns a new CompilerError for an internal invariant the analysis broke itself.
#[macro_export]
macro_rules! return_compiler_error {
    ($msg:expr) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError::compiler_error(
            $msg,
        ))
    };
}
