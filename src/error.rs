use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", format_error_pretty("ir error", .0))]
    Ir(#[from] IrError),

    #[error("{}", format_error_pretty("pass error", .0))]
    Pass(#[from] PassError),

    #[error("{}", format_error_pretty("codegen error", .0))]
    Codegen(#[from] CodegenError),
}

/// Formats an error in a human-friendly style.
fn format_error_pretty(category: &str, msg: &dyn std::fmt::Display) -> String {
    format!("[{}] {}", category, msg)
}

// ---------------------------------------------------------------------------
// IR mutation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum IrError {
    #[error("cannot erase {op}: its result {value} still has {uses} use(s)")]
    ValueInUse { op: String, value: String, uses: usize },

    #[error("operation {op} does not exist in function '{func}' (it may already have been erased)")]
    UnknownOp { func: String, op: String },

    #[error("value {value} does not exist in function '{func}'")]
    UnknownValue { func: String, value: String },

    #[error("function '{name}' is already defined in this module")]
    FunctionExists { name: String },

    #[error("insertion anchor {op} is not part of the body of function '{func}'")]
    BadInsertPoint { func: String, op: String },
}

// ---------------------------------------------------------------------------
// Pass errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PassError {
    #[error(transparent)]
    Ir(#[from] IrError),

    #[error("in function '{func}': value {value} is used before it is defined")]
    UseBeforeDef { func: String, value: String },

    #[error("in function '{func}': use list of {value} does not match its operand slots — {detail}")]
    StaleUse {
        func: String,
        value: String,
        detail: String,
    },

    #[error("in function '{func}': the body must end with exactly one 'return' terminator")]
    MissingTerminator { func: String },

    #[error("in function '{func}': {detail}")]
    SignatureMismatch { func: String, detail: String },

    #[error("type error in function '{func}' — {detail}")]
    TypeError { func: String, detail: String },
}

// ---------------------------------------------------------------------------
// Codegen errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("the {backend} backend cannot emit this construct — {detail}")]
    Unsupported { backend: String, detail: String },
}

impl From<std::fmt::Error> for CodegenError {
    fn from(e: std::fmt::Error) -> Self {
        CodegenError::Unsupported {
            backend: "printer".into(),
            detail: e.to_string(),
        }
    }
}

impl Error {
    /// Returns a stable diagnostic code for this error.
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            Error::Ir(e) => match e {
                IrError::ValueInUse { .. } => "E0100",
                IrError::UnknownOp { .. } => "E0101",
                IrError::UnknownValue { .. } => "E0102",
                IrError::FunctionExists { .. } => "E0103",
                IrError::BadInsertPoint { .. } => "E0104",
            },
            Error::Pass(p) => match p {
                PassError::Ir(_) => "E0200",
                PassError::UseBeforeDef { .. } => "E0201",
                PassError::StaleUse { .. } => "E0202",
                PassError::MissingTerminator { .. } => "E0203",
                PassError::SignatureMismatch { .. } => "E0204",
                PassError::TypeError { .. } => "E0205",
            },
            Error::Codegen(_) => "E0300",
        }
    }
}
