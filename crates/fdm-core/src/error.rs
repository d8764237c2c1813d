use thiserror::Error;

pub type FdmResult<T> = Result<T, FdmError>;

/// Engine-wide error taxonomy.
///
/// Construction and initialization failures are reported through these
/// variants and propagated to the simulation manager. The per-tick update path
/// never produces them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FdmError {
    /// A required node, reference, wheel or mass station was not found.
    #[error("Null pointer: {what}")]
    NullPointer { what: String },

    /// Configuration file missing, malformed or missing a required element.
    #[error("File reading error in '{file}': {what}{}", location_suffix(.line, .column))]
    FileReading {
        file: String,
        what: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// A named lookup among a fixed set of expected sub-objects failed.
    #[error("Unknown exception: {what}")]
    UnknownLookup { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    /// Wraps a lower-level failure with diagnostic context.
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<FdmError>,
    },
}

impl FdmError {
    pub fn null_pointer(what: impl Into<String>) -> Self {
        Self::NullPointer { what: what.into() }
    }

    pub fn unknown_lookup(what: impl Into<String>) -> Self {
        Self::UnknownLookup { what: what.into() }
    }

    pub fn invalid_arg(what: impl Into<String>) -> Self {
        Self::InvalidArg { what: what.into() }
    }

    /// Innermost error of a context chain.
    pub fn root_cause(&self) -> &FdmError {
        let mut current = self;
        while let FdmError::Context { source, .. } = current {
            current = source;
        }
        current
    }
}

fn location_suffix(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" (line {l}, column {c})"),
        (Some(l), None) => format!(" (line {l})"),
        _ => String::new(),
    }
}

/// Attach context to a failed [`FdmResult`], chaining the original error as cause.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> FdmResult<T>;

    fn with_context<F, S>(self, f: F) -> FdmResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for FdmResult<T> {
    fn context(self, context: impl Into<String>) -> FdmResult<T> {
        self.map_err(|e| FdmError::Context {
            context: context.into(),
            source: Box::new(e),
        })
    }

    fn with_context<F, S>(self, f: F) -> FdmResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| FdmError::Context {
            context: f().into(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_reading_reports_location() {
        let err = FdmError::FileReading {
            file: "c172.yaml".to_string(),
            what: "missing field `mass`".to_string(),
            line: Some(12),
            column: Some(3),
        };
        let msg = err.to_string();
        assert!(msg.contains("c172.yaml"));
        assert!(msg.contains("line 12, column 3"));
    }

    #[test]
    fn context_chain_keeps_root_cause() {
        let res: FdmResult<()> = Err(FdmError::null_pointer("controls/elevator"));
        let err = res
            .context("binding aerodynamics")
            .context("initializing aircraft")
            .unwrap_err();

        assert!(err.to_string().contains("initializing aircraft"));
        assert!(err.to_string().contains("controls/elevator"));
        assert_eq!(
            err.root_cause(),
            &FdmError::null_pointer("controls/elevator")
        );
    }
}
