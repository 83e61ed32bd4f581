use std::fmt;

/// Severity of a message emitted by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Severe,
    Fatal,
}

/// A diagnostic message queued by an engine for the driver to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMessage {
    pub severity: Severity,
    pub text: String,
}

impl EngineMessage {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Severe => "severe",
            Severity::Fatal => "fatal",
        };
        f.write_str(label)
    }
}
