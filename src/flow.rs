//! Pipeline control signals

use std::fmt;

/// Raised by a flag callback to abort the rest of the pipeline and hand
/// control to a named handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// `-h/--help [topic]`
    ShowHelp { topic: Option<String> },
    /// `-v/--version`
    ShowVersion,
    /// Anything an application defines for itself
    Custom { handler: String, args: Vec<String> },
}

impl Interrupt {
    pub fn help() -> Self {
        Interrupt::ShowHelp { topic: None }
    }

    /// Name of the handler this interrupt dispatches to
    pub fn handler(&self) -> &str {
        match self {
            Interrupt::ShowHelp { .. } => "help",
            Interrupt::ShowVersion => "version",
            Interrupt::Custom { handler, .. } => handler,
        }
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.handler())
    }
}

/// Result of a pipeline step that may be cut short by an [`Interrupt`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow<T> {
    Continue(T),
    Interrupt(Interrupt),
}
