//! Static command declarations

use heck::ToSnakeCase;

use crate::param::{Declarations, ParamSpec};
use crate::text::unindent;

/// Name, help text, parameters and task list of a command
#[derive(Debug, Clone)]
pub struct CommandSpec {
    name: String,
    description: Vec<String>,
    usage: Vec<String>,
    declarations: Declarations,
    tasks: Vec<String>,
}

impl CommandSpec {
    /// A command with the standard `-h, --help` flag
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            declarations: Declarations::command_base(),
            ..Self::bare(name)
        }
    }

    /// A command with no parameters at all
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Vec::new(),
            usage: Vec::new(),
            declarations: Declarations::new(),
            tasks: Vec::new(),
        }
    }

    /// Inherits the parent's parameter declarations
    pub fn extends(name: impl Into<String>, parent: &CommandSpec) -> Self {
        Self {
            declarations: Declarations::extending(&parent.declarations),
            ..Self::bare(name)
        }
    }

    /// Adds description lines; a multi-line string is unindented and split
    pub fn describe(mut self, text: impl AsRef<str>) -> Self {
        let text = unindent(text.as_ref());
        self.description
            .extend(text.trim_matches('\n').lines().map(str::to_string));
        self
    }

    /// Replaces the generated usage line with explicit ones
    pub fn usage(mut self, line: impl Into<String>) -> Self {
        self.usage.push(line.into());
        self
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.declarations.declare(spec);
        self
    }

    pub fn task(mut self, name: impl AsRef<str>) -> Self {
        self.tasks.push(name.as_ref().to_snake_case());
        self
    }

    pub fn tasks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tasks
            .extend(names.into_iter().map(|n| n.as_ref().to_snake_case()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn usage_lines(&self) -> &[String] {
        &self.usage
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn task_names(&self) -> &[String] {
        &self.tasks
    }
}
