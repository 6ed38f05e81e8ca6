//! Per-invocation command state

use std::rc::Rc;

use tracing::debug;

use crate::app::App;
use crate::error::{Error, Failure, Outcome};
use crate::output::Output;
use crate::param::{ParameterSet, Params, PositionalParse, Value};
use crate::task::{TaskCatalog, TaskRegistry};
use crate::text::plural;

use super::pipeline::Command;

/// Everything one run of a command owns: the shared option mapping, the task
/// registry, the merged parameter set and whatever arguments were left over.
pub struct Invocation<'a> {
    pub(super) program: String,
    pub(super) params: Params,
    pub(super) registry: TaskRegistry,
    pub(super) set: ParameterSet,
    pub(super) unexpected: Vec<String>,
    tasks: Vec<String>,
    output: &'a Output,
    app: Option<&'a App>,
}

impl<'a> Invocation<'a> {
    /// Flattens the parameter definitions of the command and of every task it
    /// runs (transitively) into one merged set.
    pub fn prepare(
        program: impl Into<String>,
        command: &dyn Command,
        catalog: Rc<TaskCatalog>,
        params: Params,
        output: &'a Output,
    ) -> Result<Self, Error> {
        let spec = command.spec();
        let mut registry = TaskRegistry::new(catalog);

        let mut definitions = spec.declarations().definitions().to_vec();
        for task in spec.task_names() {
            definitions.extend(registry.parameter_definitions(task)?);
        }
        let mut set = ParameterSet::from_definitions(&definitions)?;
        command.configure(&mut set)?;
        set.check_structure()?;

        let program = program.into();
        debug!(command = %program, parameters = set.len(), "prepared invocation");
        Ok(Self {
            program,
            params,
            registry,
            set,
            unexpected: Vec::new(),
            tasks: spec.task_names().to_vec(),
            output,
            app: None,
        })
    }

    /// Makes the owning application reachable from the command
    pub fn with_app(mut self, app: Option<&'a App>) -> Self {
        self.app = app;
        self
    }

    pub fn app(&self) -> Option<&'a App> {
        self.app
    }

    /// Name used in help and error messages, e.g. `tinyscript build`
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn param(&self, name: &str) -> Result<&Value, Error> {
        self.params.param(name)
    }

    pub fn parameter_set(&self) -> &ParameterSet {
        &self.set
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TaskRegistry {
        &mut self.registry
    }

    pub fn catalog(&self) -> Rc<TaskCatalog> {
        self.registry.shared_catalog()
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    pub fn unexpected(&self) -> &[String] {
        &self.unexpected
    }

    pub fn take_unexpected(&mut self) -> Vec<String> {
        std::mem::take(&mut self.unexpected)
    }

    pub fn output(&self) -> &'a Output {
        self.output
    }

    pub fn out(&self, message: impl AsRef<str>) {
        self.output.out(message);
    }

    pub fn err(&self, message: impl AsRef<str>) {
        self.output.err(message);
    }

    pub fn help_invite(&self) -> String {
        format!("please try {} -h for more help.", self.program)
    }

    /// Assigns residual tokens to positionals, keeping the leftovers
    pub fn parse_positionals(&mut self, residual: &[String]) -> PositionalParse {
        let mut parse = self.set.parse_positionals(residual, &mut self.params);
        self.unexpected = std::mem::take(&mut parse.unexpected);
        parse
    }

    pub fn fill_defaults(&mut self) {
        self.set.fill_defaults(&mut self.params);
    }

    /// Reports every missing required parameter and, if asked, every
    /// unexpected argument, in one go.
    pub fn complain(&self, include_unexpected: bool) -> Outcome {
        let missing: Vec<String> = self
            .set
            .missing_required(&self.params)
            .iter()
            .map(|p| p.vernacular())
            .collect();
        let unexpected: &[String] = if include_unexpected {
            &self.unexpected
        } else {
            &[]
        };
        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }

        if !missing.is_empty() {
            self.err(format!(
                "please provide required parameter{}: {}",
                plural(missing.len()),
                missing.join(", ")
            ));
        }
        if !unexpected.is_empty() {
            let quoted: Vec<String> = unexpected.iter().map(|a| format!("{:?}", a)).collect();
            self.err(format!(
                "unexpected argument{}: {}",
                plural(unexpected.len()),
                quoted.join(", ")
            ));
        }
        self.err(self.help_invite());

        let code = if missing.is_empty() {
            "unexpected_arguments"
        } else {
            "missing_parameters"
        };
        Err(Failure::usage(code).into())
    }

    /// Smart-runs the command's own task list in order, stopping at the first
    /// failure.
    pub fn run_tasks(&mut self) -> Outcome {
        for task in self.tasks.clone() {
            self.out(format!("task: {}", task));
            match self.registry.smart_run(&task, &mut self.params, self.output) {
                Ok(()) => {}
                Err(Error::Failed(failure)) => {
                    self.out(format!("task: {} failed: {}", task, failure));
                    return Err(Error::Failed(failure));
                }
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(())
    }

    /// Smart-runs any task of the catalog with this invocation's options
    pub fn run_task(&mut self, name: &str) -> Outcome {
        self.registry.smart_run(name, &mut self.params, self.output)
    }
}
