//! The everyday command: a spec, its tasks, and optionally custom logic

use std::rc::Rc;

use crate::error::Outcome;
use crate::task::TaskDef;

use super::invocation::Invocation;
use super::pipeline::Command;
use super::spec::CommandSpec;

type ExecuteFn = dyn Fn(&mut Invocation<'_>) -> Outcome;

#[derive(Clone)]
pub struct TaskCommand {
    spec: CommandSpec,
    execute: Option<Rc<ExecuteFn>>,
}

impl TaskCommand {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec, execute: None }
    }

    /// A command running exactly one task, named and described after it
    pub fn single(def: &TaskDef) -> Self {
        let spec = def
            .description()
            .iter()
            .fold(CommandSpec::new(def.name()), |spec, line| spec.describe(line))
            .task(def.name());
        Self::new(spec)
    }

    /// Replaces the default execute step (running the task list)
    pub fn executes(mut self, f: impl Fn(&mut Invocation<'_>) -> Outcome + 'static) -> Self {
        self.execute = Some(Rc::new(f));
        self
    }
}

impl Command for TaskCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn execute(&self, inv: &mut Invocation<'_>) -> Outcome {
        match &self.execute {
            Some(f) => f(inv),
            None => inv.run_tasks(),
        }
    }
}
