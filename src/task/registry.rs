//! Per-invocation task instances and the dependency walk
//!
//! A [`TaskRegistry`] owns one instance per task name for the lifetime of a
//! command invocation. [`TaskRegistry::smart_run`] memoizes success: a task
//! that succeeded is skipped, a task that failed is run again every time it is
//! asked for. There is no retry cap and no backoff.
//!
//! Cycles are caught with a visiting stack shared by every walk of the
//! registry. [`VisitGuard`] pushes a name before the walk descends into it and
//! pops it on every exit path, unwinding included.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::{fail, Error, Failure, Outcome};
use crate::output::Output;
use crate::param::{ParamSpec, Params, Value};
use crate::text::ordinal;

use super::def::{Task, TaskCatalog, TaskDef};
use super::template::Template;

/// Where a task instance stands after its last run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    NeverRun,
    Succeeded,
    Failed(Failure),
}

impl RunState {
    fn describe(&self) -> String {
        match self {
            RunState::NeverRun => "never run".to_string(),
            RunState::Succeeded => "success".to_string(),
            RunState::Failed(failure) => failure.to_string(),
        }
    }
}

/// One task instance and its run history
#[derive(Default)]
pub struct TaskSlot {
    task: Option<Box<dyn Task>>,
    times_run: u32,
    state: RunState,
}

impl TaskSlot {
    pub fn times_run(&self) -> u32 {
        self.times_run
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }
}

type Visiting = Rc<RefCell<Vec<String>>>;

/// Marks a task as being walked; released on drop.
pub struct VisitGuard {
    visiting: Visiting,
}

impl VisitGuard {
    /// Fails with [`Error::CircularDependency`] if `name` is already being walked
    pub fn enter(visiting: &Visiting, name: &str) -> Result<Self, Error> {
        let mut stack = visiting.borrow_mut();
        if stack.iter().any(|n| n == name) {
            return Err(Error::CircularDependency(name.to_string()));
        }
        stack.push(name.to_string());
        Ok(Self {
            visiting: Rc::clone(visiting),
        })
    }
}

impl Drop for VisitGuard {
    fn drop(&mut self) {
        self.visiting.borrow_mut().pop();
    }
}

/// Resolves task names to cached instances for one invocation
pub struct TaskRegistry {
    catalog: Rc<TaskCatalog>,
    slots: HashMap<String, TaskSlot>,
    definitions: HashMap<String, Vec<ParamSpec>>,
    visiting: Visiting,
}

impl TaskRegistry {
    pub fn new(catalog: Rc<TaskCatalog>) -> Self {
        Self {
            catalog,
            slots: HashMap::new(),
            definitions: HashMap::new(),
            visiting: Rc::default(),
        }
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Rc<TaskCatalog> {
        Rc::clone(&self.catalog)
    }

    /// The cached instance for `name`, created on first request
    pub fn get_task(&mut self, name: &str) -> Result<&mut TaskSlot, Error> {
        let def = self.catalog.resolve(name)?;
        let slot = self
            .slots
            .entry(def.name().to_string())
            .or_insert_with(|| {
                debug!(task = def.name(), "instantiating task");
                TaskSlot {
                    task: def.instantiate(),
                    ..TaskSlot::default()
                }
            });
        Ok(slot)
    }

    pub fn state(&self, name: &str) -> RunState {
        self.slots
            .get(name)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    pub fn times_run(&self, name: &str) -> u32 {
        self.slots.get(name).map_or(0, |slot| slot.times_run)
    }

    /// Runs a task unless it already succeeded in this invocation
    pub fn smart_run(&mut self, name: &str, params: &mut Params, output: &Output) -> Outcome {
        let catalog = Rc::clone(&self.catalog);
        let def = catalog.resolve(name)?;
        let _guard = VisitGuard::enter(&self.visiting, def.name())?;

        let before = self.get_task(def.name())?.state.clone();
        if before == RunState::Succeeded {
            debug!(task = def.name(), "already completed");
            output.out(format!("skipping: already completed task: {}", def.name()));
            return Ok(());
        }

        let result = self.run_once(def, params, output);
        let after = match &result {
            Ok(()) => RunState::Succeeded,
            Err(Error::Failed(failure)) => RunState::Failed(failure.clone()),
            Err(_) => return result,
        };

        let slot = self.get_task(def.name())?;
        slot.times_run += 1;
        if let RunState::Failed(previous) = &before {
            info!(task = def.name(), times_run = slot.times_run, %previous, "retried task");
            output.out(format!(
                "tried task a {} time: {} was before: {} just now: {}",
                ordinal(slot.times_run),
                def.name(),
                previous,
                after.describe()
            ));
        }
        debug!(task = def.name(), state = ?after, "task finished");
        slot.state = after;
        result
    }

    fn run_once(&mut self, def: &TaskDef, params: &mut Params, output: &Output) -> Outcome {
        let mut task = self.get_task(def.name())?.task.take();
        let mut cx = TaskContext {
            def,
            params,
            registry: self,
            output,
        };
        let result = match task.as_mut() {
            Some(task) => task.run(&mut cx),
            None => cx.default_run(),
        };
        self.get_task(def.name())?.task = task;
        result
    }

    /// Runs each dependee of `name` in declaration order, stopping at the
    /// first failure.
    pub fn run_dependees(&mut self, name: &str, params: &mut Params, output: &Output) -> Outcome {
        let catalog = Rc::clone(&self.catalog);
        let def = catalog.resolve(name)?;
        for dependee in def.dependees() {
            match self.smart_run(dependee, params, output) {
                Ok(()) => {}
                Err(Error::Failed(failure)) => {
                    output.out(format!(
                        "failed to run {} - child status: {}",
                        dependee, failure
                    ));
                    return Err(Error::Failed(failure));
                }
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(())
    }

    /// Own declarations, one required parameter per template variable, then
    /// the definitions of every dependee, transitively. Memoized.
    pub fn parameter_definitions(&mut self, name: &str) -> Result<Vec<ParamSpec>, Error> {
        let catalog = Rc::clone(&self.catalog);
        let def = catalog.resolve(name)?;
        if let Some(defs) = self.definitions.get(def.name()) {
            return Ok(defs.clone());
        }
        let _guard = VisitGuard::enter(&self.visiting, def.name())?;

        let mut defs = def.declarations().definitions().to_vec();
        for template in def.templates() {
            for variable in template.variable_names() {
                defs.push(
                    ParamSpec::named(variable)
                        .desc(format!("for {} *", template.name()))
                        .required(),
                );
            }
        }
        for dependee in def.dependees() {
            defs.extend(self.parameter_definitions(dependee)?);
        }

        self.definitions.insert(def.name().to_string(), defs.clone());
        Ok(defs)
    }
}

/// What a running task sees: the shared option mapping, the registry for
/// reaching other tasks, and the output sink.
pub struct TaskContext<'a> {
    def: &'a TaskDef,
    params: &'a mut Params,
    registry: &'a mut TaskRegistry,
    output: &'a Output,
}

impl TaskContext<'_> {
    pub fn name(&self) -> &str {
        self.def.name()
    }

    pub fn params(&self) -> &Params {
        self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        self.params
    }

    pub fn param(&self, name: &str) -> Result<&Value, Error> {
        self.params.param(name)
    }

    pub fn dry_run(&self) -> bool {
        self.params.dry_run()
    }

    pub fn out(&self, message: impl AsRef<str>) {
        self.output.out(message);
    }

    pub fn output(&self) -> &Output {
        self.output
    }

    pub fn template(&self, name: &str) -> Option<&Template> {
        self.def.templates().iter().find(|t| t.name() == name)
    }

    /// Renders one of this task's templates from the option mapping
    pub fn render(&self, name: &str) -> Result<String, Error> {
        self.template(name)
            .ok_or_else(|| Error::ParameterNotSet(format!("template {}", name)))?
            .interpolate(self.params)
    }

    pub fn run_dependees(&mut self) -> Outcome {
        let def = self.def;
        self.registry.run_dependees(def.name(), self.params, self.output)
    }

    /// Smart-runs another task through the same registry
    pub fn run_task(&mut self, name: &str) -> Outcome {
        self.registry.smart_run(name, self.params, self.output)
    }

    fn default_run(&mut self) -> Outcome {
        if !self.def.dependees().is_empty() {
            return self.run_dependees();
        }
        warn!(task = self.name(), "task has no logic and no dependees");
        self.out(format!("implement me: {}", self.name()));
        fail("not_implemented")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn registry(defs: Vec<TaskDef>) -> TaskRegistry {
        let mut catalog = TaskCatalog::new();
        for def in defs {
            catalog.register(def).unwrap();
        }
        TaskRegistry::new(Rc::new(catalog))
    }

    #[test]
    fn visit_guard_releases_on_drop() {
        let visiting: Visiting = Rc::default();
        {
            let _a = VisitGuard::enter(&visiting, "a").unwrap();
            assert!(matches!(
                VisitGuard::enter(&visiting, "a"),
                Err(Error::CircularDependency(name)) if name == "a"
            ));
        }
        assert!(visiting.borrow().is_empty());
        assert!(VisitGuard::enter(&visiting, "a").is_ok());
    }

    #[test]
    fn unimplemented_leaf_fails() {
        let mut reg = registry(vec![TaskDef::new("lonely")]);
        let output = Output::buffered();
        let mut params = Params::new();
        let err = reg.smart_run("lonely", &mut params, &output).unwrap_err();
        assert_eq!(err.failure().map(Failure::code), Some("not_implemented"));
        assert_eq!(output.lines(), ["implement me: lonely"]);
    }

    #[test]
    fn unknown_dependee_is_a_declaration_fault() {
        let mut reg = registry(vec![TaskDef::new("build").depends_on("ghost")]);
        let err = reg
            .smart_run("build", &mut Params::new(), &Output::buffered())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn success_is_skipped_failure_retried() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let mut reg = registry(vec![TaskDef::new("flaky").runs(move |_| {
            seen.set(seen.get() + 1);
            if seen.get() == 1 {
                fail("disk_full")
            } else {
                Ok(())
            }
        })]);
        let output = Output::buffered();
        let mut params = Params::new();

        assert!(reg.smart_run("flaky", &mut params, &output).is_err());
        assert_eq!(reg.state("flaky"), RunState::Failed(Failure::new("disk_full")));
        assert!(reg.smart_run("flaky", &mut params, &output).is_ok());
        assert!(reg.smart_run("flaky", &mut params, &output).is_ok());

        assert_eq!(calls.get(), 2);
        assert_eq!(reg.times_run("flaky"), 2);
        assert_eq!(
            output.lines(),
            [
                "tried task a 2nd time: flaky was before: disk_full just now: success",
                "skipping: already completed task: flaky",
            ]
        );
    }

    #[test]
    fn task_instance_state_persists() {
        struct Counter(u32);
        impl Task for Counter {
            fn run(&mut self, cx: &mut TaskContext<'_>) -> Outcome {
                self.0 += 1;
                cx.params_mut().insert("count", i64::from(self.0));
                fail("again")
            }
        }
        let mut reg = registry(vec![TaskDef::new("count").with_task(|| Counter(0))]);
        let output = Output::buffered();
        let mut params = Params::new();
        for _ in 0..3 {
            let _ = reg.smart_run("count", &mut params, &output);
        }
        assert_eq!(params.int("count"), Some(3));
        assert_eq!(reg.get_task("count").unwrap().times_run(), 3);
    }

    #[test]
    fn parameter_definitions_are_transitive() {
        let mut reg = registry(vec![
            TaskDef::new("fetch").param(ParamSpec::flag(["--mirror URL"])),
            TaskDef::new("manifest")
                .uses_template(Template::new("manifest", "{{ name }}-{{ version }}"))
                .depends_on("fetch"),
            TaskDef::new("package")
                .param(ParamSpec::flag(["--out DIR"]))
                .depends_on("manifest"),
        ]);
        let defs = reg.parameter_definitions("package").unwrap();
        let names: Vec<_> = defs
            .iter()
            .map(|d| d.name().map(str::to_string).unwrap_or_else(|| d.flags().join(" ")))
            .collect();
        assert_eq!(names, ["--out DIR", "name", "version", "--mirror URL"]);
        assert!(defs[1].required);
        assert_eq!(defs[1].description, ["for manifest *"]);
    }

    #[test]
    fn cycles_in_definitions_are_fatal() {
        let mut reg = registry(vec![
            TaskDef::new("a").depends_on("b"),
            TaskDef::new("b").depends_on("a"),
        ]);
        assert!(matches!(
            reg.parameter_definitions("a"),
            Err(Error::CircularDependency(name)) if name == "a"
        ));
        assert!(reg.visiting.borrow().is_empty());
    }
}
