//! Task definitions and the catalog they are registered in

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use heck::ToSnakeCase;

use crate::error::{DeclarationError, Outcome};
use crate::param::{Declarations, ParamSpec};
use crate::text::fuzzy_match;

use super::registry::TaskContext;
use super::template::Template;

/// A task's own logic.
///
/// Instances are created once per registry, so state kept in `self` survives
/// between runs of the same invocation.
pub trait Task {
    fn run(&mut self, cx: &mut TaskContext<'_>) -> Outcome;
}

type RunFn = dyn Fn(&mut TaskContext<'_>) -> Outcome;
type TaskFactory = Rc<dyn Fn() -> Box<dyn Task>>;

/// A stateless task backed by a closure
#[derive(Clone)]
pub struct FnTask(Rc<RunFn>);

impl FnTask {
    pub fn new(f: impl Fn(&mut TaskContext<'_>) -> Outcome + 'static) -> Self {
        Self(Rc::new(f))
    }
}

impl Task for FnTask {
    fn run(&mut self, cx: &mut TaskContext<'_>) -> Outcome {
        (self.0)(cx)
    }
}

/// Static description of a task: its name, parameters, dependees and logic
#[derive(Clone)]
pub struct TaskDef {
    name: String,
    description: Vec<String>,
    declarations: Declarations,
    dependees: Vec<String>,
    templates: Vec<Template>,
    factory: Option<TaskFactory>,
}

impl fmt::Debug for TaskDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDef")
            .field("name", &self.name)
            .field("dependees", &self.dependees)
            .field("templates", &self.templates)
            .field("has_logic", &self.factory.is_some())
            .finish_non_exhaustive()
    }
}

impl TaskDef {
    /// `name` is normalized: `"BuildDocs"` and `"build-docs"` are both `build_docs`
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_snake_case(),
            description: Vec::new(),
            declarations: Declarations::new(),
            dependees: Vec::new(),
            templates: Vec::new(),
            factory: None,
        }
    }

    /// Inherits the parent's parameter declarations and logic
    pub fn extends(name: impl AsRef<str>, parent: &TaskDef) -> Self {
        Self {
            declarations: Declarations::extending(&parent.declarations),
            factory: parent.factory.clone(),
            ..Self::new(name)
        }
    }

    pub fn describe(mut self, line: impl Into<String>) -> Self {
        self.description.push(line.into());
        self
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.declarations.declare(spec);
        self
    }

    pub fn depends_on(mut self, name: impl AsRef<str>) -> Self {
        self.dependees.push(name.as_ref().to_snake_case());
        self
    }

    pub fn uses_template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }

    /// Stateless logic
    pub fn runs(mut self, f: impl Fn(&mut TaskContext<'_>) -> Outcome + 'static) -> Self {
        let task = FnTask::new(f);
        self.factory = Some(Rc::new(move || -> Box<dyn Task> { Box::new(task.clone()) }));
        self
    }

    /// Logic with per-invocation state
    pub fn with_task<T, F>(mut self, make: F) -> Self
    where
        T: Task + 'static,
        F: Fn() -> T + 'static,
    {
        self.factory = Some(Rc::new(move || -> Box<dyn Task> { Box::new(make()) }));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn dependees(&self) -> &[String] {
        &self.dependees
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn has_logic(&self) -> bool {
        self.factory.is_some()
    }

    pub(crate) fn instantiate(&self) -> Option<Box<dyn Task>> {
        self.factory.as_ref().map(|make| make())
    }
}

/// Every task an application knows, in registration order
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    tasks: Vec<TaskDef>,
    index: HashMap<String, usize>,
}

impl TaskCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: TaskDef) -> Result<(), DeclarationError> {
        if self.index.contains_key(def.name()) {
            return Err(DeclarationError::DuplicateTask(def.name().to_string()));
        }
        self.index.insert(def.name().to_string(), self.tasks.len());
        self.tasks.push(def);
        Ok(())
    }

    pub fn with(mut self, def: TaskDef) -> Result<Self, DeclarationError> {
        self.register(def)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&TaskDef> {
        self.index
            .get(&name.to_snake_case())
            .map(|&i| &self.tasks[i])
    }

    pub fn resolve(&self, name: &str) -> Result<&TaskDef, DeclarationError> {
        self.get(name)
            .ok_or_else(|| DeclarationError::UnknownTask(name.to_string()))
    }

    /// Exact name, else every task whose name starts with `needle`
    pub fn find(&self, needle: &str) -> Vec<&TaskDef> {
        fuzzy_match(&self.tasks, &needle.to_snake_case(), TaskDef::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDef> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_normalized() {
        let def = TaskDef::new("BuildDocs").depends_on("FetchSources");
        assert_eq!(def.name(), "build_docs");
        assert_eq!(def.dependees(), ["fetch_sources"]);
        assert_eq!(TaskDef::new("build-docs").name(), "build_docs");
        assert_eq!(TaskDef::new("build docs").name(), "build_docs");
    }

    #[test]
    fn catalog_lookups_normalize_names() {
        let catalog = TaskCatalog::new()
            .with(TaskDef::new("build_docs"))
            .unwrap();
        assert!(catalog.get("BuildDocs").is_some());
        assert!(catalog.get("build-docs").is_some());
        assert_eq!(catalog.find("Build").len(), 1);
    }

    #[test]
    fn extends_inherits_declarations_and_logic() {
        let parent = TaskDef::new("compile")
            .param(ParamSpec::flag(["--release"]))
            .runs(|_| Ok(()));
        let child = TaskDef::extends("compile_docs", &parent).param(ParamSpec::flag(["--open"]));
        assert_eq!(child.declarations().definitions().len(), 2);
        assert!(child.has_logic());
        assert!(child.dependees().is_empty());
    }

    #[test]
    fn catalog_rejects_duplicates_and_resolves() {
        let mut catalog = TaskCatalog::new();
        catalog.register(TaskDef::new("fetch")).unwrap();
        catalog.register(TaskDef::new("format")).unwrap();
        assert_eq!(
            catalog.register(TaskDef::new("fetch")),
            Err(DeclarationError::DuplicateTask("fetch".to_string()))
        );
        assert!(catalog.resolve("fetch").is_ok());
        assert_eq!(
            catalog.resolve("nope").unwrap_err(),
            DeclarationError::UnknownTask("nope".to_string())
        );
        assert_eq!(catalog.find("f").len(), 2);
        assert_eq!(catalog.find("fe").len(), 1);
    }
}
