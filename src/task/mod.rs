//! Dependency-aware tasks

mod def;
mod graph;
mod registry;
mod template;

pub use def::{FnTask, Task, TaskCatalog, TaskDef};
pub use graph::{DependencyGraph, GraphError};
pub use registry::{RunState, TaskContext, TaskRegistry, TaskSlot, VisitGuard};
pub use template::Template;
