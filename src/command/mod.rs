//! Commands: parameter sets parsed from argv, then a list of tasks to run

mod flags;
pub mod help;
mod invocation;
mod pipeline;
mod spec;
mod supercommand;
mod task_command;

pub use flags::help_topic;
pub use invocation::Invocation;
pub use pipeline::{invoke, run, run_as, Command, Status};
pub use spec::CommandSpec;
pub use supercommand::{Supercommand, SELECTOR};
pub use task_command::TaskCommand;
