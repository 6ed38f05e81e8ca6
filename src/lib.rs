//! tinyscript - commands built from dependency-linked tasks
//!
//! A command declares its parameters and the tasks it runs. Each task declares
//! its own parameters and the tasks it depends on. Before parsing, everything a
//! command will (transitively) run is flattened into one parameter set, so
//! `-h` shows every option a task might read and validators declared by
//! different tasks for the same flag are all checked.
//!
//! ```no_run
//! use tinyscript::{App, CommandSpec, Output, ParamSpec, TaskCatalog, TaskCommand, TaskDef};
//!
//! # fn main() -> Result<(), tinyscript::Error> {
//! let catalog = TaskCatalog::new()
//!     .with(TaskDef::new("fetch").param(ParamSpec::flag(["--mirror URL"])).runs(|cx| {
//!         let mirror = cx.param("mirror")?.to_string();
//!         cx.out(format!("fetching from {}", mirror));
//!         Ok(())
//!     }))?;
//! let app = App::new("demo", catalog)
//!     .command(TaskCommand::new(CommandSpec::new("get").task("fetch")));
//! let argv = vec!["get".to_string(), "--mirror".to_string(), "file:///srv".to_string()];
//! app.run(&argv, &Output::stdio())?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod command;
pub mod error;
pub mod exitcode;
pub mod flow;
pub mod output;
pub mod param;
pub mod task;
pub mod text;

pub use app::{App, AppConfig, InterfaceCommand};
pub use command::{Command, CommandSpec, Invocation, Status, Supercommand, TaskCommand};
pub use error::{fail, DeclarationError, Error, Failure, Outcome};
pub use flow::{Flow, Interrupt};
pub use output::Output;
pub use param::{ParamSpec, Params, Value};
pub use task::{Task, TaskCatalog, TaskContext, TaskDef, TaskRegistry, Template};
