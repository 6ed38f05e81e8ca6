//! The command pipeline
//!
//! `parse_flags → parse_positionals → fill_defaults → complain → execute`,
//! short-circuiting on the first failure. A flag callback may interrupt the
//! pipeline before positional parsing; the interrupt goes to
//! [`Command::handle_interrupt`] instead.

use std::rc::Rc;

use tracing::{debug, info_span};

use crate::error::{Error, Failure, Outcome};
use crate::flow::{Flow, Interrupt};
use crate::exitcode;
use crate::output::Output;
use crate::param::{ParameterSet, Params};
use crate::task::TaskCatalog;

use super::flags;
use super::help;
use super::invocation::Invocation;
use super::spec::CommandSpec;

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Done,
    /// An interrupt (help, version) was handled instead of executing
    Interrupted,
    /// Already reported by whoever failed
    Failed(Failure),
}

impl Status {
    pub fn is_success(&self) -> bool {
        !matches!(self, Status::Failed(_))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Status::Failed(failure) => failure.exit_code(),
            _ => exitcode::OK,
        }
    }
}

/// Pipeline steps with default behavior. Implementors provide [`spec`] and
/// override whichever steps they need.
///
/// [`spec`]: Command::spec
pub trait Command {
    fn spec(&self) -> &CommandSpec;

    /// Adjusts the merged parameter set before parsing
    fn configure(&self, _set: &mut ParameterSet) -> Result<(), Error> {
        Ok(())
    }

    fn parse_flags(&self, inv: &mut Invocation<'_>, argv: &[String]) -> Result<Flow<Vec<String>>, Error> {
        flags::parse_flags(inv, argv)
    }

    fn parse_positionals(&self, inv: &mut Invocation<'_>, residual: &[String]) -> Result<Flow<()>, Error> {
        let parse = inv.parse_positionals(residual);
        if let Some(interrupt) = parse.interrupt {
            return Ok(Flow::Interrupt(interrupt));
        }
        if !parse.is_ok() {
            for message in &parse.errors {
                inv.err(message);
            }
            inv.err(inv.help_invite());
            return Err(Failure::usage("invalid_arguments").into());
        }
        Ok(Flow::Continue(()))
    }

    fn complain(&self, inv: &mut Invocation<'_>) -> Outcome {
        inv.complain(true)
    }

    fn execute(&self, inv: &mut Invocation<'_>) -> Outcome {
        inv.run_tasks()
    }

    fn handle_interrupt(&self, inv: &mut Invocation<'_>, interrupt: Interrupt) -> Outcome {
        match interrupt {
            Interrupt::ShowHelp { .. } => {
                for line in self.describe(inv) {
                    inv.out(line);
                }
                Ok(())
            }
            other => Err(Error::UnhandledInterrupt(other.handler().to_string())),
        }
    }

    /// The help screen
    fn describe(&self, inv: &Invocation<'_>) -> Vec<String> {
        help::command_help(self.spec(), inv.parameter_set(), inv.program())
    }

    fn on_success(&self, inv: &mut Invocation<'_>) {
        inv.out("done.");
    }
}

fn pipeline(command: &dyn Command, inv: &mut Invocation<'_>, argv: &[String]) -> Result<Option<Interrupt>, Error> {
    let residual = match command.parse_flags(inv, argv)? {
        Flow::Continue(residual) => residual,
        Flow::Interrupt(interrupt) => return Ok(Some(interrupt)),
    };
    if let Flow::Interrupt(interrupt) = command.parse_positionals(inv, &residual)? {
        return Ok(Some(interrupt));
    }
    inv.fill_defaults();
    command.complain(inv)?;
    command.execute(inv)?;
    Ok(None)
}

fn settle(outcome: Outcome, status: Status) -> Result<Status, Error> {
    match outcome {
        Ok(()) => Ok(status),
        Err(Error::Failed(failure)) => Ok(Status::Failed(failure)),
        Err(fatal) => Err(fatal),
    }
}

/// Runs the pipeline of a prepared invocation
pub fn invoke(command: &dyn Command, inv: &mut Invocation<'_>, argv: &[String]) -> Result<Status, Error> {
    let _span = info_span!("command", name = %inv.program()).entered();
    match pipeline(command, inv, argv) {
        Ok(None) => {
            command.on_success(inv);
            Ok(Status::Done)
        }
        Ok(Some(interrupt)) => {
            debug!(%interrupt, "handling interrupt");
            let handled = command.handle_interrupt(inv, interrupt);
            settle(handled, Status::Interrupted)
        }
        Err(err) => {
            if let Error::Failed(failure) = &err {
                debug!(%failure, "command failed");
            }
            settle(Err(err), Status::Done)
        }
    }
}

/// Prepares and runs a command under its own name
pub fn run(
    command: &dyn Command,
    catalog: Rc<TaskCatalog>,
    params: Params,
    argv: &[String],
    output: &Output,
) -> Result<Status, Error> {
    let program = command.spec().name().to_string();
    run_as(&program, command, catalog, params, argv, output)
}

/// Prepares and runs a command, naming it `program` in messages
pub fn run_as(
    program: &str,
    command: &dyn Command,
    catalog: Rc<TaskCatalog>,
    params: Params,
    argv: &[String],
    output: &Output,
) -> Result<Status, Error> {
    let mut inv = Invocation::prepare(program, command, catalog, params, output)?;
    invoke(command, &mut inv, argv)
}
