//! A command that dispatches to one of several child commands
//!
//! Its only positional is the sub-command selector. Flags are read from the
//! leading dash-prefixed tokens only; everything after the selector belongs to
//! the child, which runs its own pipeline with a copy of the option mapping.

use std::rc::Rc;

use tracing::debug;

use crate::error::{DeclarationError, Error, Failure, Outcome};
use crate::flow::Flow;
use crate::param::{ParamSpec, Parameter, ParameterSet};
use crate::task::TaskCatalog;
use crate::text::{fuzzy_match, oxford_join};

use super::help;
use super::invocation::Invocation;
use super::pipeline::{invoke, Command, Status};
use super::spec::CommandSpec;
use super::task_command::TaskCommand;

/// Normalized name of the selector parameter
pub const SELECTOR: &str = "_action";

pub struct Supercommand {
    spec: CommandSpec,
    children: Vec<Rc<dyn Command>>,
}

impl Supercommand {
    pub fn new(spec: CommandSpec, children: Vec<Rc<dyn Command>>) -> Self {
        Self { spec, children }
    }

    /// One child per task of the catalog
    pub fn for_tasks(spec: CommandSpec, catalog: &TaskCatalog) -> Self {
        let children = catalog
            .iter()
            .map(|def| Rc::new(TaskCommand::single(def)) as Rc<dyn Command>)
            .collect();
        Self::new(spec, children)
    }

    pub fn children(&self) -> &[Rc<dyn Command>] {
        &self.children
    }

    fn child_names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.spec().name()).collect()
    }

    /// `{a|b|c} [opts] [args]`
    fn expecting(&self) -> String {
        format!("{{{}}} [opts] [args]", self.child_names().join("|"))
    }
}

impl Command for Supercommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn configure(&self, set: &mut ParameterSet) -> Result<(), Error> {
        if set.parameters().iter().any(Parameter::is_positional) {
            return Err(DeclarationError::PositionalWithSubcommands.into());
        }
        if set.contains(SELECTOR) {
            return Err(DeclarationError::SelectorNameTaken(SELECTOR.to_string()).into());
        }
        let selector = ParamSpec::selector(SELECTOR).desc("the sub-command to run");
        set.insert(Parameter::from_spec(selector)?)?;
        Ok(())
    }

    fn parse_flags(&self, inv: &mut Invocation<'_>, argv: &[String]) -> Result<Flow<Vec<String>>, Error> {
        let split = argv
            .iter()
            .position(|arg| !arg.starts_with('-'))
            .unwrap_or(argv.len());
        let (leading, rest) = argv.split_at(split);
        match super::flags::parse_flags(inv, leading)? {
            Flow::Continue(mut residual) => {
                residual.extend(rest.iter().cloned());
                Ok(Flow::Continue(residual))
            }
            interrupt => Ok(interrupt),
        }
    }

    /// Leftover arguments are the child's, not unexpected
    fn complain(&self, inv: &mut Invocation<'_>) -> Outcome {
        inv.complain(false)
    }

    fn execute(&self, inv: &mut Invocation<'_>) -> Outcome {
        let selector = inv.param(SELECTOR)?.to_string();
        let found = fuzzy_match(&self.children, &selector, |c| c.spec().name());
        let child = match found.as_slice() {
            [] => {
                inv.err(format!("invalid sub-command: {:?}", selector));
                inv.err(format!("expecting: {}", self.expecting()));
                return Err(Failure::usage("invalid_subcommand").into());
            }
            [one] => Rc::clone(one),
            many => {
                let names: Vec<&str> = many.iter().map(|c| c.spec().name()).collect();
                inv.err(format!(
                    "{:?} is ambiguous. Did you mean {}?",
                    selector,
                    oxford_join(&names, " or ")
                ));
                return Err(Failure::usage("ambiguous_subcommand").into());
            }
        };

        let mut params = inv.params().clone();
        params.remove(SELECTOR);
        let argv = inv.take_unexpected();
        let program = format!("{} {}", inv.program(), child.spec().name());
        debug!(child = child.spec().name(), args = argv.len(), "dispatching to sub-command");

        let mut child_inv = Invocation::prepare(program, child.as_ref(), inv.catalog(), params, inv.output())?
            .with_app(inv.app());
        match invoke(child.as_ref(), &mut child_inv, &argv)? {
            Status::Failed(failure) => Err(failure.into()),
            Status::Done | Status::Interrupted => Ok(()),
        }
    }

    fn describe(&self, inv: &Invocation<'_>) -> Vec<String> {
        let mut lines = help::description_lines(self.spec.description());
        lines.push(format!("usage: {} [opts] {}", inv.program(), self.expecting()));
        let options = help::option_lines(inv.parameter_set());
        if !options.is_empty() {
            lines.push("options:".to_string());
            lines.extend(options);
        }
        lines.push("sub-commands:".to_string());
        for child in &self.children {
            let desc: Vec<String> = help::desc_oneline(child.spec().description())
                .map(str::to_string)
                .into_iter()
                .collect();
            lines.extend(help::table_row(child.spec().name(), &desc));
        }
        lines
    }

    /// The child reports its own success
    fn on_success(&self, _inv: &mut Invocation<'_>) {}
}
