//! The application: several named commands behind one program name

use std::rc::Rc;

use tracing::{debug, info_span};

use crate::command::{help, help_topic, invoke, Command, CommandSpec, Invocation, Status};
use crate::error::{Error, Failure, Outcome};
use crate::flow::Interrupt;
use crate::output::Output;
use crate::param::{ParamSpec, ParameterSet, Params};
use crate::task::TaskCatalog;
use crate::text::{fuzzy_match, oxford_join};

/// A program dispatching its first argument to one of its commands.
///
/// Commands are tried by exact name first, then by unique prefix. With no
/// command (or a leading flag) the app's own default command runs, which
/// offers `-h, --help [command]` and `-v, --version`.
pub struct App {
    name: String,
    version: Option<String>,
    description: Vec<String>,
    commands: Vec<Rc<dyn Command>>,
    catalog: Rc<TaskCatalog>,
    config: Params,
}

impl App {
    pub fn new(name: impl Into<String>, catalog: TaskCatalog) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: Vec::new(),
            commands: Vec::new(),
            catalog: Rc::new(catalog),
            config: Params::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn describe(mut self, line: impl Into<String>) -> Self {
        self.description.push(line.into());
        self
    }

    pub fn command(mut self, command: impl Command + 'static) -> Self {
        self.commands.push(Rc::new(command));
        self
    }

    /// Values that seed every command's option mapping
    pub fn config(mut self, config: Params) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_string(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn commands(&self) -> &[Rc<dyn Command>] {
        &self.commands
    }

    pub fn catalog(&self) -> Rc<TaskCatalog> {
        Rc::clone(&self.catalog)
    }

    pub fn config_params(&self) -> &Params {
        &self.config
    }

    fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.spec().name()).collect()
    }

    /// Prepares a command of this app with the configured defaults
    pub fn prepare<'a>(&'a self, command: &dyn Command, output: &'a Output) -> Result<Invocation<'a>, Error> {
        let program = format!("{} {}", self.name, command.spec().name());
        let inv = Invocation::prepare(program, command, self.catalog(), self.config.clone(), output)?;
        Ok(inv.with_app(Some(self)))
    }

    /// Runs whichever command `argv` names.
    ///
    /// Input errors are reported to `output` and come back as
    /// `Status::Failed`; declaration faults and cycles are `Err`.
    pub fn run(&self, argv: &[String], output: &Output) -> Result<Status, Error> {
        let _span = info_span!("app", name = %self.name).entered();
        let Some(first) = argv.first().filter(|arg| !arg.starts_with('-')) else {
            let default = AppCommand::new(self);
            let mut inv = Invocation::prepare(
                self.name.clone(),
                &default,
                self.catalog(),
                self.config.clone(),
                output,
            )?
            .with_app(Some(self));
            return invoke(&default, &mut inv, argv);
        };

        let found = fuzzy_match(&self.commands, first, |c| c.spec().name());
        let command = match found.as_slice() {
            [] => {
                output.err(format!("{:?} is not a valid command.", first));
                output.err(format!("please try {} -h for a list of valid commands.", self.name));
                return Ok(Status::Failed(Failure::usage("invalid_command")));
            }
            [one] => Rc::clone(one),
            many => {
                let quoted: Vec<String> = many.iter().map(|c| format!("{:?}", c.spec().name())).collect();
                output.err(format!("{:?} is an ambiguous command.", first));
                output.err(format!("did you mean {}?", oxford_join(&quoted, " or ")));
                return Ok(Status::Failed(Failure::usage("ambiguous_command")));
            }
        };

        if command.spec().name() != first {
            output.out(format!("running command: {}", command.spec().name()));
        }
        debug!(command = command.spec().name(), "dispatching");
        let mut inv = self.prepare(command.as_ref(), output)?;
        invoke(command.as_ref(), &mut inv, &argv[1..])
    }
}

/// What runs when no command is named
struct AppCommand<'a> {
    app: &'a App,
    spec: CommandSpec,
}

impl<'a> AppCommand<'a> {
    fn new(app: &'a App) -> Self {
        let spec = CommandSpec::bare(app.name())
            .param(
                ParamSpec::flag(["-h", "--help [COMMAND]"])
                    .desc("this screen")
                    .on(|value, _| Some(help_topic(value))),
            )
            .param(
                ParamSpec::flag(["-v", "--version"])
                    .desc("show version")
                    .on(|_, _| Some(Interrupt::ShowVersion)),
            );
        Self { app, spec }
    }

    fn app_help(&self, inv: &Invocation<'_>) -> Vec<String> {
        let program = self.app.name();
        let mut lines = help::description_lines(self.app.description());
        lines.push("usage:".to_string());
        lines.push(format!("  {}", help::generated_usage(program, inv.parameter_set())));
        lines.push(format!(
            "  {} {{{}}} [opts] [args]",
            program,
            self.app.command_names().join("|")
        ));
        lines.push("app options:".to_string());
        lines.extend(help::option_lines(inv.parameter_set()));
        lines.push("commands:".to_string());
        for command in self.app.commands() {
            let desc: Vec<String> = help::desc_oneline(command.spec().description())
                .map(str::to_string)
                .into_iter()
                .collect();
            lines.extend(help::table_row(command.spec().name(), &desc));
        }
        lines.push(format!("please try {} <command> -h for command help.", program));
        lines
    }
}

impl Command for AppCommand<'_> {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn configure(&self, set: &mut ParameterSet) -> Result<(), Error> {
        if self.app.version_string().is_none() {
            if let Some(version) = set.get_mut("version") {
                version.disable();
            }
        }
        Ok(())
    }

    fn execute(&self, inv: &mut Invocation<'_>) -> Outcome {
        inv.err("please indicate a command.");
        inv.err(format!("try {} -h for help.", self.app.name()));
        Err(Failure::usage("no_command").into())
    }

    fn handle_interrupt(&self, inv: &mut Invocation<'_>, interrupt: Interrupt) -> Outcome {
        match interrupt {
            Interrupt::ShowVersion => {
                let version = self.app.version_string().unwrap_or_default();
                inv.out(format!("{} {}", self.app.name(), version));
                Ok(())
            }
            Interrupt::ShowHelp { topic: None } => {
                for line in self.describe(inv) {
                    inv.out(line);
                }
                Ok(())
            }
            Interrupt::ShowHelp { topic: Some(command) } => {
                let argv = [command, "-h".to_string()];
                match self.app.run(&argv, inv.output())? {
                    Status::Failed(failure) => Err(failure.into()),
                    Status::Done | Status::Interrupted => Ok(()),
                }
            }
            other => Err(Error::UnhandledInterrupt(other.handler().to_string())),
        }
    }

    fn describe(&self, inv: &Invocation<'_>) -> Vec<String> {
        self.app_help(inv)
    }

    fn on_success(&self, _inv: &mut Invocation<'_>) {}
}
