//! Machine-readable description of an application's interface
//!
//! Every command with its description, the tasks it runs (transitively, in
//! dependency order) and its parameters. Empty or default fields are left out
//! of the JSON.

use std::collections::BTreeSet;

use chrono::Local;
use serde::Serialize;

use crate::command::{Command, CommandSpec, Invocation};
use crate::error::{Error, Failure, Outcome};
use crate::output::Output;
use crate::param::{ParamType, Parameter, Value};
use crate::task::DependencyGraph;

use super::App;

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceDoc {
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax_version: Option<String>,
    pub application: ApplicationDoc,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDoc {
    pub program_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub description_lines: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDoc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandDoc {
    pub short_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub description_lines: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterDoc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterDoc {
    pub normalized_name: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// Accepted token and canonical value, sorted by token
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<(String, String)>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub many: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub description_lines: Vec<String>,
}

impl ParameterDoc {
    fn from_parameter(p: &Parameter) -> Self {
        let ty = p.param_type();
        let enumeration = match &ty {
            ParamType::Enum(pairs) => {
                let mut pairs = pairs.clone();
                pairs.sort();
                Some(pairs)
            }
            _ => None,
        };
        Self {
            normalized_name: p.name().to_string(),
            required: p.required(),
            ty: (ty != ParamType::String).then(|| ty.as_str().to_string()),
            enumeration,
            many: p.many(),
            default: p.default_value().cloned(),
            description_lines: p.enhanced_description(),
        }
    }
}

/// Tasks a command runs, dependencies included, dependencies first
fn command_tasks(graph: &DependencyGraph, spec: &CommandSpec) -> Result<Vec<String>, Error> {
    let mut wanted = BTreeSet::new();
    for task in spec.task_names() {
        wanted.extend(graph.transitive_dependencies(task)?);
        wanted.insert(task.clone());
    }
    Ok(graph
        .topological_order()?
        .into_iter()
        .filter(|name| wanted.contains(name))
        .collect())
}

fn command_doc(app: &App, graph: &DependencyGraph, command: &dyn Command) -> Result<CommandDoc, Error> {
    let scratch = Output::buffered();
    let inv = app.prepare(command, &scratch)?;
    let parameters = inv
        .parameter_set()
        .enabled()
        .filter(|p| p.name() != "help")
        .map(ParameterDoc::from_parameter)
        .collect();
    Ok(CommandDoc {
        short_name: command.spec().name().to_string(),
        description_lines: command.spec().description().to_vec(),
        tasks: command_tasks(graph, command.spec())?,
        parameters,
    })
}

/// Builds the interface document of `app`
pub fn describe(app: &App) -> Result<InterfaceDoc, Error> {
    let catalog = app.catalog();
    let graph = DependencyGraph::from_catalog(&catalog)?;
    let commands = app
        .commands()
        .iter()
        .map(|command| command_doc(app, &graph, command.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let version = app.version_string().map(str::to_string);
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    Ok(InterfaceDoc {
        comment: format!(
            "Generated by {} version {} on {}",
            app.name(),
            version.as_deref().unwrap_or("unknown"),
            timestamp
        ),
        syntax_version: version,
        application: ApplicationDoc {
            program_name: app.name().to_string(),
            description_lines: app.description().to_vec(),
            commands,
        },
    })
}

/// `interface`: prints the document of the app it belongs to as JSON
pub struct InterfaceCommand {
    spec: CommandSpec,
}

impl InterfaceCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new("interface")
                .describe("output metadata about the application interface as json."),
        }
    }
}

impl Default for InterfaceCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for InterfaceCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn execute(&self, inv: &mut Invocation<'_>) -> Outcome {
        let Some(app) = inv.app() else {
            inv.err("interface: not running inside an application.");
            return Err(Failure::new("no_application").into());
        };
        let doc = describe(app)?;
        if let Err(err) = inv.output().data(&doc) {
            inv.err(format!("interface: {}", err));
            return Err(Failure::new("serialization_failed").into());
        }
        Ok(())
    }

    fn on_success(&self, _inv: &mut Invocation<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::TaskCommand;
    use crate::param::ParamSpec;
    use crate::task::{TaskCatalog, TaskDef};

    fn sample_app() -> App {
        let catalog = TaskCatalog::new()
            .with(TaskDef::new("fetch").param(ParamSpec::flag(["--mirror URL"]).default("https://example.org")))
            .unwrap()
            .with(
                TaskDef::new("compile")
                    .depends_on("fetch")
                    .param(ParamSpec::flag(["--profile NAME"]).one_of(["release", "debug"])),
            )
            .unwrap();
        App::new("demo", catalog)
            .version("0.3.0")
            .describe("does things")
            .command(TaskCommand::new(CommandSpec::new("build").describe("compiles").task("compile")))
            .command(InterfaceCommand::new())
    }

    #[test]
    fn documents_commands_tasks_and_parameters() {
        let doc = describe(&sample_app()).unwrap();
        assert!(doc.comment.starts_with("Generated by demo version 0.3.0 on "));
        assert_eq!(doc.syntax_version.as_deref(), Some("0.3.0"));
        assert_eq!(doc.application.program_name, "demo");

        let build = &doc.application.commands[0];
        assert_eq!(build.short_name, "build");
        assert_eq!(build.tasks, vec!["fetch", "compile"]);
        let names: Vec<&str> = build.parameters.iter().map(|p| p.normalized_name.as_str()).collect();
        assert_eq!(names, vec!["profile", "mirror"]);

        let profile = &build.parameters[0];
        assert_eq!(profile.ty.as_deref(), Some("enum"));
        assert_eq!(
            profile.enumeration.as_deref(),
            Some(&[("debug".to_string(), "debug".to_string()), ("release".to_string(), "release".to_string())][..])
        );
        let mirror = &build.parameters[1];
        assert_eq!(mirror.default, Some(Value::from("https://example.org")));
    }

    #[test]
    fn json_omits_empty_fields() {
        let doc = describe(&sample_app()).unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        let interface = &json["application"]["commands"][1];
        assert_eq!(interface["short_name"], "interface");
        assert!(interface.get("tasks").is_none());
        assert!(interface.get("parameters").is_none());
        let mirror = &json["application"]["commands"][0]["parameters"][1];
        assert!(mirror.get("required").is_none());
        assert_eq!(mirror["default"], "https://example.org");
    }

    #[test]
    fn interface_command_prints_json() {
        let app = sample_app();
        let out = Output::buffered();
        let status = app.run(&["interface".to_string()], &out).unwrap();
        assert!(status.is_success());
        let json: serde_json::Value = serde_json::from_str(&out.contents()).unwrap();
        assert_eq!(json["application"]["program_name"], "demo");
    }
}
