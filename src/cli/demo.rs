//! The `tinyscript` demo application
//!
//! A small release pipeline built from dependency-linked tasks:
//!
//! ```text
//! fetch ─► compile ─┐
//!                   ├─► package
//! manifest ─────────┘
//! ```
//!
//! `compile` and `package` both declare `-r, --retries N`; the merged flag
//! checks both of their validators.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::app::{App, InterfaceCommand};
use crate::command::{CommandSpec, Invocation, Supercommand, TaskCommand};
use crate::error::{fail, Error, Failure, Outcome};
use crate::param::{ParamSpec, Params, Value};
use crate::task::{DependencyGraph, TaskCatalog, TaskContext, TaskDef, Template};

fn retries_in_range(value: &Value) -> Option<String> {
    match value.as_int() {
        Some(1..=5) => None,
        _ => Some("retries must be in range 1..5".to_string()),
    }
}

fn retries_even(value: &Value) -> Option<String> {
    match value.as_int() {
        Some(n) if n % 2 == 0 => None,
        _ => Some("retries must be even".to_string()),
    }
}

fn file_exists(value: &Value) -> Option<String> {
    let path = value.to_string();
    if Path::new(&path).exists() {
        None
    } else {
        Some(format!("file not found: {}", path))
    }
}

fn fetch(cx: &mut TaskContext<'_>) -> Outcome {
    let mirror = cx.param("mirror")?.to_string();
    if cx.params().flag("offline") {
        cx.out(format!("fetch: can't reach {} while offline", mirror));
        return fail("network_error");
    }
    cx.out(format!("fetching sources from {}", mirror));
    Ok(())
}

fn compile(cx: &mut TaskContext<'_>) -> Outcome {
    cx.run_dependees()?;
    let profile = cx.param("profile")?.to_string();
    let retries = cx.param("retries")?.to_string();
    cx.out(format!("compiling {} profile (retries: {})", profile, retries));
    Ok(())
}

fn manifest(cx: &mut TaskContext<'_>) -> Outcome {
    let rendered = cx.render("manifest")?;
    cx.out(format!("manifest: {}", rendered));
    Ok(())
}

fn package(cx: &mut TaskContext<'_>) -> Outcome {
    cx.run_dependees()?;
    let out = cx.param("out")?.to_string();
    let name = cx.param("name")?.to_string();
    let version = cx.param("version")?.to_string();
    let archive = format!("{}/{}-{}.tar", out, name, version);
    let tags: Vec<String> = cx.params().list("tag").iter().map(Value::to_string).collect();
    if !tags.is_empty() {
        cx.out(format!("tags: {}", tags.join(", ")));
    }
    if cx.dry_run() {
        cx.out(format!("would write {}", archive));
    } else {
        cx.out(format!("wrote {}", archive));
    }
    Ok(())
}

/// The demo's task catalog
pub fn catalog() -> Result<TaskCatalog, Error> {
    let catalog = TaskCatalog::new()
        .with(
            TaskDef::new("fetch")
                .describe("download sources")
                .param(
                    ParamSpec::flag(["--mirror URL"])
                        .desc("where sources come from")
                        .default("https://mirror.example.org"),
                )
                .param(ParamSpec::flag(["--offline"]).desc("pretend the network is down"))
                .runs(fetch),
        )?
        .with(
            TaskDef::new("compile")
                .describe("compile sources")
                .depends_on("fetch")
                .param(
                    ParamSpec::flag(["-r", "--retries N"])
                        .desc("attempts per step")
                        .integer()
                        .default(2)
                        .validate(retries_in_range),
                )
                .param(
                    ParamSpec::flag(["--profile NAME"])
                        .desc("build profile")
                        .one_of(["debug", "release"])
                        .default("debug"),
                )
                .runs(compile),
        )?
        .with(
            TaskDef::new("manifest")
                .describe("render the package manifest")
                .uses_template(Template::new("manifest", "{{ name }} {{ version }}"))
                .runs(manifest),
        )?
        .with(
            TaskDef::new("package")
                .describe("bundle everything into an archive")
                .depends_on("compile")
                .depends_on("manifest")
                .param(
                    ParamSpec::flag(["-r", "--retries N"])
                        .integer()
                        .validate(retries_even),
                )
                .param(ParamSpec::flag(["--out DIR"]).desc("output directory").default("dist"))
                .param(ParamSpec::flag(["-t", "--tag TAG"]).desc("archive tag").many())
                .runs(package),
        )?;
    Ok(catalog)
}

fn stage(inv: &mut Invocation<'_>) -> Outcome {
    let dest = inv.param("dest")?.to_string();
    let files: Vec<String> = inv.params().list("files").iter().map(Value::to_string).collect();
    inv.out(format!("staging {} file{} into {}", files.len(), crate::text::plural(files.len()), dest));
    if inv.params().dry_run() {
        return Ok(());
    }
    if let Err(err) = fs::create_dir_all(&dest) {
        inv.err(format!("couldn't create {}: {}", dest, err));
        return Err(Failure::new("copy_failed").into());
    }
    for file in &files {
        let source = Path::new(file);
        let Some(file_name) = source.file_name() else {
            inv.err(format!("not a file: {}", file));
            return Err(Failure::new("copy_failed").into());
        };
        let target = Path::new(&dest).join(file_name);
        debug!(from = %source.display(), to = %target.display(), "staging file");
        if let Err(err) = fs::copy(source, &target) {
            inv.err(format!("couldn't copy {}: {}", file, err));
            return Err(Failure::new("copy_failed").into());
        }
    }
    Ok(())
}

fn list_tasks(inv: &mut Invocation<'_>) -> Outcome {
    let graph = DependencyGraph::from_catalog(&inv.catalog())?;
    for name in graph.topological_order()? {
        let needs = graph.dependencies(&name);
        if needs.is_empty() {
            inv.out(name);
        } else {
            inv.out(format!("{} <- {}", name, needs.join(", ")));
        }
    }
    Ok(())
}

fn dry_run_flag() -> ParamSpec {
    ParamSpec::flag(["-n", "--dry-run"]).desc("show what would happen")
}

/// The demo application, seeded with `config`
pub fn app(config: Params) -> Result<App, Error> {
    let catalog = catalog()?;
    let task_runner = Supercommand::for_tasks(
        CommandSpec::new("task").describe("run any single task, with its dependencies"),
        &catalog,
    );
    let app = App::new("tinyscript", catalog)
        .version(env!("CARGO_PKG_VERSION"))
        .describe("a demo of dependency-linked tasks")
        .config(config)
        .command(TaskCommand::new(
            CommandSpec::new("build").describe("fetch and compile").task("compile"),
        ))
        .command(TaskCommand::new(
            CommandSpec::new("release")
                .describe(
                    "
                    build and package a release.
                    --name and --version feed the manifest template.
                    ",
                )
                .param(dry_run_flag())
                .task("package"),
        ))
        .command(
            TaskCommand::new(
                CommandSpec::new("stage")
                    .describe("copy files into a staging directory")
                    .param(dry_run_flag())
                    .param(ParamSpec::positional("dest").desc("staging directory").required())
                    .param(
                        ParamSpec::positional("files")
                            .desc("files to stage")
                            .required()
                            .glob()
                            .validate(file_exists),
                    ),
            )
            .executes(stage),
        )
        .command(task_runner)
        .command(
            TaskCommand::new(CommandSpec::new("tasks").describe("list tasks and their dependencies"))
                .executes(list_tasks),
        )
        .command(InterfaceCommand::new());
    Ok(app)
}
