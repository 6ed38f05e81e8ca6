//! Help screens, rendered from parameter introspection alone

use crate::param::{ParamKind, Parameter, ParameterSet};

use super::spec::CommandSpec;

/// Width of the summary column of option and argument tables
pub const SUMMARY_WIDTH: usize = 32;
const INDENT: &str = "    ";

/// `description: x` for one line, a titled block for several
pub fn description_lines(description: &[String]) -> Vec<String> {
    match description {
        [] => vec![],
        [only] => vec![format!("description: {}", only)],
        many => std::iter::once("description:".to_string())
            .chain(many.iter().cloned())
            .collect(),
    }
}

/// `program [flags...] <args...>` from every enabled parameter
pub fn generated_usage(program: &str, set: &ParameterSet) -> String {
    let flags = set.flags().map(Parameter::usage_string);
    let args = set
        .positionals()
        .into_iter()
        .map(Parameter::usage_string);
    std::iter::once(program.to_string())
        .chain(flags)
        .chain(args)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn usage_lines(spec: &CommandSpec, set: &ParameterSet, program: &str) -> Vec<String> {
    match spec.usage_lines() {
        [] => vec![format!("usage: {}", generated_usage(program, set))],
        [only] => vec![format!("usage: {}", only)],
        many => std::iter::once("usage:".to_string())
            .chain(many.iter().map(|l| format!("  {}", l)))
            .collect(),
    }
}

/// One table entry: the summary, then description lines in a second column.
/// A summary too wide for its column pushes the description to the next line.
pub fn table_row(summary: &str, description: &[String]) -> Vec<String> {
    let pad = " ".repeat(INDENT.len() + SUMMARY_WIDTH + 1);
    let mut lines = Vec::with_capacity(description.len().max(1));
    let mut rest = description.iter();
    if summary.len() <= SUMMARY_WIDTH {
        match rest.next() {
            Some(first) => lines.push(format!("{}{:<width$} {}", INDENT, summary, first, width = SUMMARY_WIDTH)),
            None => lines.push(format!("{}{}", INDENT, summary)),
        }
    } else {
        lines.push(format!("{}{}", INDENT, summary));
    }
    lines.extend(rest.map(|line| format!("{}{}", pad, line)));
    lines
}

pub fn option_lines(set: &ParameterSet) -> Vec<String> {
    set.flags()
        .flat_map(|p| table_row(&p.syntax().summary(), &p.enhanced_description()))
        .collect()
}

pub fn argument_lines(set: &ParameterSet) -> Vec<String> {
    set.positionals()
        .into_iter()
        .filter(|p| p.kind() != ParamKind::Selector)
        .flat_map(|p| table_row(&p.vernacular(), &p.enhanced_description()))
        .collect()
}

/// First description line, for one-line listings
pub fn desc_oneline(description: &[String]) -> Option<&str> {
    description.first().map(String::as_str)
}

/// The full help screen of a command
pub fn command_help(spec: &CommandSpec, set: &ParameterSet, program: &str) -> Vec<String> {
    let mut lines = description_lines(spec.description());
    lines.extend(usage_lines(spec, set, program));
    let options = option_lines(set);
    if !options.is_empty() {
        lines.push("options:".to_string());
        lines.extend(options);
    }
    let arguments = argument_lines(set);
    if !arguments.is_empty() {
        lines.push("arguments:".to_string());
        lines.extend(arguments);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamSpec;

    fn set() -> ParameterSet {
        ParameterSet::from_definitions(&[
            ParamSpec::flag(["-h", "--help"]).desc("this screen"),
            ParamSpec::flag(["-r", "--retries N"])
                .desc("how many times")
                .integer()
                .default(3),
            ParamSpec::positional("src").required().desc("where from"),
            ParamSpec::positional("dst").default("dist"),
        ])
        .unwrap()
    }

    #[test]
    fn generated_usage_lists_flags_then_args() {
        assert_eq!(
            generated_usage("copy", &set()),
            "copy [-h] [-r N] <src> [<dst>]"
        );
    }

    #[test]
    fn full_help_screen() {
        let spec = CommandSpec::new("copy").describe("copies things");
        let help = command_help(&spec, &set(), "app copy");
        assert_eq!(
            help,
            [
                "description: copies things",
                "usage: app copy [-h] [-r N] <src> [<dst>]",
                "options:",
                "    -h, --help                       this screen",
                "    -r, --retries N                  how many times (integer) (default: 3)",
                "arguments:",
                "    <src>                            where from",
                "    <dst>                            (default: \"dist\")",
            ]
        );
    }

    #[test]
    fn explicit_usage_lines() {
        let spec = CommandSpec::new("x").usage("x one").usage("x two");
        assert_eq!(usage_lines(&spec, &set(), "x"), ["usage:", "  x one", "  x two"]);
    }

    #[test]
    fn wide_summaries_wrap() {
        let rows = table_row(
            "--a-very-long-option-name-indeed VALUE",
            &["first".to_string(), "second".to_string()],
        );
        assert_eq!(rows[0], "    --a-very-long-option-name-indeed VALUE");
        assert_eq!(rows[1].trim(), "first");
        assert_eq!(rows[2].trim(), "second");
        assert_eq!(rows[1].len(), INDENT.len() + SUMMARY_WIDTH + 1 + "first".len());
    }

    #[test]
    fn description_block() {
        assert!(description_lines(&[]).is_empty());
        let lines = description_lines(&["a".to_string(), "b".to_string()]);
        assert_eq!(lines, ["description:", "a", "b"]);
    }
}
