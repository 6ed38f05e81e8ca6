//! Flag lexing
//!
//! Token-level work (long and short forms, `=` values, clustering, `--`,
//! negatable switches, optional values) is delegated to `clap`, driven by a
//! `clap::Command` built from the enabled flags of the parameter set. Values
//! then go through the framework's own coercion, validation and callbacks, in
//! the order they appeared on the command line.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches};
use tracing::debug;

use crate::error::{Error, Failure};
use crate::flow::{Flow, Interrupt};
use crate::param::{FlagArg, ParamKind, Parameter, ParameterSet, Value};

use super::invocation::Invocation;

const RESIDUAL: &str = "\u{0}residual";
const NO_VALUE: &str = "\u{0}none";

fn negated_id(name: &str) -> String {
    format!("{}:negated", name)
}

fn build_lexer(program: &str, set: &ParameterSet) -> clap::Command {
    let mut lexer = clap::Command::new(program.to_string())
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new(RESIDUAL)
                .num_args(1..)
                .action(ArgAction::Append)
                .allow_negative_numbers(true),
        );

    for p in set.flags() {
        let syntax = p.syntax();
        let mut arg = Arg::new(p.name().to_string());
        if let Some(short) = syntax.short {
            arg = arg.short(short);
        }
        if let Some(long) = &syntax.long {
            arg = arg.long(long.clone());
        }
        arg = match &syntax.arg {
            FlagArg::None => arg.action(ArgAction::Count),
            FlagArg::Required(placeholder) => arg
                .action(ArgAction::Append)
                .num_args(1)
                .value_name(placeholder.clone())
                .allow_negative_numbers(true),
            FlagArg::Optional(placeholder) => arg
                .action(ArgAction::Append)
                .num_args(0..=1)
                .default_missing_value(NO_VALUE)
                .value_name(placeholder.clone())
                .allow_negative_numbers(true),
        };
        lexer = lexer.arg(arg);

        if syntax.negatable {
            if let Some(long) = &syntax.long {
                lexer = lexer.arg(
                    Arg::new(negated_id(p.name()))
                        .long(format!("no-{}", long))
                        .action(ArgAction::Count),
                );
            }
        }
    }
    lexer
}

/// One flag occurrence, in command-line order
struct Occurrence<'p> {
    index: usize,
    param: &'p Parameter,
    raw: Option<String>,
    negated: bool,
}

fn switch_occurrences<'p>(
    matches: &ArgMatches,
    id: &str,
    param: &'p Parameter,
    negated: bool,
    into: &mut Vec<Occurrence<'p>>,
) {
    let count = usize::from(matches.get_count(id));
    let indices: Vec<usize> = matches.indices_of(id).map(Iterator::collect).unwrap_or_default();
    for n in 0..count {
        into.push(Occurrence {
            index: indices.get(n).copied().unwrap_or(0),
            param,
            raw: None,
            negated,
        });
    }
}

fn collect_occurrences<'p>(matches: &ArgMatches, set: &'p ParameterSet) -> Vec<Occurrence<'p>> {
    let mut occurrences = Vec::new();
    for p in set.flags() {
        if p.kind() == ParamKind::Switch {
            switch_occurrences(matches, p.name(), p, false, &mut occurrences);
            if p.syntax().negatable {
                switch_occurrences(matches, &negated_id(p.name()), p, true, &mut occurrences);
            }
            continue;
        }
        let Some(values) = matches.get_raw(p.name()) else {
            continue;
        };
        let indices: Vec<usize> = matches
            .indices_of(p.name())
            .map(Iterator::collect)
            .unwrap_or_default();
        for (n, raw) in values.enumerate() {
            occurrences.push(Occurrence {
                index: indices.get(n).copied().unwrap_or(0),
                param: p,
                raw: Some(raw.to_string_lossy().into_owned()),
                negated: false,
            });
        }
    }
    occurrences.sort_by_key(|o| o.index);
    occurrences
}

/// The token the lexer rejected, without clap's value placeholder
fn rejected_token(err: &clap::Error) -> String {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// The user-facing line for a lexer error, in the style of `invalid option: --x`
fn lexer_message(err: &clap::Error, arg: &str) -> String {
    match err.kind() {
        ErrorKind::UnknownArgument => format!("invalid option: {}", arg),
        ErrorKind::InvalidValue | ErrorKind::WrongNumberOfValues | ErrorKind::NoEquals => {
            format!("missing argument: {}", arg)
        }
        _ => err
            .to_string()
            .lines()
            .next()
            .unwrap_or_default()
            .trim_start_matches("error: ")
            .to_string(),
    }
}

fn names_flag(p: &Parameter, token: &str) -> bool {
    let syntax = p.syntax();
    match token.strip_prefix("--") {
        Some(long) => syntax.long.as_deref() == Some(long),
        None => {
            let mut chars = token.chars();
            chars.next() == Some('-')
                && chars.next().is_some_and(|c| syntax.short == Some(c))
                && chars.next().is_none()
        }
    }
}

/// Runs callback flags found before the rejected token, in order, so that
/// `-h --bogus` still shows help. Returns the first interrupt raised.
fn interrupt_before(inv: &mut Invocation<'_>, argv: &[String], rejected: &str) -> Option<Interrupt> {
    let mut tokens = argv
        .iter()
        .take_while(|t| t.as_str() != "--" && (rejected.is_empty() || !t.starts_with(rejected)))
        .peekable();
    while let Some(token) = tokens.next() {
        let (flag, inline) = match token.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (token.as_str(), None),
        };
        let Some(p) = inv.set.flags().find(|p| p.has_callback() && names_flag(p, flag)) else {
            continue;
        };
        let raw = match &p.syntax().arg {
            FlagArg::None => None,
            FlagArg::Optional(_) => inline.or_else(|| {
                tokens
                    .next_if(|next| !next.starts_with('-'))
                    .cloned()
            }),
            FlagArg::Required(_) => match inline.or_else(|| tokens.next().cloned()) {
                Some(raw) => Some(raw),
                None => continue,
            },
        };
        let value = match raw {
            None => Some(Value::Bool(true)),
            Some(raw) => match p.accept(&raw) {
                Ok(value) => Some(value),
                Err(_) => continue,
            },
        };
        if let Some(interrupt) = p.apply(value, &mut inv.params) {
            return Some(interrupt);
        }
    }
    None
}

/// Lexes `argv`, applies every flag value and returns the residual
/// (non-flag) arguments.
///
/// Callbacks run in command-line order and the first interrupt wins.
/// Validation failures are collected and reported together.
pub fn parse_flags(inv: &mut Invocation<'_>, argv: &[String]) -> Result<Flow<Vec<String>>, Error> {
    let lexer = build_lexer(&inv.program, &inv.set);
    let matches = match lexer.try_get_matches_from(argv) {
        Ok(matches) => matches,
        Err(err) => {
            debug!(kind = ?err.kind(), "flag lexing failed");
            let rejected = rejected_token(&err);
            if let Some(interrupt) = interrupt_before(inv, argv, &rejected) {
                debug!(%interrupt, "interrupt raised ahead of a lexer error");
                return Ok(Flow::Interrupt(interrupt));
            }
            inv.err(lexer_message(&err, &rejected));
            inv.err(inv.help_invite());
            return Err(Failure::usage("invalid_option").into());
        }
    };

    let mut failures = Vec::new();
    for occurrence in collect_occurrences(&matches, &inv.set) {
        let p = occurrence.param;
        let value = match occurrence.raw.as_deref() {
            None => Some(Value::Bool(!occurrence.negated)),
            Some(NO_VALUE) => None,
            Some(raw) => match p.accept(raw) {
                Ok(value) => Some(value),
                Err(message) => {
                    failures.push(format!("validation failure for {}: {}", p.vernacular(), message));
                    continue;
                }
            },
        };
        if let Some(interrupt) = p.apply(value, &mut inv.params) {
            debug!(%interrupt, flag = p.name(), "flag raised interrupt");
            return Ok(Flow::Interrupt(interrupt));
        }
    }

    if !failures.is_empty() {
        for failure in &failures {
            inv.err(failure);
        }
        inv.err(inv.help_invite());
        return Err(Failure::usage("validation_failure").into());
    }

    let residual = matches
        .get_raw(RESIDUAL)
        .map(|values| values.map(|v| v.to_string_lossy().into_owned()).collect())
        .unwrap_or_default();
    Ok(Flow::Continue(residual))
}

/// Interrupt raised by a help flag given an optional topic
pub fn help_topic(value: Option<&Value>) -> Interrupt {
    Interrupt::ShowHelp {
        topic: value.map(Value::to_string),
    }
}
