//! A single declared input and the rules for merging two declarations of it

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::DeclarationError;
use crate::flow::Interrupt;
use crate::text::justified_append;

use super::spec::{ParamSpec, Placement};
use super::syntax::FlagSyntax;
use super::validation::{Handling, ValidationUnion};
use super::value::{Params, Value};

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid integer pattern"));
static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(?:\.\d+)?$").expect("valid float pattern"));

/// Drives display hints and coercion of raw tokens
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Float,
    File,
    /// accepted token → canonical value, in declaration order
    Enum(Vec<(String, String)>),
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Float => "float",
            ParamType::File => "file",
            ParamType::Enum(_) => "enum",
        }
    }

    /// Sorted accepted tokens as `{a|b|c}`
    pub fn enum_display(&self) -> Option<String> {
        match self {
            ParamType::Enum(pairs) => {
                let mut keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
                keys.sort_unstable();
                Some(format!("{{{}}}", keys.join("|")))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Flag taking a value
    Flag,
    /// Boolean flag
    Switch,
    Positional,
    Glob,
    Selector,
}

impl ParamKind {
    pub fn is_positional(self) -> bool {
        matches!(self, ParamKind::Positional | ParamKind::Glob | ParamKind::Selector)
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    flags: Vec<String>,
    syntax: Option<FlagSyntax>,
    placement: Placement,
    glob: bool,
    many: bool,
    required: bool,
    default: Option<Value>,
    enabled: bool,
    description: Vec<String>,
    ty: Option<ParamType>,
    syntax_name: Option<String>,
    handling: Handling,
}

impl Parameter {
    pub fn from_spec(spec: ParamSpec) -> Result<Self, DeclarationError> {
        let syntax = if spec.flags.is_empty() {
            None
        } else {
            let syntax = FlagSyntax::parse(&spec.flags).map_err(|token| {
                DeclarationError::BadFlagSyntax {
                    name: spec.name.clone().unwrap_or_else(|| spec.flags.join(", ")),
                    token,
                }
            })?;
            Some(syntax)
        };

        let name = spec
            .name
            .clone()
            .or_else(|| syntax.as_ref().and_then(FlagSyntax::normalized_name))
            .ok_or_else(|| DeclarationError::NoName(spec.flags.clone()))?;

        if spec.glob && spec.placement != Placement::Positional {
            return Err(DeclarationError::GlobNotPositional(name));
        }

        let handling = match (spec.callback, spec.validators.is_empty()) {
            (Some(_), false) => return Err(DeclarationError::CallbackWithValidator(name)),
            (Some(cb), true) => Handling::Callback(cb),
            (None, false) => {
                let mut union = ValidationUnion::new();
                for validator in spec.validators {
                    union.push(validator);
                }
                Handling::Validate(union)
            }
            (None, true) => Handling::Store,
        };

        Ok(Self {
            name,
            flags: spec.flags,
            syntax,
            placement: spec.placement,
            glob: spec.glob,
            many: spec.many || spec.glob,
            required: spec.required,
            default: spec.default,
            enabled: true,
            description: spec.description,
            ty: spec.ty,
            syntax_name: spec.syntax_name,
            handling,
        })
    }

    /// Folds a second declaration of the same parameter into this one.
    ///
    /// Concrete syntax and type are adopted from whichever side has them and
    /// must agree when both do. `required` and `many` are unions, description
    /// lines concatenate without exact repeats, validators join into one union.
    pub fn merge(&mut self, incoming: Parameter) -> Result<(), DeclarationError> {
        if self.name != incoming.name {
            return Err(DeclarationError::NameMismatch {
                existing: self.name.clone(),
                incoming: incoming.name,
            });
        }

        if self.placement != incoming.placement {
            match (self.placement, incoming.placement) {
                (Placement::Named, other) if self.flags.is_empty() => self.placement = other,
                (_, Placement::Named) if incoming.flags.is_empty() => {}
                (mine, theirs) => {
                    return Err(self.conflict(
                        format!("{:?}", mine).to_lowercase(),
                        format!("{:?}", theirs).to_lowercase(),
                    ));
                }
            }
        }
        self.glob |= incoming.glob;

        match (self.flags.is_empty(), incoming.flags.is_empty()) {
            (false, false) if self.flags != incoming.flags => {
                return Err(self.conflict(self.flags.join(" "), incoming.flags.join(" ")));
            }
            (true, false) => {
                self.flags = incoming.flags;
                self.syntax = incoming.syntax;
            }
            _ => {}
        }

        if let Some(theirs) = incoming.ty {
            match &self.ty {
                Some(mine) if *mine != theirs => {
                    return Err(self.conflict(mine.to_string(), theirs.to_string()));
                }
                Some(_) => {}
                None => self.ty = Some(theirs),
            }
        }

        self.required |= incoming.required;
        self.many |= incoming.many;

        self.description.extend(incoming.description);
        let mut seen = HashSet::new();
        self.description.retain(|line| seen.insert(line.clone()));

        let mine = std::mem::take(&mut self.handling);
        self.handling = match (mine, incoming.handling) {
            (Handling::Callback(_), Handling::Validate(_))
            | (Handling::Validate(_), Handling::Callback(_)) => {
                return Err(DeclarationError::CallbackWithValidator(self.name.clone()));
            }
            (Handling::Validate(mut union), Handling::Validate(other)) => {
                union.extend(other);
                Handling::Validate(union)
            }
            (Handling::Store, theirs) => theirs,
            (mine, _) => mine,
        };

        if self.default.is_none() {
            self.default = incoming.default;
        }
        if self.syntax_name.is_none() {
            self.syntax_name = incoming.syntax_name;
        }
        Ok(())
    }

    fn conflict(&self, first: String, second: String) -> DeclarationError {
        DeclarationError::ConflictingSyntax {
            name: self.name.clone(),
            first,
            second,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        match self.placement {
            Placement::Selector => ParamKind::Selector,
            Placement::Positional if self.glob => ParamKind::Glob,
            Placement::Positional => ParamKind::Positional,
            Placement::Named if self.syntax().takes_value() => ParamKind::Flag,
            Placement::Named => ParamKind::Switch,
        }
    }

    pub fn is_positional(&self) -> bool {
        self.kind().is_positional()
    }

    /// Concrete flag syntax, or the implicit `--name VALUE`
    pub fn syntax(&self) -> FlagSyntax {
        self.syntax
            .clone()
            .unwrap_or_else(|| FlagSyntax::implicit(&self.name))
    }

    pub fn flag_tokens(&self) -> &[String] {
        &self.flags
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn many(&self) -> bool {
        self.many
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn param_type(&self) -> ParamType {
        self.ty.clone().unwrap_or_default()
    }

    pub fn handling(&self) -> &Handling {
        &self.handling
    }

    pub fn has_callback(&self) -> bool {
        matches!(self.handling, Handling::Callback(_))
    }

    /// Display name of a positional, dashes instead of underscores
    pub fn syntax_name(&self) -> String {
        self.syntax_name
            .clone()
            .unwrap_or_else(|| self.name.replace('_', "-"))
    }

    /// How messages refer to this parameter: `<src>` or `--retries`
    pub fn vernacular(&self) -> String {
        if self.is_positional() {
            format!("<{}>", self.syntax_name())
        } else {
            self.syntax().primary()
        }
    }

    /// Usage fragment, bracketed when optional: `<src>`, `[<dst>]`, `[-r N]`
    pub fn usage_string(&self) -> String {
        let body = match self.kind() {
            ParamKind::Glob => {
                format!("<{0}> [<{0}> [...]]", self.syntax_name())
            }
            ParamKind::Positional | ParamKind::Selector => format!("<{}>", self.syntax_name()),
            ParamKind::Flag | ParamKind::Switch => self.syntax().usage(),
        };
        if self.required {
            body
        } else {
            format!("[{}]", body)
        }
    }

    /// Description lines followed by type and default hints
    pub fn enhanced_description(&self) -> Vec<String> {
        let mut lines = self.description.clone();
        let ty = self.param_type();
        match &ty {
            ParamType::String => {}
            ParamType::Enum(_) => {
                if let Some(set) = ty.enum_display() {
                    justified_append(&mut lines, &set);
                }
            }
            other => justified_append(&mut lines, &format!("({})", other)),
        }
        if let Some(default) = &self.default {
            justified_append(&mut lines, &format!("(default: {})", default.inspect()));
        }
        lines
    }

    /// Converts a raw token per the parameter's type. Enum tokens become their
    /// canonical value.
    pub fn coerce(&self, raw: &str) -> Result<Value, String> {
        match self.param_type() {
            ParamType::String | ParamType::File => Ok(Value::from(raw)),
            ParamType::Integer => match raw.parse::<i64>() {
                Ok(n) if INTEGER.is_match(raw) => Ok(Value::Int(n)),
                _ => Err(format!("{} must be an integer, not {:?}", self.vernacular(), raw)),
            },
            ParamType::Float => match raw.parse::<f64>() {
                Ok(x) if FLOAT.is_match(raw) => Ok(Value::Float(x)),
                _ => Err(format!("{} must be a float, not {:?}", self.vernacular(), raw)),
            },
            ParamType::Enum(pairs) => pairs
                .iter()
                .find(|(token, _)| token == raw)
                .map(|(_, canonical)| Value::from(canonical.as_str()))
                .ok_or_else(|| {
                    let set = self.param_type().enum_display().unwrap_or_default();
                    format!("{} must be {}, not {:?}", self.vernacular(), set, raw)
                }),
        }
    }

    /// Runs the validation union, if any
    pub fn check(&self, value: &Value) -> Option<String> {
        match &self.handling {
            Handling::Validate(union) => union.check(value),
            _ => None,
        }
    }

    /// Coerces then validates a raw token
    pub fn accept(&self, raw: &str) -> Result<Value, String> {
        let value = self.coerce(raw)?;
        match self.check(&value) {
            Some(message) => Err(message),
            None => Ok(value),
        }
    }

    /// Hands an accepted value to the option mapping, or to the callback.
    ///
    /// A store-handled flag given without a value records `true`.
    pub fn apply(&self, value: Option<Value>, params: &mut Params) -> Option<Interrupt> {
        if let Handling::Callback(callback) = &self.handling {
            return callback.call(value.as_ref(), params);
        }
        let value = value.unwrap_or(Value::Bool(true));
        if self.many {
            params.push(&self.name, value);
        } else {
            params.insert(self.name.clone(), value);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Validator;

    fn build(spec: ParamSpec) -> Parameter {
        Parameter::from_spec(spec).unwrap()
    }

    #[test]
    fn name_derived_from_long_flag() {
        let p = build(ParamSpec::flag(["-o", "--[no-]output-dir"]));
        assert_eq!(p.name(), "output_dir");
        assert_eq!(p.kind(), ParamKind::Switch);
        assert_eq!(p.vernacular(), "--output-dir");

        let err = Parameter::from_spec(ParamSpec::flag(["-o"])).unwrap_err();
        assert_eq!(err, DeclarationError::NoName(vec!["-o".to_string()]));
    }

    #[test]
    fn named_parameter_gets_implicit_syntax() {
        let p = build(ParamSpec::named("profile"));
        assert_eq!(p.kind(), ParamKind::Flag);
        assert_eq!(p.syntax().summary(), "--profile VALUE");
    }

    #[test]
    fn rejects_callback_with_validator_and_loose_globs() {
        let spec = ParamSpec::flag(["--x N"]).validate(|_| None).on(|_, _| None);
        assert!(matches!(
            Parameter::from_spec(spec),
            Err(DeclarationError::CallbackWithValidator(_))
        ));
        assert!(matches!(
            Parameter::from_spec(ParamSpec::flag(["--files F"]).glob()),
            Err(DeclarationError::GlobNotPositional(_))
        ));
    }

    #[test]
    fn merge_unions_and_adopts() {
        let mut p = build(ParamSpec::named("retries").desc("how many times"));
        p.merge(build(
            ParamSpec::flag(["-r", "--retries N"])
                .required()
                .integer()
                .desc("how many times")
                .desc("per host")
                .default(2),
        ))
        .unwrap();
        assert!(p.required());
        assert_eq!(p.flag_tokens(), ["-r", "--retries N"]);
        assert_eq!(p.param_type(), ParamType::Integer);
        assert_eq!(p.description(), ["how many times", "per host"]);
        assert_eq!(p.default_value(), Some(&Value::Int(2)));
    }

    #[test]
    fn merge_drops_repeats_within_one_declaration() {
        let mut p = build(ParamSpec::named("x").desc("a").desc("a"));
        p.merge(build(ParamSpec::named("x").desc("b").desc("a")))
            .unwrap();
        assert_eq!(p.description(), ["a", "b"]);
    }

    #[test]
    fn merge_rejects_conflicting_syntax() {
        let mut p = build(ParamSpec::flag(["--retries N"]));
        let err = p.merge(build(ParamSpec::flag(["-r", "--retries N"]))).unwrap_err();
        assert!(matches!(err, DeclarationError::ConflictingSyntax { .. }));

        let mut p = build(ParamSpec::named("level").integer());
        assert!(p.merge(build(ParamSpec::named("level").float())).is_err());

        let mut p = build(ParamSpec::positional("src"));
        assert!(p.merge(build(ParamSpec::flag(["--src S"]))).is_err());

        let mut p = build(ParamSpec::positional("src"));
        p.merge(build(ParamSpec::named("src").required())).unwrap();
        assert_eq!(p.kind(), ParamKind::Positional);
        assert!(p.required());
    }

    #[test]
    fn merge_requires_same_name() {
        let mut p = build(ParamSpec::named("a"));
        assert!(matches!(
            p.merge(build(ParamSpec::named("b"))),
            Err(DeclarationError::NameMismatch { .. })
        ));
    }

    #[test]
    fn merge_combines_validators() {
        let shared = Validator::new(|v| (v.as_int() != Some(2)).then(|| "must be two".to_string()));
        let mut p = build(ParamSpec::named("n").integer().validator(shared.clone()));
        p.merge(build(ParamSpec::named("n").validator(shared))).unwrap();
        p.merge(build(
            ParamSpec::named("n").validate(|v| (v.as_int() != Some(3)).then(|| "must be three".to_string())),
        ))
        .unwrap();
        assert_eq!(
            p.accept("4").unwrap_err(),
            "must be two.  Must be three"
        );

        let mut p = build(ParamSpec::named("n").validate(|_| None));
        assert!(p.merge(build(ParamSpec::named("n").on(|_, _| None))).is_err());
    }

    #[test]
    fn coerces_by_type() {
        let p = build(ParamSpec::positional("count").integer());
        assert_eq!(p.coerce("-12"), Ok(Value::Int(-12)));
        assert_eq!(
            p.coerce("twelve").unwrap_err(),
            "<count> must be an integer, not \"twelve\""
        );

        let p = build(ParamSpec::flag(["--ratio R"]).float());
        assert_eq!(p.coerce("0.5"), Ok(Value::Float(0.5)));
        assert!(p.coerce("1e3").is_err());

        let p = build(ParamSpec::flag(["--level L"]).enumeration([("dbg", "debug"), ("info", "info")]));
        assert_eq!(p.coerce("dbg"), Ok(Value::from("debug")));
        assert_eq!(
            p.coerce("loud").unwrap_err(),
            "--level must be {dbg|info}, not \"loud\""
        );
    }

    #[test]
    fn usage_strings() {
        assert_eq!(build(ParamSpec::positional("src").required()).usage_string(), "<src>");
        assert_eq!(build(ParamSpec::positional("dst")).usage_string(), "[<dst>]");
        assert_eq!(
            build(ParamSpec::positional("files").glob().required()).usage_string(),
            "<files> [<files> [...]]"
        );
        assert_eq!(build(ParamSpec::flag(["-r", "--retries N"])).usage_string(), "[-r N]");
        assert_eq!(
            build(ParamSpec::flag(["--out DIR"]).required()).usage_string(),
            "--out DIR"
        );
    }

    #[test]
    fn enhanced_description_hints() {
        let p = build(
            ParamSpec::flag(["--retries N"])
                .desc("how many times")
                .integer()
                .default(3),
        );
        assert_eq!(p.enhanced_description(), ["how many times (integer) (default: 3)"]);

        let p = build(ParamSpec::named("mode").one_of(["slow", "fast"]));
        assert_eq!(p.enhanced_description(), ["{fast|slow}"]);
    }

    #[test]
    fn apply_stores_accumulates_or_calls_back() {
        let mut params = Params::new();
        build(ParamSpec::flag(["--verbose"])).apply(None, &mut params);
        assert!(params.flag("verbose"));

        let tags = build(ParamSpec::flag(["--tag T"]).many());
        tags.apply(Some(Value::from("a")), &mut params);
        tags.apply(Some(Value::from("b")), &mut params);
        assert_eq!(params.list("tag").len(), 2);

        let help = build(ParamSpec::flag(["--help"]).on(|_, _| Some(Interrupt::help())));
        assert_eq!(help.apply(None, &mut params), Some(Interrupt::help()));
        assert!(!params.contains("help"));
    }
}
