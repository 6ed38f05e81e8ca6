//! Merged, ordered parameters of one invocation and positional parsing

use std::collections::HashMap;

use crate::error::DeclarationError;
use crate::flow::Interrupt;

use super::parameter::{ParamKind, Parameter};
use super::spec::ParamSpec;
use super::value::Params;

/// Insertion-ordered parameters keyed by normalized name.
///
/// The first declaration of a name fixes its position; later declarations of
/// the same name merge into it.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
}

/// What positional parsing found in the residual arguments
#[derive(Debug, Default)]
pub struct PositionalParse {
    /// Every coercion or validation message, in argument order
    pub errors: Vec<String>,
    /// Tokens left over once the positionals ran out
    pub unexpected: Vec<String>,
    /// First interrupt raised by a positional callback
    pub interrupt: Option<Interrupt>,
}

impl PositionalParse {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(specs: &[ParamSpec]) -> Result<Self, DeclarationError> {
        let mut set = Self::new();
        set.merge(specs)?;
        Ok(set)
    }

    /// Adds or merges every spec, then checks the positional structure
    pub fn merge(&mut self, specs: &[ParamSpec]) -> Result<(), DeclarationError> {
        for spec in specs {
            self.insert(Parameter::from_spec(spec.clone())?)?;
        }
        self.check_structure()
    }

    /// Adds a parameter, merging it into an existing one of the same name
    pub fn insert(&mut self, param: Parameter) -> Result<(), DeclarationError> {
        match self.index.get(param.name()) {
            Some(&i) => self.params[i].merge(param),
            None => {
                self.index.insert(param.name().to_string(), self.params.len());
                self.params.push(param);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.index.get(name).map(|&i| &mut self.params[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Every parameter in display order, enabled or not
    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(|p| p.enabled())
    }

    pub fn flags(&self) -> impl Iterator<Item = &Parameter> {
        self.enabled().filter(|p| !p.is_positional())
    }

    pub fn positionals(&self) -> Vec<&Parameter> {
        self.enabled().filter(|p| p.is_positional()).collect()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Fails when positionals are ordered in a way no argument vector could
    /// satisfy, or when two parameters claim the same flag spelling.
    pub fn check_structure(&self) -> Result<(), DeclarationError> {
        let positionals = self.positionals();

        let last_required = positionals.iter().rposition(|p| p.required());
        let first_optional = positionals.iter().position(|p| !p.required());
        if let (Some(required), Some(optional)) = (last_required, first_optional) {
            if required > optional {
                return Err(DeclarationError::RequiredAfterOptional { required, optional });
            }
        }

        for (i, p) in positionals.iter().enumerate() {
            if p.kind() == ParamKind::Glob && i + 1 != positionals.len() {
                return Err(DeclarationError::MisplacedGlob(p.name().to_string()));
            }
        }

        let mut owners: HashMap<String, &str> = HashMap::new();
        for p in self.flags() {
            for spelling in p.syntax().spellings() {
                if let Some(first) = owners.insert(spelling.clone(), p.name()) {
                    return Err(DeclarationError::DuplicateSpelling {
                        spelling,
                        first: first.to_string(),
                        second: p.name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Assigns residual tokens to enabled positionals in order.
    ///
    /// A glob keeps consuming to the end. Every bad token is reported, not just
    /// the first; leftovers become `unexpected`.
    pub fn parse_positionals(&self, residual: &[String], params: &mut Params) -> PositionalParse {
        let mut result = PositionalParse::default();
        let mut tokens = residual.iter();

        for p in self.positionals() {
            let glob = p.kind() == ParamKind::Glob;
            loop {
                let Some(token) = tokens.next() else { break };
                match p.accept(token) {
                    Ok(value) => {
                        if let Some(interrupt) = p.apply(Some(value), params) {
                            result.interrupt.get_or_insert(interrupt);
                        }
                    }
                    Err(message) => result.errors.push(message),
                }
                if !glob {
                    break;
                }
            }
        }

        result.unexpected = tokens.cloned().collect();
        result
    }

    /// Enabled required parameters without a value, in declaration order
    pub fn missing_required(&self, params: &Params) -> Vec<&Parameter> {
        self.enabled()
            .filter(|p| p.required() && !params.contains(p.name()))
            .collect()
    }

    /// Injects defaults for parameters nobody supplied
    pub fn fill_defaults(&self, params: &mut Params) {
        for p in self.enabled() {
            if let Some(default) = p.default_value() {
                if !params.contains(p.name()) {
                    params.insert(p.name(), default.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Value;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_declaration_keeps_position() {
        let set = ParameterSet::from_definitions(&[
            ParamSpec::flag(["--verbose"]),
            ParamSpec::positional("src"),
            ParamSpec::flag(["--verbose"]).desc("louder"),
        ])
        .unwrap();
        let names: Vec<_> = set.parameters().iter().map(Parameter::name).collect();
        assert_eq!(names, ["verbose", "src"]);
        assert_eq!(set.get("verbose").unwrap().description(), ["louder"]);
    }

    #[test]
    fn required_after_optional_is_structural() {
        let err = ParameterSet::from_definitions(&[
            ParamSpec::positional("a"),
            ParamSpec::positional("b").required(),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::RequiredAfterOptional {
                required: 1,
                optional: 0
            }
        );
    }

    #[test]
    fn glob_must_be_last() {
        let err = ParameterSet::from_definitions(&[
            ParamSpec::positional("files").glob(),
            ParamSpec::positional("dest"),
        ])
        .unwrap_err();
        assert_eq!(err, DeclarationError::MisplacedGlob("files".to_string()));

        let err = ParameterSet::from_definitions(&[
            ParamSpec::positional("a").glob(),
            ParamSpec::positional("b").glob(),
        ])
        .unwrap_err();
        assert_eq!(err, DeclarationError::MisplacedGlob("a".to_string()));
    }

    #[test]
    fn duplicate_spellings_rejected() {
        let err = ParameterSet::from_definitions(&[
            ParamSpec::flag(["-v", "--verbose"]),
            ParamSpec::flag(["-v", "--version"]),
        ])
        .unwrap_err();
        assert!(matches!(err, DeclarationError::DuplicateSpelling { spelling, .. } if spelling == "-v"));
    }

    #[test]
    fn disabled_parameters_are_skipped() {
        let mut set = ParameterSet::from_definitions(&[
            ParamSpec::flag(["-v", "--version"]),
            ParamSpec::positional("src").required(),
        ])
        .unwrap();
        set.get_mut("src").unwrap().disable();
        assert!(set.positionals().is_empty());
        assert!(set.missing_required(&Params::new()).is_empty());
        assert_eq!(set.parameters().len(), 2);
    }

    #[test]
    fn positionals_accumulate_errors_and_leftovers() {
        let set = ParameterSet::from_definitions(&[
            ParamSpec::positional("count").required().integer(),
            ParamSpec::positional("level").one_of(["low", "high"]),
        ])
        .unwrap();
        let mut params = Params::new();
        let parse = set.parse_positionals(&args(&["x", "loud", "extra"]), &mut params);
        assert_eq!(parse.errors.len(), 2);
        assert_eq!(parse.unexpected, ["extra"]);
        assert!(params.is_empty());
    }

    #[test]
    fn glob_consumes_rest() {
        let set = ParameterSet::from_definitions(&[
            ParamSpec::positional("dest").required(),
            ParamSpec::positional("files").glob(),
        ])
        .unwrap();
        let mut params = Params::new();
        let parse = set.parse_positionals(&args(&["out", "a", "b", "c"]), &mut params);
        assert!(parse.is_ok());
        assert!(parse.unexpected.is_empty());
        assert_eq!(params.str("dest"), Some("out"));
        assert_eq!(params.list("files").len(), 3);
    }

    #[test]
    fn missing_src_reported_and_dst_defaulted() {
        let set = ParameterSet::from_definitions(&[
            ParamSpec::positional("src").required(),
            ParamSpec::positional("dst").default("dist"),
        ])
        .unwrap();
        let mut params = Params::new();
        let parse = set.parse_positionals(&[], &mut params);
        assert!(parse.is_ok());
        set.fill_defaults(&mut params);
        let missing: Vec<_> = set.missing_required(&params).iter().map(|p| p.vernacular()).collect();
        assert_eq!(missing, ["<src>"]);
        assert_eq!(params.get("dst"), Some(&Value::from("dist")));
    }
}
