//! Raw parameter declarations
//!
//! A [`ParamSpec`] is what a command or task author writes. Specs are collected
//! per declaring unit in [`Declarations`] and only turned into [`Parameter`]s
//! (and merged) when a [`ParameterSet`] is built for one invocation.
//!
//! [`Parameter`]: super::Parameter
//! [`ParameterSet`]: super::ParameterSet

use crate::flow::Interrupt;

use super::parameter::ParamType;
use super::validation::{Callback, Validator};
use super::value::{Params, Value};

/// Where a parameter is read from on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// A flag, or a named parameter whose syntax another declaration supplies
    #[default]
    Named,
    Positional,
    /// The sub-command selector of a supercommand
    Selector,
}

/// One raw declaration, built fluently:
///
/// ```
/// use tinyscript::param::ParamSpec;
///
/// let spec = ParamSpec::flag(["-r", "--retries N"])
///     .desc("how many times to try")
///     .integer()
///     .default(3);
/// assert_eq!(spec.name(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParamSpec {
    pub(crate) name: Option<String>,
    pub(crate) flags: Vec<String>,
    pub(crate) placement: Placement,
    pub(crate) glob: bool,
    pub(crate) many: bool,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) description: Vec<String>,
    pub(crate) ty: Option<ParamType>,
    pub(crate) syntax_name: Option<String>,
    pub(crate) validators: Vec<Validator>,
    pub(crate) callback: Option<Callback>,
}

impl ParamSpec {
    /// A flag spelled by the given tokens, e.g. `["-v", "--[no-]verbose"]`
    pub fn flag<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: tokens.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// A parameter known only by name. Shown as `--name VALUE` unless another
    /// declaration of the same name supplies concrete syntax.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            placement: Placement::Positional,
            ..Default::default()
        }
    }

    pub(crate) fn selector(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            placement: Placement::Selector,
            required: true,
            syntax_name: Some("command".to_string()),
            ..Default::default()
        }
    }

    /// Explicit normalized name, overriding the one derived from the long flag
    pub fn name_as(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn desc(mut self, line: impl Into<String>) -> Self {
        self.description.push(line.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn integer(self) -> Self {
        self.typed(ParamType::Integer)
    }

    pub fn float(self) -> Self {
        self.typed(ParamType::Float)
    }

    pub fn file(self) -> Self {
        self.typed(ParamType::File)
    }

    pub fn string(self) -> Self {
        self.typed(ParamType::String)
    }

    /// Closed set of accepted tokens, each its own canonical value
    pub fn one_of<I, S>(self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pairs = tokens
            .into_iter()
            .map(|t| {
                let t = t.into();
                (t.clone(), t)
            })
            .collect();
        self.typed(ParamType::Enum(pairs))
    }

    /// Closed token → canonical value table, e.g. `("dbg", "debug")`
    pub fn enumeration<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.typed(ParamType::Enum(pairs))
    }

    fn typed(mut self, ty: ParamType) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Trailing positional absorbing every remaining argument
    pub fn glob(mut self) -> Self {
        self.glob = true;
        self.many = true;
        self
    }

    /// Repeated occurrences accumulate into a list
    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    /// Name shown between angle brackets for positionals (`<file>`)
    pub fn syntax_name(mut self, name: impl Into<String>) -> Self {
        self.syntax_name = Some(name.into());
        self
    }

    pub fn validate(mut self, check: impl Fn(&Value) -> Option<String> + 'static) -> Self {
        self.validators.push(Validator::new(check));
        self
    }

    /// Adds an existing validator, keeping its identity
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Handle the value with a callback instead of storing it
    pub fn on(
        mut self,
        f: impl Fn(Option<&Value>, &mut Params) -> Option<Interrupt> + 'static,
    ) -> Self {
        self.callback = Some(Callback::new(f));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }
}

/// The ordered parameter declarations of one declaring unit, ancestors first.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    specs: Vec<ParamSpec>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the parent's flattened declarations
    pub fn extending(parent: &Declarations) -> Self {
        parent.clone()
    }

    /// Base declarations of every command: `-h, --help`
    pub fn command_base() -> Self {
        Self::new().with(
            ParamSpec::flag(["-h", "--help"])
                .desc("this screen")
                .on(|_, _| Some(Interrupt::help())),
        )
    }

    pub fn declare(&mut self, spec: ParamSpec) {
        self.specs.push(spec);
    }

    pub fn with(mut self, spec: ParamSpec) -> Self {
        self.declare(spec);
        self
    }

    pub fn definitions(&self) -> &[ParamSpec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
