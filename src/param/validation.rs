//! Validators, validation unions and flag callbacks

use std::fmt;
use std::rc::Rc;

use crate::flow::Interrupt;
use crate::text::sentence_join;

use super::value::{Params, Value};

type CheckFn = dyn Fn(&Value) -> Option<String>;
type CallbackFn = dyn Fn(Option<&Value>, &mut Params) -> Option<Interrupt>;

/// A check returning an error message for invalid values.
///
/// Clones share identity, so declaring the same validator from two tasks
/// runs it once.
#[derive(Clone)]
pub struct Validator(Rc<CheckFn>);

impl Validator {
    pub fn new(check: impl Fn(&Value) -> Option<String> + 'static) -> Self {
        Self(Rc::new(check))
    }

    pub fn check(&self, value: &Value) -> Option<String> {
        (self.0)(value)
    }

    pub fn same_as(&self, other: &Validator) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({:p})", Rc::as_ptr(&self.0))
    }
}

/// Every distinct validator of a merged parameter, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ValidationUnion {
    list: Vec<Validator>,
}

impl ValidationUnion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validator unless the very same one is already present
    pub fn push(&mut self, validator: Validator) {
        if !self.list.iter().any(|v| v.same_as(&validator)) {
            self.list.push(validator);
        }
    }

    pub fn extend(&mut self, other: ValidationUnion) {
        for validator in other.list {
            self.push(validator);
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Runs every validator and joins all messages into one sentence sequence
    pub fn check(&self, value: &Value) -> Option<String> {
        let messages: Vec<String> = self.list.iter().filter_map(|v| v.check(value)).collect();
        sentence_join(&messages)
    }
}

/// A side-effecting flag handler, invoked instead of storing the value.
#[derive(Clone)]
pub struct Callback(Rc<CallbackFn>);

impl Callback {
    pub fn new(f: impl Fn(Option<&Value>, &mut Params) -> Option<Interrupt> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, value: Option<&Value>, params: &mut Params) -> Option<Interrupt> {
        (self.0)(value, params)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0))
    }
}

/// How a parsed value reaches the option mapping. Exactly one applies.
#[derive(Debug, Clone, Default)]
pub enum Handling {
    #[default]
    Store,
    Validate(ValidationUnion),
    Callback(Callback),
}
