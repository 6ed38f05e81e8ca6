//! Parameter declaration, merging and parsing

mod parameter;
mod set;
mod spec;
mod syntax;
mod validation;
mod value;

pub use parameter::{ParamKind, ParamType, Parameter};
pub use set::{ParameterSet, PositionalParse};
pub use spec::{Declarations, ParamSpec, Placement};
pub use syntax::{FlagArg, FlagSyntax};
pub use validation::{Callback, Handling, ValidationUnion, Validator};
pub use value::{Params, Value};
