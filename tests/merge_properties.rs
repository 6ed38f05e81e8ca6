//! Property tests for merging parameter declarations

use std::collections::BTreeSet;

use proptest::prelude::*;
use tinyscript::param::{ParamType, Parameter};
use tinyscript::ParamSpec;

/// A named declaration of `target`; description lines may repeat within it
fn declaration() -> impl Strategy<Value = ParamSpec> {
    (
        any::<bool>(),
        any::<bool>(),
        prop::collection::vec("[a-c]{1,2}", 0..5),
        prop::option::of(0i64..10),
    )
        .prop_map(|(required, many, lines, default)| {
            let mut spec = ParamSpec::named("target");
            if required {
                spec = spec.required();
            }
            if many {
                spec = spec.many();
            }
            for line in lines {
                spec = spec.desc(line);
            }
            if let Some(default) = default {
                spec = spec.default(default);
            }
            spec
        })
}

fn merged(specs: &[ParamSpec]) -> Parameter {
    let mut iter = specs.iter().cloned();
    let mut param = Parameter::from_spec(iter.next().unwrap()).unwrap();
    for spec in iter {
        param.merge(Parameter::from_spec(spec).unwrap()).unwrap();
    }
    param
}

fn description_set(p: &Parameter) -> BTreeSet<String> {
    p.description().iter().cloned().collect()
}

proptest! {
    #[test]
    fn required_and_many_are_unions(a in declaration(), b in declaration()) {
        let pa = Parameter::from_spec(a.clone()).unwrap();
        let pb = Parameter::from_spec(b.clone()).unwrap();
        let ab = merged(&[a, b]);
        prop_assert_eq!(ab.required(), pa.required() || pb.required());
        prop_assert_eq!(ab.many(), pa.many() || pb.many());
    }

    #[test]
    fn description_lines_never_repeat(a in declaration(), b in declaration()) {
        let pa = Parameter::from_spec(a.clone()).unwrap();
        let pb = Parameter::from_spec(b.clone()).unwrap();
        let ab = merged(&[a, b]);

        let lines = ab.description();
        let unique: BTreeSet<&String> = lines.iter().collect();
        prop_assert_eq!(unique.len(), lines.len());

        let expected: BTreeSet<String> = description_set(&pa).union(&description_set(&pb)).cloned().collect();
        prop_assert_eq!(description_set(&ab), expected);
    }

    #[test]
    fn merge_commutes_on_unions(a in declaration(), b in declaration()) {
        let ab = merged(&[a.clone(), b.clone()]);
        let ba = merged(&[b, a]);
        prop_assert_eq!(ab.required(), ba.required());
        prop_assert_eq!(ab.many(), ba.many());
        prop_assert_eq!(description_set(&ab), description_set(&ba));
    }

    #[test]
    fn merge_associates(a in declaration(), b in declaration(), c in declaration()) {
        let left = merged(&[a.clone(), b.clone(), c.clone()]);

        let mut right = Parameter::from_spec(a).unwrap();
        let mut bc = Parameter::from_spec(b).unwrap();
        bc.merge(Parameter::from_spec(c).unwrap()).unwrap();
        right.merge(bc).unwrap();

        prop_assert_eq!(left.required(), right.required());
        prop_assert_eq!(left.many(), right.many());
        prop_assert_eq!(left.description(), right.description());
        prop_assert_eq!(left.default_value(), right.default_value());
    }

    #[test]
    fn first_default_wins(a in declaration(), b in declaration()) {
        let pa = Parameter::from_spec(a.clone()).unwrap();
        let pb = Parameter::from_spec(b.clone()).unwrap();
        let ab = merged(&[a, b]);
        let expected = pa.default_value().or(pb.default_value());
        prop_assert_eq!(ab.default_value(), expected);
    }

    #[test]
    fn concrete_syntax_is_adopted(a in declaration(), short in "[a-z]", long in "[a-z]{3,8}") {
        let flagged = ParamSpec::flag([format!("-{}", short), format!("--{} VALUE", long)]).name_as("target");
        let p = merged(&[a, flagged]);
        prop_assert_eq!(p.syntax().primary(), format!("--{}", long));
        prop_assert_eq!(p.syntax().short, short.chars().next());
    }

    #[test]
    fn integer_type_is_adopted(a in declaration()) {
        let typed = ParamSpec::named("target").integer();
        let p = merged(&[a, typed]);
        prop_assert_eq!(p.param_type(), ParamType::Integer);
    }
}

#[test]
fn conflicting_flags_refuse_to_merge() {
    let mut p = Parameter::from_spec(ParamSpec::flag(["--out DIR"])).unwrap();
    let other = Parameter::from_spec(ParamSpec::flag(["-o", "--out DIR"])).unwrap();
    assert!(p.merge(other).is_err());
}
