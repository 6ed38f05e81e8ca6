//! Named text templates with `{{ variable }}` placeholders

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::Error;
use crate::param::Params;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid template variable pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    source: String,
}

impl Template {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct variable names in order of first appearance
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in VARIABLE.captures_iter(&self.source) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Substitutes every variable from the option mapping
    pub fn interpolate(&self, params: &Params) -> Result<String, Error> {
        if let Some(missing) = self
            .variable_names()
            .into_iter()
            .find(|name| !params.contains(name))
        {
            return Err(Error::ParameterNotSet(missing));
        }
        let rendered = VARIABLE.replace_all(&self.source, |caps: &Captures<'_>| {
            params
                .get(&caps[1])
                .map(ToString::to_string)
                .unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_variables_once_in_order() {
        let t = Template::new("manifest", "{{ name }} v{{version}} by {{ name }}");
        assert_eq!(t.variable_names(), ["name", "version"]);
    }

    #[test]
    fn interpolates_from_params() {
        let t = Template::new("manifest", "name = {{ name }}\nversion = {{ version }}\n");
        let mut params = Params::new();
        params.insert("name", "demo");
        assert!(matches!(t.interpolate(&params), Err(Error::ParameterNotSet(v)) if v == "version"));

        params.insert("version", "1.2.0");
        assert_eq!(
            t.interpolate(&params).unwrap(),
            "name = demo\nversion = 1.2.0\n"
        );
    }
}
