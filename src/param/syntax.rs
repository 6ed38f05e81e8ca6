//! Concrete flag spellings
//!
//! Accepted tokens:
//! - short: `-r`, `-r N`, `-r [N]`
//! - long: `--retries`, `--retries N`, `--retries=N`, `--help [topic]`
//! - negatable long: `--[no-]verbose` (boolean only)

use std::sync::LazyLock;

use regex::Regex;

static LONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--(\[no-\])?([A-Za-z0-9][-A-Za-z0-9_]*)(?:[ =](.+))?$").expect("valid long flag pattern")
});

static SHORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-([A-Za-z0-9])(?: (.+))?$").expect("valid short flag pattern")
});

/// The argument a flag takes, with its display placeholder
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlagArg {
    #[default]
    None,
    Required(String),
    Optional(String),
}

impl FlagArg {
    fn parse(placeholder: &str) -> Self {
        let placeholder = placeholder.trim();
        match placeholder.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
            Some(inner) => FlagArg::Optional(inner.trim().to_string()),
            None => FlagArg::Required(placeholder.to_string()),
        }
    }

    fn suffix(&self) -> String {
        match self {
            FlagArg::None => String::new(),
            FlagArg::Required(p) => format!(" {}", p),
            FlagArg::Optional(p) => format!(" [{}]", p),
        }
    }
}

/// Parsed flag syntax of one parameter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlagSyntax {
    pub short: Option<char>,
    pub long: Option<String>,
    pub negatable: bool,
    pub arg: FlagArg,
}

impl FlagSyntax {
    /// Parses the flag tokens of a declaration. Returns the offending token on error.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, String> {
        let mut syntax = FlagSyntax::default();
        let mut short_arg = FlagArg::None;
        for token in tokens {
            let token = token.as_ref();
            if let Some(caps) = LONG.captures(token) {
                if syntax.long.is_some() {
                    return Err(token.to_string());
                }
                syntax.negatable = caps.get(1).is_some();
                syntax.long = Some(caps[2].to_string());
                if let Some(placeholder) = caps.get(3) {
                    syntax.arg = FlagArg::parse(placeholder.as_str());
                }
            } else if let Some(caps) = SHORT.captures(token) {
                if syntax.short.is_some() {
                    return Err(token.to_string());
                }
                syntax.short = caps[1].chars().next();
                if let Some(placeholder) = caps.get(2) {
                    short_arg = FlagArg::parse(placeholder.as_str());
                }
            } else {
                return Err(token.to_string());
            }
        }
        if syntax.arg == FlagArg::None {
            syntax.arg = short_arg;
        }
        if syntax.negatable && syntax.arg != FlagArg::None {
            return Err(syntax.summary());
        }
        if syntax.short.is_none() && syntax.long.is_none() {
            return Err(String::new());
        }
        Ok(syntax)
    }

    /// The syntax used for a named parameter declared without flag tokens
    pub fn implicit(name: &str) -> Self {
        FlagSyntax {
            short: None,
            long: Some(name.replace('_', "-")),
            negatable: false,
            arg: FlagArg::Required("VALUE".to_string()),
        }
    }

    /// Normalized parameter name derived from the long spelling
    pub fn normalized_name(&self) -> Option<String> {
        self.long.as_ref().map(|long| long.replace('-', "_"))
    }

    pub fn takes_value(&self) -> bool {
        self.arg != FlagArg::None
    }

    /// Every literal switch the lexer must recognize
    pub fn spellings(&self) -> Vec<String> {
        let mut spellings = Vec::new();
        if let Some(short) = self.short {
            spellings.push(format!("-{}", short));
        }
        if let Some(long) = &self.long {
            spellings.push(format!("--{}", long));
            if self.negatable {
                spellings.push(format!("--no-{}", long));
            }
        }
        spellings
    }

    /// The canonical long switch (or short, when there is no long one)
    pub fn primary(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{}", long),
            (None, Some(short)) => format!("-{}", short),
            (None, None) => String::new(),
        }
    }

    /// Summary column of option help, e.g. `-r, --retries N` or `--[no-]verbose`
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(short) = self.short {
            parts.push(format!("-{}", short));
        }
        if let Some(long) = &self.long {
            let prefix = if self.negatable { "--[no-]" } else { "--" };
            parts.push(format!("{}{}", prefix, long));
        }
        format!("{}{}", parts.join(", "), self.arg.suffix())
    }

    /// Compact usage form, e.g. `-r N`, `--retries N`, `-v`
    pub fn usage(&self) -> String {
        match self.short {
            Some(short) => format!("-{}{}", short, self.arg.suffix()),
            None => {
                let prefix = if self.negatable { "--[no-]" } else { "--" };
                format!("{}{}{}", prefix, self.long.as_deref().unwrap_or_default(), self.arg.suffix())
            }
        }
    }
}
