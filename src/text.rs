//! String helpers for messages and help screens

/// Joins messages into sentences.
///
/// Each message after the first is capitalized and separated from the previous
/// one by two spaces, with a period added when the previous one lacks terminal
/// punctuation. Returns `None` for an empty list.
pub fn sentence_join<S: AsRef<str>>(parts: &[S]) -> Option<String> {
    let (first, rest) = parts.split_first()?;
    let mut joined = first.as_ref().to_string();
    let mut previous = first.as_ref();
    for part in rest {
        let part = part.as_ref();
        if previous.ends_with(&['.', '?', '!'][..]) {
            joined.push_str("  ");
        } else {
            joined.push_str(".  ");
        }
        joined.push_str(&capitalize(part));
        previous = part;
    }
    Some(joined)
}

/// "a", "a and b", "a, b and c"
pub fn oxford_join<S: AsRef<str>>(items: &[S], last: &str) -> String {
    let mut joined = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            joined.push_str(if i + 1 == items.len() { last } else { ", " });
        }
        joined.push_str(item.as_ref());
    }
    joined
}

/// 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st ...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => c.to_ascii_uppercase().to_string() + chars.as_str(),
        _ => s.to_string(),
    }
}

/// Removes the indentation of the first indented line from every line.
pub fn unindent(s: &str) -> String {
    let indent: String = s
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| *c == ' ' || *c == '\t').collect())
        .unwrap_or_default();
    if indent.is_empty() {
        return s.to_string();
    }
    s.lines()
        .map(|line| line.strip_prefix(indent.as_str()).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Appends `s` to the last non-blank line with a space in between, unless that
/// would make the line wider than the widest existing line, in which case `s`
/// becomes a new line after it.
pub fn justified_append(lines: &mut Vec<String>, s: &str) {
    let Some(idx) = lines.iter().rposition(|line| !line.trim().is_empty()) else {
        lines.insert(0, s.to_string());
        return;
    };
    let candidate = format!("{} {}", lines[idx], s);
    let widest = lines.iter().map(String::len).max().unwrap_or(0);
    let too_wide = lines.len() > 1 && candidate.len() > widest;
    if too_wide {
        lines.insert(idx + 1, s.to_string());
    } else {
        lines[idx] = candidate;
    }
}

/// Exact match wins; otherwise every item whose key starts with `needle`.
pub fn fuzzy_match<'a, T>(items: &'a [T], needle: &str, key: impl Fn(&T) -> &str) -> Vec<&'a T> {
    if let Some(exact) = items.iter().find(|item| key(item) == needle) {
        return vec![exact];
    }
    items.iter().filter(|item| key(item).starts_with(needle)).collect()
}
