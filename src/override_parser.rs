//! Parser for the restricted CLI override grammar:
//!
//! ```text
//! override := [prefix] key ('=' value)?
//! prefix    := '+' | '~'
//! key       := group ('@' pkg (':' pkg2)?)?
//! value     := IDENT ('/' IDENT)*
//! ```
//!
//! Grounded on the teacher's recursive-descent override parser, restricted to
//! the subset this resolver needs (no sweeps, ranges, or function calls).

use crate::error::ResolveError;
use crate::key::split_key;

/// The kind of change a parsed override requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverrideKind {
    /// `group=value` — change or package-rename an existing entry.
    Change,
    /// `+group=value` — append a new entry.
    Add,
    /// `~group` or `~group=value` — remove an entry.
    Delete,
}

/// One parsed line of the override grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedOverride {
    pub kind: OverrideKind,
    pub group: String,
    pub package: Option<String>,
    pub package2: Option<String>,
    pub value: Option<String>,
    pub input_line: String,
}

impl ParsedOverride {
    /// The `group@pkg`-style spec text used in error messages (no value).
    pub fn spec(&self) -> String {
        match (&self.package, &self.package2) {
            (None, None) => self.group.clone(),
            (Some(p), None) => format!("{}@{}", self.group, p),
            (None, Some(p2)) => format!("{}@:{}", self.group, p2),
            (Some(p), Some(p2)) => format!("{}@{}:{}", self.group, p, p2),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// Parse a single override line, e.g. `"+db=mysql"`, `"~db"`, `"db@local:dest=mysql"`.
pub fn parse_override(line: &str) -> Result<ParsedOverride, ResolveError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::override_parse_error(format!(
            "Error parsing override '{}'\nmissing override",
            line
        )));
    }

    let (kind, rest) = match trimmed.chars().next() {
        Some('+') => (OverrideKind::Add, &trimmed[1..]),
        Some('~') => (OverrideKind::Delete, &trimmed[1..]),
        _ => (OverrideKind::Change, trimmed),
    };

    let (key_part, value_part) = match rest.split_once('=') {
        Some((k, v)) => (k, Some(v)),
        None => (rest, None),
    };

    if key_part.is_empty() {
        return Err(ResolveError::override_parse_error(format!(
            "Error parsing override '{}'\nmissing key",
            line
        )));
    }
    if !key_part.chars().all(|c| is_ident_char(c) || c == '@' || c == ':' || c == '/') {
        return Err(ResolveError::override_parse_error(format!(
            "Error parsing override '{}'\ninvalid character in key",
            line
        )));
    }

    if kind == OverrideKind::Change && value_part.is_none() {
        return Err(ResolveError::override_parse_error(format!(
            "Error parsing override '{}'\nmissing EQUAL at '<EOF>'",
            line
        )));
    }

    let (group, package, package2) = split_key(key_part);
    if group.is_empty() {
        return Err(ResolveError::override_parse_error(format!(
            "Error parsing override '{}'\nmissing group name",
            line
        )));
    }

    if kind == OverrideKind::Add && package2.is_some() {
        return Err(ResolveError::AddWithRename);
    }

    if let Some(value) = value_part {
        // A list/dict literal (`[a,b,c]`, `{a:1,b:2}`) is not a valid group
        // name, regardless of which override form carried it.
        if value.starts_with('[') || value.starts_with('{') {
            return Err(ResolveError::DeleteValueNotString);
        }
        for segment in value.split('/') {
            if segment.is_empty() || !segment.chars().all(is_ident_char) {
                return Err(ResolveError::override_parse_error(format!(
                    "Error parsing override '{}'\ninvalid value '{}'",
                    line, value
                )));
            }
        }
    }

    Ok(ParsedOverride {
        kind,
        group: group.to_string(),
        package: package.map(str::to_string),
        package2: package2.map(str::to_string),
        value: value_part.map(str::to_string),
        input_line: trimmed.to_string(),
    })
}

/// Parse every override line, failing on the first malformed entry.
pub fn parse_overrides<'a>(
    lines: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<ParsedOverride>, ResolveError> {
    lines.into_iter().map(parse_override).collect()
}
