//! Media type values shared by the catalog and the negotiator.

use std::fmt;

/// A normalized `type/subtype` pair with optional parameters.
///
/// Type, subtype and parameter names are lowercased on parse. Parameter
/// values keep their case with surrounding quotes removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    pub main: String,
    pub subtype: String,
    pub params: Vec<(String, String)>,
}

impl MediaType {
    pub fn new(main: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            main: main.into().to_ascii_lowercase(),
            subtype: subtype.into().to_ascii_lowercase(),
            params: Vec::new(),
        }
    }

    /// Parse `type/subtype[; name=value]*`.
    ///
    /// Returns `None` when the essence is missing a part or contains
    /// whitespace, or a parameter has no `=`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = split_unquoted(s, ';').into_iter();
        let essence = parts.next()?.trim();
        let (main, subtype) = essence.split_once('/')?;
        if !is_token(main) || !is_token(subtype) {
            return None;
        }

        let mut media = Self::new(main, subtype);
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (name, value) = param.split_once('=')?;
            let name = name.trim();
            if !is_token(name) {
                return None;
            }
            media.params.push((name.to_ascii_lowercase(), unquote(value.trim())?));
        }
        Some(media)
    }

    /// The `type/subtype` part without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.subtype)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_wildcard(&self) -> bool {
        self.main == "*" || self.subtype == "*"
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.subtype)?;
        for (name, value) in &self.params {
            if is_token(value) && !value.contains(['"', '=']) {
                write!(f, "; {}={}", name, value)?;
            } else {
                write!(f, "; {}=\"{}\"", name, value.replace('\\', "\\\\").replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}

/// Split `s` on `sep`, ignoring separators inside quoted strings.
pub(crate) fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (idx, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if quoted && c == '\\' {
            escaped = true;
        } else if c == '"' {
            quoted = !quoted;
        } else if c == sep && !quoted {
            parts.push(&s[start..idx]);
            start = idx + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

/// A parameter value: a token, or a quoted string with its escapes resolved.
fn unquote(value: &str) -> Option<String> {
    let Some(inner) = value.strip_prefix('"') else {
        return (!value.contains('"')).then(|| value.to_string());
    };
    let inner = inner.strip_suffix('"')?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '/' || c == ',' || c == ';')
}
