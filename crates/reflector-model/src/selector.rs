//! Label selectors in Kubernetes string syntax.
//!
//! Supported requirements, comma separated:
//! - `key` / `!key`: existence;
//! - `key=value`, `key==value`, `key!=value`: equality;
//! - `key in (a,b)`, `key notin (a,b)`: set membership.
//!
//! Requirements are kept sorted by key so that [`Selector`]'s string form is canonical
//! (it is used as a metrics label value).
use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{ModelError, Tags};

/// Comparison applied by a single [`Requirement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Exists,
    DoesNotExist,
    Equals,
    NotEquals,
    In,
    NotIn,
}

/// One clause of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    op: Operator,
    values: Vec<String>,
}

impl Requirement {
    /// Build a requirement, validating key and values.
    pub fn new(
        key: impl Into<String>,
        op: Operator,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, ModelError> {
        let key = key.into();
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();

        validate_key(&key).map_err(|reason| invalid(&key, reason))?;
        for v in &values {
            validate_value(v).map_err(|reason| invalid(v, reason))?;
        }

        let arity_ok = match op {
            Operator::Exists | Operator::DoesNotExist => values.is_empty(),
            Operator::Equals | Operator::NotEquals => values.len() == 1,
            Operator::In | Operator::NotIn => !values.is_empty(),
        };
        if !arity_ok {
            return Err(invalid(&key, "wrong number of values for operator"));
        }
        if matches!(op, Operator::In | Operator::NotIn) {
            values.sort();
            values.dedup();
        }
        Ok(Self { key, op, values })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.op
    }

    /// Returns `true` if the given tags satisfy this requirement.
    pub fn matches(&self, tags: &Tags) -> bool {
        let actual = tags.get(&self.key);
        match self.op {
            Operator::Exists => actual.is_some(),
            Operator::DoesNotExist => actual.is_none(),
            Operator::Equals => actual == Some(self.values[0].as_str()),
            Operator::NotEquals => actual != Some(self.values[0].as_str()),
            Operator::In => actual.is_some_and(|a| self.values.iter().any(|v| v == a)),
            Operator::NotIn => !actual.is_some_and(|a| self.values.iter().any(|v| v == a)),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
            Operator::Equals => write!(f, "{}={}", self.key, self.values[0]),
            Operator::NotEquals => write!(f, "{}!={}", self.key, self.values[0]),
            Operator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
        }
    }
}

/// Conjunction of [`Requirement`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct Selector {
    requirements: Vec<Requirement>,
    unlabeled_only: bool,
}

impl Selector {
    /// Selector without requirements.
    ///
    /// Note that the engine refuses to use an empty selector for child lookups.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Selector that only matches objects carrying no labels at all.
    ///
    /// This is how an unset global parent selector is interpreted.
    pub fn unlabeled() -> Self {
        Self {
            requirements: Vec::new(),
            unlabeled_only: true,
        }
    }

    /// Add a requirement and return the updated selector.
    pub fn with(mut self, req: Requirement) -> Self {
        self.requirements.push(req);
        self.requirements.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }

    /// Returns `true` if the selector has no requirements and no unlabeled restriction.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && !self.unlabeled_only
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Returns `true` if the given labels satisfy every requirement.
    pub fn matches(&self, labels: &Tags) -> bool {
        if self.unlabeled_only {
            return labels.is_empty();
        }
        self.requirements.iter().all(|r| r.matches(labels))
    }

    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }

        let mut sel = Self::empty();
        for clause in split_clauses(trimmed).map_err(|reason| invalid(input, reason))? {
            let req = parse_requirement(clause).map_err(|e| match e {
                ModelError::InvalidSelector { reason, .. } => invalid(input, reason),
                other => other,
            })?;
            sel = sel.with(req);
        }
        Ok(sel)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for r in &self.requirements {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{r}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Selector {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = ModelError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Selector> for String {
    fn from(s: Selector) -> Self {
        s.to_string()
    }
}

fn invalid(subject: &str, reason: impl Into<String>) -> ModelError {
    ModelError::InvalidSelector {
        selector: subject.to_string(),
        reason: reason.into(),
    }
}

/// Split on commas that are not inside a `(...)` value set.
fn split_clauses(input: &str) -> Result<Vec<&str>, String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in input.char_indices() {
        match c {
            '(' => {
                if depth > 0 {
                    return Err("nested parentheses".into());
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err("unbalanced ')'".into());
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                out.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '('".into());
    }
    out.push(input[start..].trim());

    if out.iter().any(|c| c.is_empty()) {
        return Err("empty requirement".into());
    }
    Ok(out)
}

fn parse_requirement(clause: &str) -> Result<Requirement, ModelError> {
    if let Some(key) = clause.strip_prefix('!') {
        return Requirement::new(key.trim(), Operator::DoesNotExist, Vec::<String>::new());
    }

    if let Some(open) = clause.find('(') {
        let Some(inner) = clause[open + 1..].strip_suffix(')') else {
            return Err(invalid(clause, "value set must end with ')'"));
        };
        let head: Vec<&str> = clause[..open].split_whitespace().collect();
        let [key, op] = head.as_slice() else {
            return Err(invalid(clause, "expected `<key> in|notin (<values>)`"));
        };
        let op = match *op {
            "in" => Operator::In,
            "notin" => Operator::NotIn,
            other => return Err(invalid(clause, format!("unknown set operator {other:?}"))),
        };
        let values: Vec<&str> = inner.split(',').map(str::trim).collect();
        return Requirement::new(*key, op, values);
    }

    for (token, op) in [
        ("!=", Operator::NotEquals),
        ("==", Operator::Equals),
        ("=", Operator::Equals),
    ] {
        if let Some((key, value)) = clause.split_once(token) {
            return Requirement::new(key.trim(), op, [value.trim()]);
        }
    }

    Requirement::new(clause, Operator::Exists, Vec::<String>::new())
}

fn validate_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("empty key".into());
    }
    if key.len() > 317 {
        return Err("key too long".into());
    }
    if let Some(c) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')))
    {
        return Err(format!("invalid character {c:?} in key {key:?}"));
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<(), String> {
    if value.len() > 63 {
        return Err(format!("value {value:?} is longer than 63 characters"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(format!("invalid character {c:?} in value {value:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().copied().collect()
    }

    #[test]
    fn empty_input_parses_to_empty_selector() {
        let sel = Selector::parse("   ").unwrap();
        assert!(sel.is_empty());
        assert_eq!(sel.to_string(), "");
        assert!(sel.matches(&tags(&[("app", "web")])));
    }

    #[test]
    fn unlabeled_selector_only_matches_objects_without_labels() {
        let sel = Selector::unlabeled();
        assert!(!sel.is_empty());
        assert!(sel.matches(&Tags::new()));
        assert!(!sel.matches(&tags(&[("app", "web")])));
    }

    #[test]
    fn parses_equality_and_existence() {
        let sel = Selector::parse("tier!=frontend,app==web,team,!legacy").unwrap();
        assert_eq!(sel.to_string(), "app=web,!legacy,team,tier!=frontend");

        assert!(sel.matches(&tags(&[("app", "web"), ("team", "core")])));
        assert!(sel.matches(&tags(&[("app", "web"), ("team", "core"), ("tier", "db")])));
        assert!(!sel.matches(&tags(&[("app", "web"), ("team", "core"), ("tier", "frontend")])));
        assert!(!sel.matches(&tags(&[("app", "web"), ("team", "core"), ("legacy", "1")])));
        assert!(!sel.matches(&tags(&[("app", "api"), ("team", "core")])));
    }

    #[test]
    fn parses_set_operators() {
        let sel = Selector::parse("env in (prod, staging),zone notin (eu-1)").unwrap();
        assert_eq!(sel.to_string(), "env in (prod,staging),zone notin (eu-1)");

        assert!(sel.matches(&tags(&[("env", "prod")])));
        assert!(sel.matches(&tags(&[("env", "staging"), ("zone", "us-1")])));
        assert!(!sel.matches(&tags(&[("env", "dev")])));
        assert!(!sel.matches(&tags(&[("env", "prod"), ("zone", "eu-1")])));
    }

    #[test]
    fn rejects_malformed_selectors() {
        let bad = [
            "invalid;",
            "app=web,",
            "env in (prod",
            "env in prod)",
            "env within (a)",
            "=value",
            "app=we b",
        ];

        for input in bad {
            let parsed = Selector::parse(input);
            assert!(
                matches!(parsed, Err(ModelError::InvalidSelector { .. })),
                "expected error for {input:?}, got {parsed:?}"
            );
        }
    }

    #[test]
    fn serde_uses_string_form() {
        let sel: Selector = serde_json::from_str(r#""app=web""#).unwrap();
        assert_eq!(serde_json::to_string(&sel).unwrap(), r#""app=web""#);

        assert!(serde_json::from_str::<Selector>(r#""bad;""#).is_err());
    }
}
