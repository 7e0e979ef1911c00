//! Desired-set resolution: which source tags a parent wants on its children.
use std::collections::HashSet;

use regex::Regex;
use reflector_model::Tags;

use crate::{
    error::ReflectError,
    rule::{Operation, Rule},
};

/// Compute the tags to reflect for one domain.
///
/// `markers` are the parent's marker annotations for the domain and `source`
/// is the parent map values are copied from. Markers are applied in ascending
/// key order; a later marker overwrites an earlier one only with the same value,
/// since both read from `source`.
///
/// Any malformed marker fails the whole resolution, no partial set is returned.
pub fn desired_set(markers: &Tags, source: &Tags) -> Result<Tags, ReflectError> {
    let mut desired = Tags::new();

    for (key, value) in markers.iter() {
        let rule = Rule::parse(key)?;
        match rule.operation {
            Operation::List => {
                let names: HashSet<&str> = value.split(',').collect();
                desired.extend(source.iter().filter(|(k, _)| names.contains(k)));
            }
            Operation::Regex => {
                let re = Regex::new(&anchored(value)).map_err(|source| {
                    ReflectError::InvalidPattern {
                        key: key.to_string(),
                        pattern: value.to_string(),
                        source,
                    }
                })?;
                desired.extend(source.iter().filter(|(k, _)| re.is_match(k)));
            }
        }
    }

    Ok(desired)
}

/// Prefix `^` and suffix `$` where missing.
///
/// The pattern text is not grouped, so an alternation is anchored only at its
/// outer ends: `a|b` becomes `^a|b$`, which matches any key starting with `a`
/// or ending with `b`. Wrap alternatives in a group (`(a|b)`) for whole-key matches.
pub fn anchored(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    if !pattern.starts_with('^') {
        out.push('^');
    }
    out.push_str(pattern);
    if !pattern.ends_with('$') {
        out.push('$');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "labels.metadata-reflector.spaceship.com/list";
    const REGEX: &str = "labels.metadata-reflector.spaceship.com/regex";

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().copied().collect()
    }

    #[test]
    fn anchors_only_when_missing() {
        assert_eq!(anchored("tier"), "^tier$");
        assert_eq!(anchored("^tier"), "^tier$");
        assert_eq!(anchored("tier$"), "^tier$");
        assert_eq!(anchored("^tier$"), "^tier$");
        assert_eq!(anchored(""), "^$");
    }

    #[test]
    fn list_selects_exact_names_present_in_source() {
        let source = tags(&[("tier", "backend"), ("env", "prod"), ("team", "core")]);
        let desired = desired_set(&tags(&[(LIST, "tier,env,missing")]), &source).unwrap();

        assert_eq!(desired, tags(&[("env", "prod"), ("tier", "backend")]));
    }

    #[test]
    fn list_does_not_trim_or_prefix_match() {
        let source = tags(&[("tier", "backend"), ("env", "prod")]);
        let desired = desired_set(&tags(&[(LIST, "tie, env")]), &source).unwrap();
        assert!(desired.is_empty());
    }

    #[test]
    fn single_branch_regex_matches_whole_key() {
        let source = tags(&[("team", "core"), ("teams", "x"), ("my-team", "y")]);
        let desired = desired_set(&tags(&[(REGEX, "team")]), &source).unwrap();
        assert_eq!(desired, tags(&[("team", "core")]));

        let desired = desired_set(&tags(&[(REGEX, "te.*")]), &source).unwrap();
        assert_eq!(desired, tags(&[("team", "core"), ("teams", "x")]));
    }

    #[test]
    fn alternation_is_anchored_only_at_outer_ends() {
        assert_eq!(anchored("tier|env"), "^tier|env$");

        let source = tags(&[("tier", "a"), ("tier-canary", "b"), ("xenv", "c"), ("envx", "d")]);
        let desired = desired_set(&tags(&[(REGEX, "tier|env")]), &source).unwrap();
        assert_eq!(desired, tags(&[("tier", "a"), ("tier-canary", "b"), ("xenv", "c")]));

        let desired = desired_set(&tags(&[(REGEX, "(tier|env)")]), &source).unwrap();
        assert_eq!(desired, tags(&[("tier", "a")]));
    }

    #[test]
    fn markers_union_their_selections() {
        let source = tags(&[("tier", "backend"), ("team", "core"), ("env", "prod")]);
        let markers = tags(&[(LIST, "tier"), (REGEX, "te.*")]);

        let desired = desired_set(&markers, &source).unwrap();
        assert_eq!(desired, tags(&[("team", "core"), ("tier", "backend")]));
    }

    #[test]
    fn no_markers_means_empty_set() {
        let source = tags(&[("tier", "backend")]);
        assert!(desired_set(&Tags::new(), &source).unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error_not_a_panic() {
        let err = desired_set(&tags(&[(REGEX, "(unclosed")]), &tags(&[("a", "b")])).unwrap_err();
        assert!(matches!(err, ReflectError::InvalidPattern { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn one_bad_marker_discards_the_whole_set() {
        let source = tags(&[("tier", "backend")]);
        let markers = tags(&[
            (LIST, "tier"),
            ("labels.metadata-reflector.spaceship.com/copy", "tier"),
        ]);
        let err = desired_set(&markers, &source).unwrap_err();
        assert!(matches!(err, ReflectError::UnparsableOperation { .. }));
    }
}
