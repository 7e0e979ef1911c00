use std::fmt;

use reflector_model::{OPERATION_LIST, OPERATION_REGEX};

use crate::{domain::Domain, error::ReflectError};

/// How a marker selects keys from the source map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Value is a comma-separated list of exact key names.
    List,
    /// Value is a pattern matched against the whole key.
    Regex,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => OPERATION_LIST,
            Operation::Regex => OPERATION_REGEX,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed marker key: `<marker-domain>/<operation>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub domain: Domain,
    pub operation: Operation,
}

impl Rule {
    /// Parse a marker key.
    ///
    /// The key must have exactly two `/`-separated segments; the first must be
    /// one of the known marker domains and the second a supported operation.
    pub fn parse(key: &str) -> Result<Rule, ReflectError> {
        let unparsable = |reason| ReflectError::UnparsableAnnotation {
            key: key.to_string(),
            reason,
        };

        let mut parts = key.split('/');
        let (Some(prefix), Some(op), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(unparsable("expected exactly 2 '/'-separated parts"));
        };

        let domain = Domain::ALL
            .into_iter()
            .find(|d| d.marker_domain() == prefix)
            .ok_or_else(|| unparsable("unknown marker domain"))?;

        let operation = match op {
            OPERATION_LIST => Operation::List,
            OPERATION_REGEX => Operation::Regex,
            other => {
                return Err(ReflectError::UnparsableOperation {
                    key: key.to_string(),
                    operation: other.to_string(),
                });
            }
        };

        Ok(Rule { domain, operation })
    }
}
