use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Expected argument map for one tool call, keyed by argument name.
///
/// A `BTreeMap` keeps rendering deterministic without extra sorting.
pub type ExpectedArgs = BTreeMap<String, Expected>;

/// Score returned by `match_score` when the actual value is not a mapping.
pub const NON_MAPPING_SCORE: i64 = -10_000;

/// Expected value tree used by the deep-match predicate.
///
/// Plain JSON converts via `From<Value>`; the two escapes (`Any` and
/// `Predicate`) are built with [`Expected::any`] and [`Expected::predicate`]
/// and may appear at any depth.
#[derive(Clone)]
pub enum Expected {
    /// Wildcard sentinel; matches anything.
    Any,
    /// Arbitrary boolean check with a human-readable description.
    Predicate(Predicate),
    /// Mapping; matches iff key sets are identical and values match.
    Map(BTreeMap<String, Expected>),
    /// Sequence; matches iff same length and elements match positionally.
    List(Vec<Expected>),
    /// Scalar leaf; matches by value equality.
    Value(Value),
}

impl Expected {
    /// Returns the wildcard sentinel.
    pub fn any() -> Self {
        Self::Any
    }

    /// Wraps a boolean check plus a description used in diagnostics.
    pub fn predicate(
        description: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Predicate(Predicate::new(description, check))
    }
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Array(items) => Self::List(items.into_iter().map(Into::into).collect()),
            other => Self::Value(other),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("<any>"),
            Self::Predicate(p) => write!(f, "<{}>", p.description()),
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Value(value) => f.write_str(&render_value(value)),
        }
    }
}

impl fmt::Debug for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expected({self})")
    }
}

/// Boolean check over a JSON value plus a description for diagnostics.
#[derive(Clone)]
pub struct Predicate {
    description: String,
    check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Predicate {
    /// Creates a predicate from a description and a check function.
    pub fn new(
        description: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluates the check against a concrete value.
    pub fn holds(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.description)
    }
}

/// Recursive deep-match of an expected value against a concrete one.
pub fn matches_value(expected: &Expected, actual: &Value) -> bool {
    match expected {
        Expected::Any => true,
        Expected::Predicate(p) => p.holds(actual),
        Expected::Map(map) => match actual {
            Value::Object(obj) => {
                map.len() == obj.len()
                    && map
                        .iter()
                        .all(|(key, exp)| obj.get(key).is_some_and(|v| matches_value(exp, v)))
            }
            _ => false,
        },
        Expected::List(items) => match actual {
            Value::Array(values) => {
                items.len() == values.len()
                    && items
                        .iter()
                        .zip(values)
                        .all(|(exp, value)| matches_value(exp, value))
            }
            _ => false,
        },
        Expected::Value(value) => value == actual,
    }
}

/// Deep-match of a full expected argument map against actual arguments.
pub fn matches_args(expected: &ExpectedArgs, actual: &serde_json::Map<String, Value>) -> bool {
    expected.len() == actual.len()
        && expected
            .iter()
            .all(|(key, exp)| actual.get(key).is_some_and(|v| matches_value(exp, v)))
}

/// Heuristic closeness of actual arguments to an expected argument map.
///
/// Purely orders candidate pairings when several actual calls share a name;
/// never a pass/fail criterion on its own. Per expected key: wildcard +2,
/// predicate +2 when it holds on a present value else +1, absent key −2,
/// deep-match +2 else +1. Keys present in the actual value but not expected
/// each subtract 1.
pub fn match_score(expected: &ExpectedArgs, actual: &Value) -> i64 {
    let Value::Object(actual_map) = actual else {
        return NON_MAPPING_SCORE;
    };
    let mut score = 0_i64;
    for (key, exp) in expected {
        match exp {
            Expected::Any => score += 2,
            Expected::Predicate(p) => {
                score += match actual_map.get(key) {
                    Some(value) if p.holds(value) => 2,
                    _ => 1,
                };
            }
            _ => match actual_map.get(key) {
                None => score -= 2,
                Some(value) if matches_value(exp, value) => score += 2,
                Some(_) => score += 1,
            },
        }
    }
    score - actual_map.keys().filter(|k| !expected.contains_key(*k)).count() as i64
}

/// Rebuilds a value with recursively sorted object keys.
pub(crate) fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, value) in sorted {
                out.insert(key.clone(), canonical_value(value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}

/// Serializes a value with deterministic key ordering.
pub(crate) fn render_value(value: &Value) -> String {
    canonical_value(value).to_string()
}
