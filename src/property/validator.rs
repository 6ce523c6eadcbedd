//! Composable property validators.

use super::value::PropertyValue;
use serde::{Deserialize, Serialize};

/// How the children of a composite validator combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// Every child must accept.
    And,
    /// At least one child must accept.
    Or,
}

/// Predicate over a property value, with a reason on rejection.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// Rejects empty values, and numeric or boolean values left at their
    /// default.
    Mandatory,
    /// Inclusive bounds; applied element-wise to arrays.
    Bounded {
        lower: Option<f64>,
        upper: Option<f64>,
    },
    /// The string form must be one of the listed values.
    AllowedList(Vec<String>),
    /// The string form must start with one of the listed prefixes.
    StartsWith(Vec<String>),
    /// Array length bounds (inclusive).
    ArrayLength {
        min: Option<usize>,
        max: Option<usize>,
    },
    Composite {
        children: Vec<Validator>,
        relation: Relation,
    },
}

impl Validator {
    pub fn lower_bound(lower: f64) -> Self {
        Validator::Bounded {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn upper_bound(upper: f64) -> Self {
        Validator::Bounded {
            lower: None,
            upper: Some(upper),
        }
    }

    pub fn bounded(lower: f64, upper: f64) -> Self {
        Validator::Bounded {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn allowed<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Validator::AllowedList(values.into_iter().map(Into::into).collect())
    }

    pub fn starts_with<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Validator::StartsWith(prefixes.into_iter().map(Into::into).collect())
    }

    pub fn all(children: Vec<Validator>) -> Self {
        Validator::Composite {
            children,
            relation: Relation::And,
        }
    }

    pub fn any(children: Vec<Validator>) -> Self {
        Validator::Composite {
            children,
            relation: Relation::Or,
        }
    }

    /// Check `value`, returning the rejection reason if invalid.
    ///
    /// `is_default` tells whether the value is still the declared default.
    pub fn check(&self, value: &PropertyValue, is_default: bool) -> Option<String> {
        match self {
            Validator::Mandatory => check_mandatory(value, is_default),
            Validator::Bounded { lower, upper } => check_bounds(value, *lower, *upper),
            Validator::AllowedList(allowed) => {
                let text = value.to_text();
                if allowed.iter().any(|a| *a == text) {
                    None
                } else {
                    Some(format!(
                        "The value \"{}\" is not in the list of allowed values ({})",
                        text,
                        allowed.join(", ")
                    ))
                }
            }
            Validator::StartsWith(prefixes) => {
                let text = value.to_text();
                if prefixes.iter().any(|p| text.starts_with(p.as_str())) {
                    None
                } else {
                    Some(format!(
                        "The value \"{}\" does not start with any of ({})",
                        text,
                        prefixes.join(", ")
                    ))
                }
            }
            Validator::ArrayLength { min, max } => {
                let len = value.array_len()?;
                match (min, max) {
                    (Some(min), _) if len < *min => {
                        Some(format!("Array has {} elements, fewer than {}", len, min))
                    }
                    (_, Some(max)) if len > *max => {
                        Some(format!("Array has {} elements, more than {}", len, max))
                    }
                    _ => None,
                }
            }
            Validator::Composite { children, relation } => match relation {
                Relation::And => children.iter().find_map(|c| c.check(value, is_default)),
                Relation::Or => {
                    if children.is_empty() {
                        return None;
                    }
                    let mut failures = Vec::with_capacity(children.len());
                    for child in children {
                        match child.check(value, is_default) {
                            None => return None,
                            Some(reason) => failures.push(reason),
                        }
                    }
                    Some(failures.join("; "))
                }
            },
        }
    }

    /// Whether `value` passes.
    pub fn is_valid(&self, value: &PropertyValue, is_default: bool) -> bool {
        self.check(value, is_default).is_none()
    }

    /// Values a user may choose from, if the validator restricts to a list.
    pub fn allowed_values(&self) -> Vec<String> {
        match self {
            Validator::AllowedList(values) | Validator::StartsWith(values) => values.clone(),
            Validator::Composite {
                children,
                relation: Relation::And,
            } => children
                .iter()
                .map(Validator::allowed_values)
                .find(|v| !v.is_empty())
                .unwrap_or_default(),
            Validator::Composite {
                children,
                relation: Relation::Or,
            } => {
                let mut union: Vec<String> = Vec::new();
                for value in children.iter().flat_map(Validator::allowed_values) {
                    if !union.contains(&value) {
                        union.push(value);
                    }
                }
                union
            }
            _ => Vec::new(),
        }
    }

    /// Whether this validator (or an AND-ed child) requires a value.
    pub fn is_mandatory(&self) -> bool {
        match self {
            Validator::Mandatory => true,
            Validator::Composite {
                children,
                relation: Relation::And,
            } => children.iter().any(Validator::is_mandatory),
            _ => false,
        }
    }
}

fn check_mandatory(value: &PropertyValue, is_default: bool) -> Option<String> {
    let missing = match value {
        PropertyValue::Double(d) if d.is_nan() => true,
        PropertyValue::Int(_) | PropertyValue::Double(_) | PropertyValue::Bool(_) => is_default,
        other => other.is_empty(),
    };
    missing.then(|| "A value must be entered for this parameter".to_string())
}

fn check_bounds(value: &PropertyValue, lower: Option<f64>, upper: Option<f64>) -> Option<String> {
    let elements = value.numeric_elements()?;
    for v in elements {
        if let Some(lo) = lower {
            if v < lo {
                return Some(format!("Selected value {} is < the lower bound ({})", v, lo));
            }
        }
        if let Some(hi) = upper {
            if v > hi {
                return Some(format!("Selected value {} is > the upper bound ({})", v, hi));
            }
        }
        if v.is_nan() {
            return Some("Selected value is not a number".to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded() {
        let v = Validator::lower_bound(1.0);
        assert!(v.check(&PropertyValue::Int(0), true).is_some());
        assert!(v.check(&PropertyValue::Int(5), false).is_none());

        let v = Validator::bounded(0.0, 1.0);
        assert!(v.is_valid(&PropertyValue::DoubleArray(vec![0.0, 0.5, 1.0]), false));
        let reason = v.check(&PropertyValue::DoubleArray(vec![0.5, 2.0]), false).unwrap();
        assert!(reason.contains("upper bound"));
    }

    #[test]
    fn test_mandatory() {
        let v = Validator::Mandatory;
        assert!(!v.is_valid(&PropertyValue::Str(String::new()), true));
        assert!(v.is_valid(&PropertyValue::Str("ws".into()), false));
        assert!(!v.is_valid(&PropertyValue::Int(0), true));
        assert!(v.is_valid(&PropertyValue::Int(0), false));
        assert!(!v.is_valid(&PropertyValue::Object(None), false));
    }

    #[test]
    fn test_allowed_and_prefix_lists() {
        let v = Validator::allowed(["Multiply", "Add"]);
        assert!(v.is_valid(&PropertyValue::from("Add"), false));
        assert!(!v.is_valid(&PropertyValue::from("add"), false));
        assert_eq!(v.allowed_values(), vec!["Multiply", "Add"]);

        let v = Validator::starts_with(["HRP", "LOQ"]);
        assert!(v.is_valid(&PropertyValue::from("LOQ1234"), false));
        assert!(!v.is_valid(&PropertyValue::from("MAR1"), false));
    }

    #[test]
    fn test_and_reports_first_failure() {
        let v = Validator::all(vec![Validator::lower_bound(10.0), Validator::upper_bound(5.0)]);
        let reason = v.check(&PropertyValue::Int(7), false).unwrap();
        assert!(reason.contains("lower bound"));
        assert!(!reason.contains("upper bound"));
    }

    #[test]
    fn test_or_concatenates_all_failures() {
        let v = Validator::any(vec![Validator::allowed(["a"]), Validator::starts_with(["x"])]);
        assert!(v.is_valid(&PropertyValue::from("xyz"), false));

        let reason = v.check(&PropertyValue::from("b"), false).unwrap();
        assert!(reason.contains("allowed values"));
        assert!(reason.contains("does not start with"));
    }

    #[test]
    fn test_array_length() {
        let v = Validator::ArrayLength {
            min: Some(2),
            max: Some(3),
        };
        assert!(!v.is_valid(&PropertyValue::IntArray(vec![1]), false));
        assert!(v.is_valid(&PropertyValue::IntArray(vec![1, 2]), false));
        assert!(!v.is_valid(&PropertyValue::IntArray(vec![1, 2, 3, 4]), false));
    }

    #[test]
    fn test_composite_introspection() {
        let v = Validator::all(vec![Validator::Mandatory, Validator::allowed(["A", "B"])]);
        assert!(v.is_mandatory());
        assert_eq!(v.allowed_values(), vec!["A", "B"]);

        let v = Validator::any(vec![Validator::allowed(["A"]), Validator::allowed(["A", "C"])]);
        assert_eq!(v.allowed_values(), vec!["A", "C"]);
    }
}
