//! Dotted version numbers.
//!
//! Bundle versions are free-form dotted numbers (`1`, `1.2`, `3.0.10.4`).
//! Missing trailing components compare as zero, so `1.2` and `1.2.0` are the
//! same version.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Dotted version number, or "any version" when `text` is `None`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Version {
    /// Version as written by the author (trimmed)
    pub text: Option<String>,
    /// Numeric components, non-numeric segments coerced to 0
    pub components: Vec<u64>,
}

/// Version parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version number component '{component}' for version '{input}'. Only numerical components are supported.")]
    InvalidComponent { component: String, input: String },

    #[error("Empty version number")]
    Empty,
}

impl Version {
    /// Unconstrained version, matches anything
    pub fn any() -> Self {
        Self::default()
    }

    /// Create a version from its numeric components
    pub fn from_components(components: &[u64]) -> Self {
        let text = components
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self {
            text: Some(text),
            components: components.to_vec(),
        }
    }

    /// Parse a version, reading the leading digits of each component.
    ///
    /// A component without leading digits is coerced to 0 and returned as an
    /// error so the caller can report it; the version itself is always usable.
    pub fn parse_lenient(input: &str) -> (Self, Vec<VersionError>) {
        let text = input.trim();
        let mut errors = Vec::new();
        let components = text
            .split('.')
            .map(|part| {
                leading_number(part).unwrap_or_else(|| {
                    errors.push(VersionError::InvalidComponent {
                        component: part.to_string(),
                        input: text.to_string(),
                    });
                    0
                })
            })
            .collect();

        (
            Self {
                text: Some(text.to_string()),
                components,
            },
            errors,
        )
    }

    /// Check if a specific version was requested
    pub fn is_constrained(&self) -> bool {
        self.text.is_some()
    }

    /// Compare two versions component by component.
    ///
    /// The shorter version is padded with zeros.
    pub fn compare(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let a = self.components.get(i).copied().unwrap_or(0);
                let b = other.components.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Check if this version is at least `minimum`
    pub fn satisfies(&self, minimum: &Self) -> bool {
        self.compare(minimum) != Ordering::Less
    }

    /// Version text, or "any" for unconstrained versions
    pub fn label(&self) -> &str {
        self.text.as_deref().unwrap_or("any")
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(VersionError::Empty);
        }
        let (version, _) = Self::parse_lenient(s);
        let text = s.trim();
        match text.split('.').find(|part| part.trim().parse::<u64>().is_err()) {
            Some(part) => Err(VersionError::InvalidComponent {
                component: part.to_string(),
                input: text.to_string(),
            }),
            None => Ok(version),
        }
    }
}

/// Value of the digits a component starts with, if any
fn leading_number(part: &str) -> Option<u64> {
    let part = part.trim();
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(components: &[u64]) -> Version {
        Version::from_components(components)
    }

    #[test]
    fn test_version_parsing() {
        let version = Version::from_str("1.2.3").unwrap();
        assert_eq!(version.components, vec![1, 2, 3]);
        assert_eq!(version.text.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn test_lenient_parsing_coerces_invalid_components() {
        let (version, errors) = Version::parse_lenient(" 1.beta.3 ");
        assert_eq!(version.components, vec![1, 0, 3]);
        assert_eq!(version.text.as_deref(), Some("1.beta.3"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("'beta'"));

        assert!(Version::from_str("1.beta").is_err());
        assert_eq!(Version::from_str("2.0").map(|v| v.components), Ok(vec![2, 0]));
        assert_eq!(Version::from_str(" 2.0 ").map(|v| v.components), Ok(vec![2, 0]));
        assert_eq!(Version::from_str("  "), Err(VersionError::Empty));
    }

    #[test]
    fn test_lenient_parsing_reads_leading_digits() {
        let (version, errors) = Version::parse_lenient("1abc.2rc1.x3");
        assert_eq!(version.components, vec![1, 2, 0]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("'x3'"));
        assert_eq!(version.compare(&Version::parse_lenient("1.2").0), Ordering::Equal);

        assert!(matches!(
            Version::from_str("1abc"),
            Err(VersionError::InvalidComponent { ref component, .. }) if component == "1abc"
        ));
    }

    #[test]
    fn test_trailing_zeros_are_equal() {
        assert_eq!(v(&[1, 2]).compare(&v(&[1, 2, 0])), Ordering::Equal);
        assert_eq!(v(&[1, 2, 0, 0]).compare(&v(&[1, 2])), Ordering::Equal);
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(v(&[1, 9]).compare(&v(&[1, 10])), Ordering::Less);
        assert_eq!(v(&[2]).compare(&v(&[1, 99, 99])), Ordering::Greater);
    }

    #[test]
    fn test_any_version() {
        let any = Version::any();
        assert!(!any.is_constrained());
        assert_eq!(any.to_string(), "any");
        assert!(v(&[0]).satisfies(&any));
        assert!(v(&[3, 1]).satisfies(&any));
        assert!(!v(&[1]).satisfies(&v(&[1, 0, 1])));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn comparison_is_antisymmetric(
            a in prop::collection::vec(0u64..20, 0..5),
            b in prop::collection::vec(0u64..20, 0..5),
        ) {
            let a = Version::from_components(&a);
            let b = Version::from_components(&b);
            prop_assert_eq!(a.compare(&b), b.compare(&a).reverse());
        }

        #[test]
        fn trailing_zeros_never_matter(
            base in prop::collection::vec(0u64..100, 1..5),
            zeros in 0usize..4,
        ) {
            let mut padded = base.clone();
            padded.extend(std::iter::repeat(0).take(zeros));
            prop_assert_eq!(
                Version::from_components(&base).compare(&Version::from_components(&padded)),
                Ordering::Equal
            );
        }

        #[test]
        fn comparison_is_transitive(
            a in prop::collection::vec(0u64..5, 0..4),
            b in prop::collection::vec(0u64..5, 0..4),
            c in prop::collection::vec(0u64..5, 0..4),
        ) {
            let (a, b, c) = (
                Version::from_components(&a),
                Version::from_components(&b),
                Version::from_components(&c),
            );
            if a.compare(&b) != Ordering::Greater && b.compare(&c) != Ordering::Greater {
                prop_assert!(a.compare(&c) != Ordering::Greater);
            }
        }
    }
}
