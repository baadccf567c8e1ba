//! Folding adapter issues into the two public validation-error shapes.
//!
//! [`format_issues`] is the single place that turns a raw issue list into
//! either a flat `{ issues: [{ path, message }] }` list or a
//! `{ formErrors, fieldErrors }` grouping. Input, bind-argument and output
//! validation all go through it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::issue::{Issue, PathKey};

/// Shape used when reporting validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationErrorFormat {
    /// One entry per issue with its normalized path.
    #[default]
    Flattened,
    /// Messages grouped into form-level and per-field buckets.
    Nested,
}

/// An issue with a normalized path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatIssue {
    /// Normalized path; empty for form-level issues.
    pub path: Vec<PathKey>,
    /// Human-readable description of the failure.
    pub message: String,
}

/// Formatted validation issues, ready to be embedded in an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ValidationIssues {
    /// `{ "issues": [...] }`
    Flattened {
        /// Issues in the order the adapter reported them.
        issues: Vec<FlatIssue>,
    },
    /// `{ "formErrors": [...], "fieldErrors": { ... } }`
    #[serde(rename_all = "camelCase")]
    Nested {
        /// Messages of issues without a usable path.
        form_errors: Vec<String>,
        /// Messages keyed by dot-joined field path.
        field_errors: BTreeMap<String, Vec<String>>,
    },
}

impl ValidationIssues {
    /// The format this value was produced with.
    #[must_use]
    pub fn format(&self) -> ValidationErrorFormat {
        match self {
            Self::Flattened { .. } => ValidationErrorFormat::Flattened,
            Self::Nested { .. } => ValidationErrorFormat::Nested,
        }
    }

    /// Total number of messages carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Flattened { issues } => issues.len(),
            Self::Nested {
                form_errors,
                field_errors,
            } => form_errors.len() + field_errors.values().map(Vec::len).sum::<usize>(),
        }
    }

    /// Returns `true` when no messages are carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(dotted path, message)` pairs, sorted, independent of the format.
    ///
    /// Two values built from the same issues compare equal through this view
    /// whatever format each was produced with.
    #[must_use]
    pub fn violations(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = match self {
            Self::Flattened { issues } => issues
                .iter()
                .map(|issue| (join_path(&issue.path), issue.message.clone()))
                .collect(),
            Self::Nested {
                form_errors,
                field_errors,
            } => form_errors
                .iter()
                .map(|message| (String::new(), message.clone()))
                .chain(field_errors.iter().flat_map(|(field, messages)| {
                    messages
                        .iter()
                        .map(move |message| (field.clone(), message.clone()))
                }))
                .collect(),
        };
        pairs.sort();
        pairs
    }
}

/// Formats raw adapter issues into the requested shape.
///
/// Path descriptors are unwrapped and symbol segments are dropped. In the
/// nested shape an issue whose normalized path is empty becomes a form
/// error; all others are grouped under their dot-joined path.
///
/// # Examples
///
/// ```rust
/// use warden_schema::{Issue, ValidationErrorFormat, ValidationIssues, format_issues};
///
/// let issues = [Issue::new("required").at(["email"]), Issue::new("mismatch")];
/// let nested = format_issues(&issues, ValidationErrorFormat::Nested);
///
/// let ValidationIssues::Nested { form_errors, field_errors } = nested else { unreachable!() };
/// assert_eq!(form_errors, vec!["mismatch".to_owned()]);
/// assert_eq!(field_errors["email"], vec!["required".to_owned()]);
/// ```
#[must_use]
pub fn format_issues(issues: &[Issue], format: ValidationErrorFormat) -> ValidationIssues {
    match format {
        ValidationErrorFormat::Flattened => ValidationIssues::Flattened {
            issues: issues
                .iter()
                .map(|issue| FlatIssue {
                    path: issue.normalized_path(),
                    message: issue.message.clone(),
                })
                .collect(),
        },
        ValidationErrorFormat::Nested => {
            let mut form_errors = Vec::new();
            let mut field_errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for issue in issues {
                let path = issue.normalized_path();
                if path.is_empty() {
                    form_errors.push(issue.message.clone());
                } else {
                    field_errors
                        .entry(join_path(&path))
                        .or_default()
                        .push(issue.message.clone());
                }
            }
            ValidationIssues::Nested {
                form_errors,
                field_errors,
            }
        }
    }
}

fn join_path(path: &[PathKey]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
