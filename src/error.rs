use std::fmt;

use thiserror::Error;

use crate::path::Path;

#[derive(Debug, Error)]
pub enum ScanfigError {
    #[error("unknown type {type_name} at path {path}")]
    UnknownType { type_name: String, path: String },

    #[error("cannot convert {value} to {to_type}{}", at(.path))]
    Conversion {
        value: String,
        to_type: String,
        path: Option<String>,
    },

    #[error("validating {value} failed{}: {message}", at(.path))]
    Validation {
        value: String,
        message: String,
        path: Option<String>,
    },

    #[error("invalid {tag} constraint '{constraint}'{}: {reason}", at(.path))]
    InvalidConstraint {
        tag: String,
        constraint: String,
        reason: String,
        path: Option<String>,
    },

    #[error("storage is not available{}", at(.path))]
    Unavailable { path: Option<String> },

    #[error("invalid tags `{tags}`: {reason}")]
    InvalidTags { tags: String, reason: String },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("invalid command line: {0}")]
    CommandLine(String),

    #[error("help requested")]
    HelpRequested(String),

    #[error("failed to flatten overrides: {0}")]
    Overrides(#[from] serde_json::Error),

    #[error("{0}")]
    Multiple(Errors),
}

fn at(path: &Option<String>) -> String {
    match path {
        Some(path) => format!(" at {path}"),
        None => String::new(),
    }
}

impl ScanfigError {
    pub fn conversion(value: impl fmt::Display, to_type: impl Into<String>) -> Self {
        ScanfigError::Conversion {
            value: value.to_string(),
            to_type: to_type.into(),
            path: None,
        }
    }

    pub fn validation(value: impl fmt::Display, message: impl Into<String>) -> Self {
        ScanfigError::Validation {
            value: value.to_string(),
            message: message.into(),
            path: None,
        }
    }

    pub fn invalid_constraint(
        tag: impl Into<String>,
        constraint: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ScanfigError::InvalidConstraint {
            tag: tag.into(),
            constraint: constraint.into(),
            reason: reason.into(),
            path: None,
        }
    }

    /// Attach `path` to this error (and every error it aggregates) unless a
    /// path is already present.
    pub fn at(self, path: &Path) -> Self {
        match self {
            ScanfigError::Conversion {
                value,
                to_type,
                path: None,
            } => ScanfigError::Conversion {
                value,
                to_type,
                path: Some(path.to_string()),
            },
            ScanfigError::Validation {
                value,
                message,
                path: None,
            } => ScanfigError::Validation {
                value,
                message,
                path: Some(path.to_string()),
            },
            ScanfigError::InvalidConstraint {
                tag,
                constraint,
                reason,
                path: None,
            } => ScanfigError::InvalidConstraint {
                tag,
                constraint,
                reason,
                path: Some(path.to_string()),
            },
            ScanfigError::Unavailable { path: None } => ScanfigError::Unavailable {
                path: Some(path.to_string()),
            },
            ScanfigError::Multiple(errors) => {
                ScanfigError::Multiple(errors.into_iter().map(|e| e.at(path)).collect())
            }
            other => other,
        }
    }

    /// The rendered help text, if this error (or one it aggregates) is a
    /// help request.
    pub fn help_requested(&self) -> Option<&str> {
        self.errors().iter().find_map(|err| match err {
            ScanfigError::HelpRequested(help) => Some(help.as_str()),
            _ => None,
        })
    }

    /// The individual errors behind this one: the aggregate's members, or
    /// just `self`.
    pub fn errors(&self) -> &[ScanfigError] {
        match self {
            ScanfigError::Multiple(errors) => &errors.0,
            other => std::slice::from_ref(other),
        }
    }
}

/// An accumulating list of errors.
///
/// Pushing a `ScanfigError::Multiple` splices its members in, so the list is
/// always flat. An empty list is success: [`Errors::into_result`] only fails
/// when something was pushed.
#[derive(Debug, Default)]
pub struct Errors(Vec<ScanfigError>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: ScanfigError) {
        match err {
            ScanfigError::Multiple(errors) => self.0.extend(errors.0),
            other => self.0.push(other),
        }
    }

    /// Push the error side of `result`, if any.
    pub fn check(&mut self, result: Result<(), ScanfigError>) {
        if let Err(err) = result {
            self.push(err);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScanfigError> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), ScanfigError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ScanfigError::Multiple(self))
        }
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl Extend<ScanfigError> for Errors {
    fn extend<I: IntoIterator<Item = ScanfigError>>(&mut self, iter: I) {
        for err in iter {
            self.push(err);
        }
    }
}

impl FromIterator<ScanfigError> for Errors {
    fn from_iter<I: IntoIterator<Item = ScanfigError>>(iter: I) -> Self {
        let mut errors = Errors::new();
        errors.extend(iter);
        errors
    }
}

impl IntoIterator for Errors {
    type Item = ScanfigError;
    type IntoIter = std::vec::IntoIter<ScanfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NodePath;

    #[test]
    fn conversion_formats_with_and_without_path() {
        let err = ScanfigError::conversion("abc", "i32");
        assert_eq!(err.to_string(), "cannot convert abc to i32");

        let root = NodePath::root("");
        let path = root.node("server").leaf("port");
        let err = ScanfigError::conversion("abc", "i32").at(&path);
        assert_eq!(err.to_string(), "cannot convert abc to i32 at server->port");
    }

    #[test]
    fn validation_formats_message() {
        let err = ScanfigError::validation(9, "9 is not less than or equal to 8");
        assert_eq!(
            err.to_string(),
            "validating 9 failed: 9 is not less than or equal to 8"
        );
    }

    #[test]
    fn at_keeps_existing_path() {
        let root = NodePath::root("");
        let first = root.leaf("first");
        let second = root.leaf("second");
        let err = ScanfigError::validation("x", "bad").at(&first).at(&second);
        assert!(err.to_string().contains("at first"));
        assert!(!err.to_string().contains("second"));
    }

    #[test]
    fn unknown_type_formats() {
        let err = ScanfigError::UnknownType {
            type_name: "Widget".into(),
            path: "a->b".into(),
        };
        assert_eq!(err.to_string(), "unknown type Widget at path a->b");
    }

    #[test]
    fn help_request_is_found_in_aggregate() {
        let errors: Errors = vec![
            ScanfigError::conversion("a", "i32"),
            ScanfigError::HelpRequested("Usage: app".into()),
        ]
        .into_iter()
        .collect();
        let err = ScanfigError::Multiple(errors);
        assert_eq!(err.help_requested(), Some("Usage: app"));
        assert_eq!(ScanfigError::conversion("a", "i32").help_requested(), None);
    }

    #[test]
    fn empty_errors_are_success() {
        let errors = Errors::new();
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn push_flattens_nested_aggregates() {
        let mut inner = Errors::new();
        inner.push(ScanfigError::conversion("a", "i32"));
        inner.push(ScanfigError::conversion("b", "i32"));

        let mut outer = Errors::new();
        outer.push(ScanfigError::conversion("c", "u8"));
        outer.push(ScanfigError::Multiple(inner));
        assert_eq!(outer.len(), 3);
        assert!(outer.iter().all(|e| !matches!(e, ScanfigError::Multiple(_))));
    }

    #[test]
    fn aggregate_display_joins_lines() {
        let errors: Errors = vec![
            ScanfigError::conversion("a", "i32"),
            ScanfigError::conversion("b", "bool"),
        ]
        .into_iter()
        .collect();
        let err = errors.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot convert a to i32\ncannot convert b to bool"
        );
        assert_eq!(err.errors().len(), 2);
    }

    #[test]
    fn at_reaches_aggregate_members() {
        let root = NodePath::root("");
        let path = root.leaf("list");
        let errors: Errors = vec![ScanfigError::conversion("x", "i32")].into_iter().collect();
        let err = ScanfigError::Multiple(errors).at(&path);
        assert!(err.to_string().ends_with("at list"));
    }
}
