//! Source type identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a type in the origin type system.
///
/// A source type is identified by its namespace and name. The qualified
/// name joins both with a `.`, or is just the name for the root namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceType {
    namespace: String,
    name: String,
}

impl SourceType {
    /// Create a new source type identity.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse a qualified name (`a.b.Name`) into a source type.
    ///
    /// Generic argument lists are kept as part of the name, so `a.Page<b.User>`
    /// splits at the last `.` before the first `<`.
    pub fn parse(qualified: &str) -> Self {
        let head_end = qualified.find('<').unwrap_or(qualified.len());
        match qualified[..head_end].rfind('.') {
            Some(idx) => Self::new(&qualified[..idx], &qualified[idx + 1..]),
            None => Self::new("", qualified),
        }
    }

    /// The namespace, empty for the root namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The unqualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fully qualified name.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// The generic family this type belongs to: the qualified name with any
    /// generic argument list removed.
    pub fn family_name(&self) -> String {
        family_of(&self.qualified_name())
    }

    /// Folder derived from the namespace when nothing else is configured.
    ///
    /// `app.models.User` derives `app/models/User`.
    pub fn default_folder(&self) -> String {
        let base = strip_generics(&self.name);
        if self.namespace.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", self.namespace.replace('.', "/"), base)
        }
    }

    /// File name derived from the type name when nothing else is configured.
    pub fn default_file_name(&self) -> String {
        strip_generics(&self.name).to_string()
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}

/// Remove a trailing generic argument list from a type name.
pub(crate) fn strip_generics(name: &str) -> &str {
    match name.find('<') {
        Some(idx) => name[..idx].trim_end(),
        None => name,
    }
}

/// Family name of a qualified type name.
pub(crate) fn family_of(qualified: &str) -> String {
    strip_generics(qualified).to_string()
}
