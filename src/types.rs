// src/types.rs

//! Small shared types: field identifiers, field sets and trace ids.

use std::collections::BTreeSet;
use std::fmt;

/// Identifier of one unit of data exchanged between tasks (e.g. `"user_base"`).
pub type FieldId = String;

/// Ordered set of field identifiers.
///
/// Ordering is stable so that graph edges (and therefore logs and dry-run
/// output) come out the same way on every build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(BTreeSet<FieldId>);

impl FieldSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn insert(&mut self, field: impl Into<FieldId>) -> bool {
        self.0.insert(field.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }
}

impl<S: Into<FieldId>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<FieldId>, const N: usize> From<[S; N]> for FieldSet {
    fn from(fields: [S; N]) -> Self {
        fields.into_iter().collect()
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Invocation-scoped trace identifier.
///
/// Every call to `Engine::execute` gets one; it is handed to each task via
/// [`crate::task::TaskContext`] and recorded on the invocation's tracing span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(pub u64);

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
