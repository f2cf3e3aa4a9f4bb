//! Planned edits to existing files.
//!
//! A plugin step describes what it wants to change as a [`MutationPlan`];
//! the marker engine applies it. Keeping the plan as data lets a dry run
//! print it and lets tests assert on it without a filesystem.

use std::fmt;

use crate::domain::{
    common::RelativePath,
    patch::{self, PatchError},
};

/// What to do with the region found at a mutation's anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOp {
    /// Insert `payload` right after the anchor. With `once`, the mutation
    /// is a no-op when the payload is already present anywhere in the file.
    InsertAfter { payload: String, once: bool },
    Comment { prefix: String },
    Uncomment { prefix: String },
    Replace { with: String },
}

/// Mutation kind without its payload, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    InsertAfter,
    Comment,
    Uncomment,
    Replace,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InsertAfter => "insert",
            Self::Comment => "comment",
            Self::Uncomment => "uncomment",
            Self::Replace => "replace",
        })
    }
}

/// How a missing anchor is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    #[default]
    Fail,
    /// The anchor may legitimately have been consumed by an earlier step.
    Skip,
}

/// Result of applying one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    Skipped,
}

/// One anchor-based edit to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    path: RelativePath,
    anchor: String,
    op: MutationOp,
    on_missing: MissingPolicy,
}

impl Mutation {
    fn new(path: RelativePath, anchor: impl Into<String>, op: MutationOp) -> Self {
        Self {
            path,
            anchor: anchor.into(),
            op,
            on_missing: MissingPolicy::Fail,
        }
    }

    pub fn insert_after(
        path: RelativePath,
        anchor: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self::new(
            path,
            anchor,
            MutationOp::InsertAfter {
                payload: payload.into(),
                once: false,
            },
        )
    }

    /// Insert unless the payload already appears in the file.
    pub fn insert_once(
        path: RelativePath,
        anchor: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self::new(
            path,
            anchor,
            MutationOp::InsertAfter {
                payload: payload.into(),
                once: true,
            },
        )
    }

    pub fn comment(path: RelativePath, anchor: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(
            path,
            anchor,
            MutationOp::Comment {
                prefix: prefix.into(),
            },
        )
    }

    pub fn uncomment(
        path: RelativePath,
        anchor: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self::new(
            path,
            anchor,
            MutationOp::Uncomment {
                prefix: prefix.into(),
            },
        )
    }

    pub fn replace(path: RelativePath, old: impl Into<String>, with: impl Into<String>) -> Self {
        Self::new(path, old, MutationOp::Replace { with: with.into() })
    }

    /// Treat a missing anchor as a logged no-op instead of an error.
    pub fn skip_if_missing(mut self) -> Self {
        self.on_missing = MissingPolicy::Skip;
        self
    }

    pub fn path(&self) -> &RelativePath {
        &self.path
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn op(&self) -> &MutationOp {
        &self.op
    }

    pub fn on_missing(&self) -> MissingPolicy {
        self.on_missing
    }

    pub fn kind(&self) -> MutationKind {
        match self.op {
            MutationOp::InsertAfter { .. } => MutationKind::InsertAfter,
            MutationOp::Comment { .. } => MutationKind::Comment,
            MutationOp::Uncomment { .. } => MutationKind::Uncomment,
            MutationOp::Replace { .. } => MutationKind::Replace,
        }
    }

    /// Apply to in-memory content.
    ///
    /// `Ok(None)` means the mutation was skipped and `content` is unchanged.
    pub fn apply_to(&self, content: &str) -> Result<Option<String>, PatchError> {
        let result = match &self.op {
            MutationOp::InsertAfter { payload, once } => {
                if *once && !payload.is_empty() && content.contains(payload.as_str()) {
                    return Ok(None);
                }
                patch::insert_after(content, &self.anchor, payload)
            }
            MutationOp::Comment { prefix } => patch::comment_region(content, &self.anchor, prefix),
            MutationOp::Uncomment { prefix } => {
                patch::uncomment_region(content, &self.anchor, prefix)
            }
            MutationOp::Replace { with } => patch::replace_first(content, &self.anchor, with),
        };

        match result {
            Ok(updated) => Ok(Some(updated)),
            Err(e) if e.is_not_found() && self.on_missing == MissingPolicy::Skip => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let anchor = self.anchor.lines().next().unwrap_or_default().trim();
        write!(f, "{} {} at '{}'", self.kind(), self.path, anchor)?;
        if self.on_missing == MissingPolicy::Skip {
            f.write_str(" (optional)")?;
        }
        Ok(())
    }
}

/// Ordered mutations for one plugin step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationPlan {
    mutations: Vec<Mutation>,
}

impl MutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn with(mut self, mutation: Mutation) -> Self {
        self.push(mutation);
        self
    }

    pub fn extend(&mut self, other: MutationPlan) {
        self.mutations.extend(other.mutations);
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.mutations.iter()
    }

    /// Mutations grouped by file, files in first-seen order, mutations in
    /// plan order within each file.
    pub fn by_file(&self) -> Vec<(&RelativePath, Vec<&Mutation>)> {
        let mut groups: Vec<(&RelativePath, Vec<&Mutation>)> = Vec::new();
        for mutation in &self.mutations {
            match groups.iter_mut().find(|(path, _)| *path == mutation.path()) {
                Some((_, list)) => list.push(mutation),
                None => groups.push((mutation.path(), vec![mutation])),
            }
        }
        groups
    }
}

impl<'a> IntoIterator for &'a MutationPlan {
    type Item = &'a Mutation;
    type IntoIter = std::slice::Iter<'a, Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.iter()
    }
}

impl fmt::Display for MutationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mutation in &self.mutations {
            writeln!(f, "{mutation}")?;
        }
        Ok(())
    }
}
