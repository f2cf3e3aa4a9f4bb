//! Applies marker mutations to files through the [`Filesystem`] port.
//!
//! Each file is read once, all of its mutations are applied in memory in
//! plan order, and it is written back once. A failing mutation leaves the
//! tree untouched. [`MarkerEngine::prepare`] stops before the write so a
//! caller can check a plan against files it has not written yet.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ports::Filesystem};
use crate::domain::{Mutation, MutationOutcome, MutationPlan, Permissions, RelativePath};
use crate::error::ForgeResult;

/// Marker engine bound to one filesystem and project root.
pub struct MarkerEngine<'a> {
    fs: &'a dyn Filesystem,
    root: PathBuf,
}

impl<'a> MarkerEngine<'a> {
    pub fn new(fs: &'a dyn Filesystem, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    /// Insert `payload` right after the first occurrence of `anchor`.
    pub fn insert_after(
        &self,
        path: RelativePath,
        anchor: &str,
        payload: &str,
    ) -> ForgeResult<MutationOutcome> {
        self.apply_one(&Mutation::insert_after(path, anchor, payload))
    }

    /// Prefix every line of the region `anchor` with `prefix`.
    pub fn comment_region(
        &self,
        path: RelativePath,
        anchor: &str,
        prefix: &str,
    ) -> ForgeResult<MutationOutcome> {
        self.apply_one(&Mutation::comment(path, anchor, prefix))
    }

    /// Strip `prefix` from every line of the commented region `anchor`.
    pub fn uncomment_region(
        &self,
        path: RelativePath,
        anchor: &str,
        prefix: &str,
    ) -> ForgeResult<MutationOutcome> {
        self.apply_one(&Mutation::uncomment(path, anchor, prefix))
    }

    /// Replace the first occurrence of `old` with `new`.
    pub fn replace(&self, path: RelativePath, old: &str, new: &str) -> ForgeResult<MutationOutcome> {
        self.apply_one(&Mutation::replace(path, old, new))
    }

    pub fn apply_one(&self, mutation: &Mutation) -> ForgeResult<MutationOutcome> {
        let full = mutation.path().under(&self.root);
        let content = self.fs.read_to_string(&full)?;
        let (updated, outcome) = apply_in_memory(&full, content, mutation)?;
        if outcome == MutationOutcome::Applied {
            self.fs.write(&full, updated.as_bytes(), Permissions::default())?;
        }
        Ok(outcome)
    }

    /// Apply a plan.
    ///
    /// Every file's new content is computed before anything is written, so a
    /// failing mutation leaves the whole plan unapplied. A write failure
    /// part way through is not rolled back.
    #[instrument(skip_all, fields(mutations = plan.len()))]
    pub fn apply(&self, plan: &MutationPlan) -> ForgeResult<Vec<MutationOutcome>> {
        let prepared = self.prepare(plan, &BTreeMap::new())?;
        for (full, content) in &prepared.edits {
            debug!(path = %full.display(), "writing mutated file");
            self.fs.write(full, content.as_bytes(), Permissions::default())?;
        }
        Ok(prepared.outcomes)
    }

    /// Compute the result of a plan without writing.
    ///
    /// `staged` holds content that is about to be written by the same step
    /// and takes precedence over what is on the filesystem.
    pub fn prepare(
        &self,
        plan: &MutationPlan,
        staged: &BTreeMap<PathBuf, String>,
    ) -> ForgeResult<PreparedEdits> {
        let mut prepared = PreparedEdits::default();

        for (path, mutations) in plan.by_file() {
            let full = path.under(&self.root);
            let mut content = match staged.get(&full) {
                Some(content) => content.clone(),
                None => self.fs.read_to_string(&full)?,
            };
            let mut changed = false;

            for mutation in mutations {
                let (updated, outcome) = apply_in_memory(&full, content, mutation)?;
                content = updated;
                changed |= outcome == MutationOutcome::Applied;
                prepared.outcomes.push(outcome);
            }

            if changed {
                prepared.edits.push((full, content));
            }
        }

        Ok(prepared)
    }
}

/// Outcome of [`MarkerEngine::prepare`]: the new content of each changed
/// file, and one outcome per mutation in plan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedEdits {
    pub edits: Vec<(PathBuf, String)>,
    pub outcomes: Vec<MutationOutcome>,
}

fn apply_in_memory(
    full: &Path,
    content: String,
    mutation: &Mutation,
) -> ForgeResult<(String, MutationOutcome)> {
    match mutation.apply_to(&content) {
        Ok(Some(updated)) => Ok((updated, MutationOutcome::Applied)),
        Ok(None) => {
            warn!(mutation = %mutation, "anchor already consumed, skipping");
            Ok((content, MutationOutcome::Skipped))
        }
        Err(source) => Err(ApplicationError::Mutation {
            path: full.to_path_buf(),
            operation: mutation.kind(),
            source,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::PatchError;
    use crate::error::{ErrorKind, ForgeError};

    mockall::mock! {
        Fs {}
        impl Filesystem for Fs {
            fn read(&self, path: &Path) -> ForgeResult<Vec<u8>>;
            fn write(&self, path: &Path, content: &[u8], permissions: Permissions) -> ForgeResult<()>;
            fn exists(&self, path: &Path) -> bool;
            fn create_dir_all(&self, path: &Path) -> ForgeResult<()>;
        }
    }

    fn rel(p: &str) -> RelativePath {
        RelativePath::new(p).unwrap()
    }

    #[test]
    fn missing_anchor_never_writes() {
        let mut fs = MockFs::new();
        fs.expect_read()
            .withf(|path| path == Path::new("/p/cmd/main.go"))
            .returning(|_| Ok(b"package main\n".to_vec()));
        fs.expect_write().never();

        let engine = MarkerEngine::new(&fs, "/p");
        let err = engine
            .insert_after(rel("cmd/main.go"), "// +kubeforge:scaffold:imports", "x")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MarkerNotFound);
        match err {
            ForgeError::Application(ApplicationError::Mutation { path, source, .. }) => {
                assert_eq!(path, PathBuf::from("/p/cmd/main.go"));
                assert!(matches!(source, PatchError::MarkerNotFound { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plan_writes_each_file_once() {
        let mut fs = MockFs::new();
        fs.expect_read()
            .returning(|_| Ok(b"a: 1\n#b: 2\nc: 3\n".to_vec()));
        fs.expect_write()
            .withf(|path, content, _| {
                path == Path::new("/p/x.yaml") && content == b"a: 10\nb: 2\nc: 3\n"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let plan = MutationPlan::new()
            .with(Mutation::replace(rel("x.yaml"), "a: 1\n", "a: 10\n"))
            .with(Mutation::uncomment(rel("x.yaml"), "#b: 2", "#"));

        let outcomes = MarkerEngine::new(&fs, "/p").apply(&plan).unwrap();
        assert_eq!(outcomes, vec![MutationOutcome::Applied, MutationOutcome::Applied]);
    }

    #[test]
    fn failure_mid_file_leaves_it_untouched() {
        let mut fs = MockFs::new();
        fs.expect_read().returning(|_| Ok(b"a: 1\n".to_vec()));
        fs.expect_write().never();

        let plan = MutationPlan::new()
            .with(Mutation::replace(rel("x.yaml"), "a: 1", "a: 2"))
            .with(Mutation::replace(rel("x.yaml"), "zzz", "y"));

        let err = MarkerEngine::new(&fs, "/p").apply(&plan).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TextNotFound);
    }

    #[test]
    fn failure_in_later_file_writes_nothing() {
        let mut fs = MockFs::new();
        fs.expect_read().returning(|_| Ok(b"a: 1\n".to_vec()));
        fs.expect_write().never();

        let plan = MutationPlan::new()
            .with(Mutation::replace(rel("first.yaml"), "a: 1", "a: 2"))
            .with(Mutation::replace(rel("second.yaml"), "zzz", "y"));

        assert!(MarkerEngine::new(&fs, "/p").apply(&plan).is_err());
    }

    #[test]
    fn skipped_only_file_is_not_rewritten() {
        let mut fs = MockFs::new();
        fs.expect_read().returning(|_| Ok(b"- ../webhook\n".to_vec()));
        fs.expect_write().never();

        let plan = MutationPlan::new()
            .with(Mutation::uncomment(rel("k.yaml"), "#- ../webhook", "#").skip_if_missing());
        let outcomes = MarkerEngine::new(&fs, "/p").apply(&plan).unwrap();
        assert_eq!(outcomes, vec![MutationOutcome::Skipped]);
    }

    #[test]
    fn prepare_reads_staged_content_first_and_writes_nothing() {
        let mut fs = MockFs::new();
        fs.expect_read().never();
        fs.expect_write().never();

        let full = PathBuf::from("/p/config/manager/manager.yaml");
        let staged = BTreeMap::from([(full.clone(), "# seccompProfile\n".to_string())]);
        let plan = MutationPlan::new().with(Mutation::uncomment(
            rel("config/manager/manager.yaml"),
            "# seccompProfile\n",
            "# ",
        ));

        let prepared = MarkerEngine::new(&fs, "/p").prepare(&plan, &staged).unwrap();
        assert_eq!(prepared.edits, vec![(full, "seccompProfile\n".to_string())]);
        assert_eq!(prepared.outcomes, vec![MutationOutcome::Applied]);
    }

    #[test]
    fn read_errors_propagate() {
        let mut fs = MockFs::new();
        fs.expect_read().returning(|p| {
            Err(ApplicationError::FileNotFound {
                path: p.to_path_buf(),
            }
            .into())
        });

        let err = MarkerEngine::new(&fs, "/p")
            .replace(rel("gone.yaml"), "a", "b")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }
}
