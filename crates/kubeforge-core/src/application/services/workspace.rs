//! Rendering and writing one plugin step against the project tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::application::{
    ApplicationError,
    ports::{Filesystem, TemplateRenderer},
    services::MarkerEngine,
};
use crate::domain::{
    IfExists, MutationOutcome, Permissions, RenderContext, RenderedFile, StepPlan, TemplateId,
};
use crate::error::ForgeResult;

/// Summary of an executed step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub mutations: Vec<MutationOutcome>,
}

/// The project tree as seen by one plugin step.
pub struct Workspace<'a> {
    fs: &'a dyn Filesystem,
    renderer: &'a dyn TemplateRenderer,
    root: PathBuf,
}

impl<'a> Workspace<'a> {
    pub fn new(
        fs: &'a dyn Filesystem,
        renderer: &'a dyn TemplateRenderer,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            renderer,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &dyn Filesystem {
        self.fs
    }

    pub fn render(&self, template: &str, context: &RenderContext) -> ForgeResult<RenderedFile> {
        self.renderer.render(&TemplateId::new(template), context)
    }

    /// Render several templates, stopping at the first failure.
    pub fn render_all(
        &self,
        templates: &[&str],
        context: &RenderContext,
    ) -> ForgeResult<Vec<RenderedFile>> {
        templates
            .iter()
            .map(|id| self.render(id, context))
            .collect()
    }

    /// Write the step's files and apply its mutations.
    ///
    /// Nothing is written until the whole step has been checked: file
    /// conflicts first, then every mutation, computed against the files this
    /// step is about to write. A `FileExists` or mutation failure therefore
    /// leaves the tree untouched.
    #[instrument(skip_all, fields(files = step.files.len(), mutations = step.mutations.len(), force))]
    pub fn execute(&self, step: &StepPlan, force: bool) -> ForgeResult<StepReport> {
        let mut report = StepReport::default();
        let mut staged = BTreeMap::new();
        let mut writes = Vec::new();

        for file in &step.files {
            let full = file.path.under(&self.root);
            match effective_policy(file.if_exists, force) {
                IfExists::Error if self.fs.exists(&full) => {
                    return Err(ApplicationError::FileExists { path: full }.into());
                }
                IfExists::Skip if self.fs.exists(&full) => {
                    debug!(path = %file.path, "file exists, keeping it");
                    report.skipped.push(full);
                }
                _ => {
                    staged.insert(full.clone(), file.content.clone());
                    writes.push((full, file));
                }
            }
        }

        let prepared = MarkerEngine::new(self.fs, &self.root).prepare(&step.mutations, &staged)?;
        let mut edits: BTreeMap<_, _> = prepared.edits.into_iter().collect();

        for (full, file) in writes {
            let content = edits.remove(&full).unwrap_or_else(|| file.content.clone());
            if let Some(parent) = full.parent() {
                self.fs.create_dir_all(parent)?;
            }
            self.fs.write(&full, content.as_bytes(), file.permissions)?;
            debug!(path = %file.path, "wrote file");
            report.written.push(full);
        }
        for (full, content) in edits {
            self.fs.write(&full, content.as_bytes(), Permissions::default())?;
            debug!(path = %full.display(), "wrote mutated file");
        }

        report.mutations = prepared.outcomes;
        info!(
            written = report.written.len(),
            mutations = report.mutations.len(),
            "step executed"
        );
        Ok(report)
    }
}

fn effective_policy(policy: IfExists, force: bool) -> IfExists {
    match policy {
        IfExists::Error if force => IfExists::Overwrite,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use crate::domain::{Mutation, MutationPlan, RelativePath};
    use crate::error::ErrorKind;

    /// Flat in-memory tree; directories are implied by file paths.
    #[derive(Default)]
    struct Tree {
        files: Mutex<BTreeMap<PathBuf, String>>,
    }

    impl Tree {
        fn with(files: &[(&str, &str)]) -> Self {
            let tree = Self::default();
            for (path, content) in files {
                tree.files
                    .lock()
                    .unwrap()
                    .insert(PathBuf::from(path), content.to_string());
            }
            tree
        }

        fn get(&self, path: &str) -> Option<String> {
            self.files.lock().unwrap().get(Path::new(path)).cloned()
        }
    }

    impl Filesystem for Tree {
        fn read(&self, path: &Path) -> ForgeResult<Vec<u8>> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .map(|content| content.as_bytes().to_vec())
                .ok_or_else(|| {
                    ApplicationError::FileNotFound {
                        path: path.to_path_buf(),
                    }
                    .into()
                })
        }

        fn write(&self, path: &Path, content: &[u8], _: Permissions) -> ForgeResult<()> {
            self.files.lock().unwrap().insert(
                path.to_path_buf(),
                String::from_utf8_lossy(content).into_owned(),
            );
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn create_dir_all(&self, _: &Path) -> ForgeResult<()> {
            Ok(())
        }
    }

    struct NoTemplates;

    impl TemplateRenderer for NoTemplates {
        fn render(&self, template: &TemplateId, _: &RenderContext) -> ForgeResult<RenderedFile> {
            Err(ApplicationError::TemplateRender {
                template: template.to_string(),
                reason: "no templates".into(),
            }
            .into())
        }

        fn has_template(&self, _: &TemplateId) -> bool {
            false
        }
    }

    fn rel(p: &str) -> RelativePath {
        RelativePath::new(p).unwrap()
    }

    fn file(path: &str, content: &str, if_exists: IfExists) -> RenderedFile {
        RenderedFile {
            path: rel(path),
            content: content.to_string(),
            permissions: Permissions::default(),
            if_exists,
        }
    }

    fn step(files: Vec<RenderedFile>, mutations: MutationPlan) -> StepPlan {
        StepPlan { files, mutations }
    }

    #[test]
    fn existing_file_is_refused_before_anything_is_written() {
        let tree = Tree::with(&[("/p/b.go", "old\n")]);
        let workspace = Workspace::new(&tree, &NoTemplates, "/p");
        let plan = step(
            vec![
                file("a.go", "new a\n", IfExists::Error),
                file("b.go", "new b\n", IfExists::Error),
            ],
            MutationPlan::new(),
        );

        let err = workspace.execute(&plan, false).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FileExists);
        assert_eq!(tree.get("/p/a.go"), None);
        assert_eq!(tree.get("/p/b.go").as_deref(), Some("old\n"));
    }

    #[test]
    fn skip_policy_keeps_existing_content_even_with_force() {
        let tree = Tree::with(&[("/p/config/crd/kustomization.yaml", "edited\n")]);
        let workspace = Workspace::new(&tree, &NoTemplates, "/p");
        let plan = step(
            vec![file("config/crd/kustomization.yaml", "fresh\n", IfExists::Skip)],
            MutationPlan::new(),
        );

        let report = workspace.execute(&plan, true).unwrap();

        assert_eq!(report.skipped, vec![PathBuf::from("/p/config/crd/kustomization.yaml")]);
        assert!(report.written.is_empty());
        assert_eq!(
            tree.get("/p/config/crd/kustomization.yaml").as_deref(),
            Some("edited\n")
        );
    }

    #[test]
    fn force_overwrites_files_that_would_conflict() {
        let tree = Tree::with(&[("/p/main.go", "old\n")]);
        let workspace = Workspace::new(&tree, &NoTemplates, "/p");
        let plan = step(vec![file("main.go", "new\n", IfExists::Error)], MutationPlan::new());

        let report = workspace.execute(&plan, true).unwrap();

        assert_eq!(report.written, vec![PathBuf::from("/p/main.go")]);
        assert_eq!(tree.get("/p/main.go").as_deref(), Some("new\n"));
    }

    #[test]
    fn mutations_see_files_written_by_the_same_step() {
        let tree = Tree::default();
        let workspace = Workspace::new(&tree, &NoTemplates, "/p");
        let plan = step(
            vec![file("k.yaml", "resources:\n#- ../webhook\n", IfExists::Error)],
            MutationPlan::new().with(Mutation::uncomment(rel("k.yaml"), "#- ../webhook\n", "#")),
        );

        let report = workspace.execute(&plan, false).unwrap();

        assert_eq!(report.mutations, vec![MutationOutcome::Applied]);
        assert_eq!(tree.get("/p/k.yaml").as_deref(), Some("resources:\n- ../webhook\n"));
    }

    #[test]
    fn failing_mutation_leaves_overwritable_files_alone() {
        let tree = Tree::with(&[
            ("/p/policy.yaml", "hand edited\n"),
            ("/p/k.yaml", "resources:\n- ../policy\n"),
        ]);
        let workspace = Workspace::new(&tree, &NoTemplates, "/p");
        let plan = step(
            vec![file("policy.yaml", "generated\n", IfExists::Error)],
            MutationPlan::new().with(Mutation::uncomment(rel("k.yaml"), "#- ../policy\n", "#")),
        );

        let err = workspace.execute(&plan, true).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MarkerNotFound);
        assert_eq!(tree.get("/p/policy.yaml").as_deref(), Some("hand edited\n"));
        assert_eq!(tree.get("/p/k.yaml").as_deref(), Some("resources:\n- ../policy\n"));
    }
}
