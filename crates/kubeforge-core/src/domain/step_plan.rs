use crate::domain::{mutation::MutationPlan, render::RenderedFile};

/// Everything one plugin step will do: files to create, then mutations to
/// apply to files that already exist (or were just created).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepPlan {
    pub files: Vec<RenderedFile>,
    pub mutations: MutationPlan,
}

impl StepPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.mutations.is_empty()
    }
}
