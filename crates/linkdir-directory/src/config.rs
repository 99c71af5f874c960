use std::fmt::{Display, Formatter};
use typed_builder::TypedBuilder;

/// Whether renaming a category or tag rewrites the links that reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenamePolicy {
    /// Rewrite every referencing link to the new name.
    #[default]
    Cascade,
    /// Leave links pointing at the old name.
    Preserve,
}

/// What a batch import does with a candidate whose name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Report the candidate as failed with reason `duplicate`.
    #[default]
    Skip,
    /// Merge the candidate into the stored link.
    Overwrite,
}

impl Display for RenamePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RenamePolicy::Cascade => write!(f, "cascade"),
            RenamePolicy::Preserve => write!(f, "preserve"),
        }
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct DirectoryConfig {
    #[builder(default)]
    pub rename_policy: RenamePolicy,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Copy, Default, TypedBuilder)]
pub struct ImportOptions {
    #[builder(default)]
    pub duplicates: DuplicatePolicy,
}
