use crate::error::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::str::FromStr;

/// One JSON document on durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Links,
    Categories,
    Tags,
    Settings,
}

impl Resource {
    /// Every resource, in lock acquisition order.
    pub const ALL: [Resource; 4] = [
        Resource::Links,
        Resource::Categories,
        Resource::Tags,
        Resource::Settings,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Resource::Links => "links.json",
            Resource::Categories => "categories.json",
            Resource::Tags => "tags.json",
            Resource::Settings => "settings.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Links => "links",
            Resource::Categories => "categories",
            Resource::Tags => "tags",
            Resource::Settings => "settings",
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Fingerprint of a stored document.
///
/// Two reads return the same revision iff the document bytes are identical,
/// which lets writers detect that someone else wrote in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision(u64);

impl Revision {
    /// Revision of a resource that does not exist yet.
    pub const MISSING: Revision = Revision(0);

    /// Leading 64 bits of the SHA-256 of `contents`, stable across builds.
    pub fn of(contents: &str) -> Self {
        let digest = Sha256::digest(contents.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        // keep 0 reserved for MISSING
        Self(u64::from_be_bytes(prefix).max(1))
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Accepts the bare hex form as well as a quoted (optionally weak) entity tag.
impl FromStr for Revision {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix("W/").unwrap_or(trimmed);
        let trimmed = trimmed.trim_matches('"');
        u64::from_str_radix(trimmed, 16).map(Revision)
    }
}

/// Raw result of reading one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Loaded(String),
    Missing,
}

/// Byte-level persistence of whole JSON documents.
///
/// Implementations replace a document in a single step: a concurrent reader
/// sees either the old or the new contents, never a mix.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Reads the full document. An absent or empty document is `Missing`.
    async fn read(&self, resource: Resource) -> Result<ReadOutcome, StorageError>;

    /// Overwrites the full document.
    async fn write(&self, resource: Resource, contents: &str) -> Result<(), StorageError>;

    /// Checks whether the document exists.
    async fn exists(&self, resource: Resource) -> Result<bool, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_tracks_contents() {
        assert_eq!(Revision::of("[]"), Revision::of("[]"));
        assert_ne!(Revision::of("[]"), Revision::of("[{}]"));
        assert_ne!(Revision::of("[]"), Revision::MISSING);
    }

    #[test]
    fn revision_is_sha256_prefix() {
        // sha256("[]") = 4f53cda18c2baa0c...
        assert_eq!(Revision::of("[]").to_string(), "4f53cda18c2baa0c");
    }

    #[test]
    fn revision_parses_entity_tags() {
        let revision = Revision::of("[1,2,3]");
        let tag = format!("\"{revision}\"");

        assert_eq!(tag.parse::<Revision>().unwrap(), revision);
        assert_eq!(format!("W/{tag}").parse::<Revision>().unwrap(), revision);
        assert_eq!(revision.to_string().parse::<Revision>().unwrap(), revision);
        assert!("\"not-hex\"".parse::<Revision>().is_err());
    }

    #[test]
    fn file_names() {
        assert_eq!(Resource::Links.file_name(), "links.json");
        assert_eq!(Resource::Settings.to_string(), "settings.json");
    }
}
