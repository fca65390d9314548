//! Provenance: where a scanned blob came from. Shared by the scan and
//! validate cores; neither interprets it beyond `kind()`/`path()`.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Free-form commit metadata carried alongside a git provenance entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitMetadata {
    pub commit_id: Option<String>,
    pub author: Option<String>,
    pub message: Option<String>,
}

/// Where a scanned blob's bytes were read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    File {
        path: PathBuf,
    },
    Git {
        repo_path: PathBuf,
        blob_path_in_commit: PathBuf,
        commit_metadata: Option<CommitMetadata>,
    },
    Archive {
        archive_path: PathBuf,
        member_path: PathBuf,
    },
    Extended {
        payload: String,
    },
}

impl Provenance {
    /// A short tag identifying the variant, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            Provenance::File { .. } => "file",
            Provenance::Git { .. } => "git",
            Provenance::Archive { .. } => "archive",
            Provenance::Extended { .. } => "extended",
        }
    }

    /// A displayable path for this provenance, used in human-facing output.
    pub fn path(&self) -> &Path {
        match self {
            Provenance::File { path } => path,
            Provenance::Git {
                blob_path_in_commit,
                ..
            } => blob_path_in_commit,
            Provenance::Archive { member_path, .. } => member_path,
            Provenance::Extended { payload } => Path::new(payload.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_path_match_the_variant() {
        let p = Provenance::File {
            path: PathBuf::from("src/main.rs"),
        };
        assert_eq!(p.kind(), "file");
        assert_eq!(p.path(), Path::new("src/main.rs"));

        let g = Provenance::Git {
            repo_path: PathBuf::from("/repo"),
            blob_path_in_commit: PathBuf::from("a/b.rs"),
            commit_metadata: None,
        };
        assert_eq!(g.kind(), "git");
        assert_eq!(g.path(), Path::new("a/b.rs"));
    }
}
