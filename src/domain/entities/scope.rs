use serde::{Deserialize, Serialize};

/// The retrieval boundary for one chat turn.
///
/// Callers must name the scope explicitly; there is no implicit widening to
/// "everything the user owns" when a file or folder id is missing. Folder
/// membership is supplied by the caller since folder persistence lives
/// outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetrievalScope {
    File {
        file_id: String,
    },
    Folder {
        folder_id: String,
        file_ids: Vec<String>,
    },
    AllDocuments,
}

impl RetrievalScope {
    pub fn file(file_id: impl Into<String>) -> Self {
        Self::File {
            file_id: file_id.into(),
        }
    }

    pub fn folder(folder_id: impl Into<String>, file_ids: Vec<String>) -> Self {
        Self::Folder {
            folder_id: folder_id.into(),
            file_ids,
        }
    }
}

/// Metadata filter applied to every index query.
///
/// `user_id` is the access-control dimension and is always present; the
/// constructors are the only way to build a filter, so a query can never
/// reach the index without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFilter {
    pub user_id: String,
    pub file_id: Option<String>,
    pub folder_id: Option<String>,
}

impl ChunkFilter {
    /// Single-file chat: `file_id == F AND user_id == U`.
    pub fn for_file(user_id: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            file_id: Some(file_id.into()),
            folder_id: None,
        }
    }

    /// Folder chat: `folder_id == D AND user_id == U`.
    pub fn for_folder(user_id: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            file_id: None,
            folder_id: Some(folder_id.into()),
        }
    }

    /// User-wide retrieval: `user_id == U` alone.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            file_id: None,
            folder_id: None,
        }
    }
}
