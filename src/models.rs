//! Wire records exchanged with the coordinator
//!
//! Field names follow the coordinator's camelCase JSON. Replies default
//! missing fields so an older coordinator can omit empty payloads.

use serde::{Deserialize, Serialize};

/// Read consistency requested for stat and list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadMode {
    /// Consistent read of the latest metadata
    Latest,
    /// Bounded-delay read (about 50ms behind)
    #[default]
    Stale,
}

impl ReadMode {
    pub fn is_latest(self) -> bool {
        self == ReadMode::Latest
    }
}

impl std::fmt::Display for ReadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadMode::Latest => write!(f, "l"),
            ReadMode::Stale => write!(f, "s"),
        }
    }
}

impl std::str::FromStr for ReadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l" => Ok(ReadMode::Latest),
            "s" => Ok(ReadMode::Stale),
            _ => Err(format!("Invalid mode: {}. Use l (latest) or s (stale)", s)),
        }
    }
}

/// Validate an add before any data moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareAddRequest {
    /// Remote destination path
    pub path: String,
    pub file_name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrepareAddReply {
    /// Node the coordinator created (and locked) for the new file
    pub file_node_id: String,
    pub chunk_num: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRequest {
    pub path: String,
    pub is_latest: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatReply {
    pub file_name: String,
    pub is_directory: bool,
    pub size: u64,
    /// Unix seconds
    pub mod_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub path: String,
    pub is_latest: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileInfo {
    pub file_name: String,
    pub is_directory: bool,
    pub size: u64,
    pub mod_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListReply {
    pub files: Vec<FileInfo>,
}

/// Ask for the storage nodes that receive one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateNodesRequest {
    pub file_node_id: String,
    pub chunk_index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AllocateNodesReply {
    pub data_node_ids: Vec<String>,
    #[serde(rename = "dataNodeAdrs")]
    pub data_node_addrs: Vec<String>,
}

impl AllocateNodesReply {
    /// (id, address) pairs; unmatched trailing entries are dropped
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data_node_ids
            .iter()
            .zip(&self.data_node_addrs)
            .map(|(id, addr)| (id.as_str(), addr.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockDirectoryRequest {
    pub file_node_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnlockDirectoryReply {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseLeaseRequest {
    pub file_node_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleaseLeaseReply {
    pub success: bool,
}
