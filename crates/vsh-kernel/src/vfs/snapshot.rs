//! Serializable filesystem snapshots.
//!
//! A snapshot is the whole tree as plain serde data. `serde_json` is the byte
//! format handed to a [`PersistenceStore`](crate::persist::PersistenceStore).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vsh_types::NodeKind;

use super::mode::Mode;
use super::node::Node;
use super::path::is_valid_name;
use crate::error::{ShellError, ShellResult};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A full copy of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub root: SnapshotNode,
}

/// One node in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub kind: NodeKind,
    pub owner: String,
    pub group: String,
    pub mode: u16,
    pub mtime: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<u8>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, SnapshotNode>,
}

impl Snapshot {
    pub(crate) fn capture(root: &Node) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            root: SnapshotNode::from(root),
        }
    }

    pub fn to_bytes(&self) -> ShellResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> ShellResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Validate and rebuild the tree.
    pub(crate) fn into_tree(self) -> ShellResult<Node> {
        if self.version != SNAPSHOT_VERSION {
            return Err(ShellError::Persistence(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if self.root.kind != NodeKind::Directory {
            return Err(ShellError::Persistence("snapshot root is not a directory".into()));
        }
        self.root.into_node("/")
    }
}

impl From<&Node> for SnapshotNode {
    fn from(node: &Node) -> Self {
        Self {
            kind: node.kind,
            owner: node.owner.clone(),
            group: node.group.clone(),
            mode: node.mode.bits(),
            mtime: node.mtime,
            content: node.content.clone(),
            children: node
                .children
                .iter()
                .map(|(name, child)| (name.clone(), SnapshotNode::from(child)))
                .collect(),
        }
    }
}

impl SnapshotNode {
    fn into_node(self, path: &str) -> ShellResult<Node> {
        let bad = |why: &str| ShellError::Persistence(format!("{}: {}", path, why));
        if self.mode > 0o7777 {
            return Err(bad("mode out of range"));
        }
        if self.owner.is_empty() || self.group.is_empty() {
            return Err(bad("missing owner or group"));
        }
        match self.kind {
            NodeKind::File if !self.children.is_empty() => return Err(bad("file has children")),
            NodeKind::Directory if !self.content.is_empty() => {
                return Err(bad("directory has content"))
            }
            _ => {}
        }

        let mut children = BTreeMap::new();
        for (name, child) in self.children {
            if !is_valid_name(&name) {
                return Err(bad(&format!("invalid entry name '{}'", name)));
            }
            let child_path = if path == "/" {
                format!("/{}", name)
            } else {
                format!("{}/{}", path, name)
            };
            let node = child.into_node(&child_path)?;
            children.insert(name, node);
        }

        Ok(Node {
            kind: self.kind,
            owner: self.owner,
            group: self.group,
            mode: Mode::new(self.mode),
            mtime: self.mtime,
            content: self.content,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::vfs::NodeStore;

    fn populated() -> NodeStore {
        let store = NodeStore::new();
        let root = Identity::root();
        store.create_directory("/etc", &root, false).unwrap();
        store.create_file("/etc/motd", b"welcome\n".to_vec(), &root, false).unwrap();
        store.create_directory("/tmp", &root, false).unwrap();
        store.set_mode("/tmp", Mode::new(0o1777), &root).unwrap();
        store
    }

    #[test]
    fn snapshot_restores_tree() {
        let store = populated();
        let bytes = store.snapshot().unwrap().to_bytes().unwrap();

        let fresh = NodeStore::new();
        fresh.restore(Snapshot::from_bytes(&bytes).unwrap()).unwrap();
        assert_eq!(fresh.get_node("/").unwrap(), store.get_node("/").unwrap());
        assert_eq!(fresh.stat("/tmp").unwrap().mode, Mode::new(0o1777));
    }

    #[test]
    fn invalid_snapshot_keeps_current_tree() {
        let store = populated();
        let mut snapshot = store.snapshot().unwrap();
        snapshot
            .root
            .children
            .insert("..".into(), snapshot.root.children["etc"].clone());

        let err = store.restore(snapshot).unwrap_err();
        assert_eq!(err.kind(), vsh_types::ErrorKind::PersistenceError);
        assert!(store.exists("/etc/motd"));
    }

    #[test]
    fn file_root_is_rejected() {
        let mut snapshot = populated().snapshot().unwrap();
        snapshot.root.kind = NodeKind::File;
        snapshot.root.children.clear();
        assert!(snapshot.into_tree().is_err());
    }

    #[test]
    fn garbage_bytes_are_persistence_errors() {
        let err = Snapshot::from_bytes(b"not json").unwrap_err();
        assert_eq!(err.kind(), vsh_types::ErrorKind::PersistenceError);
    }
}
