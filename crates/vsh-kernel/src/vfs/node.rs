//! Filesystem nodes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use vsh_types::{Access, NodeKind};

use super::mode::{has_permission, Mode, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};
use crate::identity::Identity;

/// A file or directory.
///
/// Nodes own their children; there is no pointer back to the parent. The
/// parent of a node is found by resolving the parent path from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub owner: String,
    pub group: String,
    pub mode: Mode,
    pub mtime: DateTime<Utc>,
    /// File payload. Always empty for directories.
    pub content: Vec<u8>,
    /// Directory entries by name. Always empty for files.
    pub children: BTreeMap<String, Node>,
}

impl Node {
    /// A new empty directory owned by `identity` with mode 0755.
    pub fn directory(identity: &Identity) -> Self {
        Self {
            kind: NodeKind::Directory,
            owner: identity.user.clone(),
            group: identity.primary_group().to_string(),
            mode: DEFAULT_DIR_MODE,
            mtime: Utc::now(),
            content: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    /// A new file owned by `identity` with mode 0644.
    pub fn file(identity: &Identity, content: Vec<u8>) -> Self {
        Self {
            kind: NodeKind::File,
            owner: identity.user.clone(),
            group: identity.primary_group().to_string(),
            mode: DEFAULT_FILE_MODE,
            mtime: Utc::now(),
            content,
            children: BTreeMap::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn touch(&mut self) {
        self.mtime = Utc::now();
    }

    pub fn has_permission(&self, identity: &Identity, access: Access) -> bool {
        has_permission(&self.owner, &self.group, self.mode, identity, access)
    }

    /// `ls -l` style mode string for this node.
    pub fn format_mode(&self) -> String {
        self.mode.format_mode(self.kind)
    }

    /// Size under per-level aggregation.
    ///
    /// A file reports its payload length. A directory reports the sum of its
    /// immediate file children's payloads; nested directories add nothing.
    pub fn size(&self) -> u64 {
        match self.kind {
            NodeKind::File => self.content.len() as u64,
            NodeKind::Directory => self
                .children
                .values()
                .filter(|c| c.is_file())
                .map(|c| c.content.len() as u64)
                .sum(),
        }
    }

    /// Copy of the node's metadata without children or content.
    pub(crate) fn metadata_only(&self) -> Node {
        Node {
            kind: self.kind,
            owner: self.owner.clone(),
            group: self.group.clone(),
            mode: self.mode,
            mtime: self.mtime,
            content: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.values().map(Node::count).sum::<usize>()
    }
}
