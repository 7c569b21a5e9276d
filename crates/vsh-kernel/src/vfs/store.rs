//! The node store: one in-memory tree behind one lock.
//!
//! Every public method takes the lock once and checks what it needs before
//! it mutates. `delete_recursive` is the exception: it reports per-entry
//! failures and keeps going.
//!
//! The lock is a `std::sync::RwLock` and is never held across an await.
//! Paths handed to the store are absolute; they may still contain `.` and
//! `..` components, which are checked as entry names before resolution.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use vsh_types::{Access, NodeKind};

use super::mode::{has_permission, Mode};
use super::node::Node;
use super::path::{components, is_valid_name, is_within, resolve, split_parent};
use super::snapshot::Snapshot;
use crate::error::{ShellError, ShellResult};
use crate::identity::Identity;

/// How `write_file` treats existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}

/// Metadata for one node, without its children or payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    /// Normalized absolute path.
    pub path: String,
    /// Final path component, `/` for the root.
    pub name: String,
    pub kind: NodeKind,
    pub owner: String,
    pub group: String,
    pub mode: Mode,
    /// Size under per-level aggregation (see [`Node::size`]).
    pub size: u64,
    pub mtime: DateTime<Utc>,
    /// Number of immediate children.
    pub entries: usize,
}

impl Stat {
    fn of(path: &str, node: &Node) -> Self {
        let name = split_parent(path)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| "/".to_string());
        Self {
            path: path.to_string(),
            name,
            kind: node.kind,
            owner: node.owner.clone(),
            group: node.group.clone(),
            mode: node.mode,
            size: node.size(),
            mtime: node.mtime,
            entries: node.children.len(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn has_permission(&self, identity: &Identity, access: Access) -> bool {
        has_permission(&self.owner, &self.group, self.mode, identity, access)
    }

    /// `ls -l` style mode string.
    pub fn format_mode(&self) -> String {
        self.mode.format_mode(self.kind)
    }
}

/// Outcome of a recursive delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Nodes actually removed, descendants included.
    pub deleted_count: usize,
    /// Entries that could not be removed. They and their ancestors remain.
    pub errors: Vec<ShellError>,
}

/// The virtual filesystem.
#[derive(Debug)]
pub struct NodeStore {
    root: RwLock<Node>,
}

impl NodeStore {
    /// Create a store with an empty root directory owned by the superuser,
    /// mode 0755.
    pub fn new() -> Self {
        Self::with_root(Node::directory(&Identity::root()))
    }

    fn with_root(root: Node) -> Self {
        Self {
            root: RwLock::new(root),
        }
    }

    fn read(&self) -> ShellResult<RwLockReadGuard<'_, Node>> {
        self.root
            .read()
            .map_err(|_| ShellError::InvalidOperation("node store lock poisoned".into()))
    }

    fn write(&self) -> ShellResult<RwLockWriteGuard<'_, Node>> {
        self.root
            .write()
            .map_err(|_| ShellError::InvalidOperation("node store lock poisoned".into()))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    /// A copy of the node at `path`, children included.
    pub fn get_node(&self, path: &str) -> ShellResult<Node> {
        let path = resolve(path, "/");
        let root = self.read()?;
        lookup(&root, &path).cloned()
    }

    pub fn stat(&self, path: &str) -> ShellResult<Stat> {
        let path = resolve(path, "/");
        let root = self.read()?;
        lookup(&root, &path).map(|node| Stat::of(&path, node))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.stat(path).is_ok()
    }

    /// Size of the node at `path` under per-level aggregation.
    pub fn compute_size(&self, path: &str) -> ShellResult<u64> {
        self.stat(path).map(|s| s.size)
    }

    pub fn read_file(&self, path: &str, identity: &Identity) -> ShellResult<Vec<u8>> {
        let path = resolve(path, "/");
        let root = self.read()?;
        let node = lookup(&root, &path)?;
        if node.is_dir() {
            return Err(ShellError::IsADirectory(path));
        }
        if !node.has_permission(identity, Access::Read) {
            return Err(ShellError::Permission(path));
        }
        Ok(node.content.clone())
    }

    /// Entries of a directory, sorted by name.
    pub fn list_dir(&self, path: &str, identity: &Identity) -> ShellResult<Vec<Stat>> {
        let path = resolve(path, "/");
        let root = self.read()?;
        let node = lookup(&root, &path)?;
        if !node.is_dir() {
            return Err(ShellError::NotADirectory(path));
        }
        if !node.has_permission(identity, Access::Read) {
            return Err(ShellError::Permission(path));
        }
        Ok(node
            .children
            .iter()
            .map(|(name, child)| Stat::of(&child_path(&path, name), child))
            .collect())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Creation and writes
    // ═══════════════════════════════════════════════════════════════════

    /// Create or overwrite a file.
    ///
    /// With `create_parents`, missing ancestors are created as directories
    /// owned by `identity`.
    pub fn create_file(
        &self,
        path: &str,
        content: Vec<u8>,
        identity: &Identity,
        create_parents: bool,
    ) -> ShellResult<()> {
        let (parent, name) = entry_target(path)?;
        let mut root = self.write()?;

        if create_parents {
            // The parent sits above the leaf, so a file there is not a directory.
            ensure_directories(&mut root, &parent, identity, true).map_err(|e| match e {
                ShellError::AlreadyExists(path) => ShellError::NotADirectory(path),
                other => other,
            })?;
        }
        let dir = lookup_parent_mut(&mut root, &parent)?;
        put_file(dir, &child_path(&parent, &name), &name, content, WriteMode::Truncate, identity)
    }

    /// Write bytes to a file, creating it when absent.
    pub fn write_file(
        &self,
        path: &str,
        content: &[u8],
        mode: WriteMode,
        identity: &Identity,
    ) -> ShellResult<()> {
        let (parent, name) = entry_target(path)?;
        let mut root = self.write()?;
        let dir = lookup_parent_mut(&mut root, &parent)?;
        put_file(dir, &child_path(&parent, &name), &name, content.to_vec(), mode, identity)
    }

    /// Create a directory, returning how many directories were created.
    ///
    /// With `create_parents` the call is idempotent: an existing directory
    /// reports 0 instead of `AlreadyExists`.
    pub fn create_directory(
        &self,
        path: &str,
        identity: &Identity,
        create_parents: bool,
    ) -> ShellResult<usize> {
        let (parent, name) = entry_target(path)?;
        let target = child_path(&parent, &name);
        let mut root = self.write()?;
        ensure_directories(&mut root, &target, identity, create_parents)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Removal and renames
    // ═══════════════════════════════════════════════════════════════════

    /// Delete a file or directory tree.
    ///
    /// A non-empty directory needs `force`. Entries the caller may not
    /// remove are reported in [`DeleteReport::errors`] and stay in place
    /// along with their ancestors.
    pub fn delete_recursive(
        &self,
        path: &str,
        identity: &Identity,
        force: bool,
    ) -> ShellResult<DeleteReport> {
        let (parent, name) = entry_target(path)?;
        let target = child_path(&parent, &name);
        let mut root = self.write()?;
        let dir = lookup_parent_mut(&mut root, &parent)?;

        let node = dir
            .children
            .get(&name)
            .ok_or_else(|| ShellError::NotFound(target.clone()))?;
        if !may_remove_entry(dir, node, identity) {
            return Err(ShellError::Permission(target));
        }
        if node.is_dir() && !node.children.is_empty() && !force {
            return Err(ShellError::ConfirmationRequired(target));
        }

        let mut report = DeleteReport::default();
        if let Some(node) = dir.children.get_mut(&name) {
            if node.is_dir() {
                report.deleted_count += prune(node, &target, identity, &mut report.errors);
            }
        }
        let emptied = dir.children.get(&name).is_some_and(|n| n.children.is_empty());
        if emptied {
            dir.children.remove(&name);
            dir.touch();
            report.deleted_count += 1;
        }
        tracing::debug!(path = %target, deleted = report.deleted_count, errors = report.errors.len(), "delete");
        Ok(report)
    }

    /// Move `from` to `to`. An existing file at `to` is replaced.
    pub fn rename(&self, from: &str, to: &str, identity: &Identity) -> ShellResult<()> {
        let (src_parent, src_name) = entry_target(from)?;
        let (dst_parent, dst_name) = entry_target(to)?;
        let src = child_path(&src_parent, &src_name);
        let dst = child_path(&dst_parent, &dst_name);
        if src == dst {
            return Ok(());
        }

        let mut root = self.write()?;
        {
            let src_dir = lookup_parent(&root, &src_parent)?;
            let node = src_dir
                .children
                .get(&src_name)
                .ok_or_else(|| ShellError::NotFound(src.clone()))?;
            if node.is_dir() && is_within(&dst, &src) {
                return Err(ShellError::InvalidOperation(format!(
                    "cannot move '{}' into itself",
                    src
                )));
            }
            if !may_remove_entry(src_dir, node, identity) {
                return Err(ShellError::Permission(src));
            }

            let dst_dir = lookup_parent(&root, &dst_parent)?;
            match dst_dir.children.get(&dst_name) {
                Some(existing) if existing.is_dir() => return Err(ShellError::IsADirectory(dst)),
                Some(_) if node.is_dir() => return Err(ShellError::NotADirectory(dst)),
                Some(existing) if !may_remove_entry(dst_dir, existing, identity) => {
                    return Err(ShellError::Permission(dst))
                }
                None if !dst_dir.has_permission(identity, Access::Write) => {
                    return Err(ShellError::Permission(dst_parent))
                }
                _ => {}
            }
        }

        let src_dir = lookup_parent_mut(&mut root, &src_parent)?;
        let node = src_dir
            .children
            .remove(&src_name)
            .ok_or_else(|| ShellError::NotFound(src.clone()))?;
        src_dir.touch();
        let dst_dir = lookup_parent_mut(&mut root, &dst_parent)?;
        dst_dir.children.insert(dst_name, node);
        dst_dir.touch();
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Metadata
    // ═══════════════════════════════════════════════════════════════════

    /// Change permission bits. Owner or superuser only.
    pub fn set_mode(&self, path: &str, mode: Mode, identity: &Identity) -> ShellResult<()> {
        self.update_metadata(path, |node, path| {
            if !identity.is_superuser() && node.owner != identity.user {
                return Err(ShellError::Permission(path.to_string()));
            }
            node.mode = mode;
            Ok(())
        })
    }

    /// Change the owning user. Superuser only.
    pub fn set_owner(&self, path: &str, owner: &str, identity: &Identity) -> ShellResult<()> {
        if owner.is_empty() {
            return Err(ShellError::InvalidOperation("owner cannot be empty".into()));
        }
        self.update_metadata(path, |node, path| {
            if !identity.is_superuser() {
                return Err(ShellError::Permission(path.to_string()));
            }
            node.owner = owner.to_string();
            Ok(())
        })
    }

    /// Change the owning group. The superuser may set any group; an owner
    /// may set a group they belong to.
    pub fn set_group(&self, path: &str, group: &str, identity: &Identity) -> ShellResult<()> {
        if group.is_empty() {
            return Err(ShellError::InvalidOperation("group cannot be empty".into()));
        }
        self.update_metadata(path, |node, path| {
            let allowed = identity.is_superuser()
                || (node.owner == identity.user && identity.in_group(group));
            if !allowed {
                return Err(ShellError::Permission(path.to_string()));
            }
            node.group = group.to_string();
            Ok(())
        })
    }

    fn update_metadata<F>(&self, path: &str, apply: F) -> ShellResult<()>
    where
        F: FnOnce(&mut Node, &str) -> ShellResult<()>,
    {
        let path = resolve(path, "/");
        let mut root = self.write()?;
        let node = lookup_mut(&mut root, &path)?;
        apply(node, &path)?;
        node.touch();
        if let Some((parent, _)) = split_parent(&path) {
            lookup_mut(&mut root, &parent)?.touch();
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Snapshots
    // ═══════════════════════════════════════════════════════════════════

    pub fn snapshot(&self) -> ShellResult<Snapshot> {
        let root = self.read()?;
        Ok(Snapshot::capture(&root))
    }

    /// Replace the whole tree with a snapshot. The snapshot is validated
    /// first; on error the current tree is kept.
    pub fn restore(&self, snapshot: Snapshot) -> ShellResult<()> {
        let tree = snapshot.into_tree()?;
        let mut root = self.write()?;
        *root = tree;
        Ok(())
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Node> for NodeStore {
    fn from(root: Node) -> Self {
        Self::with_root(root)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tree helpers. All paths are normalized and absolute.
// ═══════════════════════════════════════════════════════════════════════════

fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Check the raw final component of `path`, then normalize it into a
/// (parent, name) pair. The root is never a valid target.
fn entry_target(path: &str) -> ShellResult<(String, String)> {
    let raw_leaf = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if raw_leaf == "." || raw_leaf == ".." {
        return Err(ShellError::InvalidOperation(format!(
            "'{}': invalid entry name",
            raw_leaf
        )));
    }
    let resolved = resolve(path, "/");
    let (parent, name) = split_parent(&resolved).ok_or_else(|| {
        ShellError::InvalidOperation("cannot modify the root directory".into())
    })?;
    if !is_valid_name(name) {
        return Err(ShellError::InvalidOperation(format!("'{}': invalid entry name", name)));
    }
    Ok((parent, name.to_string()))
}

/// Find a node. Missing components and files in the middle of the path are
/// both `NotFound`.
fn lookup<'a>(root: &'a Node, path: &str) -> ShellResult<&'a Node> {
    let mut node = root;
    for name in components(path) {
        node = node
            .children
            .get(name)
            .ok_or_else(|| ShellError::NotFound(path.to_string()))?;
    }
    Ok(node)
}

fn lookup_mut<'a>(root: &'a mut Node, path: &str) -> ShellResult<&'a mut Node> {
    let mut node = root;
    for name in components(path) {
        node = node
            .children
            .get_mut(name)
            .ok_or_else(|| ShellError::NotFound(path.to_string()))?;
    }
    Ok(node)
}

/// Find the directory that will contain a new entry, distinguishing a
/// missing ancestor from one that is a file.
fn lookup_parent<'a>(root: &'a Node, parent: &str) -> ShellResult<&'a Node> {
    let mut node = root;
    let mut walked = String::new();
    for name in components(parent) {
        walked.push('/');
        walked.push_str(name);
        node = match node.children.get(name) {
            Some(child) if child.is_dir() => child,
            Some(_) => return Err(ShellError::NotADirectory(walked)),
            None => return Err(ShellError::ParentMissing(walked)),
        };
    }
    Ok(node)
}

fn lookup_parent_mut<'a>(root: &'a mut Node, parent: &str) -> ShellResult<&'a mut Node> {
    // Validate with shared borrows first so the error reports the first bad
    // component, then walk again mutably.
    lookup_parent(root, parent)?;
    lookup_mut(root, parent)
}

/// May `identity` remove or replace `child` inside `dir`?
///
/// Needs write on the directory. In a sticky directory the caller must also
/// own the entry or the directory.
fn may_remove_entry(dir: &Node, child: &Node, identity: &Identity) -> bool {
    if !dir.has_permission(identity, Access::Write) {
        return false;
    }
    !dir.mode.is_sticky()
        || identity.is_superuser()
        || identity.user == dir.owner
        || identity.user == child.owner
}

fn put_file(
    dir: &mut Node,
    path: &str,
    name: &str,
    content: Vec<u8>,
    mode: WriteMode,
    identity: &Identity,
) -> ShellResult<()> {
    match dir.children.get_mut(name) {
        Some(existing) if existing.is_dir() => Err(ShellError::AlreadyExists(path.to_string())),
        Some(existing) => {
            if !existing.has_permission(identity, Access::Write) {
                return Err(ShellError::Permission(path.to_string()));
            }
            match mode {
                WriteMode::Truncate => existing.content = content,
                WriteMode::Append => existing.content.extend_from_slice(&content),
            }
            existing.touch();
            Ok(())
        }
        None => {
            if !dir.has_permission(identity, Access::Write) {
                return Err(ShellError::Permission(path.to_string()));
            }
            dir.children.insert(name.to_string(), Node::file(identity, content));
            dir.touch();
            Ok(())
        }
    }
}

/// Create `target` and, with `create_parents`, any missing ancestors.
///
/// Everything is checked before the first node is inserted, so a failure
/// leaves the tree unchanged.
fn ensure_directories(
    root: &mut Node,
    target: &str,
    identity: &Identity,
    create_parents: bool,
) -> ShellResult<usize> {
    let names = components(target);
    let last = names.len().saturating_sub(1);
    let prefix = |i: usize| format!("/{}", names[..=i].join("/"));

    let mut node: &Node = root;
    let mut first_missing = None;
    for (i, name) in names.iter().enumerate() {
        match node.children.get(*name) {
            Some(child) if child.is_dir() => node = child,
            Some(_) if i == last => return Err(ShellError::AlreadyExists(prefix(i))),
            Some(_) => return Err(ShellError::NotADirectory(prefix(i))),
            None => {
                first_missing = Some(i);
                break;
            }
        }
    }

    let Some(first) = first_missing else {
        return if create_parents {
            Ok(0)
        } else {
            Err(ShellError::AlreadyExists(target.to_string()))
        };
    };
    if first < last && !create_parents {
        return Err(ShellError::ParentMissing(prefix(first)));
    }
    if !node.has_permission(identity, Access::Write) {
        let parent = if first == 0 { "/".to_string() } else { prefix(first - 1) };
        return Err(ShellError::Permission(parent));
    }

    let mut chain = Node::directory(identity);
    for name in names[first + 1..].iter().rev() {
        let mut dir = Node::directory(identity);
        dir.children.insert((*name).to_string(), chain);
        chain = dir;
    }
    let parent_path = if first == 0 { "/".to_string() } else { prefix(first - 1) };
    let parent = lookup_mut(root, &parent_path)?;
    parent.children.insert(names[first].to_string(), chain);
    parent.touch();
    Ok(last - first + 1)
}

/// Remove everything removable below `dir`. Returns how many nodes went.
fn prune(dir: &mut Node, dir_path: &str, identity: &Identity, errors: &mut Vec<ShellError>) -> usize {
    let mut removed = 0;
    let names: Vec<String> = dir.children.keys().cloned().collect();
    let dir_meta = dir.metadata_only();

    for name in names {
        let path = child_path(dir_path, &name);
        let Some(child) = dir.children.get_mut(&name) else {
            continue;
        };
        if !may_remove_entry(&dir_meta, child, identity) {
            errors.push(ShellError::Permission(path));
            continue;
        }
        if child.is_dir() {
            removed += prune(child, &path, identity, errors);
            if !child.children.is_empty() {
                continue;
            }
        }
        dir.children.remove(&name);
        removed += 1;
    }
    if removed > 0 {
        dir.touch();
    }
    removed
}
