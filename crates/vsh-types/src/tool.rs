//! Command definitions and parsed arguments.
//!
//! A `ToolSchema` is the declarative definition a command registers: how many
//! positional arguments it takes, which flags it understands, and which path
//! and permission preconditions must hold before it may run. The validator
//! interprets these uniformly for every command.

use std::collections::{HashMap, HashSet};

use crate::fs::{Access, NodeKind};

/// Bounds on the number of positional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgConstraint {
    /// Minimum number of positional arguments.
    pub min: usize,
    /// Maximum number of positional arguments, if bounded.
    pub max: Option<usize>,
}

impl ArgConstraint {
    /// Exactly `n` arguments.
    pub fn exact(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    /// At least `n` arguments.
    pub fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    /// At most `n` arguments.
    pub fn at_most(n: usize) -> Self {
        Self { min: 0, max: Some(n) }
    }

    /// Between `min` and `max` arguments inclusive.
    pub fn range(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }

    /// Any number of arguments.
    pub fn any() -> Self {
        Self { min: 0, max: None }
    }
}

impl Default for ArgConstraint {
    fn default() -> Self {
        Self::any()
    }
}

/// A flag a command understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDef {
    /// Canonical name, used as `--name` and as the key in `ToolArgs`.
    pub name: String,
    /// Alternative spellings, e.g. `r` and `R` for `recursive` (`-r`, `-R`).
    pub aliases: Vec<String>,
    /// True if the flag consumes a value (`-n 5`, `--count=5`).
    pub takes_value: bool,
    /// Description for help text.
    pub description: String,
}

impl FlagDef {
    /// A boolean flag.
    pub fn switch(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            takes_value: false,
            description: description.into(),
        }
    }

    /// A flag that takes a value.
    pub fn value(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            takes_value: true,
            description: description.into(),
        }
    }

    /// Add alternative names for this flag.
    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Check if a flag spelling matches this flag or any of its aliases.
    pub fn matches_flag(&self, flag: &str) -> bool {
        self.name == flag || self.aliases.iter().any(|a| a == flag)
    }
}

/// Which positional arguments a requirement applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSelector {
    /// A single argument, if present.
    Index(usize),
    /// Every argument from this index on.
    From(usize),
    /// Every argument except the last (sources of `mv`).
    AllButLast,
    /// The last argument (destination of `mv`).
    Last,
}

impl ArgSelector {
    /// The indices this selector picks out of `len` arguments.
    pub fn indices(&self, len: usize) -> Vec<usize> {
        match *self {
            ArgSelector::Index(i) if i < len => vec![i],
            ArgSelector::Index(_) => Vec::new(),
            ArgSelector::From(i) => (i..len).collect(),
            ArgSelector::AllButLast => (0..len.saturating_sub(1)).collect(),
            ArgSelector::Last if len > 0 => vec![len - 1],
            ArgSelector::Last => Vec::new(),
        }
    }
}

/// What must be true of a path argument before the command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCheck {
    /// The path must resolve to a node.
    MustExist,
    /// Nothing may occupy the path.
    MustNotExist,
    /// The parent directory must exist; the leaf may or may not.
    ParentMustExist,
}

/// A declared path precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRequirement {
    pub args: ArgSelector,
    pub check: PathCheck,
    /// Expected node type when the node exists.
    pub kind: Option<NodeKind>,
    /// Skip this requirement when the named flag is set (`rm -r`).
    pub unless_flag: Option<String>,
}

impl PathRequirement {
    /// Require the selected paths to exist.
    pub fn exists(args: ArgSelector) -> Self {
        Self {
            args,
            check: PathCheck::MustExist,
            kind: None,
            unless_flag: None,
        }
    }

    /// Require the selected paths to be free.
    pub fn absent(args: ArgSelector) -> Self {
        Self {
            args,
            check: PathCheck::MustNotExist,
            kind: None,
            unless_flag: None,
        }
    }

    /// Require the selected paths' parents to exist.
    pub fn parent_exists(args: ArgSelector) -> Self {
        Self {
            args,
            check: PathCheck::ParentMustExist,
            kind: None,
            unless_flag: None,
        }
    }

    /// Require a node type (checked when the node exists).
    pub fn of_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Do not check when the given flag is present.
    pub fn unless(mut self, flag: impl Into<String>) -> Self {
        self.unless_flag = Some(flag.into());
        self
    }
}

/// Which node a permission requirement is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionTarget {
    /// The node the argument names. Skipped if it does not exist.
    Node,
    /// The directory containing the node.
    Parent,
    /// The node if it exists, otherwise its parent directory.
    NodeOrParent,
}

/// A declared permission precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequirement {
    pub args: ArgSelector,
    pub access: Access,
    pub target: PermissionTarget,
}

impl PermissionRequirement {
    pub fn new(args: ArgSelector, access: Access, target: PermissionTarget) -> Self {
        Self { args, access, target }
    }
}

/// An example showing how to use a command.
#[derive(Debug, Clone)]
pub struct Example {
    pub description: String,
    pub code: String,
}

impl Example {
    pub fn new(description: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            code: code.into(),
        }
    }
}

/// Declarative definition of a command.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    /// Command name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Positional argument bounds.
    pub args: ArgConstraint,
    /// Recognised flags.
    pub flags: Vec<FlagDef>,
    /// Path preconditions.
    pub paths: Vec<PathRequirement>,
    /// Permission preconditions.
    pub permissions: Vec<PermissionRequirement>,
    /// Usage examples.
    pub examples: Vec<Example>,
}

impl ToolSchema {
    /// Create a new schema accepting any arguments and no flags.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args: ArgConstraint::any(),
            flags: Vec::new(),
            paths: Vec::new(),
            permissions: Vec::new(),
            examples: Vec::new(),
        }
    }

    /// Set the positional argument bounds.
    pub fn args(mut self, args: ArgConstraint) -> Self {
        self.args = args;
        self
    }

    /// Add a flag definition.
    pub fn flag(mut self, flag: FlagDef) -> Self {
        self.flags.push(flag);
        self
    }

    /// Add a path precondition.
    pub fn path(mut self, requirement: PathRequirement) -> Self {
        self.paths.push(requirement);
        self
    }

    /// Add a permission precondition.
    pub fn permission(mut self, requirement: PermissionRequirement) -> Self {
        self.permissions.push(requirement);
        self
    }

    /// Add an example.
    pub fn example(mut self, description: impl Into<String>, code: impl Into<String>) -> Self {
        self.examples.push(Example::new(description, code));
        self
    }

    /// Find the flag definition a spelling refers to.
    pub fn find_flag(&self, spelling: &str) -> Option<&FlagDef> {
        self.flags.iter().find(|f| f.matches_flag(spelling))
    }
}

/// Validated arguments ready for command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs {
    /// Positional arguments in order.
    pub positional: Vec<String>,
    /// Value-taking flags by canonical name.
    pub named: HashMap<String, String>,
    /// Boolean flags by canonical name.
    pub flags: HashSet<String>,
}

impl ToolArgs {
    /// Create empty args.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a positional argument by index.
    pub fn get_positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    /// Get a value flag by canonical name.
    pub fn get_named(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str)
    }

    /// Check if a boolean flag is set.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }
}
