//! Permission bits and access decisions.
//!
//! A [`Mode`] is the 12-bit mask: setuid, setgid, sticky, then owner, group
//! and other `rwx` triples. Three textual forms exist and all round-trip:
//! octal (`0755`), the `ls -l` rendering (`drwxr-xr-x`) and chmod clauses
//! (`u+x,go-w`), the last one being an edit rather than a full value.

use std::fmt;

use vsh_types::{Access, NodeKind};

use crate::error::{ShellError, ShellResult};
use crate::identity::Identity;

pub const SETUID: u16 = 0o4000;
pub const SETGID: u16 = 0o2000;
pub const STICKY: u16 = 0o1000;

const MASK: u16 = 0o7777;

/// Default mode for new files.
pub const DEFAULT_FILE_MODE: Mode = Mode(0o644);
/// Default mode for new directories.
pub const DEFAULT_DIR_MODE: Mode = Mode(0o755);

/// Permission class a user falls into for a given node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Owner,
    Group,
    Other,
}

impl Class {
    fn shift(self) -> u16 {
        match self {
            Class::Owner => 6,
            Class::Group => 3,
            Class::Other => 0,
        }
    }

    fn special(self) -> u16 {
        match self {
            Class::Owner => SETUID,
            Class::Group => SETGID,
            Class::Other => STICKY,
        }
    }
}

const CLASSES: [Class; 3] = [Class::Owner, Class::Group, Class::Other];

/// A 12-bit permission mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mode(u16);

impl Mode {
    /// Create a mode, discarding bits above 0o7777.
    pub const fn new(bits: u16) -> Self {
        Mode(bits & MASK)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub fn is_sticky(self) -> bool {
        self.0 & STICKY != 0
    }

    /// Parse 1 to 4 octal digits.
    pub fn parse_octal(s: &str) -> ShellResult<Self> {
        if s.is_empty() || s.len() > 4 || !s.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Err(ShellError::Validation(format!("invalid octal mode: '{}'", s)));
        }
        u16::from_str_radix(s, 8)
            .map(Mode::new)
            .map_err(|_| ShellError::Validation(format!("invalid octal mode: '{}'", s)))
    }

    /// Four-digit octal rendering, e.g. `0755`.
    pub fn format_octal(self) -> String {
        format!("{:04o}", self.0)
    }

    /// `ls -l` style rendering with a leading type character.
    pub fn format_mode(self, kind: NodeKind) -> String {
        let mut s = String::with_capacity(10);
        s.push(match kind {
            NodeKind::Directory => 'd',
            NodeKind::File => '-',
        });
        for class in CLASSES {
            let bits = (self.0 >> class.shift()) & 0o7;
            s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            let exec = bits & 0o1 != 0;
            let special = self.0 & class.special() != 0;
            let (set, unset) = if class == Class::Other { ('t', 'T') } else { ('s', 'S') };
            s.push(match (special, exec) {
                (true, true) => set,
                (true, false) => unset,
                (false, true) => 'x',
                (false, false) => '-',
            });
        }
        s
    }

    /// Parse the `ls -l` rendering back into a mode.
    ///
    /// Accepts nine permission characters, optionally preceded by `d` or `-`.
    pub fn from_symbolic(s: &str) -> ShellResult<Self> {
        let invalid = || ShellError::Validation(format!("invalid symbolic mode: '{}'", s));
        let chars: Vec<char> = s.chars().collect();
        let perms = match chars.len() {
            10 if matches!(chars[0], 'd' | '-') => &chars[1..],
            9 => &chars[..],
            _ => return Err(invalid()),
        };

        let mut bits = 0u16;
        for (class, triple) in CLASSES.iter().zip(perms.chunks(3)) {
            let shift = class.shift();
            match triple[0] {
                'r' => bits |= 0o4 << shift,
                '-' => {}
                _ => return Err(invalid()),
            }
            match triple[1] {
                'w' => bits |= 0o2 << shift,
                '-' => {}
                _ => return Err(invalid()),
            }
            let (set, unset) = if *class == Class::Other { ('t', 'T') } else { ('s', 'S') };
            match triple[2] {
                'x' => bits |= 0o1 << shift,
                '-' => {}
                c if c == set => bits |= (0o1 << shift) | class.special(),
                c if c == unset => bits |= class.special(),
                _ => return Err(invalid()),
            }
        }
        Ok(Mode(bits))
    }

    /// Apply comma-separated chmod clauses such as `u+x`, `go-w`, `a=r`, `+t`.
    ///
    /// `X` grants execute only to directories or to nodes that already have
    /// an execute bit somewhere.
    pub fn apply_symbolic(self, spec: &str, kind: NodeKind) -> ShellResult<Self> {
        let invalid = || ShellError::Validation(format!("invalid mode: '{}'", spec));
        let mut bits = self.0;

        for clause in spec.split(',') {
            let op_at = clause.find(['+', '-', '=']).ok_or_else(invalid)?;
            let (who, mut rest) = clause.split_at(op_at);

            let mut classes = Vec::new();
            for c in who.chars() {
                match c {
                    'u' => classes.push(Class::Owner),
                    'g' => classes.push(Class::Group),
                    'o' => classes.push(Class::Other),
                    'a' => classes.extend(CLASSES),
                    _ => return Err(invalid()),
                }
            }
            if classes.is_empty() {
                classes.extend(CLASSES);
            }

            while let Some(op) = rest.chars().next() {
                if !matches!(op, '+' | '-' | '=') {
                    return Err(invalid());
                }
                let perms_end = rest[1..]
                    .find(['+', '-', '='])
                    .map(|i| i + 1)
                    .unwrap_or(rest.len());
                let perms = &rest[1..perms_end];
                rest = &rest[perms_end..];

                let has_exec = bits & 0o111 != 0 || kind == NodeKind::Directory;
                let mut change = 0u16;
                for p in perms.chars() {
                    for &class in &classes {
                        let shift = class.shift();
                        match p {
                            'r' => change |= 0o4 << shift,
                            'w' => change |= 0o2 << shift,
                            'x' => change |= 0o1 << shift,
                            'X' if has_exec => change |= 0o1 << shift,
                            'X' => {}
                            's' if class != Class::Other => change |= class.special(),
                            't' if class == Class::Other => change |= STICKY,
                            's' | 't' => {}
                            _ => return Err(invalid()),
                        }
                    }
                }

                match op {
                    '+' => bits |= change,
                    '-' => bits &= !change,
                    _ => {
                        let mut cleared = 0u16;
                        for &class in &classes {
                            cleared |= (0o7 << class.shift()) | class.special();
                        }
                        bits = (bits & !cleared) | change;
                    }
                }
            }
        }
        Ok(Mode(bits & MASK))
    }

    fn allows(self, class: Class, access: Access) -> bool {
        let bit = match access {
            Access::Read => 0o4,
            Access::Write => 0o2,
            Access::Execute => 0o1,
        };
        self.0 & (bit << class.shift()) != 0
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// Decide whether `identity` may perform `access` on a node.
///
/// The superuser is always granted. Otherwise exactly one class applies:
/// owner bits if the user owns the node, else group bits if the user is in
/// the node's group, else other bits.
pub fn has_permission(owner: &str, group: &str, mode: Mode, identity: &Identity, access: Access) -> bool {
    if identity.is_superuser() {
        return true;
    }
    let class = if identity.user == owner {
        Class::Owner
    } else if identity.in_group(group) {
        Class::Group
    } else {
        Class::Other
    };
    mode.allows(class, access)
}
