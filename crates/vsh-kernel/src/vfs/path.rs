//! Lexical path resolution.
//!
//! Paths are plain `/`-separated strings. Resolution never consults the tree:
//! `..` pops a component, `.` and empty components vanish, and `..` at the
//! root stays at the root.

/// Resolve `path` against `cwd` into a normalized absolute path.
pub fn resolve(path: &str, cwd: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let joined_cwd = if path.starts_with('/') { "" } else { cwd };

    for component in joined_cwd.split('/').chain(path.split('/')) {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Join `path` onto `cwd` without normalizing.
///
/// The store checks the final component for `.` and `..` before it
/// resolves, so creation commands pass joined paths rather than resolved
/// ones.
pub fn join(cwd: &str, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else if cwd.ends_with('/') {
        format!("{}{}", cwd, path)
    } else {
        format!("{}/{}", cwd, path)
    }
}

/// Components of a normalized absolute path. Empty for `/`.
pub fn components(absolute: &str) -> Vec<&str> {
    absolute.split('/').filter(|c| !c.is_empty()).collect()
}

/// Split a normalized absolute path into parent path and final name.
///
/// Returns `None` for the root.
pub fn split_parent(absolute: &str) -> Option<(String, &str)> {
    let trimmed = absolute.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    let name = &trimmed[idx + 1..];
    if name.is_empty() {
        return None;
    }
    let parent = if idx == 0 { "/".to_string() } else { trimmed[..idx].to_string() };
    Some((parent, name))
}

/// True if `name` may be used as a directory entry.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

/// True if `path` is `ancestor` or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/a/b", "/x", "/a/b")]
    #[case("b", "/a", "/a/b")]
    #[case("./b/", "/a", "/a/b")]
    #[case("../c", "/a/b", "/a/c")]
    #[case("..", "/", "/")]
    #[case("../../..", "/a", "/")]
    #[case("//a///b//", "/", "/a/b")]
    #[case("", "/home/alice", "/home/alice")]
    #[case(".", "/", "/")]
    #[case("/a/./b/../c", "/", "/a/c")]
    fn resolves_lexically(#[case] path: &str, #[case] cwd: &str, #[case] expected: &str) {
        assert_eq!(resolve(path, cwd), expected);
    }

    #[test]
    fn join_keeps_dot_components() {
        assert_eq!(join("/home", "."), "/home/.");
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/x", "/abs"), "/abs");
    }

    #[test]
    fn split_parent_of_paths() {
        assert_eq!(split_parent("/a/b"), Some(("/a".to_string(), "b")));
        assert_eq!(split_parent("/a"), Some(("/".to_string(), "a")));
        assert_eq!(split_parent("/"), None);
    }

    #[test]
    fn names() {
        assert!(is_valid_name("x.txt"));
        assert!(!is_valid_name("."));
        assert!(!is_valid_name(".."));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a/b"));
    }

    #[test]
    fn within() {
        assert!(is_within("/a/b", "/a"));
        assert!(is_within("/a", "/a"));
        assert!(!is_within("/ab", "/a"));
        assert!(is_within("/x", "/"));
    }
}
