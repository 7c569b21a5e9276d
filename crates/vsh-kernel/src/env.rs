//! Variables and word expansion.
//!
//! Expansion runs on a parsed [`Script`] just before a pipeline executes, so
//! an `export` earlier on the same line is visible to later pipelines.
//! Expanded text is never re-split or re-parsed: a variable holding
//! `a | b` produces one argument containing a pipe character.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::ast::{Command, Pipeline, Redirect, Word, WordPart};

/// Variable lookup used during expansion.
pub trait Environment {
    fn get(&self, name: &str) -> Option<String>;
}

/// Session variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    vars: BTreeMap<String, String>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    /// All variables, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Environment for Env {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Session variables shared between the kernel and running commands.
///
/// Foreground pipelines share the kernel's variables, so `export` sticks.
/// Background jobs get a [`detached`](SharedEnv::detached) copy.
#[derive(Debug, Clone, Default)]
pub struct SharedEnv(Arc<RwLock<Env>>);

impl SharedEnv {
    pub fn new(env: Env) -> Self {
        Self(Arc::new(RwLock::new(env)))
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).get(name)
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).set(name, value);
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.0.write().unwrap_or_else(PoisonError::into_inner).remove(name)
    }

    /// A copy of the current variables.
    pub fn snapshot(&self) -> Env {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// An independent copy; changes to it do not reach this one.
    pub fn detached(&self) -> SharedEnv {
        SharedEnv::new(self.snapshot())
    }
}

impl Environment for SharedEnv {
    fn get(&self, name: &str) -> Option<String> {
        SharedEnv::get(self, name)
    }
}

/// Session variables overlaid with per-call values such as `PWD` and `USER`.
pub struct Overlay<'a> {
    pub base: &'a dyn Environment,
    pub overrides: &'a [(&'a str, String)],
}

impl Environment for Overlay<'_> {
    fn get(&self, name: &str) -> Option<String> {
        self.overrides
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.clone())
            .or_else(|| self.base.get(name))
    }
}

/// Is `name` usable as a variable name?
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Expand one word. Unset variables become the empty string.
pub fn expand_word(word: &Word, env: &dyn Environment) -> String {
    word.parts
        .iter()
        .map(|part| match part {
            WordPart::Literal(text) => text.clone(),
            WordPart::Var(name) => env.get(name).unwrap_or_default(),
        })
        .collect()
}

/// Expand every word of a pipeline.
pub fn expand_pipeline(pipeline: &Pipeline, env: &dyn Environment) -> Pipeline<String> {
    Pipeline {
        commands: pipeline
            .commands
            .iter()
            .map(|cmd| Command {
                name: expand_word(&cmd.name, env),
                args: cmd.args.iter().map(|a| expand_word(a, env)).collect(),
                redirects: cmd
                    .redirects
                    .iter()
                    .map(|r| Redirect {
                        kind: r.kind,
                        target: expand_word(&r.target, env),
                    })
                    .collect(),
            })
            .collect(),
        background: pipeline.background,
        text: pipeline.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    #[test]
    fn expands_variables_and_unset_is_empty() {
        let mut env = Env::new();
        env.set("NAME", "world");
        let script = parse_line("echo \"hello $NAME\" '$NAME' x${MISSING}y").unwrap();
        let expanded = expand_pipeline(&script.pipelines[0], &env);
        assert_eq!(expanded.commands[0].args, vec!["hello world", "$NAME", "xy"]);
    }

    #[test]
    fn expansion_is_not_resplit() {
        let mut env = Env::new();
        env.set("CMD", "a | b > c");
        let script = parse_line("echo $CMD").unwrap();
        let expanded = expand_pipeline(&script.pipelines[0], &env);
        assert_eq!(expanded.commands.len(), 1);
        assert_eq!(expanded.commands[0].args, vec!["a | b > c"]);
        assert!(expanded.commands[0].redirects.is_empty());
    }

    #[test]
    fn overlay_shadows_base() {
        let mut env = Env::new();
        env.set("USER", "nobody");
        env.set("EDITOR", "vi");
        let overrides = [("USER", "alice".to_string())];
        let overlay = Overlay {
            base: &env,
            overrides: &overrides,
        };
        assert_eq!(overlay.get("USER").as_deref(), Some("alice"));
        assert_eq!(overlay.get("EDITOR").as_deref(), Some("vi"));
        assert_eq!(overlay.get("NOPE"), None);
    }

    #[test]
    fn detached_env_is_independent() {
        let shared = SharedEnv::default();
        shared.set("A", "1");
        let copy = shared.detached();
        copy.set("A", "2");
        assert_eq!(shared.get("A").as_deref(), Some("1"));
        assert_eq!(copy.get("A").as_deref(), Some("2"));
    }

    #[test]
    fn variable_names() {
        assert!(is_valid_name("PATH"));
        assert!(is_valid_name("_x1"));
        assert!(!is_valid_name("1x"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a-b"));
    }
}
