//! Syntax tree for command lines.
//!
//! Words keep their variable references unexpanded. [`crate::env`] turns a
//! parsed [`Script`] into plain strings once an environment is available.

use std::fmt;

/// One piece of a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    /// Text taken as-is (quotes and escapes already removed).
    Literal(String),
    /// `$NAME` or `${NAME}`.
    Var(String),
}

/// A shell word: adjacent unquoted, quoted and escaped segments joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Source text, for error messages and job display.
    pub raw: String,
    pub parts: Vec<WordPart>,
}

impl Word {
    /// A word that is a single literal.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: text.clone(),
            parts: vec![WordPart::Literal(text)],
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Direction and mode of a redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `< path`
    Input,
    /// `> path`
    Truncate,
    /// `>> path`
    Append,
}

impl fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectKind::Input => write!(f, "<"),
            RedirectKind::Truncate => write!(f, ">"),
            RedirectKind::Append => write!(f, ">>"),
        }
    }
}

/// A redirection attached to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect<T = Word> {
    pub kind: RedirectKind,
    pub target: T,
}

/// One command invocation: name, arguments, redirections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<T = Word> {
    pub name: T,
    pub args: Vec<T>,
    pub redirects: Vec<Redirect<T>>,
}

/// Commands connected by pipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline<T = Word> {
    pub commands: Vec<Command<T>>,
    /// Terminated by `&`.
    pub background: bool,
    /// Source text of the pipeline, for job listings.
    pub text: String,
}

impl<T> Pipeline<T> {
    /// The `<` redirect of the first stage, if any.
    pub fn input(&self) -> Option<&T> {
        self.commands
            .first()?
            .redirects
            .iter()
            .find(|r| r.kind == RedirectKind::Input)
            .map(|r| &r.target)
    }

    /// The `>`/`>>` redirect of the final stage, if any.
    pub fn output(&self) -> Option<&Redirect<T>> {
        self.commands
            .last()?
            .redirects
            .iter()
            .find(|r| r.kind != RedirectKind::Input)
    }
}

/// A full line: independent pipelines in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script<T = Word> {
    pub pipelines: Vec<Pipeline<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            pipelines: Vec::new(),
        }
    }
}

impl<T> Script<T> {
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
