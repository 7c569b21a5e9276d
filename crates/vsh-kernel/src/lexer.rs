//! Lexer for vsh command lines.
//!
//! Converts a raw line into operator tokens and words using the logos lexer
//! generator. Quoting is resolved here: a [`Word`] token already carries its
//! literal text and variable references as separate parts, so nothing inside
//! quotes can ever be mistaken for an operator later.
//!
//! # Token Categories
//!
//! - **Operators**: `|`, `>`, `>>`, `<`, `&`, `;`
//! - **Newlines**: separate pipelines like `;`
//! - **Words**: everything else, with `'...'`, `"..."` and `\x` segments
//! - **Comments**: `#` at the start of a word runs to end of line (skipped)

use std::fmt;

use logos::{Lexer, Logos, Span};

use crate::ast::{Word, WordPart};

/// A token with its span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(token: T, span: Span) -> Self {
        Self { token, span }
    }
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexerError {
    #[default]
    UnexpectedCharacter,
    UnterminatedQuote,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerError::UnexpectedCharacter => write!(f, "unexpected character"),
            LexerError::UnterminatedQuote => write!(f, "unterminated quote"),
        }
    }
}

/// Tokens produced by the vsh lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexerError)]
#[logos(skip r"[ \t\r]+")]
pub enum Token {
    #[token(">>")]
    GtGt,

    #[token(">")]
    Gt,

    #[token("<")]
    Lt,

    #[token("|")]
    Pipe,

    #[token("&")]
    Amp,

    #[token(";")]
    Semi,

    #[token("\n")]
    Newline,

    /// `# ...` up to the end of the line. Only recognised where a word
    /// could start, so `a#b` stays one word.
    #[regex(r"#[^\n]*", allow_greedy = true)]
    Comment,

    /// Backslash-newline joins lines.
    #[regex(r"\\[ \t]*\n")]
    LineContinuation,

    /// A quote that never closes. Always an error.
    #[regex(r#"'[^']*"#, unterminated, allow_greedy = true)]
    #[regex(r#""([^"\\]|\\.)*"#, unterminated, allow_greedy = true)]
    Unterminated,

    #[regex(
        r#"([^\s|&;<>'"\\#]|\\.|'[^']*'|"([^"\\]|\\.)*")([^\s|&;<>'"\\]|\\.|'[^']*'|"([^"\\]|\\.)*")*"#,
        lex_word,
        allow_greedy = true
    )]
    Word(Word),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::GtGt => write!(f, ">>"),
            Token::Gt => write!(f, ">"),
            Token::Lt => write!(f, "<"),
            Token::Pipe => write!(f, "|"),
            Token::Amp => write!(f, "&"),
            Token::Semi => write!(f, ";"),
            Token::Newline => write!(f, "newline"),
            Token::Comment => write!(f, "comment"),
            Token::LineContinuation => write!(f, "\\"),
            Token::Unterminated => write!(f, "quote"),
            Token::Word(w) => write!(f, "{}", w),
        }
    }
}

fn unterminated(_lex: &mut Lexer<Token>) -> Result<(), LexerError> {
    Err(LexerError::UnterminatedQuote)
}

fn lex_word(lex: &mut Lexer<Token>) -> Word {
    parse_word(lex.slice())
}

/// Split the source text of one word into literal and variable parts.
///
/// Outside quotes a backslash escapes any character. Inside double quotes it
/// escapes only `"`, `\` and `$`; before anything else it is kept. Single
/// quotes take everything literally. `$NAME` and `${NAME}` are variable
/// references outside quotes and inside double quotes.
pub fn parse_word(raw: &str) -> Word {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut chars = raw.chars().peekable();
    let mut in_double = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => {
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    text.push(q);
                }
            }
            '"' => in_double = !in_double,
            '\\' => match chars.next() {
                Some(next) if !in_double || matches!(next, '"' | '\\' | '$') => text.push(next),
                Some(next) => {
                    text.push('\\');
                    text.push(next);
                }
                None => text.push('\\'),
            },
            '$' => match read_var_name(&mut chars) {
                Some(name) => {
                    if !text.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut text)));
                    }
                    parts.push(WordPart::Var(name));
                }
                None => text.push('$'),
            },
            c => text.push(c),
        }
    }

    if !text.is_empty() || parts.is_empty() {
        parts.push(WordPart::Literal(text));
    }
    Word {
        raw: raw.to_string(),
        parts,
    }
}

/// Read a variable name after `$`. Leaves the iterator untouched and
/// returns `None` when no name follows.
fn read_var_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let is_start = |c: &char| c.is_ascii_alphabetic() || *c == '_';
    let is_cont = |c: &char| c.is_ascii_alphanumeric() || *c == '_';

    if chars.peek() == Some(&'{') {
        // Only commit to `${` once we know the brace closes over a valid name.
        let mut lookahead = chars.clone();
        lookahead.next();
        let mut name = String::new();
        for c in lookahead.by_ref() {
            if c == '}' {
                if !name.is_empty() && name.chars().next().is_some_and(|c| is_start(&c)) && name.chars().all(|c| is_cont(&c)) {
                    *chars = lookahead;
                    return Some(name);
                }
                return None;
            }
            name.push(c);
        }
        return None;
    }

    let first = chars.peek().copied().filter(is_start)?;
    let mut name = String::from(first);
    chars.next();
    while let Some(c) = chars.peek().copied().filter(is_cont) {
        name.push(c);
        chars.next();
    }
    Some(name)
}

/// Tokenize a command line, dropping comments and line continuations.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, Vec<Spanned<LexerError>>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(Token::Comment | Token::LineContinuation) => {}
            Ok(token) => tokens.push(Spanned::new(token, span)),
            Err(err) => errors.push(Spanned::new(err, span)),
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("lexer should succeed")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    fn word(source: &str) -> Word {
        match lex(source).as_slice() {
            [Token::Word(w)] => w.clone(),
            other => panic!("expected one word, got {:?}", other),
        }
    }

    fn lit(s: &str) -> WordPart {
        WordPart::Literal(s.to_string())
    }

    fn var(s: &str) -> WordPart {
        WordPart::Var(s.to_string())
    }

    #[test]
    fn operators() {
        let tokens = lex("a | b > c >> d < e & ; \n");
        assert!(matches!(
            tokens.as_slice(),
            [
                Token::Word(_),
                Token::Pipe,
                Token::Word(_),
                Token::Gt,
                Token::Word(_),
                Token::GtGt,
                Token::Word(_),
                Token::Lt,
                Token::Word(_),
                Token::Amp,
                Token::Semi,
                Token::Newline
            ]
        ));
    }

    #[test]
    fn operators_need_no_spaces() {
        let tokens = lex("echo hi>out|cat");
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[2], Token::Gt);
        assert_eq!(tokens[4], Token::Pipe);
    }

    #[rstest]
    #[case("'a | b'", vec![lit("a | b")])]
    #[case("\"a > b\"", vec![lit("a > b")])]
    #[case("'$HOME'", vec![lit("$HOME")])]
    #[case("\"$HOME\"", vec![var("HOME")])]
    #[case("\"x${USER}y\"", vec![lit("x"), var("USER"), lit("y")])]
    #[case("$A$B", vec![var("A"), var("B")])]
    #[case("a\\ b", vec![lit("a b")])]
    #[case("\\$HOME", vec![lit("$HOME")])]
    #[case("\"\\$HOME\"", vec![lit("$HOME")])]
    #[case("\"a\\nb\"", vec![lit("a\\nb")])]
    #[case("\"say \\\"hi\\\"\"", vec![lit("say \"hi\"")])]
    #[case("pre'mid'\"post\"", vec![lit("premidpost")])]
    #[case("cost$", vec![lit("cost$")])]
    #[case("$1", vec![lit("$1")])]
    #[case("${unclosed", vec![lit("${unclosed")])]
    #[case("\"\"", vec![lit("")])]
    #[case("a#b", vec![lit("a#b")])]
    fn word_parts(#[case] source: &str, #[case] expected: Vec<WordPart>) {
        assert_eq!(word(source).parts, expected);
    }

    #[test]
    fn word_keeps_raw_text() {
        assert_eq!(word("\"a b\"").raw, "\"a b\"");
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = lex("echo hi # a comment | with > operators\nls");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[2], Token::Newline);
    }

    #[test]
    fn quoted_hash_is_literal() {
        assert_eq!(word("'#not'").parts, vec![lit("#not")]);
    }

    #[test]
    fn line_continuation_joins() {
        let tokens = lex("echo a \\\n b");
        assert_eq!(tokens.len(), 3);
    }

    #[rstest]
    #[case("echo 'abc")]
    #[case("echo \"abc")]
    #[case("echo ab'cd")]
    #[case("echo \"a\\\"")]
    fn unterminated_quotes(#[case] source: &str) {
        let errors = tokenize(source).unwrap_err();
        assert_eq!(errors[0].token, LexerError::UnterminatedQuote);
    }
}
