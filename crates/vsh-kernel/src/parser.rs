//! Parser for vsh command lines.
//!
//! Transforms the token stream from the lexer into a [`Script`]. The chumsky
//! grammar is deliberately loose: it accepts empty stages and redirections
//! without targets so that a second pass can reject them with precise
//! messages instead of a generic "unexpected token".

use chumsky::{input::ValueInput, prelude::*};

use crate::ast::{Command, Pipeline, Redirect, RedirectKind, Script, Word};
use crate::error::ShellError;
use crate::lexer::{self, Token};

/// Span type used throughout the parser.
pub type Span = SimpleSpan;

/// Parse error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for ShellError {
    fn from(err: ParseError) -> Self {
        ShellError::Parse(err.message)
    }
}

/// A redirection as written, before its target is checked.
#[derive(Debug, Clone)]
struct RawRedirect {
    kind: RedirectKind,
    target: Option<Word>,
    span: Span,
}

#[derive(Debug, Clone)]
enum Item {
    Arg(Word),
    Redirect(RawRedirect),
}

#[derive(Debug, Clone)]
struct RawStage {
    name: Word,
    items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Sequence,
    Background,
}

#[derive(Debug, Clone)]
struct RawPipeline {
    stages: Vec<Option<RawStage>>,
    span: Span,
    terminator: Option<(Terminator, Span)>,
}

/// Parse a command line into a script.
pub fn parse(source: &str) -> Result<Script, Vec<ParseError>> {
    let tokens = lexer::tokenize(source).map_err(|errs| {
        errs.into_iter()
            .map(|e| {
                ParseError::new(
                    (e.span.start..e.span.end).into(),
                    format!("syntax error: {}", e.token),
                )
            })
            .collect::<Vec<_>>()
    })?;

    let tokens: Vec<(Token, Span)> = tokens
        .into_iter()
        .map(|spanned| (spanned.token, (spanned.span.start..spanned.span.end).into()))
        .collect();

    let end_span: Span = (source.len()..source.len()).into();

    let raw = script_parser()
        .parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)))
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .map(|e| {
                    let near = e
                        .found()
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "newline".to_string());
                    ParseError::new(*e.span(), format!("syntax error near unexpected token `{}`", near))
                })
                .collect::<Vec<_>>()
        })?;

    check(source, raw).map_err(|e| vec![e])
}

/// Parse a command line, reporting only the first error.
pub fn parse_line(source: &str) -> Result<Script, ShellError> {
    parse(source).map_err(|mut errs| {
        if errs.is_empty() {
            ShellError::Parse("syntax error".into())
        } else {
            errs.swap_remove(0).into()
        }
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser Combinators
// ═══════════════════════════════════════════════════════════════════════════

fn script_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Vec<RawPipeline>, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let terminator = select! {
        Token::Semi => Terminator::Sequence,
        Token::Newline => Terminator::Sequence,
        Token::Amp => Terminator::Background,
    }
    .map_with(|t, e| (t, e.span()));

    let terminated = pipeline_parser()
        .then(terminator)
        .map(|(mut pipeline, term)| {
            pipeline.terminator = Some(term);
            pipeline
        });

    terminated
        .repeated()
        .collect::<Vec<_>>()
        .then(pipeline_parser())
        .then_ignore(end())
        .map(|(mut pipelines, last)| {
            pipelines.push(last);
            pipelines
        })
}

/// Pipeline: stages separated by `|`. A stage may be missing; the check
/// pass reports that as a dangling pipe.
fn pipeline_parser<'tokens, I>(
) -> impl Parser<'tokens, I, RawPipeline, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    stage_parser()
        .or_not()
        .separated_by(just(Token::Pipe))
        .at_least(1)
        .collect::<Vec<_>>()
        .map_with(|stages, e| RawPipeline {
            stages,
            span: e.span(),
            terminator: None,
        })
        .labelled("pipeline")
}

/// Stage: `name (arg | redirect)*`
fn stage_parser<'tokens, I>(
) -> impl Parser<'tokens, I, RawStage, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let word = select! { Token::Word(w) => w };

    let item = choice((
        redirect_parser().map(Item::Redirect),
        word.map(Item::Arg),
    ));

    word.then(item.repeated().collect::<Vec<_>>())
        .map(|(name, items)| RawStage { name, items })
        .labelled("command")
}

/// Redirect: `> word`, `>> word`, `< word`. The target is optional here.
fn redirect_parser<'tokens, I>(
) -> impl Parser<'tokens, I, RawRedirect, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::GtGt => RedirectKind::Append,
        Token::Gt => RedirectKind::Truncate,
        Token::Lt => RedirectKind::Input,
    }
    .map_with(|kind, e| (kind, e.span()))
    .then(select! { Token::Word(w) => w }.or_not())
    .map(|((kind, span), target)| RawRedirect { kind, target, span })
    .labelled("redirect")
}

// ═══════════════════════════════════════════════════════════════════════════
// Structural checks
// ═══════════════════════════════════════════════════════════════════════════

fn check(source: &str, raw: Vec<RawPipeline>) -> Result<Script, ParseError> {
    let mut script = Script::default();

    for pipeline in raw {
        let background = matches!(pipeline.terminator, Some((Terminator::Background, _)));

        if pipeline.stages.iter().all(Option::is_none) {
            // Blank between separators is fine; `&` with nothing before it is not.
            if pipeline.stages.len() > 1 {
                return Err(ParseError::new(pipeline.span, "syntax error: dangling pipe"));
            }
            if let Some((Terminator::Background, span)) = pipeline.terminator {
                return Err(ParseError::new(span, "syntax error near unexpected token `&`"));
            }
            continue;
        }
        if pipeline.stages.iter().any(Option::is_none) {
            return Err(ParseError::new(pipeline.span, "syntax error: dangling pipe"));
        }

        let stages: Vec<RawStage> = pipeline.stages.into_iter().flatten().collect();
        let last = stages.len() - 1;
        let mut commands = Vec::with_capacity(stages.len());

        for (i, stage) in stages.into_iter().enumerate() {
            let mut args = Vec::new();
            let mut redirects = Vec::new();
            for item in stage.items {
                match item {
                    Item::Arg(word) => args.push(word),
                    Item::Redirect(r) => {
                        let Some(target) = r.target else {
                            return Err(ParseError::new(
                                r.span,
                                format!("syntax error: redirection `{}` missing target", r.kind),
                            ));
                        };
                        if r.kind == RedirectKind::Input && i != 0 {
                            return Err(ParseError::new(
                                r.span,
                                "syntax error: input redirection only allowed on the first command of a pipeline",
                            ));
                        }
                        if r.kind != RedirectKind::Input && i != last {
                            return Err(ParseError::new(
                                r.span,
                                "syntax error: output redirection only allowed on the last command of a pipeline",
                            ));
                        }
                        let input = r.kind == RedirectKind::Input;
                        let repeated = redirects
                            .iter()
                            .any(|prev: &Redirect| (prev.kind == RedirectKind::Input) == input);
                        if repeated {
                            let which = if input { "input" } else { "output" };
                            return Err(ParseError::new(
                                r.span,
                                format!("syntax error: more than one {} redirection", which),
                            ));
                        }
                        redirects.push(Redirect { kind: r.kind, target });
                    }
                }
            }
            commands.push(Command {
                name: stage.name,
                args,
                redirects,
            });
        }

        let text = source
            .get(pipeline.span.start..pipeline.span.end)
            .unwrap_or_default()
            .trim()
            .to_string();
        script.pipelines.push(Pipeline {
            commands,
            background,
            text,
        });
    }

    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::WordPart;
    use rstest::rstest;

    fn names(pipeline: &Pipeline) -> Vec<String> {
        pipeline.commands.iter().map(|c| c.name.raw.clone()).collect()
    }

    fn error(source: &str) -> String {
        match parse_line(source) {
            Err(ShellError::Parse(message)) => message,
            other => panic!("expected parse error for {:?}, got {:?}", source, other),
        }
    }

    #[test]
    fn simple_command() {
        let script = parse_line("echo hello world").unwrap();
        assert_eq!(script.pipelines.len(), 1);
        let cmd = &script.pipelines[0].commands[0];
        assert_eq!(cmd.name.raw, "echo");
        assert_eq!(cmd.args.len(), 2);
        assert!(!script.pipelines[0].background);
    }

    #[test]
    fn pipeline_stages() {
        let script = parse_line("cat f | grep x | wc -l").unwrap();
        assert_eq!(names(&script.pipelines[0]), vec!["cat", "grep", "wc"]);
    }

    #[test]
    fn redirections() {
        let script = parse_line("grep x < in.txt | wc >> out.txt").unwrap();
        let pipeline = &script.pipelines[0];
        assert_eq!(pipeline.input().map(|w| w.raw.as_str()), Some("in.txt"));
        let out = pipeline.output().unwrap();
        assert_eq!(out.kind, RedirectKind::Append);
        assert_eq!(out.target.raw, "out.txt");
    }

    #[test]
    fn sequencing_and_background() {
        let script = parse_line("sleep 5 & echo a; echo b\necho c").unwrap();
        assert_eq!(script.pipelines.len(), 4);
        assert!(script.pipelines[0].background);
        assert_eq!(script.pipelines[0].text, "sleep 5");
        assert!(!script.pipelines[1].background);
    }

    #[test]
    fn blank_lines_and_comments() {
        assert!(parse_line("").unwrap().is_empty());
        assert!(parse_line("   # just a comment").unwrap().is_empty());
        assert_eq!(parse_line("echo a;;\n\n echo b ;").unwrap().pipelines.len(), 2);
    }

    #[test]
    fn quoted_operators_stay_in_words() {
        let script = parse_line("echo 'a | b' \"c > d\" e\\;f").unwrap();
        let args = &script.pipelines[0].commands[0].args;
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].parts, vec![WordPart::Literal("a | b".into())]);
        assert_eq!(args[2].parts, vec![WordPart::Literal("e;f".into())]);
    }

    #[rstest]
    #[case("echo hi |", "syntax error: dangling pipe")]
    #[case("| echo hi", "syntax error: dangling pipe")]
    #[case("echo a | | echo b", "syntax error: dangling pipe")]
    #[case("echo hi >", "syntax error: redirection `>` missing target")]
    #[case("echo hi >> ;", "syntax error: redirection `>>` missing target")]
    #[case("cat <", "syntax error: redirection `<` missing target")]
    #[case(
        "echo hi > out | cat",
        "syntax error: output redirection only allowed on the last command of a pipeline"
    )]
    #[case(
        "echo hi | cat < in",
        "syntax error: input redirection only allowed on the first command of a pipeline"
    )]
    #[case("echo hi > a > b", "syntax error: more than one output redirection")]
    #[case("echo hi > a >> b", "syntax error: more than one output redirection")]
    #[case("cat < a < b", "syntax error: more than one input redirection")]
    #[case("echo 'oops", "syntax error: unterminated quote")]
    #[case("&", "syntax error near unexpected token `&`")]
    #[case("echo a && echo b", "syntax error near unexpected token `&`")]
    #[case("> out", "syntax error near unexpected token `>`")]
    fn parse_errors(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(error(source), expected);
    }
}
