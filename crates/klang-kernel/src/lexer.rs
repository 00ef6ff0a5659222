//! Lexer for klang source code.
//!
//! Converts source text into a stream of spanned tokens using the logos
//! lexer generator. Klang has three string forms: double-quoted with
//! escapes, single-quoted raw (single line), and backtick raw (multi-line,
//! verbatim — no trimming). Punctuation covers both expression syntax and
//! the characters that appear inside inline JSON object literals; the
//! parser reassembles kubectl barewords like `cm/test-cm` from adjacent
//! tokens using the spans recorded here.

use std::ops::Range;

use logos::Logos;

use crate::error::ParseError;

/// Byte range in the source text.
pub type Span = Range<usize>;

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

/// Strip the surrounding quote characters from a raw string slice.
fn inner(slice: &str) -> String {
    slice[1..slice.len() - 1].to_string()
}

/// Process escapes in a double-quoted string slice (quotes included).
fn unescape(slice: &str) -> Option<String> {
    let body = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '0' => out.push('\0'),
            _ => return None,
        }
    }
    Some(out)
}

/// A klang token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("kubectl")]
    Kubectl,
    #[token("shellScript")]
    ShellScript,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),
    #[regex(r"'[^'\n]*'", |lex| inner(lex.slice()))]
    RawStr(String),
    #[regex(r"`[^`]*`", |lex| inner(lex.slice()))]
    Backtick(String),

    // Operators
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("#")]
    Hash,
}

/// Tokenize a whole source text into spanned tokens.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, ParseError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(item) = lexer.next() {
        let span = lexer.span();
        match item {
            Ok(token) => tokens.push(Spanned::new(token, span)),
            Err(()) => {
                let snippet = &source[span.clone()];
                return Err(ParseError::new(
                    span,
                    format!("unexpected input {snippet:?}"),
                ));
            }
        }
    }
    Ok(tokens)
}
