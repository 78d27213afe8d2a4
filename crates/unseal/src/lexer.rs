//! Lexer for the PHP source subset the rewriter understands.
//!
//! Converts source text into a stream of spanned tokens using the logos
//! lexer generator. The lexer only classifies as much as keyword removal
//! needs: the `final`/`readonly` keywords themselves, every construct
//! whose *body* must stay opaque (strings, heredocs, comments, inline
//! HTML), and the handful of operators that decide whether a keyword is
//! really a declaration modifier. Everything else is passed through as
//! single-character `Other` tokens.
//!
//! Tokens never carry copies of their text; each is paired with its byte
//! span so the rewriter can reassemble output verbatim from the input,
//! including all whitespace between tokens.
//!
//! # Tag handling
//!
//! PHP sources are modal: text outside `<?php`/`<?=` tags is inline HTML
//! emitted as-is. `tokenize` walks the source in that mode, synthesizing
//! `InlineHtml` and `OpenTag` tokens itself and handing code regions to
//! logos until a `?>` close tag drops back to HTML mode.

use logos::{Logos, Span};
use std::fmt;

/// A token with its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
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
///
/// Any of these aborts tokenization of the whole file; the rewriter
/// treats that as "malformed input" and falls back to the original text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LexerError {
    #[default]
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedComment,
    UnterminatedHeredoc,
    MalformedHeredoc,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerError::UnexpectedCharacter => write!(f, "unexpected character"),
            LexerError::UnterminatedString => write!(f, "unterminated string literal"),
            LexerError::UnterminatedComment => write!(f, "unterminated block comment"),
            LexerError::UnterminatedHeredoc => write!(f, "unterminated heredoc"),
            LexerError::MalformedHeredoc => write!(f, "malformed heredoc opener"),
        }
    }
}

/// Tokens produced by the lexer.
///
/// `InlineHtml` and `OpenTag` are synthesized by `tokenize` while
/// switching between HTML and code mode; they carry no logos pattern.
/// Keyword matching is ASCII-case-insensitive, as in the host language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexerError)]
#[logos(skip r"[ \t\r\n\x0c]+")]
pub enum Token {
    /// Raw text outside `<?php` tags, passed through verbatim.
    InlineHtml,

    /// `<?php` or `<?=`.
    OpenTag,

    #[token("?>")]
    CloseTag,

    // ═══════════════════════════════════════════════════════════════════
    // Keywords
    // ═══════════════════════════════════════════════════════════════════
    #[token("final", ignore(ascii_case))]
    Final,

    #[token("readonly", ignore(ascii_case))]
    Readonly,

    #[token("function", ignore(ascii_case))]
    Function,

    // ═══════════════════════════════════════════════════════════════════
    // Operators that affect keyword classification
    // ═══════════════════════════════════════════════════════════════════
    #[token("?->")]
    NullsafeArrow,

    #[token("->")]
    Arrow,

    #[token("::")]
    DoubleColon,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    /// PHP 8 attribute opener `#[`. Must come before the `#` comment so
    /// an attribute on the same line as a keyword does not swallow it.
    #[token("#[")]
    AttributeStart,

    // ═══════════════════════════════════════════════════════════════════
    // Comments (preserved verbatim in rewriter output)
    // ═══════════════════════════════════════════════════════════════════
    /// `// ...` or `# ...`, ending at newline or at a `?>` close tag.
    #[token("//", lex_line_comment)]
    #[token("#", lex_line_comment)]
    LineComment,

    /// `/* ... */`, including doc comments.
    #[token("/*", lex_block_comment)]
    BlockComment,

    // ═══════════════════════════════════════════════════════════════════
    // Strings (opaque: keyword text inside never reaches the rewriter)
    // ═══════════════════════════════════════════════════════════════════
    #[regex(r#"(?s)"([^"\\]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r"(?s)'([^'\\]|\\.)*'")]
    SingleQuoted,

    #[regex(r"(?s)`([^`\\]|\\.)*`")]
    Backtick,

    /// `<<<LABEL ... LABEL` heredoc or `<<<'LABEL'` nowdoc, consumed
    /// through the closing label.
    #[token("<<<", lex_heredoc)]
    Heredoc,

    /// A bare quote that did not start a complete string literal.
    /// Without this, the quote would lex as `Other` and the unterminated
    /// body would be visible to the rewriter as code.
    #[token("\"", lex_unterminated)]
    #[token("'", lex_unterminated)]
    #[token("`", lex_unterminated)]
    Unterminated,

    // ═══════════════════════════════════════════════════════════════════
    // Everything else
    // ═══════════════════════════════════════════════════════════════════
    /// Variables: `$name`.
    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_]*")]
    Variable,

    /// Numeric literals, loosely: keeps digits out of identifier space.
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+")]
    Number,

    /// Identifiers: class names, method names, all other keywords.
    /// ASCII only; non-ASCII identifier bytes lex as `Other`, and the
    /// rewriter's adjacency guard keeps keywords glued to them intact.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    /// Any other single character (operators, punctuation, non-ASCII).
    #[regex(r"[^ \t\r\n\x0c]", priority = 0)]
    Other,
}

impl Token {
    /// True for the keywords the rewriter strips.
    pub fn is_finality_keyword(&self) -> bool {
        matches!(self, Token::Final | Token::Readonly)
    }

    /// True for tokens the rewriter skips when looking at neighbors.
    pub fn is_comment(&self) -> bool {
        matches!(self, Token::LineComment | Token::BlockComment)
    }
}

/// Consume a line comment body: up to the newline or a `?>` close tag,
/// whichever comes first. Neither terminator is consumed; the close tag
/// must still lex so HTML mode resumes, matching host-language behavior.
fn lex_line_comment(lex: &mut logos::Lexer<Token>) {
    let rest = lex.remainder();
    let end = match (rest.find('\n'), rest.find("?>")) {
        (Some(nl), Some(ct)) => nl.min(ct),
        (Some(nl), None) => nl,
        (None, Some(ct)) => ct,
        (None, None) => rest.len(),
    };
    lex.bump(end);
}

/// Consume a block comment body through the closing `*/`.
fn lex_block_comment(lex: &mut logos::Lexer<Token>) -> Result<(), LexerError> {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(pos) => {
            lex.bump(pos + 2);
            Ok(())
        }
        None => Err(LexerError::UnterminatedComment),
    }
}

fn lex_unterminated(_lex: &mut logos::Lexer<Token>) -> Result<(), LexerError> {
    Err(LexerError::UnterminatedString)
}

/// Consume a heredoc/nowdoc after the `<<<` opener: optional whitespace,
/// optionally quoted label, a newline, then content through the closing
/// label. The closing label may be indented (flexible heredoc) and
/// anything after it on the line lexes as code.
fn lex_heredoc(lex: &mut logos::Lexer<Token>) -> Result<(), LexerError> {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();
    let mut i = 0;

    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }

    let quote = match bytes.get(i) {
        Some(&q @ (b'\'' | b'"')) => {
            i += 1;
            Some(q)
        }
        _ => None,
    };

    let label_start = i;
    if !matches!(bytes.get(i), Some(c) if c.is_ascii_alphabetic() || *c == b'_') {
        return Err(LexerError::MalformedHeredoc);
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    let label = &rest[label_start..i];

    if let Some(q) = quote {
        if bytes.get(i) != Some(&q) {
            return Err(LexerError::MalformedHeredoc);
        }
        i += 1;
    }

    if bytes.get(i) == Some(&b'\r') {
        i += 1;
    }
    if bytes.get(i) != Some(&b'\n') {
        return Err(LexerError::MalformedHeredoc);
    }
    i += 1;

    loop {
        let mut j = i;
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
        if rest[j..].starts_with(label) {
            let after = j + label.len();
            let at_boundary = match bytes.get(after) {
                Some(c) => !(c.is_ascii_alphanumeric() || *c == b'_'),
                None => true,
            };
            if at_boundary {
                lex.bump(after);
                return Ok(());
            }
        }
        match bytes[i..].iter().position(|&b| b == b'\n') {
            Some(off) => i += off + 1,
            None => return Err(LexerError::UnterminatedHeredoc),
        }
    }
}

/// Find the next open tag in an HTML region.
///
/// Returns `(offset, tag_len)` for `<?php` (when followed by whitespace
/// or end of input) or `<?=`. Short `<?` tags are not recognized.
fn find_open_tag(s: &str) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    let mut from = 0;
    while let Some(rel) = s[from..].find("<?") {
        let at = from + rel;
        let rest = &bytes[at + 2..];
        if rest.len() >= 3 && rest[..3].eq_ignore_ascii_case(b"php") {
            match rest.get(3) {
                None => return Some((at, 5)),
                Some(&c) if matches!(c, b' ' | b'\t' | b'\r' | b'\n') => return Some((at, 5)),
                Some(_) => {}
            }
        }
        if rest.first() == Some(&b'=') {
            return Some((at, 3));
        }
        from = at + 2;
    }
    None
}

/// Tokenize source text into a vector of spanned tokens.
///
/// Whitespace between tokens is skipped; consumers that need it (the
/// rewriter) recover it from the gaps between consecutive spans. Inline
/// HTML outside `<?php` tags is emitted as `InlineHtml` tokens.
///
/// Returns all lexer errors with their positions if the source does not
/// tokenize cleanly.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, Vec<Spanned<LexerError>>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        // HTML mode: raw text until the next open tag.
        match find_open_tag(&source[pos..]) {
            Some((off, tag_len)) => {
                if off > 0 {
                    tokens.push(Spanned::new(Token::InlineHtml, pos..pos + off));
                }
                tokens.push(Spanned::new(Token::OpenTag, pos + off..pos + off + tag_len));
                pos += off + tag_len;
            }
            None => {
                tokens.push(Spanned::new(Token::InlineHtml, pos..source.len()));
                break;
            }
        }

        // Code mode: logos until a close tag or end of input.
        let base = pos;
        let mut lexer = Token::lexer(&source[base..]);
        let mut resumed_html = false;
        pos = source.len();
        while let Some(result) = lexer.next() {
            let span = lexer.span();
            let abs = base + span.start..base + span.end;
            match result {
                Ok(Token::CloseTag) => {
                    tokens.push(Spanned::new(Token::CloseTag, abs));
                    pos = base + span.end;
                    resumed_html = true;
                    break;
                }
                Ok(token) => tokens.push(Spanned::new(token, abs)),
                Err(err) => errors.push(Spanned::new(err, abs)),
            }
        }
        if !resumed_html {
            break;
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}
