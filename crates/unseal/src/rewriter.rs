//! Lexical rewriter: drops `final`/`readonly` keyword tokens.
//!
//! The transform is purely subtractive at keyword-token granularity.
//! Output is reassembled from the original text using token spans, so
//! every byte that is not a dropped keyword (whitespace runs, comments,
//! string bodies, inline HTML) survives verbatim and in order.
//!
//! The rewriter never fails. Input that does not tokenize (truncated
//! strings, unterminated heredocs, invalid UTF-8) is returned unchanged;
//! loading a file the host language itself would reject is the host's
//! problem, not ours.

use crate::lexer::{self, Spanned, Token};
use tracing::debug;

/// Keywords removed from eligible sources. Matching is ASCII-case-
/// insensitive, like the host language's keyword recognition.
pub const TARGET_KEYWORDS: [&str; 2] = ["final", "readonly"];

/// Fast prequalification: does the raw text contain either keyword as a
/// case-insensitive substring? A keyword token cannot exist without its
/// literal text appearing, so a miss here proves there is nothing to do
/// without tokenizing (or touching the cache).
pub fn contains_keyword(source: &[u8]) -> bool {
    TARGET_KEYWORDS
        .iter()
        .any(|kw| contains_ignore_ascii_case(source, kw.as_bytes()))
}

fn contains_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

/// Rewrite source text, removing keyword tokens in modifier position.
///
/// Returns the input unchanged when no keyword substring is present or
/// when tokenization fails.
pub fn rewrite(source: &str) -> String {
    if !contains_keyword(source.as_bytes()) {
        return source.to_owned();
    }

    let tokens = match lexer::tokenize(source) {
        Ok(tokens) => tokens,
        Err(errors) => {
            debug!(errors = errors.len(), "source does not tokenize, leaving unchanged");
            return source.to_owned();
        }
    };

    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for (idx, spanned) in tokens.iter().enumerate() {
        out.push_str(&source[last..spanned.span.start]);
        let drop_token = spanned.token.is_finality_keyword()
            && is_modifier_position(&tokens, idx)
            && !glued_to_identifier(source, &spanned.span);
        if !drop_token {
            out.push_str(&source[spanned.span.clone()]);
        }
        last = spanned.span.end;
    }
    out.push_str(&source[last..]);
    out
}

/// Whether the span borders an identifier byte. The lexer only produces
/// ASCII identifiers, so a keyword directly adjacent to a non-ASCII
/// byte is really the tail of a longer name and must not be dropped.
fn glued_to_identifier(source: &str, span: &logos::Span) -> bool {
    let bytes = source.as_bytes();
    let ident_byte = |b: u8| b == b'_' || b.is_ascii_alphanumeric() || b >= 0x80;
    let before = span.start.checked_sub(1).map(|i| bytes[i]);
    let after = bytes.get(span.end).copied();
    before.is_some_and(ident_byte) || after.is_some_and(ident_byte)
}

/// Byte-level entry point used by the interception layer and cache.
///
/// Sources that are not valid UTF-8 are returned unchanged (fail soft,
/// same as any other tokenization failure).
pub fn rewrite_bytes(source: &[u8]) -> Vec<u8> {
    if !contains_keyword(source) {
        return source.to_vec();
    }
    match std::str::from_utf8(source) {
        Ok(text) => rewrite(text).into_bytes(),
        Err(_) => {
            debug!("source is not valid utf-8, leaving unchanged");
            source.to_vec()
        }
    }
}

/// Whether the keyword at `idx` is a declaration modifier rather than an
/// identifier spelled like one. Member accesses (`->final`, `::final`),
/// method declarations (`function readonly`) and call syntax
/// (`readonly(...)`) keep their token; the host language treats those
/// spellings as plain names.
fn is_modifier_position(tokens: &[Spanned<Token>], idx: usize) -> bool {
    if let Some(prev) = significant(tokens[..idx].iter().rev()) {
        if matches!(
            prev,
            Token::Arrow | Token::NullsafeArrow | Token::DoubleColon | Token::Function
        ) {
            return false;
        }
    }
    if significant(tokens[idx + 1..].iter()) == Some(Token::LParen) {
        return false;
    }
    true
}

fn significant<'a, I>(mut iter: I) -> Option<Token>
where
    I: Iterator<Item = &'a Spanned<Token>>,
{
    iter.find(|s| !s.token.is_comment()).map(|s| s.token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prequalification_is_case_insensitive() {
        assert!(contains_keyword(b"FINAL class"));
        assert!(contains_keyword(b"public ReadOnly int"));
        assert!(!contains_keyword(b"class A { public int $x; }"));
        assert!(!contains_keyword(b""));
    }

    #[test]
    fn prequalification_matches_substrings() {
        // "finally" contains "final"; the scan is allowed to pass it
        // through to the tokenizer, which will not strip it.
        assert!(contains_keyword(b"try {} finally {}"));
    }

    #[test]
    fn strips_class_modifier() {
        let src = "<?php final class A {}";
        assert_eq!(rewrite(src), "<?php  class A {}");
    }

    #[test]
    fn strips_property_modifiers() {
        let src = "<?php class A { public readonly final int $x; }";
        assert_eq!(rewrite(src), "<?php class A { public   int $x; }");
    }

    #[test]
    fn preserves_method_named_readonly() {
        let src = "<?php class A { function readonly() {} }";
        assert_eq!(rewrite(src), src);
    }

    #[test]
    fn preserves_member_access() {
        let src = "<?php $a->final(); $a?->readonly; A::final;";
        assert_eq!(rewrite(src), src);
    }

    #[test]
    fn preserves_call_syntax() {
        let src = "<?php readonly($x);";
        assert_eq!(rewrite(src), src);
    }

    #[test]
    fn mixed_positions() {
        let src = "<?php final class A { public function f() { return $this->final; } }";
        assert_eq!(
            rewrite(src),
            "<?php  class A { public function f() { return $this->final; } }"
        );
    }

    #[test]
    fn comments_between_modifier_and_neighbor_are_skipped() {
        let src = "<?php $a-> /* c */ final();";
        assert_eq!(rewrite(src), src);
    }

    #[test]
    fn keyword_glued_to_non_ascii_name_survives() {
        // ` üfinal` is one identifier to the host language even though
        // this lexer splits the non-ASCII byte off.
        let src = "<?php $x = üfinal; final class A {}";
        assert_eq!(rewrite(src), "<?php $x = üfinal;  class A {}");
    }

    #[test]
    fn invalid_utf8_unchanged() {
        let src = b"<?php final \xff\xfe class";
        assert_eq!(rewrite_bytes(src), src.to_vec());
    }

    #[test]
    fn malformed_source_unchanged() {
        let src = "<?php final class A { $x = \"unterminated";
        assert_eq!(rewrite(src), src);
    }

    #[test]
    fn bytes_roundtrip_matches_str() {
        let src = "<?php final class A {}";
        assert_eq!(rewrite_bytes(src.as_bytes()), rewrite(src).into_bytes());
    }
}
