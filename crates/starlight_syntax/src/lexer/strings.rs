//! String literal scanning: escapes, interpolation boundaries and templates.

use super::{Lexer, Mark, Mode, TokenKind};
use crate::ast::Span;

/// Why a string body scan stopped.
enum BodyEnd {
    /// Closing quote consumed.
    Closed,
    /// `${` consumed.
    Interpolation,
    /// Line break or end of input before the closing quote (not consumed).
    Unterminated,
}

impl Lexer<'_> {
    /// Scan a string whose opening quote (at `start`) was just consumed.
    pub(super) fn scan_string(&mut self, start: Mark, quote: char) {
        let body = self.mark();
        let (text, body_end, end) = self.scan_string_body(quote);
        match end {
            BodyEnd::Closed => self.push(TokenKind::Str(text), start),
            BodyEnd::Unterminated => {
                self.error("unterminated string literal", Span::new(start.pos, body.pos));
                self.push(TokenKind::Str(text), start);
            }
            BodyEnd::Interpolation => {
                self.push_to(TokenKind::StringStart, start, body.pos);
                if !text.is_empty() {
                    self.push_to(TokenKind::StringText(text), body, body_end.pos);
                }
                self.push(TokenKind::InterpolationOpen, body_end);
                self.modes.push(Mode::Template {
                    quote,
                    open: Span::new(start.pos, body.pos),
                });
                self.modes.push(Mode::Interpolation { depth: 0 });
            }
        }
    }

    /// Continue the enclosing template string after an interpolation closed.
    pub(super) fn resume_template(&mut self) {
        let Some(Mode::Template { quote, open }) = self.modes.last().copied() else {
            return;
        };
        let body = self.mark();
        let (text, body_end, end) = self.scan_string_body(quote);
        if !text.is_empty() {
            self.push_to(TokenKind::StringText(text), body, body_end.pos);
        }
        match end {
            BodyEnd::Closed => {
                self.modes.pop();
                self.push(TokenKind::StringEnd, body_end);
            }
            BodyEnd::Interpolation => {
                self.push(TokenKind::InterpolationOpen, body_end);
                self.modes.push(Mode::Interpolation { depth: 0 });
            }
            BodyEnd::Unterminated => {
                self.modes.pop();
                self.error("unterminated string literal", open);
                self.push_to(TokenKind::StringEnd, body_end, body_end.pos);
            }
        }
    }

    /// Scan string characters up to the closing quote, an interpolation, or the end of the line.
    ///
    /// Returns the decoded text, the position where the body ended (before the terminator) and
    /// the reason scanning stopped.
    fn scan_string_body(&mut self, quote: char) -> (String, Mark, BodyEnd) {
        let mut text = String::new();
        loop {
            let here = self.mark();
            match self.peek() {
                None | Some('\n') => return (text, here, BodyEnd::Unterminated),
                Some(c) if c == quote => {
                    self.advance();
                    return (text, here, BodyEnd::Closed);
                }
                Some('$') if self.peek_next() == Some('{') => {
                    self.advance();
                    self.advance();
                    return (text, here, BodyEnd::Interpolation);
                }
                Some('\\') => {
                    self.advance();
                    self.scan_escape(here, &mut text);
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }
    }

    /// Decode the escape after a consumed backslash at `start`.
    fn scan_escape(&mut self, start: Mark, text: &mut String) {
        let decoded = match self.peek() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('$') => '$',
            // Leave the line break for the caller to report as unterminated.
            None | Some('\n') => return,
            Some(other) => {
                self.advance();
                self.error(
                    format!("unknown escape sequence `\\{other}`"),
                    Span::new(start.pos, self.pos),
                );
                text.push(other);
                return;
            }
        };
        self.advance();
        text.push(decoded);
    }
}

#[cfg(test)]
mod tests {
    use super::super::lex;
    use super::*;

    #[test]
    fn test_unknown_escape_reports_and_keeps_char() {
        let errs = lex(r#""a\qb""#).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("\\q"));
    }

    #[test]
    fn test_template_text_spans_exclude_quotes() {
        let tokens = lex(r#"'x${1}y'"#).unwrap();
        assert_eq!(tokens[0].lexeme, "'");
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[2].lexeme, "${");
        assert_eq!(tokens[4].lexeme, "}");
        assert_eq!(tokens[5].lexeme, "y");
        assert_eq!(tokens[6].lexeme, "'");
        assert_eq!(tokens[6].kind, TokenKind::StringEnd);
    }

    #[test]
    fn test_adjacent_interpolations() {
        let tokens = lex(r#""${a}${b}""#).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.name()).collect();
        assert_eq!(
            kinds,
            vec![
                "string_start",
                "interpolation_open",
                "identifier",
                "interpolation_close",
                "interpolation_open",
                "identifier",
                "interpolation_close",
                "string_end",
                "eof"
            ]
        );
    }
}
