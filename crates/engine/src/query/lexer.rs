//! Query tokenizer
//!
//! Splits a query string into words, quoted strings, comparison operators
//! and punctuation. Every token keeps its byte span so the parser can quote
//! the exact fragment it drops or rejects.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Bare word: keyword, field name, number, `*`
    Word(String),
    /// Single- or double-quoted string, quotes stripped and doubled quotes
    /// collapsed
    Quoted(String),
    /// `=`, `!=`, `>`, `<`, `>=`, `<=`
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

impl Token {
    /// Case-insensitive keyword check; quoted strings are never keywords
    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// Quote left open at end of input
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UnterminatedQuote {
    pub span: Range<usize>,
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '\'' | '"' | '(' | ')' | ',' | '=' | '!' | '<' | '>')
}

/// Tokenize a query.
///
/// An unterminated quote still yields a `Quoted` token running to the end
/// of input; the problem is reported separately so lenient parsing can
/// carry on.
pub(crate) fn tokenize(input: &str) -> (Vec<Spanned>, Option<UnterminatedQuote>) {
    let mut tokens = Vec::new();
    let mut unterminated = None;
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '(' => {
                chars.next();
                Token::LParen
            }
            ')' => {
                chars.next();
                Token::RParen
            }
            ',' => {
                chars.next();
                Token::Comma
            }
            '\'' | '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    if ch == c {
                        // doubled quote is a literal quote
                        if matches!(chars.peek(), Some(&(_, next)) if next == c) {
                            chars.next();
                            text.push(c);
                            continue;
                        }
                        closed = true;
                        break;
                    }
                    text.push(ch);
                }
                if !closed {
                    unterminated = Some(UnterminatedQuote {
                        span: start..input.len(),
                    });
                }
                Token::Quoted(text)
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = matches!(chars.peek(), Some(&(_, '=')));
                let op = match (c, followed_by_eq) {
                    ('!', true) => "!=",
                    ('<', true) => "<=",
                    ('>', true) => ">=",
                    ('=', _) => "=",
                    ('<', false) => "<",
                    ('>', false) => ">",
                    _ => "!",
                };
                if followed_by_eq && c != '=' {
                    chars.next();
                }
                if op == "!" {
                    Token::Word("!".to_string())
                } else {
                    Token::Op(op)
                }
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if !is_word_char(ch) {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                Token::Word(word)
            }
        };

        let end = chars.peek().map(|&(i, _)| i).unwrap_or(input.len());
        tokens.push(Spanned {
            token,
            span: start..end,
        });
    }

    (tokens, unterminated)
}
