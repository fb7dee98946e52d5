use std::iter::Peekable;

use crate::token::{Span, Token, TokenKind, KEYWORDS, MAX_SOURCE_LEN};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// Whitespace and comments are discarded. The last token is always
/// [`TokenKind::Eof`].
pub fn lex(src: &str, tokens: &mut Vec<Token>) -> Result<(), Error> {
    Lexer::new(src, tokens).lex()
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens)?;
    Ok(tokens)
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("offset {offset}: {kind} (near `{excerpt}`)")]
pub struct Error {
    pub kind: ErrorKind,
    /// Byte offset of the offending character (or of the token start, for
    /// unterminated tokens).
    pub offset: usize,
    pub excerpt: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unclosed quoted label")]
    UnclosedQuotedLabel,
    #[error("character {0:?} is not allowed in a quoted label")]
    InvalidQuotedLabelChar(char),
    #[error("unclosed comment")]
    UnclosedComment,
    #[error("input of {0} bytes exceeds the {MAX_SOURCE_LEN} byte limit")]
    TooLarge(usize),
}

/// The type-expression lexer.
struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    ///
    /// Tokens are written into the provided tokens buffer.
    fn lex(mut self) -> Result<(), Error> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        if self.src.len() > MAX_SOURCE_LEN {
            return Err(self.error_at(0, ErrorKind::TooLarge(self.src.len())));
        }
        loop {
            let Some(next) = self.scan_token_kind()? else {
                continue; // trivia
            };
            self.produce(next);
            if next == TokenKind::Eof {
                break Ok(());
            }
        }
    }

    /// Tries to scan the current character. Returns `None` for trivia.
    fn scan_token_kind(&mut self) -> Result<Option<TokenKind>, Error> {
        use TokenKind::*;
        if self.is_exhausted() {
            self.current_lo = self.cursor;
            return Ok(Some(Eof));
        }
        let kind = match self.mark_advance() {
            ':' => Colon,
            ',' => Comma,
            '(' => LParen,
            ')' => RParen,
            '{' => match self.peek() {
                '-' => return self.block_comment().map(|()| None),
                _ => LBrace,
            },
            '}' => RBrace,
            '-' if self.peek() == '-' => {
                self.line_comment();
                return Ok(None);
            }
            '`' => self.quoted_identifier()?,
            c if c.is_alphabetic() || c == '_' => self.identifier_or_keyword(),
            c if c.is_whitespace() => {
                self.whitespace();
                return Ok(None);
            }
            c => return Err(self.error_at(self.current_lo, ErrorKind::UnexpectedChar(c))),
        };
        Ok(Some(kind))
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        let valid_identifier_suffix =
            |c: char| c.is_alphanumeric() || matches!(c, '-' | '/' | '_');

        while valid_identifier_suffix(self.peek()) {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    /// Scans a backtick-quoted label. The opening backtick was already
    /// consumed. Only printable ASCII (other than the backtick itself) may
    /// appear between the quotes.
    fn quoted_identifier(&mut self) -> Result<TokenKind, Error> {
        loop {
            if self.is_exhausted() {
                return Err(self.error_at(self.current_lo, ErrorKind::UnclosedQuotedLabel));
            }
            let lo = self.cursor;
            match self.advance() {
                '`' => return Ok(TokenKind::QuotedIdentifier),
                '\n' => {
                    return Err(self.error_at(self.current_lo, ErrorKind::UnclosedQuotedLabel));
                }
                ' '..='~' => (),
                c => return Err(self.error_at(lo, ErrorKind::InvalidQuotedLabelChar(c))),
            }
        }
    }

    fn whitespace(&mut self) {
        while self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn line_comment(&mut self) {
        debug_assert_eq!(self.peek(), '-');
        while !matches!(self.peek(), '\n' | '\0') {
            self.advance();
        }
    }

    /// Block comments nest, as in `{- outer {- inner -} still outer -}`.
    fn block_comment(&mut self) -> Result<(), Error> {
        assert_eq!(self.advance(), '-');
        let mut depth = 1_usize;
        while depth > 0 {
            if self.is_exhausted() {
                return Err(self.error_at(self.current_lo, ErrorKind::UnclosedComment));
            }
            match (self.advance(), self.peek()) {
                ('{', '-') => {
                    self.advance();
                    depth += 1;
                }
                ('-', '}') => {
                    self.advance();
                    depth -= 1;
                }
                _ => (),
            }
        }
        Ok(())
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            tokens,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.advance()
    }

    /// Returns the next char and advances the iterator.
    fn advance(&mut self) -> char {
        self.iter
            .next()
            .inspect(|c| self.cursor += c.len_utf8())
            .unwrap_or('\0')
    }

    /// Returns the next char without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    fn is_exhausted(&mut self) -> bool {
        self.iter.peek().is_none()
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.span()));
    }

    fn error_at(&self, offset: usize, kind: ErrorKind) -> Error {
        Error {
            kind,
            offset,
            excerpt: Span::new_of_length(offset, 0).excerpt(self.src),
        }
    }
}

pub mod extract {
    use super::*;

    /// Returns the label a token spells, without quotes.
    pub fn label(token: Token, src: &str) -> Box<str> {
        debug_assert!(token.kind.is_label());
        let span = match token.kind {
            TokenKind::QuotedIdentifier => token.span().offset(1, -1),
            _ => token.span(),
        };
        span.substr(src).to_string().into_boxed_str()
    }
}
