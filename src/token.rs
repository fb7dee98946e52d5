use std::{fmt, ops::Range};

/// Longest source, in bytes, whose spans fit a [`Span`].
pub const MAX_SOURCE_LEN: usize = u32::MAX as usize;

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    /// Returns the end-of-file token for the given source.
    pub fn eof_for(src: &str) -> Token {
        Token::new(TokenKind::Eof, Span::new_of_length(src.len(), 0))
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        // Can't fail for lexed input: the lexer rejects sources longer than
        // `MAX_SOURCE_LEN`.
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap())
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    pub fn hi(self) -> usize {
        self.lo + self.len as usize
    }

    /// Returns the span from the start of `self` to the end of `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new_of_bounds(self.lo..other.hi())
    }

    /// Shrinks (or grows) the span bounds by the given offsets.
    pub fn offset(self, lo: isize, hi: isize) -> Span {
        let new_lo = self.lo.saturating_add_signed(lo);
        let new_hi = self.hi().saturating_add_signed(hi);
        Span::new_of_bounds(new_lo..new_hi.max(new_lo))
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.hi()]
    }

    /// Returns the source around the span, whitespace collapsed onto a
    /// single line.
    pub fn excerpt(self, src: &str) -> String {
        const CONTEXT: usize = 16;

        let mut lo = self.lo.saturating_sub(CONTEXT).min(src.len());
        while !src.is_char_boundary(lo) {
            lo -= 1;
        }
        let mut hi = self.hi().saturating_add(CONTEXT).min(src.len());
        while !src.is_char_boundary(hi) {
            hi += 1;
        }
        src[lo..hi].split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `List`, the list type constructor.
    List,
    /// `Optional`, the optional type constructor.
    Optional,

    Colon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,

    /// A simple label, such as `name` or `Text`.
    Identifier,
    /// A backtick-quoted label, such as `` `app.kubernetes.io/name` ``.
    QuotedIdentifier,

    Eof,
}

impl TokenKind {
    /// Whether the token may be used as a record field label.
    pub fn is_label(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier | TokenKind::QuotedIdentifier | TokenKind::List | TokenKind::Optional
        )
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "List" => TokenKind::List,
    "Optional" => TokenKind::Optional,
};
