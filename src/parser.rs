use std::collections::HashMap;

use crate::{
    ast::{Field, Label, Record, Type},
    lexer::{self, extract},
    token::{Span, Token, TokenKind},
};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Nesting limit for records, applications and parentheses.
pub const MAX_DEPTH: usize = 256;

/// Parses a complete type description, whose top-level type must be a
/// record.
pub fn parse(src: &str, tokens: &mut Vec<Token>) -> Result<Type, crate::Error> {
    run(src, tokens, |p| {
        let open = p.peek().span();
        let ty = p.parse_type()?;
        p.consume_eof()?;
        if !matches!(ty, Type::Record(_)) {
            let span = open.to(p.prev_span());
            return Err(p.error(span, ErrorKind::RootNotRecord));
        }
        Ok(ty)
    })
}

/// Parses any type, such as a `List { ... }` fragment.
pub fn parse_type(src: &str, tokens: &mut Vec<Token>) -> Result<Type, crate::Error> {
    run(src, tokens, |p| {
        let ty = p.parse_type()?;
        p.consume_eof()?;
        Ok(ty)
    })
}

/// A convenience function that allocates a new tokens buffer.
pub fn parse_in_new(src: &str) -> Result<Type, crate::Error> {
    parse(src, &mut Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY))
}

fn run<T>(
    src: &str,
    tokens: &mut Vec<Token>,
    f: impl FnOnce(&mut Parser<'_, '_>) -> Result<T>,
) -> Result<T, crate::Error> {
    assert!(tokens.is_empty());
    lexer::lex(src, tokens)?;
    let mut p = Parser::new(src, tokens);
    Ok(f(&mut p)?)
}

struct Parser<'src, 'tok> {
    src: &'src str,
    tokens: &'tok [Token],
    cursor: usize,
    depth: usize,
}

impl Parser<'_, '_> {
    fn parse_type(&mut self) -> Result<Type> {
        let token = self.peek();
        self.descend(token.span())?;
        let ty = match token.kind {
            TokenKind::LBrace => self.parse_record().map(Type::Record),
            TokenKind::List => {
                self.advance();
                self.parse_type().map(Type::list)
            }
            TokenKind::Optional => {
                self.advance();
                self.parse_type().map(Type::optional)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.consume(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Type::Scalar(extract::label(token, self.src)))
            }
            actual => Err(self.error(token.span(), ErrorKind::ExpectedType { actual })),
        };
        self.depth -= 1;
        ty
    }

    fn parse_record(&mut self) -> Result<Record> {
        let open = self.consume(TokenKind::LBrace)?;
        // `dhall format` puts separators first, which may leave a comma
        // right after the opening brace.
        self.take(TokenKind::Comma);

        let mut seen: HashMap<Label, Span> = HashMap::new();
        let mut fields = Vec::new();
        if self.take(TokenKind::RBrace) {
            return Ok(Record::new());
        }
        loop {
            if self.is(TokenKind::Eof) {
                return Err(self.unclosed(open));
            }
            let (label, label_span) = self.parse_label()?;
            if let Some(&first) = seen.get(&label) {
                let error = ErrorKind::DuplicateField {
                    name: label.as_str().into(),
                    first,
                };
                return Err(self.error(label_span, error));
            }
            seen.insert(label.clone(), label_span);

            self.consume(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            fields.push(Field { label, ty });

            let c = self.peek();
            match c.kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => return Err(self.unclosed(open)),
                actual => {
                    let error = ErrorKind::UnexpectedAny {
                        actual,
                        expected: Box::from([TokenKind::Comma, TokenKind::RBrace]),
                    };
                    return Err(self.error(c.span(), error));
                }
            }
        }
        Ok(Record::from_unique(fields))
    }

    fn parse_label(&mut self) -> Result<(Label, Span)> {
        let token = self.peek();
        if !token.kind.is_label() {
            let error = ErrorKind::ExpectedLabel { actual: token.kind };
            return Err(self.error(token.span(), error));
        }
        self.advance();
        Ok((extract::label(token, self.src).into(), token.span()))
    }
}

impl Parser<'_, '_> {
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok [Token]) -> Parser<'src, 'tok> {
        Parser {
            src,
            tokens,
            cursor: 0,
            depth: 0,
        }
    }

    /// Builds an error carrying an excerpt of the surrounding source.
    fn error(&self, span: Span, kind: ErrorKind) -> Error {
        Error {
            kind,
            span,
            excerpt: span.excerpt(self.src),
        }
    }

    fn unclosed(&self, open: Token) -> Error {
        let at = self.peek().span();
        self.error(at, ErrorKind::UnclosedRecord { open: open.span() })
    }

    /// Tracks nesting, failing once [`MAX_DEPTH`] is exceeded.
    fn descend(&mut self, at: Span) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(at, ErrorKind::TooDeep));
        }
        self.depth += 1;
        Ok(())
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        match self.tokens.get(self.cursor) {
            Some(token) => *token,
            None => Token::eof_for(self.src),
        }
    }

    /// Returns the span of the last consumed token.
    fn prev_span(&self) -> Span {
        match self.cursor.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span(),
            None => Span::new_of_length(0, 0),
        }
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> Token {
        let c = self.peek();
        if !c.is_eof() {
            self.cursor += 1;
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not,
    /// returns an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            let error = ErrorKind::Unexpected {
                actual: c.kind,
                expected: expect,
            };
            Err(self.error(c.span(), error))
        }
    }

    fn consume_eof(&mut self) -> Result<()> {
        let c = self.peek();
        if c.is_eof() {
            Ok(())
        } else {
            Err(self.error(c.span(), ErrorKind::TrailingInput { actual: c.kind }))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{span}: {kind} (near `{excerpt}`)")]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Span,
    pub excerpt: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("expected token {expected:?}, but got {actual:?}")]
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("expected one of {expected:?}, but got {actual:?}")]
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    #[error("expected a type, but got {actual:?}")]
    ExpectedType { actual: TokenKind },
    #[error("expected a field label, but got {actual:?}")]
    ExpectedLabel { actual: TokenKind },
    #[error("unclosed record opened at {open}")]
    UnclosedRecord { open: Span },
    #[error("duplicate field `{name}`, first defined at {first}")]
    DuplicateField { name: Box<str>, first: Span },
    #[error("unexpected trailing {actual:?}")]
    TrailingInput { actual: TokenKind },
    #[error("expected a record type at the top level")]
    RootNotRecord,
    #[error("type nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use parser;

        fn test_empty_record() {
            let root = "{}";
            let tree_ok = "record";
        }

        fn test_empty_record_with_separator() {
            let root = "{ , }";
            let tree_ok = "record";
        }

        fn test_flat_record() {
            let root = "{ name : Text, port : Natural, tls : Optional Bool }";
            let tree_ok = "
                record
                  field name
                    scalar Text
                  field port
                    scalar Natural
                  field tls
                    optional
                      scalar Bool
            ";
        }

        fn test_nested_records() {
            let root = "{ Deployment : { web : { image : Text } } }";
            let tree_ok = "
                record
                  field Deployment
                    record
                      field web
                        record
                          field image
                            scalar Text
            ";
        }

        fn test_list_of_records() {
            let ty = "List { name : Text, port : Natural }";
            let tree_ok = "
                list
                  record
                    field name
                      scalar Text
                    field port
                      scalar Natural
            ";
        }

        fn test_parenthesized_applications() {
            let ty = "List (Optional (List Text))";
            let tree_ok = "
                list
                  optional
                    list
                      scalar Text
            ";
        }

        fn test_unparenthesized_applications() {
            let ty = "Optional List Text";
            let tree_ok = "
                optional
                  list
                    scalar Text
            ";
        }

        fn test_leading_separators() {
            let root = "
                { metadata :
                    { labels : { `app.kubernetes.io/name` : Text }
                    , name : Text
                    }
                , kind : Text
                }
            ";
            let tree_ok = "
                record
                  field metadata
                    record
                      field labels
                        record
                          field app.kubernetes.io/name
                            scalar Text
                      field name
                        scalar Text
                  field kind
                    scalar Text
            ";
        }

        fn test_keywords_as_labels() {
            let root = "{ List : Text, Optional : List Text }";
            let tree_ok = "
                record
                  field List
                    scalar Text
                  field Optional
                    list
                      scalar Text
            ";
        }

        fn test_comments_are_ignored() {
            let root = "{- inferred -} { a : Text -- trailing\n }";
            let tree_ok = "
                record
                  field a
                    scalar Text
            ";
        }

        fn test_error_duplicate_field() {
            let root = "{ a : Text, a : Bool }";
            let expected_errors = &["12..13: duplicate field `a`, first defined at 2..3"];
        }

        fn test_error_duplicate_quoted_field() {
            let root = "{ a : Text, `a` : Bool }";
            let expected_errors = &["12..15: duplicate field `a`, first defined at 2..3"];
        }

        fn test_error_unclosed_record() {
            let root = "{ a : { b : Text }";
            let expected_errors = &["18..18: unclosed record opened at 0..1"];
        }

        fn test_error_unclosed_after_separator() {
            let root = "{ a : Text,";
            let expected_errors = &["11..11: unclosed record opened at 0..1"];
        }

        fn test_error_trailing_separator() {
            let root = "{ a : Text, }";
            let expected_errors = &["12..13: expected a field label, but got RBrace"];
        }

        fn test_error_missing_colon() {
            let root = "{ a Text }";
            let expected_errors = &["4..8: expected token Colon, but got Identifier"];
        }

        fn test_error_missing_separator() {
            let root = "{ a : Text b : Bool }";
            let expected_errors = &["11..12: expected one of [Comma, RBrace], but got Identifier"];
        }

        fn test_error_missing_type() {
            let root = "{ a : , b : Bool }";
            let expected_errors = &["6..7: expected a type, but got Comma"];
        }

        fn test_error_quoted_scalar() {
            let ty = "List `Text`";
            let expected_errors = &["5..11: expected a type, but got QuotedIdentifier"];
        }

        fn test_error_unclosed_paren() {
            let ty = "List (Optional Text";
            let expected_errors = &["19..19: expected token RParen, but got Eof"];
        }

        fn test_error_trailing_input() {
            let root = "{ a : Text } }";
            let expected_errors = &["13..14: unexpected trailing RBrace"];
        }

        fn test_error_root_not_record() {
            let root = "List { a : Text }";
            let expected_errors = &["0..17: expected a record type at the top level"];
        }

        fn test_error_empty_input() {
            let root = "  ";
            let expected_errors = &["2..2: expected a type, but got Eof"];
        }

        fn test_error_from_lexer() {
            let root = "{ a : Text; }";
            let expected_errors = &["offset 10: unexpected character ';' (near `{ a : Text; }`)"];
        }
    );

    #[test]
    fn test_too_deep() {
        let src = format!("{}Text{}", "(".repeat(300), ")".repeat(300));
        let error = super::parse_type(&src, &mut Vec::new()).unwrap_err();
        let crate::Error::Parse(error) = error else {
            panic!("expected a parse error, got {error:?}");
        };
        assert_eq!(error.kind, super::ErrorKind::TooDeep);
        assert_eq!(error.span.lo, super::MAX_DEPTH);
    }

    #[test]
    fn test_wide_record_keeps_order() {
        let labels: Vec<String> = (0..5_000).map(|i| format!("field{i}")).collect();
        let src = format!(
            "{{ {} }}",
            labels
                .iter()
                .map(|l| format!("{l} : Text"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let ty = super::parse_in_new(&src).unwrap();
        let record = ty.as_record().unwrap();
        assert_eq!(record.len(), labels.len());
        assert!(record
            .fields()
            .iter()
            .zip(&labels)
            .all(|(field, label)| field.label.as_str() == label));
    }

    #[test]
    fn test_error_display_has_excerpt() {
        let error = super::parse_in_new("{ metadata : { name : Text, name : Text } }").unwrap_err();
        assert_eq!(
            error.to_string(),
            "parse error at 28..32: duplicate field `name`, first defined at 15..19 \
            (near `{ name : Text, name : Text } }`)"
        );
    }
}
