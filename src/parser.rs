use crate::{
    ast::{DateFilter, Node, Spanned, Token},
    error::{SearchSyntaxError, SyntaxErrorCause},
    lexer::tokenize,
};
use std::mem;

pub struct Parser {
    tokens: std::vec::IntoIter<Spanned>,
    current: Spanned,
    /// Source text of the last consumed token, used for end-of-input errors
    previous_lexeme: String,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        let mut tokens = tokens.into_iter();
        let current = tokens
            .next()
            .unwrap_or_else(|| Spanned::new(Token::Eof, 0, ""));
        Parser {
            tokens,
            current,
            previous_lexeme: String::new(),
        }
    }

    /// Moves to the next token. Past the end the parser stays on `Eof`.
    fn advance(&mut self) {
        if let Some(next) = self.tokens.next() {
            self.previous_lexeme = mem::replace(&mut self.current, next).lexeme;
        }
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    fn unexpected_end(&self) -> SearchSyntaxError {
        SearchSyntaxError::new(
            SyntaxErrorCause::UnexpectedEnd,
            "Unexpected end of query: expected a search term",
            self.previous_lexeme.clone(),
            self.current.position,
        )
    }

    /// Parse primary expressions: a parenthesised group, a single predicate
    /// or a negation. Negation binds tighter than any binary operator and may
    /// repeat (`--a`).
    fn parse_primary(&mut self) -> Result<Node, SearchSyntaxError> {
        let position = self.current.position;

        match mem::replace(&mut self.current.token, Token::Eof) {
            Token::LParen => {
                self.advance();
                let node = self.parse_or()?;
                match self.current.token {
                    Token::RParen => {
                        self.advance();
                        Ok(node)
                    }
                    Token::Eof => Err(SearchSyntaxError::new(
                        SyntaxErrorCause::UnbalancedParenthesis,
                        "Unclosed parenthesis: missing ')'",
                        "(",
                        position,
                    )),
                    _ => Err(SearchSyntaxError::new(
                        SyntaxErrorCause::UnexpectedToken,
                        "Expected ')' to close group",
                        self.current.lexeme.clone(),
                        self.current.position,
                    )),
                }
            }

            // Leaves
            Token::Text { value } => {
                self.advance();
                Ok(Node::Text { value, field: None })
            }
            Token::QuotedText { value } => {
                self.advance();
                Ok(Node::QuotedText(value))
            }
            Token::Field { field, value } => {
                self.advance();
                Ok(Node::Text {
                    value,
                    field: Some(field),
                })
            }
            Token::Tag { pattern } => {
                self.advance();
                Ok(Node::Tag(pattern))
            }
            Token::Deck { path } => {
                self.advance();
                Ok(Node::Deck(path))
            }
            Token::State { state } => {
                self.advance();
                Ok(Node::State(state))
            }
            Token::Flag { flag } => {
                self.advance();
                Ok(Node::Flag(flag))
            }
            Token::Property { name, op, value } => {
                self.advance();
                Ok(Node::Property { name, op, value })
            }
            Token::Date { kind, days, rating } => {
                self.advance();
                Ok(Node::Date(DateFilter { kind, days, rating }))
            }
            Token::Regex { field, pattern } => {
                self.advance();
                Ok(Node::Regex { pattern, field })
            }
            Token::WordBoundary { word } => {
                self.advance();
                Ok(Node::WordBoundary(word))
            }
            Token::AccentInsensitive { value } => {
                self.advance();
                Ok(Node::AccentInsensitive(value))
            }

            Token::Not => {
                self.advance();
                let operand = self.parse_primary()?;
                Ok(Node::not(operand))
            }

            Token::Eof => Err(self.unexpected_end()),
            Token::RParen => Err(SearchSyntaxError::new(
                SyntaxErrorCause::UnexpectedToken,
                "Unexpected ')': expected a search term",
                ")",
                position,
            )),
            token @ (Token::And | Token::Or) => {
                let keyword = if token == Token::And { "AND" } else { "OR" };
                Err(SearchSyntaxError::new(
                    SyntaxErrorCause::UnexpectedToken,
                    format!("Unexpected operator '{}': expected a search term", keyword),
                    self.current.lexeme.clone(),
                    position,
                ))
            }
        }
    }

    fn parse_and(&mut self) -> Result<Node, SearchSyntaxError> {
        let mut left = self.parse_primary()?;

        while self.check(&Token::And) {
            self.advance();
            let right = self.parse_primary()?;
            left = Node::and(left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Node, SearchSyntaxError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Node::or(left, right);
        }
        Ok(left)
    }

    /// Parse the whole stream. An empty stream yields [`Node::MatchAll`].
    pub fn parse(&mut self) -> Result<Node, SearchSyntaxError> {
        if self.check(&Token::Eof) {
            return Ok(Node::MatchAll);
        }

        let node = self.parse_or()?;

        match self.current.token {
            Token::Eof => Ok(node),
            Token::RParen => Err(SearchSyntaxError::new(
                SyntaxErrorCause::UnbalancedParenthesis,
                "Unmatched closing parenthesis",
                ")",
                self.current.position,
            )),
            _ => Err(SearchSyntaxError::new(
                SyntaxErrorCause::UnexpectedToken,
                "Expected an operator or the end of the query",
                self.current.lexeme.clone(),
                self.current.position,
            )),
        }
    }
}

/// Tokenizes and parses a query in one step.
pub fn parse_query(query: &str) -> Result<Node, SearchSyntaxError> {
    let tokens = tokenize(query)?;
    Parser::new(tokens).parse()
}

#[test]
fn test_stays_on_eof_past_the_end() {
    let mut parser = Parser::new(vec![Spanned::new(Token::Eof, 0, "")]);
    parser.advance();
    parser.advance();
    assert!(parser.check(&Token::Eof));
    assert_eq!(parser.parse().unwrap(), Node::MatchAll);
}
