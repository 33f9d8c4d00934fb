use tracing::trace;

use crate::ast::{CardState, CompareOp, DateKind, PropertyName, Rating, Spanned, Token};
use crate::error::{SearchSyntaxError, SyntaxErrorCause};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn slice(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn unclosed_quote(&self, start: usize) -> SearchSyntaxError {
        SearchSyntaxError::new(
            SyntaxErrorCause::UnclosedQuote,
            "Unclosed double quote",
            self.input[start..].iter().collect::<String>(),
            start,
        )
    }

    /// Reads a standalone `"..."` phrase and returns its unescaped content.
    fn read_quoted(&mut self) -> Result<String, SearchSyntaxError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' if matches!(self.peek_char(1), Some('"' | '\\')) => {
                    self.advance();
                    if let Some(escaped) = self.current_char() {
                        result.push(escaped);
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.unclosed_quote(start))
    }

    /// Reads a bare word up to whitespace or a parenthesis. Quoted sections
    /// inside the word are kept verbatim, so `front:"big dog"` stays one word.
    fn read_word(&mut self) -> Result<String, SearchSyntaxError> {
        let mut word = String::new();

        while let Some(ch) = self.current_char() {
            match ch {
                c if c.is_whitespace() || c == '(' || c == ')' => break,
                '"' => {
                    let quote_start = self.position;
                    word.push(ch);
                    self.advance();
                    loop {
                        match self.current_char() {
                            Some('\\') => {
                                word.push('\\');
                                self.advance();
                                if let Some(escaped) = self.current_char() {
                                    word.push(escaped);
                                    self.advance();
                                }
                            }
                            Some('"') => {
                                word.push('"');
                                self.advance();
                                break;
                            }
                            Some(c) => {
                                word.push(c);
                                self.advance();
                            }
                            None => return Err(self.unclosed_quote(quote_start)),
                        }
                    }
                }
                _ => {
                    word.push(ch);
                    self.advance();
                }
            }
        }

        Ok(word)
    }

    pub fn next_token(&mut self) -> Result<Spanned, SearchSyntaxError> {
        self.skip_whitespace();
        let start = self.position;

        match self.current_char() {
            None => Ok(Spanned::new(Token::Eof, start, "")),
            Some('(') => {
                self.advance();
                Ok(Spanned::new(Token::LParen, start, "("))
            }
            Some(')') => {
                self.advance();
                Ok(Spanned::new(Token::RParen, start, ")"))
            }
            // A dash glued to the next character always negates, even in front
            // of something that looks like a number.
            Some('-') if self.peek_char(1).is_some_and(|c| !c.is_whitespace()) => {
                self.advance();
                Ok(Spanned::new(Token::Not, start, "-"))
            }
            Some('"') => {
                let value = self.read_quoted()?;
                Ok(Spanned::new(
                    Token::QuotedText { value },
                    start,
                    self.slice(start),
                ))
            }
            Some(_) => {
                let word = self.read_word()?;
                let token = classify_word(&word, start)?;
                Ok(Spanned::new(token, start, word))
            }
        }
    }
}

/// Scans the whole query and inserts implicit conjunctions.
///
/// The returned stream always ends with exactly one `Eof`.
pub fn tokenize(query: &str) -> Result<Vec<Spanned>, SearchSyntaxError> {
    let mut lexer = Lexer::new(query);
    let mut tokens = vec![];

    loop {
        let spanned = lexer.next_token()?;
        let done = spanned.token == Token::Eof;
        tokens.push(spanned);
        if done {
            break;
        }
    }

    Ok(insert_implicit_and(&tokens))
}

/// Inserts an `And` between every term-ending token and a following token
/// that can begin an expression.
pub fn insert_implicit_and(tokens: &[Spanned]) -> Vec<Spanned> {
    let mut result = Vec::with_capacity(tokens.len() * 2);
    let mut inserted = 0usize;

    for (index, spanned) in tokens.iter().enumerate() {
        if index > 0
            && tokens[index - 1].token.is_value_like()
            && spanned.token.can_start_expression()
        {
            result.push(Spanned::new(Token::And, spanned.position, ""));
            inserted += 1;
        }
        result.push(spanned.clone());
    }

    trace!(inserted, total = result.len(), "inserted implicit conjunctions");
    result
}

fn classify_word(word: &str, position: usize) -> Result<Token, SearchSyntaxError> {
    match word {
        "AND" => return Ok(Token::And),
        "OR" => return Ok(Token::Or),
        "NOT" => return Ok(Token::Not),
        _ => {}
    }

    let Some((prefix, rest)) = word.split_once(':') else {
        return Ok(Token::Text {
            value: unquote(word),
        });
    };
    if prefix.is_empty() {
        return Ok(Token::Text {
            value: unquote(word),
        });
    }

    let token = match prefix.to_ascii_lowercase().as_str() {
        "tag" => Token::Tag {
            pattern: unquote(rest),
        },
        "deck" => Token::Deck { path: unquote(rest) },
        "is" => parse_state(rest, word, position)?,
        "flag" => parse_flag(rest, word, position)?,
        "prop" => parse_property(rest, word, position)?,
        "added" => parse_date(DateKind::Added, rest, word, position)?,
        "rated" => parse_date(DateKind::Rated, rest, word, position)?,
        "re" => Token::Regex {
            field: None,
            pattern: unquote(rest),
        },
        "w" => Token::WordBoundary { word: unquote(rest) },
        "nc" => Token::AccentInsensitive {
            value: unquote(rest),
        },
        _ => {
            let field = unquote(prefix);
            match rest.get(..3) {
                Some(scope) if scope.eq_ignore_ascii_case("re:") => Token::Regex {
                    field: Some(field),
                    pattern: unquote(&rest[3..]),
                },
                _ => Token::Field {
                    field,
                    value: unquote(rest),
                },
            }
        }
    };

    Ok(token)
}

/// Drops unescaped double quotes and resolves `\"` and `\\`.
fn unquote(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if matches!(chars.peek(), Some('"' | '\\')) => {
                if let Some(escaped) = chars.next() {
                    result.push(escaped);
                }
            }
            '"' => {}
            _ => result.push(ch),
        }
    }
    result
}

fn parse_state(value: &str, word: &str, position: usize) -> Result<Token, SearchSyntaxError> {
    let value = unquote(value);
    CardState::from_keyword(&value)
        .map(|state| Token::State { state })
        .ok_or_else(|| {
            SearchSyntaxError::new(
                SyntaxErrorCause::UnknownState,
                format!(
                    "Unknown card state '{}': expected one of {}",
                    value,
                    CardState::VOCABULARY.join(", ")
                ),
                word,
                position,
            )
        })
}

/// Parses an unsigned decimal made of ASCII digits only; `str::parse`
/// would also take a leading `+`.
fn parse_digits<T: std::str::FromStr>(value: &str) -> Option<T> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn parse_flag(value: &str, word: &str, position: usize) -> Result<Token, SearchSyntaxError> {
    match parse_digits::<u8>(value) {
        Some(flag) if flag <= 7 => Ok(Token::Flag { flag }),
        _ => Err(SearchSyntaxError::new(
            SyntaxErrorCause::InvalidFlag,
            format!("Invalid flag '{}': flags range from 0 to 7", value),
            word,
            position,
        )),
    }
}

/// Finds the first position holding a comparison operator, preferring the
/// two-character spellings at that position.
fn find_operator(clause: &str) -> Option<(usize, CompareOp)> {
    clause.char_indices().find_map(|(index, _)| {
        let rest = &clause[index..];
        CompareOp::ALL
            .iter()
            .find(|op| rest.starts_with(op.symbol()))
            .map(|op| (index, *op))
    })
}

fn parse_property(clause: &str, word: &str, position: usize) -> Result<Token, SearchSyntaxError> {
    let invalid = |message: String| {
        SearchSyntaxError::new(SyntaxErrorCause::InvalidProperty, message, word, position)
    };

    let Some((index, op)) = find_operator(clause) else {
        return Err(invalid(format!(
            "Missing comparison operator in property clause '{}': expected one of >=, <=, !=, >, <, =",
            clause
        )));
    };

    let raw_name = &clause[..index];
    let name = PropertyName::from_keyword(raw_name).ok_or_else(|| {
        invalid(format!(
            "Unknown property '{}': expected one of {}",
            raw_name,
            PropertyName::VOCABULARY.join(", ")
        ))
    })?;

    let raw_value = &clause[index + op.symbol().len()..];
    let value = raw_value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            invalid(format!(
                "Invalid value '{}' for property {}: expected a number",
                raw_value,
                name.as_str()
            ))
        })?;

    Ok(Token::Property { name, op, value })
}

fn parse_date(
    kind: DateKind,
    value: &str,
    word: &str,
    position: usize,
) -> Result<Token, SearchSyntaxError> {
    let prefix = match kind {
        DateKind::Added => "added",
        DateKind::Rated => "rated",
    };
    let invalid = |message: String| {
        SearchSyntaxError::new(SyntaxErrorCause::InvalidDate, message, word, position)
    };

    let parts: Vec<&str> = value.split(':').collect();
    let (raw_days, raw_rating) = match (kind, parts.as_slice()) {
        (_, [days]) => (*days, None),
        (DateKind::Rated, [days, rating]) => (*days, Some(*rating)),
        _ => {
            return Err(invalid(format!(
                "Malformed {} clause '{}': expected {}:DAYS{}",
                prefix,
                value,
                prefix,
                if kind == DateKind::Rated { "[:RATING]" } else { "" }
            )));
        }
    };

    let days = parse_digits::<u32>(raw_days).ok_or_else(|| {
        invalid(format!(
            "Invalid day count '{}' in {}: expected a non-negative whole number",
            raw_days, prefix
        ))
    })?;

    let rating = match raw_rating {
        None => None,
        Some(raw) => Some(
            parse_digits::<u8>(raw)
                .and_then(Rating::from_number)
                .ok_or_else(|| {
                    invalid(format!(
                        "Invalid rating '{}' in rated: expected 1 (Again), 2 (Hard), 3 (Good) or 4 (Easy)",
                        raw
                    ))
                })?,
        ),
    };

    Ok(Token::Date { kind, days, rating })
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("AND OR NOT and");
    assert_eq!(lexer.next_token().unwrap().token, Token::And);
    assert_eq!(lexer.next_token().unwrap().token, Token::Or);
    assert_eq!(lexer.next_token().unwrap().token, Token::Not);
    assert_eq!(
        lexer.next_token().unwrap().token,
        Token::Text {
            value: "and".to_string()
        }
    );
    assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
}

#[test]
fn test_operator_prefers_longest_match() {
    assert_eq!(find_operator("ivl>=10"), Some((3, CompareOp::GreaterEqual)));
    assert_eq!(find_operator("ivl=>10"), Some((3, CompareOp::Equal)));
    assert_eq!(find_operator("ivl10"), None);
}

#[test]
fn test_parse_digits() {
    assert_eq!(parse_digits::<u8>("7"), Some(7));
    assert_eq!(parse_digits::<u8>("+3"), None);
    assert_eq!(parse_digits::<u32>(""), None);
    assert_eq!(parse_digits::<u32>(" 1"), None);
}

#[test]
fn test_unquote() {
    assert_eq!(unquote(r#""big dog""#), "big dog");
    assert_eq!(unquote(r#"say \"hi\""#), r#"say "hi""#);
    assert_eq!(unquote("plain"), "plain");
}
