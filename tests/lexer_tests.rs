// tests/lexer_tests.rs

use cardql::ast::{CardState, CompareOp, DateKind, PropertyName, Rating, Token};
use cardql::error::SyntaxErrorCause;
use cardql::lexer::{Lexer, insert_implicit_and, tokenize};

fn kinds(query: &str) -> Vec<Token> {
    tokenize(query)
        .unwrap()
        .into_iter()
        .map(|spanned| spanned.token)
        .collect()
}

fn text(value: &str) -> Token {
    Token::Text {
        value: value.to_string(),
    }
}

// ============================================================================
// Delimiters and Operators
// ============================================================================

#[test]
fn test_empty_query_is_just_eof() {
    assert_eq!(kinds(""), vec![Token::Eof]);
    assert_eq!(kinds("   \t "), vec![Token::Eof]);
}

#[test]
fn test_parentheses() {
    assert_eq!(
        kinds("(dog)"),
        vec![Token::LParen, text("dog"), Token::RParen, Token::Eof]
    );
}

#[test]
fn test_boolean_keywords_are_case_sensitive() {
    assert_eq!(
        kinds("a OR b"),
        vec![text("a"), Token::Or, text("b"), Token::Eof]
    );
    assert_eq!(
        kinds("a or b"),
        vec![
            text("a"),
            Token::And,
            text("or"),
            Token::And,
            text("b"),
            Token::Eof
        ]
    );
}

#[test]
fn test_dash_negates_following_term() {
    assert_eq!(kinds("-dog"), vec![Token::Not, text("dog"), Token::Eof]);
    assert_eq!(
        kinds("--dog"),
        vec![Token::Not, Token::Not, text("dog"), Token::Eof]
    );
    assert_eq!(
        kinds("-(a)"),
        vec![Token::Not, Token::LParen, text("a"), Token::RParen, Token::Eof]
    );
}

#[test]
fn test_dash_before_number_is_still_negation() {
    assert_eq!(kinds("-5"), vec![Token::Not, text("5"), Token::Eof]);
}

#[test]
fn test_lone_dash_is_text() {
    assert_eq!(kinds("-"), vec![text("-"), Token::Eof]);
    assert_eq!(
        kinds("a - b"),
        vec![
            text("a"),
            Token::And,
            text("-"),
            Token::And,
            text("b"),
            Token::Eof
        ]
    );
}

#[test]
fn test_dash_inside_word_is_literal() {
    assert_eq!(kinds("well-known"), vec![text("well-known"), Token::Eof]);
}

// ============================================================================
// Quoted Phrases
// ============================================================================

#[test]
fn test_quoted_phrase() {
    assert_eq!(
        kinds(r#""big dog""#),
        vec![
            Token::QuotedText {
                value: "big dog".to_string()
            },
            Token::Eof
        ]
    );
}

#[test]
fn test_quoted_phrase_with_escaped_quote() {
    assert_eq!(
        kinds(r#""say \"hi\"""#),
        vec![
            Token::QuotedText {
                value: r#"say "hi""#.to_string()
            },
            Token::Eof
        ]
    );
}

#[test]
fn test_unclosed_quote_is_fatal() {
    let err = tokenize(r#"dog "big cat"#).unwrap_err();
    assert_eq!(err.cause, SyntaxErrorCause::UnclosedQuote);
    assert_eq!(err.message, "Unclosed double quote");
    assert_eq!(err.position, 4);
    assert_eq!(err.fragment, r#""big cat"#);
}

#[test]
fn test_unclosed_quote_inside_word_is_fatal() {
    let err = tokenize(r#"front:"big dog"#).unwrap_err();
    assert_eq!(err.cause, SyntaxErrorCause::UnclosedQuote);
    assert_eq!(err.position, 6);
}

#[test]
fn test_quoted_field_value_stays_one_token() {
    assert_eq!(
        kinds(r#"front:"big dog""#),
        vec![
            Token::Field {
                field: "front".to_string(),
                value: "big dog".to_string()
            },
            Token::Eof
        ]
    );
}

#[test]
fn test_parenthesis_inside_quoted_value_is_literal() {
    assert_eq!(
        kinds(r#"deck:"A (B)""#),
        vec![
            Token::Deck {
                path: "A (B)".to_string()
            },
            Token::Eof
        ]
    );
}

// ============================================================================
// Prefixes
// ============================================================================

#[test]
fn test_tag_and_deck() {
    assert_eq!(
        kinds("tag:language::arabic::* deck:Languages::Arabic"),
        vec![
            Token::Tag {
                pattern: "language::arabic::*".to_string()
            },
            Token::And,
            Token::Deck {
                path: "Languages::Arabic".to_string()
            },
            Token::Eof
        ]
    );
}

#[test]
fn test_prefixes_are_case_insensitive() {
    assert_eq!(
        kinds("TAG:vocab"),
        vec![
            Token::Tag {
                pattern: "vocab".to_string()
            },
            Token::Eof
        ]
    );
    assert_eq!(
        kinds("Is:Due"),
        vec![
            Token::State {
                state: CardState::Due
            },
            Token::Eof
        ]
    );
}

#[test]
fn test_states() {
    let cases = vec![
        ("is:due", CardState::Due),
        ("is:new", CardState::New),
        ("is:learning", CardState::Learning),
        ("is:review", CardState::Review),
        ("is:relearning", CardState::Relearning),
        ("is:paused", CardState::Paused),
        ("is:skipped", CardState::Skipped),
        ("is:buried", CardState::Skipped),
    ];

    for (input, expected) in cases {
        assert_eq!(
            kinds(input),
            vec![Token::State { state: expected }, Token::Eof],
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_unknown_state_lists_vocabulary() {
    let err = tokenize("is:frozen").unwrap_err();
    assert_eq!(err.cause, SyntaxErrorCause::UnknownState);
    assert!(err.message.contains("'frozen'"));
    assert!(err.message.contains("due, new, learning, review"));
    assert!(err.message.contains("buried"));
    assert_eq!(err.fragment, "is:frozen");
}

#[test]
fn test_flags() {
    for flag in 0..=7u8 {
        assert_eq!(
            kinds(&format!("flag:{}", flag)),
            vec![Token::Flag { flag }, Token::Eof]
        );
    }
}

#[test]
fn test_invalid_flags() {
    for input in [
        "flag:8", "flag:9", "flag:-1", "flag:red", "flag:", "flag:+3", "flag:0x1",
    ] {
        let err = tokenize(input).unwrap_err();
        assert_eq!(err.cause, SyntaxErrorCause::InvalidFlag, "input: {}", input);
        assert!(err.message.contains("0 to 7"));
    }
}

#[test]
fn test_property_operators() {
    let cases = vec![
        ("prop:ivl>=10", CompareOp::GreaterEqual),
        ("prop:ivl<=10", CompareOp::LessEqual),
        ("prop:ivl!=10", CompareOp::NotEqual),
        ("prop:ivl>10", CompareOp::GreaterThan),
        ("prop:ivl<10", CompareOp::LessThan),
        ("prop:ivl=10", CompareOp::Equal),
    ];

    for (input, op) in cases {
        assert_eq!(
            kinds(input),
            vec![
                Token::Property {
                    name: PropertyName::Interval,
                    op,
                    value: 10.0
                },
                Token::Eof
            ],
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_property_float_value() {
    assert_eq!(
        kinds("prop:ease!=2.5"),
        vec![
            Token::Property {
                name: PropertyName::Ease,
                op: CompareOp::NotEqual,
                value: 2.5
            },
            Token::Eof
        ]
    );
    assert_eq!(
        kinds("prop:retrievability<0.9"),
        vec![
            Token::Property {
                name: PropertyName::Retrievability,
                op: CompareOp::LessThan,
                value: 0.9
            },
            Token::Eof
        ]
    );
}

#[test]
fn test_property_errors() {
    let err = tokenize("prop:bogus>=10").unwrap_err();
    assert_eq!(err.cause, SyntaxErrorCause::InvalidProperty);
    assert!(err.message.contains("Unknown property 'bogus'"));

    let err = tokenize("prop:ivl10").unwrap_err();
    assert_eq!(err.cause, SyntaxErrorCause::InvalidProperty);
    assert!(err.message.contains("Missing comparison operator"));

    let err = tokenize("prop:ivl>=ten").unwrap_err();
    assert_eq!(err.cause, SyntaxErrorCause::InvalidProperty);
    assert!(err.message.contains("expected a number"));

    let err = tokenize("prop:ivl>=nan").unwrap_err();
    assert_eq!(err.cause, SyntaxErrorCause::InvalidProperty);

    let err = tokenize("prop:ivl>=").unwrap_err();
    assert_eq!(err.cause, SyntaxErrorCause::InvalidProperty);
}

#[test]
fn test_dates() {
    assert_eq!(
        kinds("added:7"),
        vec![
            Token::Date {
                kind: DateKind::Added,
                days: 7,
                rating: None
            },
            Token::Eof
        ]
    );
    assert_eq!(
        kinds("rated:3:2"),
        vec![
            Token::Date {
                kind: DateKind::Rated,
                days: 3,
                rating: Some(Rating::Hard)
            },
            Token::Eof
        ]
    );
}

#[test]
fn test_date_errors() {
    for input in [
        "added:-1",
        "added:soon",
        "added:3:1",
        "rated:3:9",
        "rated:3:0",
        "rated:x",
        "rated:1:2:3",
        "added:+1",
        "rated:+3",
        "rated:3:+2",
    ] {
        let err = tokenize(input).unwrap_err();
        assert_eq!(err.cause, SyntaxErrorCause::InvalidDate, "input: {}", input);
    }
}

#[test]
fn test_regex_word_and_accent_prefixes() {
    assert_eq!(
        kinds("re:^dog front:re:(cat|dog) w:dog nc:uber"),
        vec![
            Token::Regex {
                field: None,
                pattern: "^dog".to_string()
            },
            Token::And,
            Token::Regex {
                field: Some("front".to_string()),
                pattern: "".to_string()
            },
            Token::And,
            Token::LParen,
            text("cat|dog"),
            Token::RParen,
            Token::And,
            Token::WordBoundary {
                word: "dog".to_string()
            },
            Token::And,
            Token::AccentInsensitive {
                value: "uber".to_string()
            },
            Token::Eof
        ]
    );
}

#[test]
fn test_field_regex_with_quotes() {
    assert_eq!(
        kinds(r#"front:re:"(cat|dog)""#),
        vec![
            Token::Regex {
                field: Some("front".to_string()),
                pattern: "(cat|dog)".to_string()
            },
            Token::Eof
        ]
    );
}

#[test]
fn test_leading_colon_is_text() {
    assert_eq!(kinds(":dog"), vec![text(":dog"), Token::Eof]);
}

// ============================================================================
// Implicit Conjunction
// ============================================================================

#[test]
fn test_implicit_and_between_terms() {
    assert_eq!(
        kinds("a b"),
        vec![text("a"), Token::And, text("b"), Token::Eof]
    );
}

#[test]
fn test_no_implicit_and_next_to_explicit_operators() {
    assert_eq!(
        kinds("a AND b"),
        vec![text("a"), Token::And, text("b"), Token::Eof]
    );
    assert_eq!(
        kinds("a OR -b"),
        vec![text("a"), Token::Or, Token::Not, text("b"), Token::Eof]
    );
}

#[test]
fn test_implicit_and_around_groups() {
    assert_eq!(
        kinds("(a) (b) -c"),
        vec![
            Token::LParen,
            text("a"),
            Token::RParen,
            Token::And,
            Token::LParen,
            text("b"),
            Token::RParen,
            Token::And,
            Token::Not,
            text("c"),
            Token::Eof
        ]
    );
}

#[test]
fn test_no_implicit_and_before_closing_paren() {
    assert_eq!(
        kinds("(a b)"),
        vec![
            Token::LParen,
            text("a"),
            Token::And,
            text("b"),
            Token::RParen,
            Token::Eof
        ]
    );
}

#[test]
fn test_implicit_and_pass_is_pure() {
    let mut lexer = Lexer::new("a b");
    let raw = vec![
        lexer.next_token().unwrap(),
        lexer.next_token().unwrap(),
        lexer.next_token().unwrap(),
    ];
    let with_and = insert_implicit_and(&raw);

    assert_eq!(raw.len(), 3);
    assert_eq!(with_and.len(), 4);
    assert_eq!(with_and[1].token, Token::And);
    assert_eq!(with_and[1].position, raw[1].position);
    assert_eq!(with_and[1].lexeme, "");
}

#[test]
fn test_positions_and_lexemes() {
    let tokens = tokenize("  tag:a  -b").unwrap();
    assert_eq!(tokens[0].position, 2);
    assert_eq!(tokens[0].lexeme, "tag:a");
    assert_eq!(tokens[2].token, Token::Not);
    assert_eq!(tokens[2].position, 9);
    assert_eq!(tokens[3].position, 10);
    assert_eq!(tokens.last().unwrap().position, 11);
}
