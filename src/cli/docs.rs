//! Grammar reference for the cardql CLI

use super::CliError;

/// Available grammar topics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarTopic {
    Terms,
    Operators,
    Prefixes,
    Properties,
    Errors,
}

impl GrammarTopic {
    /// Parse topic name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "terms" | "text" => Some(Self::Terms),
            "operators" | "ops" | "boolean" => Some(Self::Operators),
            "prefixes" | "prefix" => Some(Self::Prefixes),
            "properties" | "prop" | "props" => Some(Self::Properties),
            "errors" | "error" => Some(Self::Errors),
            _ => None,
        }
    }
}

/// Get the grammar overview (topic listing)
pub fn get_grammar_overview() -> &'static str {
    r#"CARDQL GRAMMAR

CardQL is a search language for flashcards. A query is a list of terms;
terms next to each other must all match. Queries compile to a parameterized
SQL filter.

GRAMMAR TOPICS

  terms             Plain words, quoted phrases and field-scoped text
  operators         AND, OR, NOT, '-' and parentheses
  prefixes          tag:, deck:, is:, flag:, added:, rated:, re:, w:, nc:
  properties        prop: comparisons on scheduling data
  errors            What makes a query invalid

QUICK REFERENCE

  dog cat                 both words
  "big dog"               exact phrase
  front:cat               text in one field
  tag:vocab::*            tag and its children
  deck:Languages          deck and its subdecks
  -is:paused              negation
  a OR (b c)              grouping

Run 'cardql grammar <topic>' for details.
"#
}

/// Get the reference text for one topic
pub fn get_grammar_topic(name: &str) -> Result<&'static str, CliError> {
    match GrammarTopic::from_name(name) {
        Some(GrammarTopic::Terms) => Ok(TERMS_DOC),
        Some(GrammarTopic::Operators) => Ok(OPERATORS_DOC),
        Some(GrammarTopic::Prefixes) => Ok(PREFIXES_DOC),
        Some(GrammarTopic::Properties) => Ok(PROPERTIES_DOC),
        Some(GrammarTopic::Errors) => Ok(ERRORS_DOC),
        None => Err(CliError::UnknownTopic(name.to_string())),
    }
}

const TERMS_DOC: &str = r#"TERMS

PLAIN WORDS
  dog
    Case-insensitive substring match over every field of the note.
    A word runs until whitespace or a parenthesis.

QUOTED PHRASES
  "big dog"
    Spaces inside quotes are part of the phrase. Use \" for a literal quote.
    A quote that is never closed is an error.

FIELD-SCOPED TEXT
  front:cat
  front:"big dog"
    Only the named field is searched. Field names are case-insensitive.
    A field the note type does not have matches nothing.
"#;

const OPERATORS_DOC: &str = r#"OPERATORS

  a b             a AND b (implicit)
  a AND b         both
  a OR b          either
  NOT a           negation
  -a              negation, the dash must touch the term
  ( ... )         grouping

PRECEDENCE (loosest first)
  OR, then AND, then NOT / '-'. Parentheses override.

    a OR b c      a OR (b AND c)
    (a OR b) c    (a OR b) AND c
    --a           NOT (NOT a)

  Keywords are case-sensitive: 'and' is an ordinary word.
  A lone '-' followed by a space is an ordinary word.
"#;

const PREFIXES_DOC: &str = r#"PREFIXES

  tag:vocab                 exactly this tag
  tag:language::arabic::*   the tag and everything below it
  tag:lang*                 tags starting with 'lang'
  deck:Languages::Arabic    the deck and its subdecks
  is:due                    due now, not paused or skipped
  is:new | learning | review | relearning
  is:paused | skipped       ('buried' is an alias of skipped)
  flag:0..7                 flag colour, 0 means no flag
  added:N                   created in the last N days
  rated:N                   reviewed in the last N days
  rated:N:R                 ... with rating R (1 Again, 2 Hard, 3 Good, 4 Easy)
  re:PATTERN                regular expression over all fields
  field:re:PATTERN          regular expression over one field
  w:WORD                    whole word, '*' matches word characters
  nc:TEXT                   ignore accents
"#;

const PROPERTIES_DOC: &str = r#"PROPERTIES

  prop:NAME OP VALUE

  NAME   ivl, lapses, ease, reps, stability, retrievability, difficulty
  OP     >=  <=  !=  >  <  =
  VALUE  any finite number

  Examples:
    prop:ivl>=10
    prop:lapses>3
    prop:retrievability<0.9

  Cards that were never reviewed have no retrievability and never match
  a retrievability comparison.
"#;

const ERRORS_DOC: &str = r#"ERRORS

  A query is rejected as a whole; nothing runs. Causes:

  - an unclosed double quote
  - an unknown is: state
  - a flag outside 0..7
  - a prop: clause with an unknown name, no operator or a non-numeric value
  - an added:/rated: clause with a bad day count or a rating outside 1..4
  - unbalanced parentheses
  - a query that ends where a term was expected, e.g. 'dog OR'
"#;

#[test]
fn test_topic_lookup() {
    assert_eq!(GrammarTopic::from_name("Props"), Some(GrammarTopic::Properties));
    assert!(get_grammar_topic("prefixes").unwrap().contains("rated:N:R"));
    assert!(matches!(
        get_grammar_topic("colours"),
        Err(CliError::UnknownTopic(_))
    ));
}
