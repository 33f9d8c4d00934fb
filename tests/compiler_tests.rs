// tests/compiler_tests.rs

use cardql::ast::Node;
use cardql::compiler::{SqlParam, SqlQuery, compile, placeholder_numbers};
use cardql::parser::parse_query;
use cardql::schema::Join;

fn compile_query(query: &str) -> SqlQuery {
    compile(&parse_query(query).unwrap(), 0)
}

fn text(value: &str) -> SqlParam {
    SqlParam::Text(value.to_string())
}

const FIELDS: &str = "EXISTS (SELECT 1 FROM jsonb_each_text(n.fields) AS f(key, value) WHERE";

// ============================================================================
// Text
// ============================================================================

#[test]
fn test_match_all() {
    let sql = compile(&Node::MatchAll, 0);
    assert_eq!(sql.predicate, "TRUE");
    assert!(sql.params.is_empty());
    assert!(sql.joins.is_empty());
}

#[test]
fn test_unscoped_text() {
    let sql = compile_query("dog");
    assert_eq!(sql.predicate, format!("{} f.value ILIKE $1)", FIELDS));
    assert_eq!(sql.params, vec![text("%dog%")]);
    assert_eq!(sql.joins, vec![Join::Note]);
}

#[test]
fn test_quoted_text_matches_like_text() {
    let quoted = compile_query(r#""big dog""#);
    let plain = compile(&Node::text("big dog"), 0);
    assert_eq!(quoted, plain);
}

#[test]
fn test_text_escapes_like_wildcards() {
    let sql = compile_query("100%_off");
    assert_eq!(sql.params, vec![text(r"%100\%\_off%")]);
}

#[test]
fn test_field_scoped_text() {
    let sql = compile_query("front:cat");
    assert_eq!(
        sql.predicate,
        format!("{} lower(f.key) = lower($1) AND f.value ILIKE $2)", FIELDS)
    );
    assert_eq!(sql.params, vec![text("front"), text("%cat%")]);
}

#[test]
fn test_unknown_field_compiles_to_field_lookup() {
    // Field existence is not checked here; a note without the field has no
    // matching row, so the predicate is false for it.
    let sql = compile_query("bogus:cat");
    assert_eq!(sql.params, vec![text("bogus"), text("%cat%")]);
    assert!(sql.predicate.contains("lower(f.key) = lower($1)"));
}

#[test]
fn test_regex_word_and_accent() {
    let sql = compile_query("re:^dog");
    assert_eq!(sql.predicate, format!("{} f.value ~* $1)", FIELDS));
    assert_eq!(sql.params, vec![text("^dog")]);

    let sql = compile_query("front:re:^dog");
    assert_eq!(
        sql.predicate,
        format!("{} lower(f.key) = lower($1) AND f.value ~* $2)", FIELDS)
    );

    let sql = compile_query("w:dog");
    assert_eq!(sql.params, vec![text(r"\mdog\M")]);

    let sql = compile_query("nc:uber");
    assert_eq!(
        sql.predicate,
        format!("{} unaccent(f.value) ILIKE unaccent($1))", FIELDS)
    );
    assert_eq!(sql.params, vec![text("%uber%")]);
}

// ============================================================================
// Tags and Decks
// ============================================================================

#[test]
fn test_exact_tag() {
    let sql = compile_query("tag:vocab");
    assert_eq!(
        sql.predicate,
        "EXISTS (SELECT 1 FROM unnest(nt.slugs) AS s(slug) WHERE s.slug ILIKE $1)"
    );
    assert_eq!(sql.params, vec![text("vocab")]);
    assert_eq!(sql.joins, vec![Join::NoteTags]);
}

#[test]
fn test_tag_with_descendants() {
    let sql = compile_query("tag:language::arabic::*");
    assert_eq!(
        sql.predicate,
        "EXISTS (SELECT 1 FROM unnest(nt.slugs) AS s(slug) WHERE (s.slug ILIKE $1 OR s.slug ILIKE ($1 || '::%')))"
    );
    assert_eq!(sql.params, vec![text("language::arabic")]);
}

#[test]
fn test_tag_prefix_wildcard() {
    let sql = compile_query("tag:lang*");
    assert_eq!(sql.params, vec![text("lang%")]);
    assert!(sql.predicate.ends_with("WHERE s.slug ILIKE $1)"));
}

#[test]
fn test_tag_escapes_like_characters() {
    let sql = compile_query("tag:my_tag::*");
    assert_eq!(sql.params, vec![text(r"my\_tag")]);
}

#[test]
fn test_deck_includes_subdecks() {
    let sql = compile_query("deck:Languages::Arabic");
    assert_eq!(
        sql.predicate,
        "(d.path ILIKE $1 OR d.path ILIKE ($1 || '::%'))"
    );
    assert_eq!(sql.params, vec![text("Languages::Arabic")]);
    assert_eq!(sql.joins, vec![Join::Deck]);
}

#[test]
fn test_deck_prefix_wildcard() {
    let sql = compile_query("deck:Lang*");
    assert_eq!(sql.predicate, "d.path ILIKE $1");
    assert_eq!(sql.params, vec![text("Lang%")]);
}

// ============================================================================
// Card State, Flags, Properties, Dates
// ============================================================================

#[test]
fn test_states() {
    let sql = compile_query("is:due");
    assert_eq!(sql.predicate, "(c.due <= now() AND c.status = $1)");
    assert_eq!(sql.params, vec![text("active")]);

    let sql = compile_query("is:review");
    assert_eq!(sql.predicate, "(c.card_type = $1 AND c.status = $2)");
    assert_eq!(sql.params, vec![text("review"), text("active")]);

    let sql = compile_query("is:paused");
    assert_eq!(sql.predicate, "c.status = $1");
    assert_eq!(sql.params, vec![text("paused")]);

    let sql = compile_query("is:buried");
    assert_eq!(sql.params, vec![text("skipped")]);
    assert!(sql.joins.is_empty());
}

#[test]
fn test_flag() {
    let sql = compile_query("flag:0");
    assert_eq!(sql.predicate, "c.flag = $1");
    assert_eq!(sql.params, vec![SqlParam::Integer(0)]);
}

#[test]
fn test_properties() {
    let cases = vec![
        ("prop:ivl>=10", "c.interval >= $1"),
        ("prop:lapses<=3", "c.lapses <= $1"),
        ("prop:ease!=2.5", "c.ease != $1"),
        ("prop:reps>1", "c.reps > $1"),
        ("prop:stability<4", "c.stability < $1"),
        ("prop:difficulty=5", "c.difficulty = $1"),
    ];

    for (query, expected) in cases {
        assert_eq!(compile_query(query).predicate, expected, "query: {}", query);
    }

    let sql = compile_query("prop:ease!=2.5");
    assert_eq!(sql.params, vec![SqlParam::Float(2.5)]);
}

#[test]
fn test_retrievability_is_derived_from_review_log() {
    let sql = compile_query("prop:retrievability<0.9");
    assert!(sql.predicate.starts_with("power("));
    assert!(sql.predicate.contains("FROM review_logs rl WHERE rl.card_id = c.id"));
    assert!(sql.predicate.ends_with("-0.5) < $1"));
    assert_eq!(sql.params, vec![SqlParam::Float(0.9)]);
}

#[test]
fn test_added() {
    let sql = compile_query("added:7");
    assert_eq!(
        sql.predicate,
        "c.created_at >= now() - ($1 * INTERVAL '1 day')"
    );
    assert_eq!(sql.params, vec![SqlParam::Integer(7)]);
}

#[test]
fn test_rated() {
    let sql = compile_query("rated:3");
    assert_eq!(
        sql.predicate,
        "EXISTS (SELECT 1 FROM review_logs rl WHERE rl.card_id = c.id AND rl.reviewed_at >= now() - ($1 * INTERVAL '1 day'))"
    );
    assert_eq!(sql.params, vec![SqlParam::Integer(3)]);

    let sql = compile_query("rated:3:1");
    assert!(sql.predicate.ends_with(" AND rl.rating = $2)"));
    assert_eq!(sql.params, vec![SqlParam::Integer(3), SqlParam::Integer(1)]);
}

// ============================================================================
// Combinators
// ============================================================================

#[test]
fn test_and_or_wrap_both_sides() {
    let sql = compile_query("flag:1 OR flag:2");
    assert_eq!(sql.predicate, "(c.flag = $1) OR (c.flag = $2)");

    let sql = compile_query("flag:1 flag:2");
    assert_eq!(sql.predicate, "(c.flag = $1) AND (c.flag = $2)");
    assert_eq!(sql.params, vec![SqlParam::Integer(1), SqlParam::Integer(2)]);
}

#[test]
fn test_not_keeps_params_and_joins() {
    let inner = compile_query("tag:vocab");
    let sql = compile_query("-tag:vocab");
    assert_eq!(
        sql.predicate,
        format!("NOT COALESCE(({}), FALSE)", inner.predicate)
    );
    assert_eq!(sql.params, inner.params);
    assert_eq!(sql.joins, inner.joins);
}

#[test]
fn test_not_treats_null_as_false() {
    // `due` and `ease` are nullable; a NULL comparison must land on the
    // negated side instead of dropping the card from both.
    let sql = compile_query("-prop:ease>2");
    assert_eq!(sql.predicate, "NOT COALESCE((c.ease > $1), FALSE)");

    let sql = compile_query("NOT prop:retrievability<0.9");
    assert!(sql.predicate.starts_with("NOT COALESCE((power("));
    assert!(sql.predicate.ends_with("-0.5) < $1), FALSE)"));

    let sql = compile_query("--flag:1");
    assert_eq!(
        sql.predicate,
        "NOT COALESCE((NOT COALESCE((c.flag = $1), FALSE)), FALSE)"
    );
}

#[test]
fn test_joins_are_deduplicated_in_first_use_order() {
    let sql = compile_query("deck:a dog tag:x deck:b cat");
    assert_eq!(sql.joins, vec![Join::Deck, Join::Note, Join::NoteTags]);
}

#[test]
fn test_offset_shifts_every_placeholder() {
    let node = parse_query("flag:1 OR (front:x -is:new)").unwrap();
    let sql = compile(&node, 4);
    assert_eq!(
        placeholder_numbers(&sql.predicate).into_iter().collect::<Vec<_>>(),
        vec![5, 6, 7, 8, 9]
    );
    assert_eq!(sql.params.len(), 5);
    assert_eq!(sql.params[0], SqlParam::Integer(1));
    assert_eq!(sql.params[1], text("front"));
    assert_eq!(sql.params[3], text("new"));
}

#[test]
fn test_nested_combinators_number_left_to_right() {
    let sql = compile_query("(flag:1 OR flag:2) (flag:3 OR -flag:4)");
    assert_eq!(
        sql.predicate,
        "((c.flag = $1) OR (c.flag = $2)) AND ((c.flag = $3) OR (NOT COALESCE((c.flag = $4), FALSE)))"
    );
    assert_eq!(
        sql.params,
        (1..=4).map(SqlParam::Integer).collect::<Vec<_>>()
    );
}

#[test]
fn test_join_clauses_render_sql() {
    let sql = compile_query("deck:a tag:b");
    let clauses: Vec<_> = sql.join_clauses().collect();
    assert_eq!(clauses[0], "JOIN decks d ON d.id = c.deck_id");
    assert!(clauses[1].starts_with("LEFT JOIN LATERAL"));
    assert!(clauses[1].ends_with(") nt ON TRUE"));
}

#[test]
fn test_serializes_to_json() {
    let sql = compile_query("flag:2 deck:a");
    let json = serde_json::to_value(&sql).unwrap();
    assert_eq!(json["params"], serde_json::json!([2, "a"]));
    assert_eq!(json["joins"], serde_json::json!(["deck"]));
}
