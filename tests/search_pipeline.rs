//! End-to-end tests: query string through parse, validate, build and execute.

mod fixtures;

use fixtures::{CorpusBuilder, database_corpus, now, search_ids, warning_kinds};
use topic_search::query::{Identity, Node, WarningKind, build, compile, is_valid, parse, validate};

fn jane() -> Option<Identity> {
    Some(Identity::new(1, Some(2)))
}

const NONE: &[u32] = &[];

// ============================================================================
// Text
// ============================================================================

#[test]
fn test_text_term_selects_matching_title() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "performance", None), vec![1]);
}

#[test]
fn test_negated_text_excludes_topic() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "postgresql -mysql", None), vec![1]);
    assert_eq!(search_ids(&corpus, "postgresql", None), vec![1, 2]);
}

#[test]
fn test_implicit_and_matches_explicit_and() {
    let corpus = database_corpus();
    let implicit = search_ids(&corpus, "postgresql mysql", None);
    assert_eq!(implicit, vec![2]);
    assert_eq!(search_ids(&corpus, "postgresql AND mysql", None), implicit);
    assert_eq!(search_ids(&corpus, "postgresql and mysql", None), implicit);
}

#[test]
fn test_quoted_phrase_matches_body() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "\"optimizing postgresql\"", None), vec![1]);
    assert_eq!(search_ids(&corpus, "\"postgresql optimizing\"", None), NONE);
}

#[test]
fn test_empty_phrase_does_not_filter() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "\"\" performance", None), vec![1]);
    assert!(warning_kinds("\"\"", None).is_empty());
}

#[test]
fn test_bracketed_text_is_plain_text() {
    let ast = parse("[proposal]").unwrap().unwrap();
    assert_eq!(ast.as_text().unwrap().value, "[proposal]");
}

// ============================================================================
// Selectors
// ============================================================================

#[test]
fn test_from_selector() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "from:bruce", None), vec![1, 3]);
    assert_eq!(search_ids(&corpus, "From:\"Bruce Momjian\"", None), vec![1, 3]);
    assert_eq!(search_ids(&corpus, "-from:bruce", None), vec![2]);
    assert_eq!(search_ids(&corpus, "from:me", jane()), vec![1, 2]);
}

#[test]
fn test_from_conditions_scope_the_author() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "from:bruce[messages:>=2]", None), vec![1]);
    assert_eq!(search_ids(&corpus, "from:jane[first_after:2024-02-01]", None), vec![2]);
    assert_eq!(search_ids(&corpus, "from:[body:workload]", None), vec![2]);
}

#[test]
fn test_upper_bound_conditions_keep_the_parent_relation() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "from:bruce[messages:<2]", None), vec![3]);
    assert_eq!(search_ids(&corpus, "from:bruce[messages:<=2]", None), vec![1, 3]);
    assert_eq!(search_ids(&corpus, "from:bruce[messages:0]", None), NONE);
    assert_eq!(search_ids(&corpus, "has:patch[count:<2]", None), vec![1]);
    assert_eq!(search_ids(&corpus, "has:patch[count:0]", None), NONE);
}

#[test]
fn test_has_selector() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "has:patch", None), vec![1]);
    assert_eq!(search_ids(&corpus, "has:attachment", None), vec![1, 3]);
    assert_eq!(search_ids(&corpus, "has:committer", None), vec![1, 3]);
    assert_eq!(search_ids(&corpus, "has:patch[from:jane]", None), NONE);
    assert_eq!(search_ids(&corpus, "has:patch[from:bruce]", None), vec![1]);
}

#[test]
fn test_date_selectors() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "first_after:2024-02", None), vec![2, 3]);
    assert_eq!(search_ids(&corpus, "last_after:30d", None), vec![3]);
    assert_eq!(search_ids(&corpus, "first_before:2024-02-01", None), vec![1]);
}

#[test]
fn test_count_selectors_use_denormalized_counts() {
    let corpus = CorpusBuilder::new()
        .topic(1, "Busy thread", "2024-01-01")
        .counts(1, 25, 8)
        .topic(2, "Quiet thread", "2024-01-02")
        .counts(2, 2, 1)
        .build();
    assert_eq!(search_ids(&corpus, "messages:>10", None), vec![1]);
    assert_eq!(search_ids(&corpus, "participants:<3", None), vec![2]);
    assert_eq!(search_ids(&corpus, "count:2", None), vec![2]);
}

#[test]
fn test_tag_commitfest_and_status() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "tag:needs", None), vec![2]);
    assert_eq!(search_ids(&corpus, "tag:[from:me]", jane()), vec![2]);
    assert_eq!(search_ids(&corpus, "commitfest:2024-03", None), vec![1]);
    assert_eq!(search_ids(&corpus, "commitfest:[tag:perf]", None), vec![1]);
    assert_eq!(search_ids(&corpus, "commitfest:[status:needs]", None), NONE);
    assert_eq!(search_ids(&corpus, "status:commit", None), vec![1]);
}

#[test]
fn test_identity_states_with_requester() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "starred:me", jane()), vec![3]);
    assert_eq!(search_ids(&corpus, "read:me", jane()), vec![1]);
    assert_eq!(search_ids(&corpus, "reading:me", jane()), vec![2]);
    assert_eq!(search_ids(&corpus, "unread:me", jane()), vec![2, 3]);
    assert_eq!(search_ids(&corpus, "new:me", jane()), vec![3]);
    assert_eq!(search_ids(&corpus, "notes:me", jane()), vec![2]);
}

#[test]
fn test_identity_without_requester_matches_nothing() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "starred:me", None), NONE);
    assert_eq!(warning_kinds("starred:me", None), vec![WarningKind::RequiresSignIn]);
    assert_eq!(search_ids(&corpus, "tag:[from:me]", None), NONE);
    assert_eq!(search_ids(&corpus, "-unread:me", None), NONE);
    assert_eq!(search_ids(&corpus, "-starred:me", None), NONE);
    assert_eq!(warning_kinds("-unread:me", None), vec![WarningKind::RequiresSignIn]);
    assert_eq!(search_ids(&corpus, "-starred:me", jane()), vec![1, 2]);
}

#[test]
fn test_boolean_combination() {
    let corpus = database_corpus();
    assert_eq!(
        search_ids(&corpus, "(from:bruce OR from:jane) -has:patch", None),
        vec![2, 3]
    );
    assert_eq!(search_ids(&corpus, "-(from:bruce OR from:jane)", None), NONE);
    assert_eq!(search_ids(&corpus, "release OR mysql", None), vec![2, 3]);
}

// ============================================================================
// Structure and diagnostics
// ============================================================================

#[test]
fn test_and_binds_tighter_than_or() {
    let ast = parse("a b OR c").unwrap().unwrap();
    assert_eq!(ast.to_string(), "((a b) OR c)");
}

#[test]
fn test_negated_group_is_single_node() {
    let ast = parse("-(from:john OR from:jane)").unwrap().unwrap();
    assert!(matches!(&ast, Node::Or(group) if group.negated && group.children.len() == 2));
}

#[test]
fn test_validity() {
    assert!(!is_valid("((broken"));
    assert!(is_valid("(a OR b)"));
    assert!(!is_valid("a)"));
    assert!(is_valid("from:john OR OR"));
}

#[test]
fn test_warnings_and_pruning() {
    assert_eq!(warning_kinds("from: title:test", None), vec![WarningKind::EmptyValue]);
    assert_eq!(warning_kinds("messages:abc", None), vec![WarningKind::InvalidCount]);

    let validated = validate(parse("first_after:notadate").unwrap().as_ref(), now());
    assert!(validated.ast.is_none());
    assert_eq!(validated.warnings[0].to_string(), "invalid date: notadate");
}

#[test]
fn test_pruned_parts_do_not_block_the_rest() {
    let corpus = database_corpus();
    let built = compile("performance color:blue messages:lots", now(), None).unwrap();
    assert_eq!(built.warnings.len(), 2);
    assert_eq!(search_ids(&corpus, "performance color:blue messages:lots", None), vec![1]);
}

#[test]
fn test_blank_query_matches_everything() {
    let corpus = database_corpus();
    assert_eq!(search_ids(&corpus, "   ", None), vec![1, 2, 3]);
    assert!(build(None, None).warnings.is_empty());
}

#[test]
fn test_revalidating_is_idempotent() {
    let first = validate(parse("from:john").unwrap().as_ref(), now());
    let second = validate(first.ast.as_ref(), now());
    assert_eq!(first, second);
    assert!(second.warnings.is_empty());
}

#[test]
fn test_unusual_input_never_panics() {
    let corpus = database_corpus();
    let inputs = [
        "", "-", "--a", "OR", "AND AND", "or and", "from:[", "tag:[from:me", "\"unterminated",
        ":", "a:b:c", "-()", "()", "é:ü", "from:a[b", "has:[count:>1]", "[x:y]", "a OR", "OR a",
        "((a) OR (b)) -(c d)", "commitfest:[status:]", ")(", "((", "\"\"",
    ];
    for input in inputs {
        match compile(input, now(), jane()) {
            Ok(built) => {
                let _ = topic_search::query::QueryExecutor::new(&corpus).execute(&built.predicate);
            }
            Err(e) => assert!(e.is_syntax(), "{:?} failed with {}", input, e),
        }
    }
}
