//! End-to-end driver scenarios over small character languages.

use ll1::{Conflict, Language, ParseResult, Parsers, Syntax};
use rstest::rstest;

/// Characters classify as themselves, except digits which share kind 'd'.
enum Chars {}

impl Language for Chars {
    type Token = char;
    type Kind = char;

    fn kind_of(token: &char) -> char {
        if token.is_ascii_digit() { 'd' } else { *token }
    }
}

fn digit(p: &Parsers<Chars>) -> Syntax<i64, Chars> {
    p.accept('d', |c| i64::from(c.to_digit(10).unwrap_or(0)))
}

/// number ('+' number)* with a left fold.
fn sums(p: &Parsers<Chars>) -> Syntax<i64, Chars> {
    let number = digit(p);
    let tail = p.elem('+').ignore_then(&number).many();
    number
        .then(&tail)
        .map(|(head, rest)| rest.into_iter().fold(head, |acc, n| acc + n))
}

/// parens = '(' parens ')' | ε
fn parens(p: &Parsers<Chars>) -> Syntax<(), Chars> {
    p.recursive(|rec| {
        let nested = p.elem('(').then(rec).then(&p.elem(')')).map(|_| ());
        nested.or(&p.epsilon(()))
    })
}

// ============================================================================
// Arithmetic sums
// ============================================================================

#[rstest]
#[case("1+2+3", 6)]
#[case("7", 7)]
#[case("9+0", 9)]
fn sums_fold_left(#[case] input: &str, #[case] expected: i64) {
    let p = Parsers::new();
    let sum = sums(&p);
    assert!(sum.is_ll1());
    assert_eq!(sum.parse(input.chars()).value(), Some(expected));
}

#[test]
fn sums_reject_a_dangling_operator() {
    let p = Parsers::new();
    let sum = sums(&p);
    assert!(matches!(
        sum.parse("1+".chars()),
        ParseResult::UnexpectedEnd(_)
    ));
    assert!(matches!(
        sum.parse("+1".chars()),
        ParseResult::UnexpectedToken('+', _)
    ));
}

// ============================================================================
// Balanced parentheses
// ============================================================================

#[test]
fn balanced_parens_accepts_nesting() {
    let p = Parsers::new();
    let s = parens(&p);
    assert!(s.is_ll1());
    assert_eq!(s.parse("(())".chars()).value(), Some(()));
    assert_eq!(s.parse("".chars()).value(), Some(()));
}

#[test]
fn unclosed_parens_end_unexpectedly() {
    let p = Parsers::new();
    let s = parens(&p);
    assert!(matches!(
        s.parse("(()".chars()),
        ParseResult::UnexpectedEnd(_)
    ));
}

#[test]
fn an_extra_closer_is_rejected_at_its_token() {
    let p = Parsers::new();
    let s = parens(&p);
    assert!(matches!(
        s.parse("())".chars()),
        ParseResult::UnexpectedToken(')', _)
    ));
}

// ============================================================================
// Plain disjunction
// ============================================================================

#[rstest]
#[case("a")]
#[case("b")]
fn either_letter_parses(#[case] input: &str) {
    let p = Parsers::<Chars>::new();
    let either = p.elem('a').or(&p.elem('b'));
    assert!(either.parse(input.chars()).is_parsed());
}

#[test]
fn neither_letter_fails_according_to_the_input() {
    let p = Parsers::<Chars>::new();
    let either = p.elem('a').or(&p.elem('b'));
    assert!(matches!(
        either.parse("c".chars()),
        ParseResult::UnexpectedToken('c', _)
    ));
    assert!(matches!(
        either.parse("".chars()),
        ParseResult::UnexpectedEnd(_)
    ));
}

// ============================================================================
// Nullable prefix
// ============================================================================

#[rstest]
#[case("b", None)]
#[case("ab", Some('a'))]
fn an_optional_prefix_may_be_absent(#[case] input: &str, #[case] prefix: Option<char>) {
    let p = Parsers::<Chars>::new();
    let s = p.elem('a').opt().then_ignore(&p.elem('b'));
    assert_eq!(s.parse(input.chars()).value(), Some(prefix));
}

#[test]
fn the_optional_prefix_alone_is_not_enough() {
    let p = Parsers::<Chars>::new();
    let s = p.elem('a').opt().then_ignore(&p.elem('b'));
    assert!(matches!(s.parse("a".chars()), ParseResult::UnexpectedEnd(_)));
}

// ============================================================================
// Shared prefix: the defect and the LL(1) rewrite
// ============================================================================

#[test]
fn a_shared_prefix_across_alternatives_is_a_conflict() {
    let p = Parsers::<Chars>::new();
    let ab = p.elem('a').then(&p.elem('b')).map(|_| ());
    let ac = p.elem('a').then(&p.elem('c')).map(|_| ());
    let bad = ab.or(&ac);
    assert_eq!(
        bad.conflicts(),
        vec![Conflict::FirstOverlap { overlap: vec!['a'] }]
    );
}

#[test]
fn factoring_the_prefix_restores_ll1_and_restartability() {
    let p = Parsers::<Chars>::new();
    let s = p.elem('a').then(&p.elem('b').or(&p.elem('c')));
    assert!(s.is_ll1());
    assert_eq!(s.parse("ab".chars()).value(), Some(('a', 'b')));
    assert_eq!(s.parse("ac".chars()).value(), Some(('a', 'c')));

    // The residual after 'a' still accepts either continuation.
    let ParseResult::UnexpectedEnd(after_a) = s.parse("a".chars()) else {
        panic!("expected the input to end early");
    };
    assert_eq!(after_a.parse("b".chars()).value(), Some(('a', 'b')));
    assert_eq!(after_a.parse("c".chars()).value(), Some(('a', 'c')));
}

#[test]
fn a_rejected_token_leaves_the_prior_state_intact() {
    let p = Parsers::new();
    let sum = sums(&p);
    let result = sum.parse("1+2(".chars());
    assert!(matches!(&result, ParseResult::UnexpectedToken('(', _)));
    // The residual sits right before the rejected token: more input works.
    assert_eq!(result.state().parse("+3".chars()).value(), Some(6));
}
