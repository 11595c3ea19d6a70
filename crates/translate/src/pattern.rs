//! Complexity guard for caller-controlled regular expressions.
//!
//! Patterns run on the store's regex engine, which backtracks. A pattern is
//! accepted only when it:
//!
//! 1. is at most `max_len` characters,
//! 2. compiles with the `regex` crate under a bounded program size and nesting
//!    depth (this also rules out backreferences and look-around),
//! 3. has no group that repeats without bound while itself containing an
//!    unbounded repetition (`(a+)+`, `(x*)*`, `(ab{2,})+`).

use regex::RegexBuilder;
use regex_syntax::ast::parse::Parser;
use regex_syntax::ast::{Ast, RepetitionKind, RepetitionRange};

const PATTERN_SIZE_LIMIT: usize = 256 * 1024;
const PATTERN_NEST_LIMIT: u32 = 32;

pub(crate) fn validate_pattern(pattern: &str, max_len: usize) -> Result<(), String> {
    let len = pattern.chars().count();
    if len > max_len {
        return Err(format!("pattern is {len} characters, limit is {max_len}"));
    }

    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .nest_limit(PATTERN_NEST_LIMIT)
        .build()
        .map_err(|e| e.to_string())?;

    if let Some(offset) = nested_repetition(pattern) {
        return Err(format!("nested repetition at offset {offset}"));
    }
    Ok(())
}

/// Byte offset of the quantifier of the first repetition that wraps
/// another repetition, both able to match more than once. Works on the
/// parsed syntax tree, so the `x` flag and classes such as `[]]` are read
/// the way the engine reads them.
fn nested_repetition(pattern: &str) -> Option<usize> {
    let ast = Parser::new().parse(pattern).ok()?;
    let mut found = None;
    contains_repetition(&ast, &mut found);
    found
}

/// Whether `ast` holds a repetition that can match more than once.
fn contains_repetition(ast: &Ast, found: &mut Option<usize>) -> bool {
    match ast {
        Ast::Repetition(rep) => {
            let inner = contains_repetition(&rep.ast, found);
            let repeats = repeats_more_than_once(&rep.op.kind);
            if inner && repeats && found.is_none() {
                *found = Some(rep.op.span.start.offset);
            }
            inner || repeats
        }
        Ast::Group(group) => contains_repetition(&group.ast, found),
        Ast::Alternation(alt) => any_repetition(&alt.asts, found),
        Ast::Concat(concat) => any_repetition(&concat.asts, found),
        _ => false,
    }
}

// Visits every branch, no short-circuit.
fn any_repetition(asts: &[Ast], found: &mut Option<usize>) -> bool {
    asts.iter()
        .map(|ast| contains_repetition(ast, found))
        .fold(false, |acc, hit| acc || hit)
}

/// `*`, `+`, `{n,}`, and `{n}` or `{n,m}` allowing more than one match.
/// `?` and `{0,1}` do not count.
fn repeats_more_than_once(kind: &RepetitionKind) -> bool {
    match kind {
        RepetitionKind::ZeroOrOne => false,
        RepetitionKind::ZeroOrMore | RepetitionKind::OneOrMore => true,
        RepetitionKind::Range(RepetitionRange::AtLeast(_)) => true,
        RepetitionKind::Range(RepetitionRange::Exactly(n)) => *n > 1,
        RepetitionKind::Range(RepetitionRange::Bounded(_, max)) => *max > 1,
    }
}
