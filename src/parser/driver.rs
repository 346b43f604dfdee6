//! The token-driven derivative engine.
//!
//! Consuming one token is a three-step rewrite of the current cursor:
//!
//! 1. *locate*: find the sub-syntax whose FIRST set accepts the token's
//!    kind, folding nullable prefixes through the chain on the way;
//! 2. *derive*: descend into that syntax along the accepting branch,
//!    pushing the obligations met on the way down;
//! 3. *fold*: feed the consumed token to the resulting chain, which
//!    yields the next cursor.
//!
//! No step looks past the current token, and a failed step leaves the
//! cursor exactly where it was, so every returned state is restartable.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::language::Language;
use crate::parser::chain::{Chain, Cursor, Focus, Frame, fold};
use crate::syntax::{Node, Pool, SyntaxId, Value, unwrap_value, wrap_value};

/// The cursor a fresh parse of `root` starts from.
pub(crate) fn initial_cursor(root: SyntaxId) -> Cursor {
    Cursor {
        focus: Focus::Syntax(root),
        chain: Vec::new(),
    }
}

/// Outcome of driving a syntax over a token stream.
///
/// Every variant carries the residual [`ParseState`]: the exact parse
/// position, restartable with further tokens.
pub enum ParseResult<T, L: Language> {
    /// Input exhausted and the residual syntax admits a value.
    Parsed(T, ParseState<T, L>),
    /// The carried token has no acceptable continuation; the state is the
    /// one in force before that token.
    UnexpectedToken(L::Token, ParseState<T, L>),
    /// Input ended but the residual state does not accept the empty stream.
    UnexpectedEnd(ParseState<T, L>),
}

impl<T, L: Language> ParseResult<T, L> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseResult::Parsed(..))
    }

    /// The parsed value, if this is [`ParseResult::Parsed`].
    pub fn value(self) -> Option<T> {
        match self {
            ParseResult::Parsed(value, _) => Some(value),
            _ => None,
        }
    }

    /// The residual state, whatever the outcome.
    pub fn state(&self) -> &ParseState<T, L> {
        match self {
            ParseResult::Parsed(_, state)
            | ParseResult::UnexpectedToken(_, state)
            | ParseResult::UnexpectedEnd(state) => state,
        }
    }

    pub fn into_state(self) -> ParseState<T, L> {
        match self {
            ParseResult::Parsed(_, state)
            | ParseResult::UnexpectedToken(_, state)
            | ParseResult::UnexpectedEnd(state) => state,
        }
    }
}

impl<T, L> fmt::Debug for ParseResult<T, L>
where
    T: fmt::Debug,
    L: Language,
    L::Token: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseResult::Parsed(value, _) => f.debug_tuple("Parsed").field(value).finish(),
            ParseResult::UnexpectedToken(token, _) => {
                f.debug_tuple("UnexpectedToken").field(token).finish()
            }
            ParseResult::UnexpectedEnd(_) => f.debug_tuple("UnexpectedEnd").finish(),
        }
    }
}

/// A restartable parse position.
///
/// States are plain values: cloning one and driving the clone leaves the
/// original usable, so callers may fork a parse from any prefix.
pub struct ParseState<T, L: Language> {
    pool: Rc<RefCell<Pool<L>>>,
    cursor: Cursor,
    marker: PhantomData<fn() -> T>,
}

impl<T, L: Language> Clone for ParseState<T, L> {
    fn clone(&self) -> Self {
        ParseState {
            pool: Rc::clone(&self.pool),
            cursor: self.cursor.clone(),
            marker: PhantomData,
        }
    }
}

impl<T, L: Language> fmt::Debug for ParseState<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseState")
            .field("pending", &self.cursor.chain.len())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static, L: Language> ParseState<T, L> {
    /// Resume this parse with further tokens.
    pub fn parse<I>(&self, tokens: I) -> ParseResult<T, L>
    where
        I: IntoIterator<Item = L::Token>,
    {
        drive(&self.pool, self.cursor.clone(), tokens)
    }
}

/// Internal outcome, before values regain their type.
enum Outcome<L: Language> {
    Parsed(Value, Cursor),
    UnexpectedToken(L::Token, Cursor),
    UnexpectedEnd(Cursor),
}

pub(crate) fn drive<T, L, I>(
    pool_rc: &Rc<RefCell<Pool<L>>>,
    cursor: Cursor,
    tokens: I,
) -> ParseResult<T, L>
where
    T: Clone + 'static,
    L: Language,
    I: IntoIterator<Item = L::Token>,
{
    pool_rc.borrow_mut().ensure_props();
    let outcome = {
        let pool = pool_rc.borrow();
        run(&pool, cursor, tokens)
    };
    let state = |cursor| ParseState {
        pool: Rc::clone(pool_rc),
        cursor,
        marker: PhantomData,
    };
    match outcome {
        Outcome::Parsed(value, residual) => ParseResult::Parsed(unwrap_value(value), state(residual)),
        Outcome::UnexpectedToken(token, residual) => {
            ParseResult::UnexpectedToken(token, state(residual))
        }
        Outcome::UnexpectedEnd(residual) => ParseResult::UnexpectedEnd(state(residual)),
    }
}

fn run<L, I>(pool: &Pool<L>, mut cursor: Cursor, tokens: I) -> Outcome<L>
where
    L: Language,
    I: IntoIterator<Item = L::Token>,
{
    for token in tokens {
        match step(pool, cursor, token) {
            Ok(next) => cursor = next,
            Err((token, unchanged)) => return Outcome::UnexpectedToken(token, unchanged),
        }
    }
    finish(pool, cursor)
}

/// Consume one token, or give it back along with the untouched cursor.
fn step<L: Language>(
    pool: &Pool<L>,
    cursor: Cursor,
    token: L::Token,
) -> Result<Cursor, (L::Token, Cursor)> {
    let kind = L::kind_of(&token);
    let (id, mut chain) = match locate(pool, cursor, &kind) {
        Ok(found) => found,
        Err(unchanged) => return Err((token, unchanged)),
    };
    derive(pool, id, &kind, &mut chain);
    tracing::trace!(kind = ?kind, pending = chain.len(), "consumed token");
    Ok(fold(chain, wrap_value(token)))
}

/// Walk towards the sub-state whose FIRST set contains `kind`, folding
/// nullable prefixes through the chain. `Err` restores the original
/// cursor: nothing from here on accepts `kind`.
fn locate<L: Language>(
    pool: &Pool<L>,
    cursor: Cursor,
    kind: &L::Kind,
) -> Result<(SyntaxId, Chain), Cursor> {
    // Non-empty match is preferred over a nullable continuation, so the
    // FIRST check always comes before the nullable fold.
    if let Focus::Syntax(id) = cursor.focus {
        if pool.first(id).contains(kind) {
            return Ok((id, cursor.chain));
        }
    }
    let saved = cursor.clone();
    let mut cursor = cursor;
    loop {
        let nullable = match &cursor.focus {
            Focus::Syntax(id) => pool.nullable(*id),
            Focus::Epsilon(value) => Some(value.clone()),
        };
        let Some(value) = nullable else {
            return Err(saved);
        };
        if cursor.chain.is_empty() {
            return Err(saved);
        }
        cursor = fold(cursor.chain, value);
        if let Focus::Syntax(id) = cursor.focus {
            if pool.first(id).contains(kind) {
                return Ok((id, cursor.chain));
            }
        }
    }
}

/// Descend into `id` along the branch that consumes `kind`, pushing the
/// deferred obligations met on the way down.
///
/// The caller established `kind ∈ FIRST(id)`, so the descent always ends
/// at a terminal.
fn derive<L: Language>(pool: &Pool<L>, mut id: SyntaxId, kind: &L::Kind, chain: &mut Chain) {
    loop {
        match pool.node(id) {
            Node::Elem(_) => return,
            Node::Transform { inner, apply } => {
                chain.push(Frame::Apply {
                    apply: apply.clone(),
                });
                id = *inner;
            }
            Node::Disjunction { left, right } => {
                // Left bias: an overlapping (conflicted) disjunction still
                // derives deterministically.
                id = if pool.first(*left).contains(kind) {
                    *left
                } else {
                    *right
                };
            }
            Node::Sequence {
                left,
                right,
                combine,
            } => {
                if pool.first(*left).contains(kind) {
                    chain.push(Frame::FollowBy {
                        second: *right,
                        combine: combine.clone(),
                    });
                    id = *left;
                } else {
                    let Some(prefix) = pool.nullable(*left) else {
                        unreachable!("sequence admits {kind:?} only through its nullable prefix")
                    };
                    chain.push(Frame::PrependValue {
                        prefix,
                        combine: combine.clone(),
                    });
                    id = *right;
                }
            }
            Node::Concat {
                left,
                right,
                combine,
            } => {
                if pool.first(*left).contains(kind) {
                    chain.push(Frame::ConcatFollowBy {
                        second: *right,
                        combine: combine.clone(),
                    });
                    id = *left;
                } else {
                    let Some(prefix) = pool.nullable(*left) else {
                        unreachable!("concat admits {kind:?} only through its nullable prefix")
                    };
                    chain.push(Frame::ConcatPrepend {
                        prefix,
                        combine: combine.clone(),
                    });
                    id = *right;
                }
            }
            Node::Recursive { inner: Some(inner) } => id = *inner,
            Node::Failure | Node::Epsilon(_) | Node::Recursive { inner: None } => {
                unreachable!("derivation descended into a syntax whose FIRST set is empty")
            }
        }
    }
}

/// Resolve the end of input: fold nullable values through the chain until
/// the parse completes or a non-nullable syntax blocks it.
fn finish<L: Language>(pool: &Pool<L>, cursor: Cursor) -> Outcome<L> {
    let mut probe = cursor.clone();
    loop {
        let nullable = match &probe.focus {
            Focus::Syntax(id) => pool.nullable(*id),
            Focus::Epsilon(value) => Some(value.clone()),
        };
        let Some(value) = nullable else {
            return Outcome::UnexpectedEnd(cursor);
        };
        if probe.chain.is_empty() {
            return Outcome::Parsed(
                value.clone(),
                Cursor {
                    focus: Focus::Epsilon(value),
                    chain: Vec::new(),
                },
            );
        }
        probe = fold(probe.chain, value);
    }
}
