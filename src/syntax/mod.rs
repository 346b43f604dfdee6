//! The syntax algebra.
//!
//! Syntaxes are immutable graphs of eight node shapes (failure, epsilon,
//! terminal, disjunction, sequence, concat, transform, recursion), stored
//! in an append-only pool and addressed by index. Each node carries two
//! precomputed properties, both least fixed points over the graph:
//! whether it accepts the empty stream (and with what value), and the set
//! of token kinds that may begin a non-empty match. The driver in
//! [`crate::parser`] consults nothing else.

mod combinators;
mod pool;
mod props;

pub use combinators::{Parsers, Syntax};
pub use props::Conflict;

pub(crate) use pool::{ApplyFn, CombineFn, Node, Pool, SyntaxId, Value, unwrap_value, wrap_value};
