//! The continuation chain: work remaining after a partial match.
//!
//! While the engine descends into a syntax to consume a token, everything
//! still owed afterwards is pushed here as a frame. A frame is either
//! *reductive* (turns an incoming value into another value) or
//! *redirecting* (switches the focus to another syntax, leaving a
//! reductive frame behind). Folding a value through the chain therefore
//! either finishes the parse or surfaces the next syntax to work on.

use crate::syntax::{ApplyFn, CombineFn, SyntaxId, Value};

/// One deferred obligation.
#[derive(Clone)]
pub(crate) enum Frame {
    /// Apply a user mapping to the incoming value. Reductive.
    Apply { apply: ApplyFn },
    /// Pair a previously seen value with the incoming one. Reductive.
    PrependValue { prefix: Value, combine: CombineFn },
    /// Continue with the second half of a sequence. Redirecting.
    FollowBy { second: SyntaxId, combine: CombineFn },
    /// Concatenate a previously seen sequence with the incoming one. Reductive.
    ConcatPrepend { prefix: Value, combine: CombineFn },
    /// Continue with the second half of a concatenation. Redirecting.
    ConcatFollowBy { second: SyntaxId, combine: CombineFn },
}

/// The obligation stack; the top lives at the end.
pub(crate) type Chain = Vec<Frame>;

/// What the engine is currently focused on.
#[derive(Clone)]
pub(crate) enum Focus {
    /// A syntax node still to be driven.
    Syntax(SyntaxId),
    /// An already-produced value; equivalent to an epsilon syntax.
    Epsilon(Value),
}

/// A focus plus its pending chain: one restartable parse position.
#[derive(Clone)]
pub(crate) struct Cursor {
    pub(crate) focus: Focus,
    pub(crate) chain: Chain,
}

/// Fold `value` through the chain until it either redirects to another
/// syntax or the chain runs dry, in which case the whole parse has
/// produced the folded value.
pub(crate) fn fold(mut chain: Chain, mut value: Value) -> Cursor {
    while let Some(frame) = chain.pop() {
        match frame {
            Frame::Apply { apply } => value = apply(value),
            Frame::PrependValue { prefix, combine } | Frame::ConcatPrepend { prefix, combine } => {
                value = combine(prefix, value);
            }
            Frame::FollowBy { second, combine } => {
                chain.push(Frame::PrependValue {
                    prefix: value,
                    combine,
                });
                return Cursor {
                    focus: Focus::Syntax(second),
                    chain,
                };
            }
            Frame::ConcatFollowBy { second, combine } => {
                chain.push(Frame::ConcatPrepend {
                    prefix: value,
                    combine,
                });
                return Cursor {
                    focus: Focus::Syntax(second),
                    chain,
                };
            }
        }
    }
    Cursor {
        focus: Focus::Epsilon(value),
        chain,
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::syntax::{unwrap_value, wrap_value};

    #[test]
    fn folding_an_empty_chain_terminates_with_the_value() {
        let cursor = fold(Vec::new(), wrap_value(5i64));
        match cursor.focus {
            Focus::Epsilon(value) => assert_eq!(unwrap_value::<i64>(value), 5),
            Focus::Syntax(_) => panic!("expected a terminal fold"),
        }
        assert!(cursor.chain.is_empty());
    }

    #[test]
    fn reductive_frames_fold_in_stack_order() {
        let double: ApplyFn = Rc::new(|v| wrap_value(unwrap_value::<i64>(v) * 2));
        let add: CombineFn =
            Rc::new(|a, b| wrap_value(unwrap_value::<i64>(a) + unwrap_value::<i64>(b)));
        // Bottom of the stack doubles, top adds 10: (10 + 3) * 2 = 26.
        let chain = vec![
            Frame::Apply { apply: double },
            Frame::PrependValue {
                prefix: wrap_value(10i64),
                combine: add,
            },
        ];
        let cursor = fold(chain, wrap_value(3i64));
        match cursor.focus {
            Focus::Epsilon(value) => assert_eq!(unwrap_value::<i64>(value), 26),
            Focus::Syntax(_) => panic!("expected a terminal fold"),
        }
    }

    #[test]
    fn a_redirecting_frame_halts_the_fold() {
        let pair: CombineFn = Rc::new(|a, b| {
            wrap_value((unwrap_value::<i64>(a), unwrap_value::<i64>(b)))
        });
        let chain = vec![Frame::FollowBy {
            second: 42,
            combine: pair,
        }];
        let cursor = fold(chain, wrap_value(1i64));
        match cursor.focus {
            Focus::Syntax(id) => assert_eq!(id, 42),
            Focus::Epsilon(_) => panic!("expected a redirect"),
        }
        assert_eq!(cursor.chain.len(), 1, "the prefix stays on the chain");
    }
}
