//! Node pool for syntax graphs.
//!
//! Syntax nodes live in an append-only pool and refer to their children by
//! index. `Recursive` holds an index too, assigned when its cycle is tied,
//! so cyclic graphs need no back-pointers, structural traversals cannot
//! loop through ownership, and node identity is simply the pool index.
//!
//! Semantic values are erased here: every node that has to manipulate a
//! typed value (pair it, concatenate it, map it) captured a closure at
//! construction time, when the static types were still in scope. The pool
//! and the engine only ever move opaque [`Value`]s through those closures.

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::language::Language;
use crate::syntax::props::Conflict;

/// Identity of a node in its [`Pool`].
pub(crate) type SyntaxId = usize;

/// An erased semantic value. `Rc` so nullable values can be handed out
/// repeatedly and retained parser states can share them.
pub(crate) type Value = Rc<dyn Any>;

/// Erased user mapping, captured by `Transform` nodes.
pub(crate) type ApplyFn = Rc<dyn Fn(Value) -> Value>;

/// Erased value combination, captured by `Sequence` (pairing) and
/// `Concat` (list concatenation) nodes.
pub(crate) type CombineFn = Rc<dyn Fn(Value, Value) -> Value>;

/// Erase a typed value.
pub(crate) fn wrap_value<T: 'static>(value: T) -> Value {
    Rc::new(value)
}

/// Recover a typed value at a boundary where construction fixed the type.
///
/// A mismatch is impossible for values produced by this crate's own
/// constructors; hitting one means a closure was wired to the wrong node,
/// which is a programmer error, not a parse error.
pub(crate) fn unwrap_value<T: Clone + 'static>(value: Value) -> T {
    let shared = value
        .downcast::<T>()
        .unwrap_or_else(|_| panic!("semantic value does not carry the type recorded at construction"));
    Rc::try_unwrap(shared).unwrap_or_else(|kept| (*kept).clone())
}

/// A syntax node. Children are pool indices.
pub(crate) enum Node<L: Language> {
    /// Matches nothing.
    Failure,
    /// Matches the empty stream, yielding a fixed value.
    Epsilon(Value),
    /// Matches exactly one token of the given kind, yielding the token.
    Elem(L::Kind),
    /// Either of two alternatives with the same result type.
    Disjunction { left: SyntaxId, right: SyntaxId },
    /// `left` then `right`, results paired by `combine`.
    Sequence {
        left: SyntaxId,
        right: SyntaxId,
        combine: CombineFn,
    },
    /// `left` then `right`, both over ordered sequences, joined by `combine`.
    Concat {
        left: SyntaxId,
        right: SyntaxId,
        combine: CombineFn,
    },
    /// Apply a user function to the inner result.
    Transform { inner: SyntaxId, apply: ApplyFn },
    /// By-need reference to another node; `None` only until the cycle is tied.
    Recursive { inner: Option<SyntaxId> },
}

/// Precomputed LL(1) properties of one node.
pub(crate) struct Props<L: Language> {
    /// `Some(v)` iff the node accepts the empty stream, yielding `v`.
    pub(crate) nullable: Option<Value>,
    /// Kinds that may begin a non-empty match.
    pub(crate) first: FxHashSet<L::Kind>,
}

impl<L: Language> Default for Props<L> {
    fn default() -> Self {
        Props {
            nullable: None,
            first: FxHashSet::default(),
        }
    }
}

/// Append-only storage for one syntax graph.
///
/// Construction happens through [`crate::syntax::Parsers`]; afterwards the
/// pool is only read. Properties are refreshed lazily: any push or tie
/// marks the pool stale, and the next query re-runs the fixpoint.
pub(crate) struct Pool<L: Language> {
    nodes: Vec<Node<L>>,
    props: Vec<Props<L>>,
    conflicts: Vec<(SyntaxId, Conflict<L::Kind>)>,
    stale: bool,
}

impl<L: Language> Pool<L> {
    pub(crate) fn new() -> Self {
        Pool {
            nodes: Vec::new(),
            props: Vec::new(),
            conflicts: Vec::new(),
            stale: false,
        }
    }

    pub(crate) fn push(&mut self, node: Node<L>) -> SyntaxId {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.props.push(Props::default());
        self.stale = true;
        id
    }

    /// Close a recursion: point `rec` at its freshly built body.
    pub(crate) fn tie(&mut self, rec: SyntaxId, inner: SyntaxId) {
        match &mut self.nodes[rec] {
            Node::Recursive { inner: slot } => {
                debug_assert!(slot.is_none(), "recursion tied twice");
                *slot = Some(inner);
            }
            _ => unreachable!("tie target is not a recursion point"),
        }
        self.stale = true;
    }

    pub(crate) fn node(&self, id: SyntaxId) -> &Node<L> {
        &self.nodes[id]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) fn mark_fresh(&mut self) {
        self.stale = false;
    }

    pub(crate) fn nullable(&self, id: SyntaxId) -> Option<Value> {
        debug_assert!(!self.stale, "properties read before fixpoint");
        self.props[id].nullable.clone()
    }

    pub(crate) fn first(&self, id: SyntaxId) -> &FxHashSet<L::Kind> {
        debug_assert!(!self.stale, "properties read before fixpoint");
        &self.props[id].first
    }

    pub(crate) fn props_mut(&mut self, id: SyntaxId) -> &mut Props<L> {
        &mut self.props[id]
    }

    pub(crate) fn props(&self, id: SyntaxId) -> &Props<L> {
        &self.props[id]
    }

    pub(crate) fn conflicts(&self) -> &[(SyntaxId, Conflict<L::Kind>)] {
        &self.conflicts
    }

    pub(crate) fn set_conflicts(&mut self, conflicts: Vec<(SyntaxId, Conflict<L::Kind>)>) {
        self.conflicts = conflicts;
    }

    /// All nodes reachable from `root`, recursion points included.
    pub(crate) fn reachable(&self, root: SyntaxId) -> FxHashSet<SyntaxId> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            match &self.nodes[id] {
                Node::Failure | Node::Epsilon(_) | Node::Elem(_) => {}
                Node::Disjunction { left, right }
                | Node::Sequence { left, right, .. }
                | Node::Concat { left, right, .. } => {
                    stack.push(*left);
                    stack.push(*right);
                }
                Node::Transform { inner, .. } => stack.push(*inner),
                Node::Recursive { inner } => {
                    if let Some(inner) = inner {
                        stack.push(*inner);
                    }
                }
            }
        }
        seen
    }
}
