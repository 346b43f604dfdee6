//! Syntax constructors and the typed combinator surface.
//!
//! A [`Parsers`] owns one node pool and hands out [`Syntax`] handles: a
//! handle is a pool index plus a phantom result type. Handles are cheap to
//! clone and freely shareable; the graph behind them is immutable once
//! built (construction appends, never rewrites).
//!
//! Every combinator that has to manipulate typed values captures the
//! type-specific step as a closure right here, where the types are known,
//! and stores it in the node. The engine downstream works purely on erased
//! values threaded through those closures.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::grammar::Grammar;
use crate::language::Language;
use crate::parser::{ParseResult, drive, initial_cursor};
use crate::syntax::pool::{ApplyFn, CombineFn, Node, Pool, SyntaxId, unwrap_value, wrap_value};
use crate::syntax::props::Conflict;

/// Factory for the syntaxes of one [`Language`].
///
/// All syntaxes meant to be combined must come from the same `Parsers`;
/// mixing pools is a programmer error and panics.
pub struct Parsers<L: Language> {
    pool: Rc<RefCell<Pool<L>>>,
}

impl<L: Language> Default for Parsers<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Language> Parsers<L> {
    pub fn new() -> Self {
        Parsers {
            pool: Rc::new(RefCell::new(Pool::new())),
        }
    }

    fn push(&self, node: Node<L>) -> SyntaxId {
        self.pool.borrow_mut().push(node)
    }

    fn handle<T>(&self, id: SyntaxId) -> Syntax<T, L> {
        Syntax {
            pool: Rc::clone(&self.pool),
            id,
            marker: PhantomData,
        }
    }

    /// The syntax that matches nothing.
    pub fn failure<T: Clone + 'static>(&self) -> Syntax<T, L> {
        let id = self.push(Node::Failure);
        self.handle(id)
    }

    /// The syntax that matches the empty stream, yielding `value`.
    pub fn epsilon<T: Clone + 'static>(&self, value: T) -> Syntax<T, L> {
        let id = self.push(Node::Epsilon(wrap_value(value)));
        self.handle(id)
    }

    /// The syntax that matches exactly one token of kind `kind`, yielding
    /// the token itself.
    pub fn elem(&self, kind: L::Kind) -> Syntax<L::Token, L> {
        let id = self.push(Node::Elem(kind));
        self.handle(id)
    }

    /// Match one token of kind `kind` and map it through `f`.
    pub fn accept<T, F>(&self, kind: L::Kind, f: F) -> Syntax<T, L>
    where
        T: Clone + 'static,
        F: Fn(L::Token) -> T + 'static,
    {
        self.elem(kind).map(f)
    }

    /// Build a recursive syntax.
    ///
    /// `define` receives a handle to the recursion point and returns its
    /// body; references to the handle inside the body close the cycle. The
    /// recursion point has identity: every reference to the same handle
    /// denotes the same non-terminal in the extracted grammar.
    pub fn recursive<T, F>(&self, define: F) -> Syntax<T, L>
    where
        T: Clone + 'static,
        F: FnOnce(&Syntax<T, L>) -> Syntax<T, L>,
    {
        let id = self.push(Node::Recursive { inner: None });
        let handle = self.handle(id);
        let body = define(&handle);
        handle.check_same_pool(&body);
        self.pool.borrow_mut().tie(id, body.id);
        handle
    }
}

/// A typed handle to one node of a syntax graph.
///
/// `T` is the semantic value the syntax produces on a successful parse.
/// Handles are as cheap to clone as an `Rc`.
pub struct Syntax<T, L: Language> {
    pool: Rc<RefCell<Pool<L>>>,
    id: SyntaxId,
    marker: PhantomData<fn() -> T>,
}

impl<T, L: Language> Clone for Syntax<T, L> {
    fn clone(&self) -> Self {
        Syntax {
            pool: Rc::clone(&self.pool),
            id: self.id,
            marker: PhantomData,
        }
    }
}

impl<T, L: Language> Syntax<T, L> {
    fn push(&self, node: Node<L>) -> SyntaxId {
        self.pool.borrow_mut().push(node)
    }

    fn derived<U>(&self, id: SyntaxId) -> Syntax<U, L> {
        Syntax {
            pool: Rc::clone(&self.pool),
            id,
            marker: PhantomData,
        }
    }

    fn check_same_pool<U>(&self, other: &Syntax<U, L>) {
        assert!(
            Rc::ptr_eq(&self.pool, &other.pool),
            "syntaxes from different Parsers cannot be combined"
        );
    }
}

impl<T: Clone + 'static, L: Language> Syntax<T, L> {
    /// This syntax or `other`, whichever the next token selects.
    ///
    /// Under LL(1) the FIRST sets must be disjoint and at most one side
    /// nullable; violations surface through [`Syntax::conflicts`]. The
    /// engine resolves any residual ambiguity towards `self`.
    pub fn or(&self, other: &Syntax<T, L>) -> Syntax<T, L> {
        self.check_same_pool(other);
        let id = self.push(Node::Disjunction {
            left: self.id,
            right: other.id,
        });
        self.derived(id)
    }

    /// This syntax followed by `other`, pairing their results.
    pub fn then<U: Clone + 'static>(&self, other: &Syntax<U, L>) -> Syntax<(T, U), L> {
        self.check_same_pool(other);
        let combine: CombineFn =
            Rc::new(|a, b| wrap_value((unwrap_value::<T>(a), unwrap_value::<U>(b))));
        let id = self.push(Node::Sequence {
            left: self.id,
            right: other.id,
            combine,
        });
        self.derived(id)
    }

    /// Map the result through `f`.
    ///
    /// `f` must be deterministic and side-effect-free; it may run more than
    /// once for the same underlying match (nullable values are derived from
    /// the graph, not cached per parse).
    pub fn map<U, F>(&self, f: F) -> Syntax<U, L>
    where
        U: Clone + 'static,
        F: Fn(T) -> U + 'static,
    {
        let apply: ApplyFn = Rc::new(move |value| wrap_value(f(unwrap_value::<T>(value))));
        let id = self.push(Node::Transform {
            inner: self.id,
            apply,
        });
        self.derived(id)
    }

    /// This syntax followed by `other`, keeping only this result.
    pub fn then_ignore<U: Clone + 'static>(&self, other: &Syntax<U, L>) -> Syntax<T, L> {
        self.then(other).map(|(keep, _)| keep)
    }

    /// This syntax followed by `other`, keeping only the other result.
    pub fn ignore_then<U: Clone + 'static>(&self, other: &Syntax<U, L>) -> Syntax<U, L> {
        self.then(other).map(|(_, keep)| keep)
    }

    /// Zero or one occurrence.
    pub fn opt(&self) -> Syntax<Option<T>, L> {
        let absent_id = self.push(Node::Epsilon(wrap_value(Option::<T>::None)));
        let absent: Syntax<Option<T>, L> = self.derived(absent_id);
        self.map(Some).or(&absent)
    }

    /// Zero or more occurrences, collected in order.
    ///
    /// The element must not be nullable, or the repetition is ambiguous
    /// under one-token lookahead and [`Syntax::conflicts`] will say so.
    pub fn many(&self) -> Syntax<Vec<T>, L> {
        let rec_id = self.push(Node::Recursive { inner: None });
        let rep: Syntax<Vec<T>, L> = self.derived(rec_id);
        let step = self.then(&rep).map(|(head, mut tail)| {
            tail.insert(0, head);
            tail
        });
        let empty_id = self.push(Node::Epsilon(wrap_value(Vec::<T>::new())));
        let empty: Syntax<Vec<T>, L> = self.derived(empty_id);
        let body = step.or(&empty);
        self.pool.borrow_mut().tie(rec_id, body.id);
        rep
    }

    /// The value this syntax yields for the empty stream, if any.
    pub fn nullable(&self) -> Option<T> {
        self.pool.borrow_mut().ensure_props();
        let pool = self.pool.borrow();
        pool.nullable(self.id).map(unwrap_value)
    }

    /// The kinds that may begin a non-empty match, sorted.
    pub fn first(&self) -> Vec<L::Kind> {
        self.pool.borrow_mut().ensure_props();
        let pool = self.pool.borrow();
        let mut kinds: Vec<L::Kind> = pool.first(self.id).iter().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Structural LL(1) defects reachable from this syntax.
    pub fn conflicts(&self) -> Vec<Conflict<L::Kind>> {
        self.pool.borrow_mut().ensure_props();
        let pool = self.pool.borrow();
        let reachable = pool.reachable(self.id);
        pool.conflicts()
            .iter()
            .filter(|(id, _)| reachable.contains(id))
            .map(|(_, conflict)| conflict.clone())
            .collect()
    }

    /// Whether this syntax satisfies the LL(1) disjointness invariants.
    pub fn is_ll1(&self) -> bool {
        self.conflicts().is_empty()
    }

    /// Drive this syntax over a token stream.
    ///
    /// Tokens are pulled one at a time and never beyond the first failure;
    /// the returned result always carries a restartable residual state.
    pub fn parse<I>(&self, tokens: I) -> ParseResult<T, L>
    where
        I: IntoIterator<Item = L::Token>,
    {
        drive(&self.pool, initial_cursor(self.id), tokens)
    }

    /// Extract the BNF view of this syntax.
    pub fn grammar(&self) -> Grammar<L::Kind> {
        let pool = self.pool.borrow();
        crate::grammar::extract(&pool, self.id)
    }
}

impl<E: Clone + 'static, L: Language> Syntax<Vec<E>, L> {
    /// This sequence followed by `other`, results concatenated in order.
    pub fn concat(&self, other: &Syntax<Vec<E>, L>) -> Syntax<Vec<E>, L> {
        self.check_same_pool(other);
        let combine: CombineFn = Rc::new(|a, b| {
            let mut items = unwrap_value::<Vec<E>>(a);
            items.extend(unwrap_value::<Vec<E>>(b));
            wrap_value(items)
        });
        let id = self.push(Node::Concat {
            left: self.id,
            right: other.id,
            combine,
        });
        self.derived(id)
    }
}
