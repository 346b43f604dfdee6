//! Nullability and FIRST sets.
//!
//! Both properties are least fixed points over the node graph: start every
//! node at "not nullable, empty FIRST" and re-evaluate until nothing moves.
//! The lattice is monotone (nullability only flips to `Some`, FIRST sets
//! only grow) and the pool is finite, so the iteration terminates even for
//! cyclic graphs built through recursion points.
//!
//! The same pass derives the structural LL(1) diagnostics: a disjunction
//! whose alternatives overlap on FIRST, or admit the empty input on both
//! sides, is ambiguous under one-token lookahead. The engine itself stays
//! deterministic on such syntaxes (left bias), but the conflict is reported
//! through [`crate::syntax::Syntax::conflicts`].

use std::fmt;

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::language::Language;
use crate::syntax::pool::{Node, Pool, Props, SyntaxId, Value};

/// A structural LL(1) defect of a disjunction.
///
/// Conflicts are programmer errors in the syntax description, not parse
/// errors: the driver never returns them for any token stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict<K: fmt::Debug> {
    /// Both alternatives can start with one of the listed kinds.
    #[error("ambiguous alternatives: both can start with a token of kind {overlap:?}")]
    FirstOverlap {
        /// The overlapping kinds, sorted.
        overlap: Vec<K>,
    },
    /// Both alternatives accept the empty input.
    #[error("ambiguous alternatives: both accept the empty input")]
    BothNullable,
}

impl<L: Language> Pool<L> {
    /// Re-run the property fixpoint if nodes were added since the last run.
    pub(crate) fn ensure_props(&mut self) {
        if !self.is_stale() {
            return;
        }
        let mut rounds = 0usize;
        loop {
            let mut changed = false;
            for id in 0..self.len() {
                changed |= self.refresh(id);
            }
            rounds += 1;
            if !changed {
                break;
            }
        }
        let conflicts = self.collect_conflicts();
        tracing::debug!(
            nodes = self.len(),
            rounds,
            conflicts = conflicts.len(),
            "syntax properties reached fixpoint"
        );
        self.set_conflicts(conflicts);
        self.mark_fresh();
    }

    /// Recompute one node's properties from its children; true if they grew.
    fn refresh(&mut self, id: SyntaxId) -> bool {
        let (nullable, first) = self.evaluate(id);
        let slot = self.props_mut(id);
        let grew = (slot.nullable.is_none() && nullable.is_some()) || first.len() > slot.first.len();
        *slot = Props { nullable, first };
        grew
    }

    fn evaluate(&self, id: SyntaxId) -> (Option<Value>, FxHashSet<L::Kind>) {
        match self.node(id) {
            Node::Failure => (None, FxHashSet::default()),
            Node::Epsilon(value) => (Some(value.clone()), FxHashSet::default()),
            Node::Elem(kind) => {
                let mut first = FxHashSet::default();
                first.insert(kind.clone());
                (None, first)
            }
            Node::Disjunction { left, right } => {
                let left = self.props(*left);
                let right = self.props(*right);
                // Left bias: where both alternatives are nullable, the
                // left value wins.
                let nullable = left.nullable.clone().or_else(|| right.nullable.clone());
                let first = left.first.union(&right.first).cloned().collect();
                (nullable, first)
            }
            Node::Sequence { left, right, combine } | Node::Concat { left, right, combine } => {
                let lhs = self.props(*left);
                let rhs = self.props(*right);
                let nullable = match (&lhs.nullable, &rhs.nullable) {
                    (Some(a), Some(b)) => Some(combine(a.clone(), b.clone())),
                    _ => None,
                };
                let mut first = lhs.first.clone();
                if lhs.nullable.is_some() {
                    first.extend(rhs.first.iter().cloned());
                }
                (nullable, first)
            }
            Node::Transform { inner, apply } => {
                let inner = self.props(*inner);
                let nullable = inner.nullable.clone().map(|value| apply(value));
                (nullable, inner.first.clone())
            }
            Node::Recursive { inner: Some(inner) } => {
                let inner = self.props(*inner);
                (inner.nullable.clone(), inner.first.clone())
            }
            // Untied recursion behaves as failure until the body arrives.
            Node::Recursive { inner: None } => (None, FxHashSet::default()),
        }
    }

    fn collect_conflicts(&self) -> Vec<(SyntaxId, Conflict<L::Kind>)> {
        let mut conflicts = Vec::new();
        for id in 0..self.len() {
            let Node::Disjunction { left, right } = self.node(id) else {
                continue;
            };
            let lhs = self.props(*left);
            let rhs = self.props(*right);
            let mut overlap: Vec<L::Kind> = lhs.first.intersection(&rhs.first).cloned().collect();
            if !overlap.is_empty() {
                overlap.sort();
                conflicts.push((id, Conflict::FirstOverlap { overlap }));
            }
            if lhs.nullable.is_some() && rhs.nullable.is_some() {
                conflicts.push((id, Conflict::BothNullable));
            }
        }
        conflicts
    }
}
