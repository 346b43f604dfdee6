//! Grammar extraction: from a syntax graph to finite BNF.
//!
//! Sharing is discovered through node identity, never structural equality:
//! two references to the same recursion point or the same disjunction mean
//! the same non-terminal, and identity keying is what guarantees
//! termination on cyclic graphs. Everything else (sequences, transforms,
//! terminals) is inlined into the alternative that uses it.

use std::collections::VecDeque;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::grammar::{Grammar, NonTerminalId, Rule, Symbol};
use crate::language::Language;
use crate::syntax::{Node, Pool, SyntaxId};

pub(crate) fn extract<L: Language>(pool: &Pool<L>, root: SyntaxId) -> Grammar<L::Kind> {
    let mut extractor = Extractor {
        pool,
        ids: IndexMap::new(),
        queue: VecDeque::new(),
    };
    extractor.intern(root);
    let mut rules = Vec::new();
    while let Some(node) = extractor.queue.pop_front() {
        let id = extractor.ids[&node];
        let alternatives = extractor.alternatives(node);
        rules.push(Rule { id, alternatives });
    }
    tracing::debug!(rules = rules.len(), "extracted grammar");
    Grammar { rules }
}

struct Extractor<'a, L: Language> {
    pool: &'a Pool<L>,
    /// Node identity → non-terminal id, in assignment order.
    ids: IndexMap<SyntaxId, NonTerminalId>,
    queue: VecDeque<SyntaxId>,
}

impl<'a, L: Language> Extractor<'a, L> {
    /// Peel transparent wrappers down to the node that owns the rule.
    fn representative(&self, mut id: SyntaxId) -> SyntaxId {
        let mut seen = FxHashSet::default();
        loop {
            if !seen.insert(id) {
                // A cycle made only of wrappers never produces anything;
                // give it a degenerate rule rather than spinning.
                return id;
            }
            match self.pool.node(id) {
                Node::Transform { inner, .. } => id = *inner,
                Node::Recursive { inner: Some(inner) } => id = *inner,
                _ => return id,
            }
        }
    }

    fn intern(&mut self, id: SyntaxId) -> NonTerminalId {
        let rep = self.representative(id);
        if let Some(&known) = self.ids.get(&rep) {
            return known;
        }
        let fresh = self.ids.len();
        self.ids.insert(rep, fresh);
        self.queue.push_back(rep);
        fresh
    }

    /// Flatten the disjunctions at the top of `id` into alternatives.
    fn alternatives(&mut self, id: SyntaxId) -> Vec<Vec<Symbol<L::Kind>>> {
        let mut alternatives = Vec::new();
        self.collect(id, &mut alternatives);
        alternatives
    }

    fn collect(&mut self, id: SyntaxId, alternatives: &mut Vec<Vec<Symbol<L::Kind>>>) {
        let node = self.pool.node(id);
        match node {
            Node::Disjunction { left, right } => {
                let (left, right) = (*left, *right);
                self.collect(left, alternatives);
                self.collect(right, alternatives);
            }
            Node::Transform { inner, .. } => {
                let inner = *inner;
                self.collect(inner, alternatives);
            }
            // An unreachable alternative contributes nothing.
            Node::Failure => {}
            _ => {
                let mut symbols = Vec::new();
                if self.symbols(id, &mut symbols) {
                    alternatives.push(symbols);
                }
            }
        }
    }

    /// Emit one alternative's symbols; false drops the alternative (it
    /// contained a failure and can never match).
    fn symbols(&mut self, id: SyntaxId, out: &mut Vec<Symbol<L::Kind>>) -> bool {
        let node = self.pool.node(id);
        match node {
            Node::Failure => false,
            Node::Epsilon(_) => {
                out.push(Symbol::Epsilon);
                true
            }
            Node::Elem(kind) => {
                out.push(Symbol::Terminal(kind.clone()));
                true
            }
            Node::Transform { inner, .. } => {
                let inner = *inner;
                self.symbols(inner, out)
            }
            Node::Sequence { left, right, .. } | Node::Concat { left, right, .. } => {
                let (left, right) = (*left, *right);
                self.symbols(left, out) && self.symbols(right, out)
            }
            // A disjunction below the top of an alternative gets a rule of
            // its own, keyed by its identity.
            Node::Disjunction { .. } => {
                let reference = self.intern(id);
                out.push(Symbol::NonTerminal(reference));
                true
            }
            Node::Recursive { inner: Some(inner) } => {
                let inner = *inner;
                let reference = self.intern(inner);
                out.push(Symbol::NonTerminal(reference));
                true
            }
            Node::Recursive { inner: None } => {
                unreachable!("recursion point left untied by construction")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::Symbol;
    use crate::language::Language;
    use crate::syntax::Parsers;

    enum Chars {}

    impl Language for Chars {
        type Token = char;
        type Kind = char;

        fn kind_of(token: &char) -> char {
            *token
        }
    }

    #[test]
    fn transforms_are_transparent() {
        let p = Parsers::<Chars>::new();
        let s = p.elem('a').map(|_| 1i64).map(|n| n + 1);
        let grammar = s.grammar();
        assert_eq!(grammar.rules.len(), 1);
        assert_eq!(grammar.rules[0].alternatives, vec![vec![Symbol::Terminal('a')]]);
    }

    #[test]
    fn sequences_inline_their_symbols() {
        let p = Parsers::<Chars>::new();
        let s = p.elem('a').then(&p.elem('b')).then(&p.epsilon(0i64));
        let grammar = s.grammar();
        assert_eq!(
            grammar.rules[0].alternatives,
            vec![vec![
                Symbol::Terminal('a'),
                Symbol::Terminal('b'),
                Symbol::Epsilon
            ]]
        );
    }

    #[test]
    fn top_level_failure_yields_an_unreachable_rule() {
        let p = Parsers::<Chars>::new();
        let s = p.failure::<char>();
        let grammar = s.grammar();
        assert_eq!(grammar.rules.len(), 1);
        assert!(grammar.rules[0].alternatives.is_empty());
    }

    #[test]
    fn an_alternative_containing_failure_is_dropped() {
        let p = Parsers::<Chars>::new();
        let broken = p.elem('a').then(&p.failure::<char>()).map(|_| ());
        let fine = p.elem('b').map(|_| ());
        let grammar = broken.or(&fine).grammar();
        assert_eq!(grammar.rules[0].alternatives, vec![vec![Symbol::Terminal('b')]]);
    }

    #[test]
    fn nested_disjunctions_flatten_at_the_top_only() {
        let p = Parsers::<Chars>::new();
        let a = p.elem('a').map(|_| ());
        let b = p.elem('b').map(|_| ());
        let c = p.elem('c').map(|_| ());
        // (a | b) | c flattens to three top-level alternatives.
        let top = a.or(&b).or(&c);
        assert_eq!(top.grammar().rules[0].alternatives.len(), 3);

        // x (a | b) keeps the inner disjunction as its own rule.
        let inner = p.elem('a').map(|_| ()).or(&p.elem('b').map(|_| ()));
        let seq = p.elem('x').then(&inner);
        let grammar = seq.grammar();
        assert_eq!(grammar.rules.len(), 2);
        assert_eq!(
            grammar.rules[0].alternatives,
            vec![vec![Symbol::Terminal('x'), Symbol::NonTerminal(1)]]
        );
        assert_eq!(grammar.rules[1].alternatives.len(), 2);
    }

    #[test]
    fn shared_disjunctions_share_their_rule() {
        let p = Parsers::<Chars>::new();
        let shared = p.elem('a').map(|_| ()).or(&p.elem('b').map(|_| ()));
        let twice = p.elem('x').ignore_then(&shared).then(&shared).map(|_| ());
        let grammar = twice.grammar();
        // One rule for the root, one shared rule for the disjunction.
        assert_eq!(grammar.rules.len(), 2);
        let symbols = &grammar.rules[0].alternatives[0];
        assert_eq!(
            symbols
                .iter()
                .filter(|s| **s == Symbol::NonTerminal(1))
                .count(),
            2
        );
    }
}
