//! BNF grammar model: symbols, rules, pretty-printing.
//!
//! The extractor in this layer turns a syntax graph into a finite grammar
//! by introducing non-terminals at recursion points and at disjunctions
//! reached below the top of an alternative. Terminals print through the
//! host kind's `Display`.

mod extract;

pub(crate) use extract::extract;

use std::fmt;

/// Identity of a rule within its [`Grammar`].
pub type NonTerminalId = usize;

/// One BNF symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol<K> {
    /// A terminal, identified by its token kind.
    Terminal(K),
    /// A reference to another rule.
    NonTerminal(NonTerminalId),
    /// The empty production.
    Epsilon,
}

/// One disjunctive rule: a non-terminal and its alternatives.
///
/// A rule with no alternatives is unreachable (it came from a failure
/// syntax).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule<K> {
    pub id: NonTerminalId,
    pub alternatives: Vec<Vec<Symbol<K>>>,
}

/// A finite BNF grammar, rules ordered by non-terminal id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar<K> {
    pub rules: Vec<Rule<K>>,
}

impl<K: fmt::Display> Grammar<K> {
    /// Render the grammar one rule per line, `N ::= α | β` shaped, naming
    /// non-terminals through `naming`.
    pub fn pretty<F>(&self, naming: F) -> String
    where
        F: Fn(NonTerminalId) -> String,
    {
        let mut out = String::new();
        for rule in &self.rules {
            out.push_str(&naming(rule.id));
            out.push_str(" ::= ");
            for (index, alternative) in rule.alternatives.iter().enumerate() {
                if index > 0 {
                    out.push_str(" | ");
                }
                for (position, symbol) in alternative.iter().enumerate() {
                    if position > 0 {
                        out.push(' ');
                    }
                    match symbol {
                        Symbol::Terminal(kind) => out.push_str(&kind.to_string()),
                        Symbol::NonTerminal(id) => out.push_str(&naming(*id)),
                        Symbol::Epsilon => out.push('ε'),
                    }
                }
            }
            out.push('\n');
        }
        out
    }
}

impl<K: fmt::Display> fmt::Display for Grammar<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty(|id| format!("n{id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_renders_one_rule_per_line() {
        let grammar = Grammar {
            rules: vec![
                Rule {
                    id: 0,
                    alternatives: vec![
                        vec![Symbol::Terminal('a'), Symbol::NonTerminal(1)],
                        vec![Symbol::Epsilon],
                    ],
                },
                Rule {
                    id: 1,
                    alternatives: vec![vec![Symbol::Terminal('b')]],
                },
            ],
        };
        assert_eq!(grammar.pretty(|id| format!("N{id}")), "N0 ::= a N1 | ε\nN1 ::= b\n");
        assert_eq!(grammar.to_string(), "n0 ::= a n1 | ε\nn1 ::= b\n");
    }

    #[test]
    fn an_unreachable_rule_prints_empty() {
        let grammar = Grammar::<char> {
            rules: vec![Rule {
                id: 0,
                alternatives: vec![],
            }],
        };
        assert_eq!(grammar.to_string(), "n0 ::= \n");
    }
}
