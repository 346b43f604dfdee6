//! Token vocabulary: the two opaque types the engine is generic over.
//!
//! The engine never inspects tokens itself. A host implements [`Language`]
//! to name its runtime token type, its classifier kind, and the mapping
//! between them. Kinds are the alphabet: FIRST sets, terminal matching and
//! conflict reports all speak in kinds, never in tokens.

use std::fmt;
use std::hash::Hash;

/// The token vocabulary of a syntax.
///
/// Implementing this trait is the instantiation point of the library: one
/// implementation per token stream shape, typically on a zero-sized marker
/// type.
///
/// ```
/// use ll1::Language;
///
/// enum Arith {}
///
/// impl Language for Arith {
///     type Token = char;
///     type Kind = char;
///
///     fn kind_of(token: &char) -> char {
///         // All digits share one kind; everything else classifies as itself.
///         if token.is_ascii_digit() { 'd' } else { *token }
///     }
/// }
/// ```
pub trait Language: 'static {
    /// The runtime token value produced by the host's lexer.
    type Token: Clone + 'static;

    /// The token classifier used for FIRST sets and terminal matching.
    ///
    /// `Ord` makes every user-visible collection of kinds sortable, so
    /// FIRST sets and conflict reports come out deterministic.
    type Kind: Clone + Eq + Hash + Ord + fmt::Debug + 'static;

    /// Classify a token.
    ///
    /// Must be pure: the same token always yields the same kind.
    fn kind_of(token: &Self::Token) -> Self::Kind;
}
