//! Regular expressions compiled to epsilon-NFAs
//!
//! The textual syntax treats every character literally except the operators
//! `+` (union), `*` (Kleene star) and `( )` (grouping); concatenation is
//! juxtaposition and a backslash escapes any of the five reserved characters.

use std::{fmt, ops::Deref};

use crate::{
    automaton::{FiniteAutomaton, delegate_automaton},
    builder::{BuildError, NfaBuilder},
    nfa::{self, Nfa},
    prelude::*,
    symbol,
};

mod parser;
#[cfg(any(test, feature = "proptest"))]
pub mod prop;

pub use parser::{ParseError, RESERVED, parse};

/// Syntax tree of a regular expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    /// A single symbol, or the empty word for [`EPSILON`]
    Lit(Symbol),
    /// Union; empty for the empty language
    Alt(Vec<Regex>),
    /// Concatenation; empty for the empty word
    Cat(Vec<Regex>),
    /// Kleene star
    Star(Box<Regex>),
}

impl Regex {
    /// Matches nothing
    pub const BOTTOM: Self = Self::Alt(vec![]);
    /// Matches only the empty word
    pub const EMPTY: Self = Self::Cat(vec![]);

    /// Union of `alts`, collapsing a single alternative
    #[must_use]
    pub fn alt(mut alts: Vec<Self>) -> Self {
        if alts.len() == 1 {
            alts.pop().unwrap_or_else(|| unreachable!())
        } else {
            Self::Alt(alts)
        }
    }

    /// Concatenation of `cat`, collapsing a single element
    #[must_use]
    pub fn cat(mut cat: Vec<Self>) -> Self {
        if cat.len() == 1 {
            cat.pop().unwrap_or_else(|| unreachable!())
        } else {
            Self::Cat(cat)
        }
    }

    /// Parse the textual syntax
    ///
    /// # Errors
    /// See [`parse`].
    #[inline]
    pub fn parse(s: &str) -> Result<Self, ParseError> { parser::parse(s) }

    /// Build the Thompson automaton for this tree
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the states do not fit.
    pub fn compile(&self) -> Result<RegularExpression, BuildError> {
        match self {
            Self::Lit(s) => RegularExpression::singleton(*s),
            Self::Alt(alts) => {
                let alts = alts.iter().map(Self::compile).collect::<Result<Vec<_>, _>>()?;
                RegularExpression::union(&alts)
            },
            Self::Cat(cat) => {
                let cat = cat.iter().map(Self::compile).collect::<Result<Vec<_>, _>>()?;
                RegularExpression::concatenation(&cat)
            },
            Self::Star(re) => re.compile()?.kleene_star(),
        }
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lit(EPSILON) => Ok(()),
            &Self::Lit(s) => match u32::try_from(s).ok().and_then(char::from_u32) {
                Some(c) if RESERVED.contains(&c) => write!(f, "\\{c}"),
                Some(c) => write!(f, "{c}"),
                None => write!(f, "<{s}>"),
            },
            Self::Alt(alts) => {
                f.write_str("(")?;
                for (i, re) in alts.iter().enumerate() {
                    if i != 0 {
                        f.write_str("+")?;
                    }
                    write!(f, "{re}")?;
                }
                f.write_str(")")
            },
            Self::Cat(cat) => cat.iter().try_for_each(|re| write!(f, "{re}")),
            Self::Star(re) => write!(f, "({re})*"),
        }
    }
}

/// A regular language represented by its epsilon-NFA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularExpression(Nfa);

delegate_automaton!(RegularExpression => 0);

impl Deref for RegularExpression {
    type Target = Nfa;

    #[inline]
    fn deref(&self) -> &Nfa { &self.0 }
}

impl From<RegularExpression> for Nfa {
    #[inline]
    fn from(re: RegularExpression) -> Self { re.0 }
}

impl RegularExpression {
    /// Parse and compile the textual syntax
    ///
    /// # Errors
    /// Returns a [`ParseError`] for malformed input.
    pub fn parse(s: &str) -> Result<Self, ParseError> { Ok(Regex::parse(s)?.compile()?) }

    /// Two states joined by one transition on `symbol`
    ///
    /// # Errors
    /// Returns [`BuildError::InvalidSymbol`] for reserved symbols other than
    /// [`EPSILON`] and [`ERROR`].
    pub fn singleton(symbol: Symbol) -> Result<Self, BuildError> {
        let mut builder = NfaBuilder::new();
        let start = builder.add_initial_state()?;
        let end = builder.add_final_state()?;
        builder.add_transition(start, symbol, end)?;
        Ok(Self(builder.build()?))
    }

    /// # Errors
    /// Never fails in practice; see [`singleton`](Self::singleton).
    #[inline]
    pub fn literal(c: char) -> Result<Self, BuildError> { Self::singleton(symbol(c)) }

    /// Exactly the given word
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the states do not fit.
    pub fn word(word: &str) -> Result<Self, BuildError> {
        let mut builder = NfaBuilder::new();
        let mut tail = builder.add_initial_state()?;

        for c in word.chars() {
            let next = builder.add_state()?;
            builder.add_transition(tail, symbol(c), next)?;
            tail = next;
        }

        builder.make_final(tail)?;
        Ok(Self(builder.build()?))
    }

    /// Words of any of `exprs`; no expressions give the empty language
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the states do not fit.
    pub fn union<'a>(exprs: impl IntoIterator<Item = &'a Self>) -> Result<Self, BuildError> {
        nfa::union(exprs).map(Self)
    }

    /// Words formed by one word of each expression in order; no expressions
    /// give the empty word
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the states do not fit.
    pub fn concatenation<'a>(
        exprs: impl IntoIterator<Item = &'a Self>,
    ) -> Result<Self, BuildError> {
        let mut builder = NfaBuilder::new();
        let start = builder.add_initial_state()?;
        let mut tails = BTreeSet::from([start]);

        for expr in exprs {
            let imported = builder.add_automaton(expr)?;

            for &tail in &tails {
                for &init in &imported.initial {
                    builder.add_epsilon_transition(tail, init)?;
                }
            }

            tails = imported.accept;
        }

        for tail in tails {
            builder.make_final(tail)?;
        }

        Ok(Self(builder.build()?))
    }

    /// Zero or more repetitions of this expression
    ///
    /// # Errors
    /// Returns [`BuildError::CapacityExceeded`] if the states do not fit.
    pub fn kleene_star(&self) -> Result<Self, BuildError> {
        let mut builder = NfaBuilder::new();
        let start = builder.add_initial_state()?;
        let end = builder.add_final_state()?;
        let imported = builder.add_automaton(self)?;

        for &init in &imported.initial {
            builder.add_epsilon_transition(start, init)?;

            for &fin in &imported.accept {
                builder.add_epsilon_transition(fin, init)?;
            }
        }

        for &fin in &imported.accept {
            builder.add_epsilon_transition(fin, end)?;
        }

        builder.add_epsilon_transition(start, end)?;
        Ok(Self(builder.build()?))
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::{Regex, RegularExpression, prop as re_prop};
    use crate::{ERROR, EPSILON, FiniteAutomaton, Symbol};

    fn accepts(re: &RegularExpression, word: &str) -> bool { re.run_str(word).unwrap() }

    #[test]
    fn star() {
        let re = RegularExpression::parse("a*").unwrap();
        for word in ["", "a", "aa", "aaaaaa"] {
            assert!(accepts(&re, word), "{word:?}");
        }
        for word in ["b", "ab", "aab", "ba"] {
            assert!(!accepts(&re, word), "{word:?}");
        }
    }

    #[test]
    fn union() {
        let re = RegularExpression::parse("a+b").unwrap();
        assert!(accepts(&re, "a"));
        assert!(accepts(&re, "b"));
        for word in ["", "ab", "ba", "aa", "c"] {
            assert!(!accepts(&re, word), "{word:?}");
        }
    }

    #[test]
    fn concatenation() {
        let re = RegularExpression::parse("ab").unwrap();
        assert!(accepts(&re, "ab"));
        for word in ["", "a", "b", "ba", "abb"] {
            assert!(!accepts(&re, word), "{word:?}");
        }
    }

    #[test]
    fn empty_word() {
        let re = RegularExpression::parse("").unwrap();
        assert!(accepts(&re, ""));
        assert!(!accepts(&re, "a"));

        let cat = RegularExpression::concatenation([]).unwrap();
        assert!(accepts(&cat, ""));
        assert!(!accepts(&cat, "a"));
    }

    #[test]
    fn empty_language() {
        let re = RegularExpression::union([]).unwrap();
        assert!(re.is_empty());
        assert!(!accepts(&re, ""));

        let a = RegularExpression::literal('a').unwrap();
        let cat = RegularExpression::concatenation([&a, &re]).unwrap();
        assert!(cat.is_empty());
    }

    #[test]
    fn word_and_literal() {
        let re = RegularExpression::word("hello").unwrap();
        assert!(accepts(&re, "hello"));
        assert!(!accepts(&re, "hell"));

        assert!(accepts(&RegularExpression::word("").unwrap(), ""));
        assert!(RegularExpression::singleton(ERROR).unwrap().run([ERROR]).unwrap());
        assert!(accepts(&RegularExpression::singleton(EPSILON).unwrap(), ""));
    }

    #[test]
    fn nested_groups() {
        let re = RegularExpression::parse("(a(b+c))*d").unwrap();
        for word in ["d", "abd", "acabd", "acacacd"] {
            assert!(accepts(&re, word), "{word:?}");
        }
        for word in ["", "ad", "abc", "abdd"] {
            assert!(!accepts(&re, word), "{word:?}");
        }
    }

    #[test]
    fn display_parses_back() {
        let re = RegularExpression::parse(r"(a\+)*b+\(").unwrap();
        assert!(accepts(&re, "a+a+b"));
        assert!(accepts(&re, "("));

        let tree = Regex::parse(r"(a\+)*b+\(").unwrap();
        assert_eq!(Regex::parse(&tree.to_string()).unwrap(), tree);
    }

    fn symbol() -> impl Strategy<Value = Symbol> { 0..3 }

    fn tree() -> impl Strategy<Value = Regex> { re_prop::re(4, 24, 4, symbol()) }

    fn words() -> impl Strategy<Value = Vec<Vec<Symbol>>> {
        prop::collection::vec(prop::collection::vec(symbol(), 0..8), 1..32)
    }

    // Words outside a DFA's alphabet leave its transition function, which
    // is never acceptance.
    fn dfa_accepts(dfa: &crate::Dfa, word: &[Symbol]) -> bool {
        dfa.run(word.iter().copied()).unwrap_or(false)
    }

    proptest! {
        #[test]
        fn nfa_matches_reference(re in tree(), words in words()) {
            let nfa = re.compile().unwrap();
            for w in &words {
                prop_assert_eq!(
                    nfa.run(w.iter().copied()).unwrap(),
                    re_prop::matches(&re, w),
                    "{:?}",
                    w
                );
            }
        }

        #[test]
        fn determinize_preserves_language(re in tree(), words in words()) {
            let dfa = re.compile().unwrap().determinize().unwrap();
            for w in &words {
                prop_assert_eq!(dfa_accepts(&dfa, w), re_prop::matches(&re, w), "{:?}", w);
            }
        }

        #[test]
        fn minimize_is_idempotent(re in tree(), words in words()) {
            let min = re.compile().unwrap().minimize().unwrap();
            let again = min.minimize().unwrap();
            prop_assert_eq!(min.states().len(), again.states().len());

            let via_dfa = re.compile().unwrap().determinize().unwrap().minimize().unwrap();
            prop_assert_eq!(min.states().len(), via_dfa.states().len());

            for w in &words {
                let expected = re_prop::matches(&re, w);
                prop_assert_eq!(dfa_accepts(&min, w), expected, "{:?}", w);
                prop_assert_eq!(dfa_accepts(&again, w), expected, "{:?}", w);
            }
        }

        #[test]
        fn double_reverse(re in tree(), words in words()) {
            let min = re.compile().unwrap().minimize().unwrap();
            let back = min.reverse().reverse();
            for w in &words {
                prop_assert_eq!(
                    back.run(w.iter().copied()).unwrap(),
                    dfa_accepts(&min, w),
                    "{:?}",
                    w
                );
            }
        }

        #[test]
        fn double_complement(re in tree(), words in words()) {
            let min = re.compile().unwrap().minimize().unwrap();
            let comp = min.complement().unwrap();
            let back = comp.complement().unwrap();
            for w in words.iter().filter(|w| w.iter().all(|s| min.alphabet().contains(s))) {
                prop_assert_eq!(dfa_accepts(&comp, w), !dfa_accepts(&min, w), "{:?}", w);
                prop_assert_eq!(dfa_accepts(&back, w), dfa_accepts(&min, w), "{:?}", w);
            }
        }

        #[test]
        fn emptiness_matches_reference(re in re_prop::re_with_bottom(4, 24, 4, symbol())) {
            let compiled = re.compile().unwrap();
            prop_assert_eq!(compiled.is_empty(), re_prop::is_empty(&re));
            prop_assert_eq!(
                compiled.minimize().unwrap().final_states().is_empty(),
                re_prop::is_empty(&re),
            );
        }

        #[test]
        fn printed_tree_parses_to_same_language(re in tree(), words in words()) {
            let parsed = RegularExpression::parse(&re.to_string()).unwrap();
            for w in &words {
                prop_assert_eq!(
                    parsed.run(w.iter().copied()).unwrap(),
                    re_prop::matches(&re, w),
                    "{:?}",
                    w
                );
            }
        }
    }
}
