//! Random syntax trees and a reference matcher for property tests

use std::collections::BTreeSet;

use proptest::prelude::*;

use super::Regex;
use crate::{EPSILON, Symbol};

fn tree(
    depth: u32,
    tree_size: u32,
    branch_size: u32,
    min_branch: usize,
    leaf: impl Strategy<Value = Symbol> + 'static,
) -> impl Strategy<Value = Regex> {
    leaf.prop_map(Regex::Lit)
        .prop_recursive(depth, tree_size, branch_size, move |s| {
            let size = min_branch..=(branch_size.try_into().unwrap_or(usize::MAX));
            prop_oneof![
                prop::collection::vec(s.clone(), size.clone()).prop_map(Regex::Alt),
                prop::collection::vec(s.clone(), size).prop_map(Regex::Cat),
                s.prop_map(|r| Regex::Star(r.into())),
            ]
        })
}

/// Trees over `leaf` symbols whose unions are never empty
pub fn re(
    depth: u32,
    tree_size: u32,
    branch_size: u32,
    leaf: impl Strategy<Value = Symbol> + 'static,
) -> impl Strategy<Value = Regex> {
    tree(depth, tree_size, branch_size, 1, leaf)
}

/// Trees that may contain the empty language and the empty word
pub fn re_with_bottom(
    depth: u32,
    tree_size: u32,
    branch_size: u32,
    leaf: impl Strategy<Value = Symbol> + 'static,
) -> impl Strategy<Value = Regex> {
    tree(depth, tree_size, branch_size, 0, leaf)
}

/// Positions of `word` at which a match of `re` starting at any of `starts`
/// can end
fn ends(re: &Regex, word: &[Symbol], starts: &BTreeSet<usize>) -> BTreeSet<usize> {
    match re {
        Regex::Lit(EPSILON) => starts.clone(),
        Regex::Lit(s) => starts
            .iter()
            .filter(|&&i| word.get(i) == Some(s))
            .map(|i| i + 1)
            .collect(),
        Regex::Alt(alts) => alts.iter().flat_map(|r| ends(r, word, starts)).collect(),
        Regex::Cat(cat) => cat
            .iter()
            .fold(starts.clone(), |pos, r| ends(r, word, &pos)),
        Regex::Star(r) => {
            let mut reached = starts.clone();
            let mut frontier = starts.clone();
            while !frontier.is_empty() {
                frontier = ends(r, word, &frontier)
                    .difference(&reached)
                    .copied()
                    .collect();
                reached.extend(&frontier);
            }
            reached
        },
    }
}

/// Check whether `re` matches all of `word`, without building an automaton
#[must_use]
pub fn matches(re: &Regex, word: &[Symbol]) -> bool {
    ends(re, word, &[0].into()).contains(&word.len())
}

/// Check whether `re` denotes the empty language
#[must_use]
pub fn is_empty(re: &Regex) -> bool {
    match re {
        Regex::Lit(_) | Regex::Star(_) => false,
        Regex::Alt(alts) => alts.iter().all(is_empty),
        Regex::Cat(cat) => cat.iter().any(is_empty),
    }
}
