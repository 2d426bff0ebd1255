use dervish::language::{eps, ialt, icat, rep, tok, Language, Token};
use dervish::{Dervish, Grammar, Settings, Symbol};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn language() -> impl Strategy<Value = Language> {
    let leaf = prop_oneof![Just(tok(2)), Just(tok(3)), Just(eps())];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| ialt(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| icat(l, r)),
            inner.prop_map(rep),
        ]
    })
}

fn input() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(2u32..4, 0..5)
}

// Every position a match of `lang` starting at `from` can end at.
fn ends(lang: &Language, input: &[u32], from: usize) -> BTreeSet<usize> {
    match lang {
        Language::Epsilon => [from].into_iter().collect(),
        Language::Token(Token(c)) => {
            if input.get(from) == Some(c) {
                [from + 1].into_iter().collect()
            } else {
                BTreeSet::new()
            }
        }
        Language::Alt(alt) => {
            let mut all = ends(&alt.0, input, from);
            all.extend(ends(&alt.1, input, from));
            all
        }
        Language::Cat(cat) => ends(&cat.0, input, from)
            .into_iter()
            .flat_map(|mid| ends(&cat.1, input, mid))
            .collect(),
        Language::Repeat(r) => {
            let mut seen: BTreeSet<usize> = [from].into_iter().collect();
            let mut frontier = vec![from];
            while let Some(pos) = frontier.pop() {
                for end in ends(&r.0, input, pos) {
                    if seen.insert(end) {
                        frontier.push(end);
                    }
                }
            }
            seen
        }
        Language::Rule(_) => BTreeSet::new(),
    }
}

fn accepts(lang: &Language, input: &[u32]) -> bool {
    ends(lang, input, 0).contains(&input.len())
}

fn symbols(input: &[u32]) -> Vec<Symbol<u32>> {
    input.iter().map(|c| Symbol::new(*c, *c)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn recognition_agrees_with_backtracking(lang in language(), input in input()) {
        let mut dervish = Dervish::<u32>::from_language(&lang).unwrap();
        let result = dervish.recognize(symbols(&input));
        prop_assert_eq!(result.accepted, accepts(&lang, &input), "{}", lang);
    }

    #[test]
    fn culling_changes_nothing(lang in language(), input in input()) {
        let (grammar, start) = Grammar::<u32>::from_language(&lang).unwrap();
        let settings = Settings::default().cull(false);
        let mut raw = Dervish::with_settings(grammar, start, settings).unwrap();
        let mut culled = Dervish::<u32>::from_language(&lang).unwrap();
        prop_assert_eq!(
            raw.recognize(symbols(&input)).accepted,
            culled.recognize(symbols(&input)).accepted
        );
    }

    #[test]
    fn concatenation_splits_the_input(l in language(), r in language(), input in input()) {
        let joined = icat(l.clone(), r.clone());
        let mut whole = Dervish::<u32>::from_language(&joined).unwrap();
        let mut left = Dervish::<u32>::from_language(&l).unwrap();
        let mut right = Dervish::<u32>::from_language(&r).unwrap();
        let split = (0..=input.len()).any(|at| {
            left.recognize(symbols(&input[..at])).accepted
                && right.recognize(symbols(&input[at..])).accepted
        });
        prop_assert_eq!(whole.recognize(symbols(&input)).accepted, split);
    }

    #[test]
    fn every_tree_spells_the_input(lang in language(), input in input()) {
        let mut dervish = Dervish::<u32>::from_language(&lang).unwrap();
        match dervish.parse(symbols(&input)) {
            Some(forest) => {
                prop_assert_eq!(forest.is_empty(), input.is_empty());
                for tree in forest.iter() {
                    let leaves: Vec<u32> = tree.leaves().iter().map(|s| s.class).collect();
                    prop_assert_eq!(&leaves, &input);
                }
            }
            None => prop_assert!(!accepts(&lang, &input)),
        }
    }

    #[test]
    fn collection_changes_nothing(lang in language(), input in input()) {
        let (grammar, start) = Grammar::<u32>::from_language(&lang).unwrap();
        let settings = Settings::default().collect_every(1);
        let mut collected = Dervish::with_settings(grammar, start, settings).unwrap();
        let mut plain = Dervish::<u32>::from_language(&lang).unwrap();
        prop_assert_eq!(
            collected.recognize(symbols(&input)).accepted,
            plain.recognize(symbols(&input)).accepted
        );
        prop_assert_eq!(collected.forest(), plain.forest());
    }
}
