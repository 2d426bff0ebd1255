use dervish::{Cell, Dervish, Grammar, GrammarError, Parser, Settings, Symbol};

use crate::{letter, letters};

fn beer_grammar() -> (Grammar<char>, usize) {
    let mut grammar = Grammar::new();
    let b = grammar.make_tok(letter('b'));
    let ee = {
        let e1 = grammar.make_tok(letter('e'));
        let e2 = grammar.make_tok(letter('e'));
        grammar.make_cat(e1, e2)
    };
    let eestar = grammar.make_rep(ee);
    let r = grammar.make_tok(letter('r'));
    let eer = grammar.make_cat(eestar, r);
    let beer = grammar.make_cat(b, eer);
    (grammar, beer)
}

#[test]
fn beer() {
    let (grammar, start) = beer_grammar();
    let mut dervish = Dervish::new(grammar, start).unwrap();
    let forest = dervish.parse(letters("beeeer")).unwrap();
    assert_eq!(forest.len(), 1);
    let tree = forest.iter().next().unwrap();
    assert_eq!(tree.car(), Some(&Cell::Lit(Symbol::new(letter('b'), 'b'))));
    let lexemes: String = tree.leaves().iter().map(|s| s.lexeme).collect();
    assert_eq!(lexemes, "beeeer");

    assert!(dervish.parse(letters("beeer")).is_none());
    assert!(dervish.parse(letters("br")).is_some());
}

#[test]
fn step_by_step_matches_recognize() {
    let (grammar, start) = beer_grammar();
    let mut dervish = Dervish::new(grammar, start).unwrap();
    for symbol in letters("beer") {
        assert!(dervish.feed(&symbol));
    }
    assert!(dervish.accepted());
    let stepped = format!("{}", dervish.grammar().display(dervish.current()));
    let node = dervish.recognize(letters("beer")).node;
    assert_eq!(format!("{}", dervish.grammar().display(node)), stepped);
}

#[test]
fn culled_steps_are_stable() {
    let (grammar, start) = beer_grammar();
    let mut dervish = Dervish::new(grammar, start).unwrap();
    dervish.recognize(letters("beee"));
    let node = dervish.current();
    let before = format!("{}", dervish.grammar().display(node));

    let (mut grammar, start) = beer_grammar();
    let mut node = start;
    for symbol in letters("beee") {
        grammar.forget_derivatives();
        node = grammar.derive(node, &symbol);
        grammar.nullable(node);
        node = grammar.cull(node).unwrap_or(grammar.empty);
    }
    let once = format!("{}", grammar.display(node));
    let again = grammar.cull(node).unwrap_or(grammar.empty);
    assert_eq!(again, node);
    assert_eq!(format!("{}", grammar.display(again)), once);
    assert_eq!(once, before);
}

#[test]
fn an_unknown_class_kills_in_one_step() {
    let (grammar, start) = beer_grammar();
    let mut dervish = Dervish::new(grammar, start).unwrap();
    let result = dervish.recognize(letters("bxeer"));
    assert!(!result.accepted);
    assert_eq!(result.node, dervish.grammar().empty);
    assert_eq!(dervish.steps(), 2);
    assert!(matches!(dervish.grammar()[result.node].data, Parser::Emp));
}

#[test]
fn running_on_after_death() {
    let (grammar, start) = beer_grammar();
    let settings = Settings::default().stop_when_dead(false);
    let mut dervish = Dervish::with_settings(grammar, start, settings).unwrap();
    let result = dervish.recognize(letters("xbeer"));
    assert!(!result.accepted);
    assert_eq!(dervish.steps(), 5);
}

#[test]
fn construction_errors() {
    let mut grammar = Grammar::<char>::new();
    let s = grammar.declare("S");
    let t = grammar.declare("T");
    let a = grammar.make_tok(letter('a'));
    let body = grammar.make_cat(a, t);
    grammar.define(s, body).unwrap();

    assert_eq!(
        grammar.define(s, a),
        Err(GrammarError::Redefined { name: "S".to_string() })
    );
    assert_eq!(grammar.define(a, a), Err(GrammarError::NotANonterminal(a)));
    match Dervish::new(grammar, s) {
        Err(e) => assert_eq!(e.to_string(), "nonterminal `T` is reachable but was never defined"),
        Ok(_) => panic!("undefined nonterminal accepted"),
    }
}
