use arena::NodeId;
use hashbrown::HashMap;

use crate::error::{GrammarError, Result};
use crate::grammar::Grammar;
use crate::language::Language;
use crate::siaa::Siaa;

// Lowers a `Language` into the arena, bottom up.  Rule references are
// looked up in `rules`, which holds every nonterminal up front, so a
// body can name any rule, itself included.
fn language_handler<L: Siaa>(
    grammar: &mut Grammar<L>,
    lang: &Language,
    rules: &HashMap<String, NodeId>,
) -> Result<NodeId> {
    Ok(match lang {
        Language::Epsilon => grammar.make_epsilon(),

        Language::Token(ref t) => grammar.make_tok(t.0),

        Language::Alt(ref node) => {
            let car = language_handler(grammar, &node.0, rules)?;
            let cdr = language_handler(grammar, &node.1, rules)?;
            grammar.make_alt(car, cdr)
        }

        Language::Cat(ref node) => {
            let car = language_handler(grammar, &node.0, rules)?;
            let cdr = language_handler(grammar, &node.1, rules)?;
            grammar.make_cat(car, cdr)
        }

        Language::Repeat(ref node) => {
            let car = language_handler(grammar, &node.0, rules)?;
            grammar.make_rep(car)
        }

        Language::Rule(ref name) => match rules.get(&name.0) {
            Some(id) => *id,
            None => {
                return Err(GrammarError::UnknownRule {
                    name: name.0.clone(),
                })
            }
        },
    })
}

impl<L: Siaa> Grammar<L> {
    /// A grammar for a single, rule-free language.
    pub fn from_language(lang: &Language) -> Result<(Grammar<L>, NodeId)> {
        let mut grammar = Grammar::new();
        let start = language_handler(&mut grammar, lang, &HashMap::new())?;
        Ok((grammar, start))
    }

    /// A grammar from named rules.  Every rule is declared before any
    /// is defined, so the rules may refer to one another freely.
    /// Returns the grammar and the node for `start`.
    pub fn from_rules(rules: &[(&str, Language)], start: &str) -> Result<(Grammar<L>, NodeId)> {
        let mut grammar = Grammar::new();
        let mut names = HashMap::new();
        for (name, _) in rules {
            if names.contains_key(*name) {
                return Err(GrammarError::DuplicateRule {
                    name: name.to_string(),
                });
            }
            let id = grammar.declare(name);
            names.insert(name.to_string(), id);
        }

        for (name, lang) in rules {
            let body = language_handler(&mut grammar, lang, &names)?;
            grammar.define(names[*name], body)?;
        }

        let start = match names.get(start) {
            Some(id) => *id,
            None => {
                return Err(GrammarError::UnknownRule {
                    name: start.to_string(),
                })
            }
        };
        grammar.validate(start)?;
        Ok((grammar, start))
    }
}
