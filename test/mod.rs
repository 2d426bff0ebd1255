use dervish::{Class, Forest, Symbol, FIRST_TERMINAL};

mod test_grammar;
mod test_properties;

/// Classifies each character by its position in `alphabet`.  Anything
/// not in the alphabet gets a class no grammar here ever mentions.
pub fn lex(input: &str, alphabet: &str) -> Vec<Symbol<char>> {
    input
        .chars()
        .map(|c| {
            let class = match alphabet.chars().position(|a| a == c) {
                Some(pos) => FIRST_TERMINAL + pos as Class,
                None => 999,
            };
            Symbol::new(class, c)
        })
        .collect()
}

/// Lower-case letters, 'a' as the first terminal class.
pub fn letter(c: char) -> Class {
    FIRST_TERMINAL + (c as Class - 'a' as Class)
}

pub fn letters(input: &str) -> Vec<Symbol<char>> {
    input.chars().map(|c| Symbol::new(letter(c), c)).collect()
}

/// The lexemes of the first tree in the forest, if there was a parse.
pub fn extract_match(res: &Option<Forest<char>>) -> Option<String> {
    res.as_ref().map(|forest| match forest.iter().next() {
        Some(tree) => tree.leaves().iter().map(|s| s.lexeme).collect(),
        None => String::new(),
    })
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
