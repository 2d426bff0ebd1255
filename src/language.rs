use std::fmt;

use crate::types::{Class, EPSILON};

#[derive(Clone, PartialEq, Debug)]
pub struct Token(pub Class);

#[derive(Clone, PartialEq, Debug)]
pub struct Alt(pub Box<Language>, pub Box<Language>);

#[derive(Clone, PartialEq, Debug)]
pub struct Cat(pub Box<Language>, pub Box<Language>);

#[derive(Clone, PartialEq, Debug)]
pub struct Repeat(pub Box<Language>);

#[derive(Clone, PartialEq, Debug)]
pub struct Rule(pub String);

/// A grammar written down as a value, before it is lowered into an
/// arena.  Rules refer to each other by name; see `Grammar::from_rules`.
#[derive(Clone, PartialEq, Debug)]
pub enum Language {
    Epsilon,
    Token(Token),
    Alt(Alt),
    Cat(Cat),
    Repeat(Repeat),
    Rule(Rule),
}

pub fn icat(l: Language, r: Language) -> Language {
    Language::Cat(Cat(Box::new(l), Box::new(r)))
}

pub fn ialt(l: Language, r: Language) -> Language {
    Language::Alt(Alt(Box::new(l), Box::new(r)))
}

pub fn rep(n: Language) -> Language {
    Language::Repeat(Repeat(Box::new(n)))
}

pub fn tok(class: Class) -> Language {
    if class == EPSILON {
        Language::Epsilon
    } else {
        Language::Token(Token(class))
    }
}

pub fn eps() -> Language {
    Language::Epsilon
}

pub fn rule(name: &str) -> Language {
    Language::Rule(Rule(name.to_string()))
}

#[macro_export]
macro_rules! cat {
    ($l:expr, $r:expr) => {
        $crate::language::icat($l, $r)
    };

    ($l:expr, $r:expr, $($x:expr),*) => {
        $crate::language::icat($l, $crate::cat!($r, $($x),*))
    };
}

#[macro_export]
macro_rules! alt {
    ($l:expr, $r:expr) => {
        $crate::language::ialt($l, $r)
    };

    ($l:expr, $r:expr, $($x:expr),*) => {
        $crate::language::ialt($l, $crate::alt!($r, $($x),*))
    };
}

impl fmt::Display for Alt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}|", self.0)?;

        let mut c = &*self.1;
        while let Language::Alt(nalt) = c {
            write!(f, "{}|", nalt.0)?;
            c = &*nalt.1;
        }
        write!(f, "{})", c)
    }
}

impl fmt::Display for Cat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)?;
        write!(f, "{}", self.1)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Language::Epsilon => write!(f, "ε"),
            Language::Token(ref c) => write!(f, "<{}>", c.0),
            Language::Alt(ref alt) => write!(f, "{}", alt),
            Language::Cat(ref cat) => write!(f, "{}", cat),
            Language::Repeat(ref r) => write!(f, "({})*", r.0),
            Language::Rule(ref r) => write!(f, "{}", r.0),
        }
    }
}
