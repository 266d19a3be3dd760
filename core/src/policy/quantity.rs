//! Quantity extraction from free text
//!
//! Turns an utterance into a flat token stream of numbers (with their optional unit
//! word), operator words, parentheses and connectives. This is heuristic text matching: it
//! knows a fixed vocabulary and treats the first non-vocabulary word after a number as its
//! unit. Words naming mathematics beyond the four operations are never units.

use crate::operations::{Operand, Operation};
use regex::Regex;
use std::sync::OnceLock;

/// A lexical unit of an utterance
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A number, with the unit word that followed it
    Quantity(Operand),
    /// An infix operator ("plus", "divided by", "*", ...)
    Operator(Operation),
    /// An imperative verb ("add", "subtract", ...)
    Verb(Operation),
    /// "and" or a comma between two quantities
    And,
    /// `(`
    Open,
    /// `)`
    Close,
    /// An operation outside add/subtract/multiply/divide ("squared", "percent", ...)
    Unsupported(String),
    /// Any other word
    Word(String),
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?P<number>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+)
            | (?P<word>[a-z]+(?:['-][a-z]+)*)
            | (?P<symbol>[-+*/×÷,()%])
            ",
        )
        .expect("token pattern is valid")
    })
}

/// Words that never name a unit
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "what", "whats", "what's", "is", "are", "was", "be", "of", "by", "to",
    "from", "and", "or", "how", "many", "much", "me", "my", "i", "you", "your", "we", "it",
    "that", "this", "total", "equals", "equal", "result", "please", "calculate", "compute",
    "tell", "give", "if", "then", "have", "has", "get", "got", "in", "on", "with", "than",
    "more", "less", "left", "together", "altogether", "do", "does", "can", "could", "would",
    "will", "into", "over", "at", "for", "as", "so", "all", "there", "here", "hi", "hello",
    "hey", "thanks", "thank", "plus", "minus", "times", "x", "multiplied", "divided",
    "added", "take", "away", "negative", "add", "subtract", "multiply", "divide", "sum",
    "product", "today", "now", "tomorrow", "yesterday", "exactly", "again", "just", "really",
    "about", "approximately", "roughly", "also", "other", "each",
];

/// Mathematics the calculator does not offer
const UNSUPPORTED: &[&str] = &[
    "squared", "cubed", "square-root", "sqrt", "root", "roots", "power", "powers", "exponent",
    "percent", "percentage", "percents", "mod", "modulo", "remainder", "factorial", "log",
    "logarithm", "sin", "sine", "cos", "cosine", "tan", "tangent", "average", "mean", "median",
];

fn is_unsupported(word: &str) -> bool {
    UNSUPPORTED.contains(&word)
}

/// Value of a single number word
fn simple_number_word(word: &str) -> Option<f64> {
    let value = match word {
        "zero" | "none" => 0.0,
        "one" => 1.0,
        "two" => 2.0,
        "three" => 3.0,
        "four" => 4.0,
        "five" => 5.0,
        "six" => 6.0,
        "seven" => 7.0,
        "eight" => 8.0,
        "nine" => 9.0,
        "ten" => 10.0,
        "eleven" => 11.0,
        "twelve" | "dozen" => 12.0,
        "thirteen" => 13.0,
        "fourteen" => 14.0,
        "fifteen" => 15.0,
        "sixteen" => 16.0,
        "seventeen" => 17.0,
        "eighteen" => 18.0,
        "nineteen" => 19.0,
        "twenty" => 20.0,
        "thirty" => 30.0,
        "forty" => 40.0,
        "fifty" => 50.0,
        "sixty" => 60.0,
        "seventy" => 70.0,
        "eighty" => 80.0,
        "ninety" => 90.0,
        "hundred" => 100.0,
        "thousand" => 1000.0,
        _ => return None,
    };
    Some(value)
}

/// Value of a number word, including hyphenated tens ("twenty-five")
pub fn number_word(word: &str) -> Option<f64> {
    if let Some(value) = simple_number_word(word) {
        return Some(value);
    }

    let (tens, ones) = word.split_once('-')?;
    let tens = simple_number_word(tens).filter(|t| (20.0..=90.0).contains(t) && t % 10.0 == 0.0)?;
    let ones = simple_number_word(ones).filter(|o| (1.0..=9.0).contains(o))?;
    Some(tens + ones)
}

fn is_unit_candidate(word: &str) -> bool {
    !STOPWORDS.contains(&word) && !is_unsupported(word) && number_word(word).is_none()
}

/// Raw lexeme before operator phrases are merged
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Number(f64),
    Word(String),
    Symbol(char),
}

fn lex(text: &str) -> Vec<Lexeme> {
    let lowered = text.to_lowercase();
    token_regex()
        .captures_iter(&lowered)
        .filter_map(|caps| {
            if let Some(number) = caps.name("number") {
                number
                    .as_str()
                    .replace(',', "")
                    .parse::<f64>()
                    .ok()
                    .map(Lexeme::Number)
            } else if let Some(word) = caps.name("word") {
                Some(Lexeme::Word(word.as_str().to_string()))
            } else {
                caps.name("symbol")
                    .and_then(|symbol| symbol.as_str().chars().next())
                    .map(Lexeme::Symbol)
            }
        })
        .collect()
}

/// Split an utterance into tokens
pub fn tokenize(text: &str) -> Vec<Token> {
    let lexemes = lex(text);
    let mut tokens = Vec::new();
    let mut i = 0;

    let word_at = |index: usize| match lexemes.get(index) {
        Some(Lexeme::Word(word)) => Some(word.as_str()),
        _ => None,
    };

    while i < lexemes.len() {
        match &lexemes[i] {
            Lexeme::Number(value) => {
                let (value, consumed) = match (word_at(i + 1), word_at(i + 2)) {
                    // "2 dozen", "3 hundred"
                    (Some("dozen"), _) => (value * 12.0, 2),
                    (Some("hundred"), _) => (value * 100.0, 2),
                    (Some("thousand"), _) => (value * 1000.0, 2),
                    _ => (*value, 1),
                };
                i += consumed;
                i += push_quantity(&mut tokens, value, word_at(i));
            }
            Lexeme::Symbol(symbol) => {
                tokens.push(match symbol {
                    '+' => Token::Operator(Operation::Add),
                    '-' => Token::Operator(Operation::Subtract),
                    '*' | '×' => Token::Operator(Operation::Multiply),
                    '/' | '÷' => Token::Operator(Operation::Divide),
                    '(' => Token::Open,
                    ')' => Token::Close,
                    '%' => Token::Unsupported("percent".to_string()),
                    _ => Token::And,
                });
                i += 1;
            }
            Lexeme::Word(word) => {
                let next = word_at(i + 1);
                match (word.as_str(), next) {
                    ("multiplied", Some("by")) | ("times", Some("by")) => {
                        tokens.push(Token::Operator(Operation::Multiply));
                        i += 2;
                    }
                    ("divided", Some("by")) => {
                        tokens.push(Token::Operator(Operation::Divide));
                        i += 2;
                    }
                    ("added", Some("to")) => {
                        tokens.push(Token::Operator(Operation::Add));
                        i += 2;
                    }
                    ("take", Some("away")) => {
                        tokens.push(Token::Operator(Operation::Subtract));
                        i += 2;
                    }
                    ("plus", _) => {
                        tokens.push(Token::Operator(Operation::Add));
                        i += 1;
                    }
                    ("minus", _) => {
                        tokens.push(Token::Operator(Operation::Subtract));
                        i += 1;
                    }
                    ("times", _) | ("x", _) | ("multiplied", _) => {
                        tokens.push(Token::Operator(Operation::Multiply));
                        i += 1;
                    }
                    ("over", _) | ("divided", _) => {
                        tokens.push(Token::Operator(Operation::Divide));
                        i += 1;
                    }
                    ("add", _) | ("sum", _) => {
                        tokens.push(Token::Verb(Operation::Add));
                        i += 1;
                    }
                    ("product", _) => {
                        tokens.push(Token::Verb(Operation::Multiply));
                        i += 1;
                    }
                    ("subtract", _) => {
                        tokens.push(Token::Verb(Operation::Subtract));
                        i += 1;
                    }
                    ("multiply", _) => {
                        tokens.push(Token::Verb(Operation::Multiply));
                        i += 1;
                    }
                    ("divide", _) => {
                        tokens.push(Token::Verb(Operation::Divide));
                        i += 1;
                    }
                    ("and", _) => {
                        tokens.push(Token::And);
                        i += 1;
                    }
                    ("negative", _) => {
                        // "negative five" reads like a leading minus sign
                        tokens.push(Token::Operator(Operation::Subtract));
                        i += 1;
                    }
                    (word, _) if is_unsupported(word) => {
                        tokens.push(Token::Unsupported(word.to_string()));
                        i += 1;
                    }
                    ("a", Some(next)) | ("an", Some(next)) if is_unit_candidate(next) => {
                        i += 1;
                        i += push_quantity(&mut tokens, 1.0, Some(next));
                    }
                    (word, _) => {
                        if let Some(value) = number_word(word) {
                            let (value, consumed) = compound_number(value, next);
                            i += consumed;
                            i += push_quantity(&mut tokens, value, word_at(i));
                        } else {
                            tokens.push(Token::Word(word.to_string()));
                            i += 1;
                        }
                    }
                }
            }
        }
    }

    tokens
}

/// Combine "twenty five" and "three hundred" style sequences
fn compound_number(value: f64, next: Option<&str>) -> (f64, usize) {
    let Some(next_value) = next.and_then(number_word) else {
        return (value, 1);
    };

    let is_tens = (20.0..=90.0).contains(&value) && value % 10.0 == 0.0;
    if is_tens && (1.0..=9.0).contains(&next_value) {
        (value + next_value, 2)
    } else if value < 100.0 && (next_value == 100.0 || next_value == 1000.0 || next_value == 12.0) {
        (value * next_value, 2)
    } else {
        (value, 1)
    }
}

/// Push a quantity, attaching `unit_word` when it names a unit. Returns words consumed.
fn push_quantity(tokens: &mut Vec<Token>, value: f64, unit_word: Option<&str>) -> usize {
    match unit_word.filter(|word| is_unit_candidate(word)) {
        Some(unit) => {
            tokens.push(Token::Quantity(Operand::with_unit(value, unit)));
            1
        }
        None => {
            tokens.push(Token::Quantity(Operand::new(value)));
            0
        }
    }
}

/// All quantities mentioned in the text, in order
pub fn extract_quantities(text: &str) -> Vec<Operand> {
    tokenize(text)
        .into_iter()
        .filter_map(|token| match token {
            Token::Quantity(operand) => Some(operand),
            _ => None,
        })
        .collect()
}

/// Grouping key for a unit word: lower-cased and singularised
pub fn unit_key(word: &str) -> String {
    let word = word.to_lowercase();
    let len = word.len();

    if len > 4 && word.ends_with("ies") {
        format!("{}y", &word[..len - 3])
    } else if len > 4
        && ["oes", "ches", "shes", "sses", "xes", "zes"]
            .iter()
            .any(|suffix| word.ends_with(suffix))
    {
        word[..len - 2].to_string()
    } else if len > 3
        && word.ends_with('s')
        && !["ss", "us", "is"].iter().any(|suffix| word.ends_with(suffix))
    {
        word[..len - 1].to_string()
    } else {
        word
    }
}

/// Plural form of a unit key
pub fn pluralize(key: &str) -> String {
    let consonant_y = key.len() > 1
        && key.ends_with('y')
        && !key[..key.len() - 1].ends_with(['a', 'e', 'i', 'o', 'u']);

    if consonant_y {
        format!("{}ies", &key[..key.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| key.ends_with(suffix))
    {
        format!("{}es", key)
    } else {
        format!("{}s", key)
    }
}
