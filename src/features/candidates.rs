

use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};

lazy_static! {
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}


pub fn case_variants(phrase: &str) -> [String; 4] {
    [
        phrase.to_string(),
        phrase.to_uppercase(),
        phrase.to_lowercase(),
        title_case(phrase),
    ]
}


// A letter is capitalized when the previous char is not a letter ("t-shirt" -> "T-Shirt").
pub fn title_case(phrase: &str) -> String {
    let mut out = String::with_capacity(phrase.len());
    let mut prev_is_letter = false;
    for c in phrase.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}


pub fn stem(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|word| STEMMER.stem(&word.to_lowercase()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}


pub fn expand(phrase: &str, include_stem: bool) -> Vec<String> {
    let mut candidates = Vec::with_capacity(if include_stem { 8 } else { 4 });
    candidates.extend(case_variants(phrase));
    if include_stem {
        candidates.extend(case_variants(&stem(phrase)));
    }
    candidates
}
