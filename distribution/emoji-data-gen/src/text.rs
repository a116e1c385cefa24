//! Name and keyword normalization

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Words kept lowercase by [`titleize`] unless they open the string.
const SMALL_WORDS: [&str; 22] = [
    "and", "or", "nor", "a", "an", "the", "so", "but", "to", "of", "at", "by", "from", "into",
    "on", "onto", "off", "out", "in", "over", "with", "for",
];

/// Lexicon entries rewritten before tokenizing.
const KEYWORD_SUBSTITUTES: [(&str, &str); 1] = [("highfive", "highfive high-five")];

static WORD_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z0-9_])-").expect("valid hyphen regex"));
static KEYWORD_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[_|\s]+").expect("valid keyword split regex"));
static DIACRITIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Diacritic}").expect("valid diacritic regex"));

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `"WAVING HAND SIGN"` → `"Waving Hand Sign"`, `"flag-in_the_house"` →
/// `"Flag-in the House"`.
pub fn titleize(value: &str) -> String {
    let lowered = value.to_lowercase().replace('_', " ");
    let titled = lowered
        .split(' ')
        .map(|word| {
            word.split('-')
                .map(|part| {
                    if SMALL_WORDS.contains(&part) {
                        part.to_string()
                    } else {
                        capitalize(part)
                    }
                })
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut chars = titled.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Decompose and drop diacritics: `"piñata"` → `"pinata"`.
/// Other combining marks, such as variation selectors, are kept.
pub fn strip_diacritics(value: &str) -> String {
    let decomposed: String = value.nfd().collect();
    DIACRITIC.replace_all(&decomposed, "").into_owned()
}

/// Tokens for one raw lexicon entry or short name.
fn tokens(word: &str) -> Vec<String> {
    let word = KEYWORD_SUBSTITUTES
        .iter()
        .find(|(from, _)| *from == word)
        .map_or(word, |(_, to)| *to);
    let stripped = strip_diacritics(word);
    let joined = WORD_HYPHEN.replacen(&stripped, 1, "${1}_");
    KEYWORD_SPLIT
        .split(&joined)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keyword list for an emoji.
///
/// Starts from every short name plus the lexicon entries, tokenizes each,
/// dedupes in order and drops tokens that are whole words of the name.
pub fn keywords<'a>(
    ids: &'a [String],
    lexicon: impl IntoIterator<Item = &'a String>,
    name: &str,
) -> Vec<String> {
    let name_words: Vec<String> = name
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut out: Vec<String> = Vec::new();
    for word in ids.iter().chain(lexicon) {
        for token in tokens(word) {
            if !name_words.contains(&token) && !out.contains(&token) {
                out.push(token);
            }
        }
    }
    out
}
