//! Substitution ciphers for the low-difficulty puzzles
//!
//! Only `A..=Z` is enciphered; digits and anything else pass through.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

const ALPHABET_LEN: u8 = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherKind {
    Caesar,
    Vigenere,
}

/// Lowest 64 bits of a big integer
pub(crate) fn low_u64(value: &BigUint) -> u64 {
    value.iter_u64_digits().next().unwrap_or(0)
}

/// Derive an uppercase word: each letter is `seed mod 26`, then the seed drops 5 bits.
pub fn word_from_seed(seed: &BigUint, length: usize) -> String {
    let mut word = String::with_capacity(length);
    let mut temp = seed.clone();
    for _ in 0..length {
        let letter = (low_u64(&(&temp % 26u32)) as u8) + b'A';
        word.push(letter as char);
        temp >>= 5usize;
    }
    word
}

fn shift_letter(c: char, shift: u8) -> char {
    if c.is_ascii_uppercase() {
        let offset = (c as u8 - b'A' + shift % ALPHABET_LEN) % ALPHABET_LEN;
        (b'A' + offset) as char
    } else {
        c
    }
}

fn keyword_shifts(keyword: &str) -> Vec<u8> {
    keyword
        .bytes()
        .filter(u8::is_ascii_uppercase)
        .map(|b| b - b'A')
        .collect()
}

pub fn caesar_encrypt(text: &str, shift: u8) -> String {
    text.chars().map(|c| shift_letter(c, shift)).collect()
}

pub fn caesar_decrypt(text: &str, shift: u8) -> String {
    let inverse = ALPHABET_LEN - shift % ALPHABET_LEN;
    caesar_encrypt(text, inverse)
}

/// Position `i` of the text is shifted by keyword letter `i mod len`, counting every character.
pub fn vigenere_encrypt(text: &str, keyword: &str) -> String {
    let shifts = keyword_shifts(keyword);
    if shifts.is_empty() {
        return text.to_string();
    }
    text.chars()
        .enumerate()
        .map(|(i, c)| shift_letter(c, shifts[i % shifts.len()]))
        .collect()
}

pub fn vigenere_decrypt(text: &str, keyword: &str) -> String {
    let shifts = keyword_shifts(keyword);
    if shifts.is_empty() {
        return text.to_string();
    }
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            let shift = shifts[i % shifts.len()];
            shift_letter(c, ALPHABET_LEN - shift)
        })
        .collect()
}
