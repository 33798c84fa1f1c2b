//! Claim codec
//!
//! Positional integer encoding over a configurable alphabet (radix = alphabet
//! size) and the separator-joined composite that carries several claims in one
//! string. The alphabet only obfuscates; it authenticates nothing.

use std::collections::HashMap;

use thiserror::Error;

/// Digits `0-9a-z`
pub const BASE36: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
/// Digits `0-9a-zA-Z`
pub const BASE62: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Failures while decoding or splitting claim text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("malformed claim: {0}")]
    MalformedClaim(String),

    #[error("malformed token: expected {expected} fields, found {found}")]
    MalformedToken { expected: usize, found: usize },
}

/// Invalid alphabet or separator configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlphabetError {
    #[error("alphabet needs at least 2 characters, got {0}")]
    TooShort(usize),

    #[error("alphabet contains '{0}' more than once")]
    Duplicate(char),

    #[error("separator '{0}' is part of the alphabet")]
    SeparatorInAlphabet(char),

    #[error("'{0}' cannot travel in a header; use visible ASCII")]
    NotVisibleAscii(char),
}

/// Ordered set of distinct digit characters
#[derive(Debug, Clone)]
pub struct Alphabet {
    digits: Vec<char>,
    index: HashMap<char, u64>,
}

impl Alphabet {
    pub fn new(chars: &str) -> Result<Self, AlphabetError> {
        let digits: Vec<char> = chars.chars().collect();
        if digits.len() < 2 {
            return Err(AlphabetError::TooShort(digits.len()));
        }

        let mut index = HashMap::with_capacity(digits.len());
        for (position, &c) in digits.iter().enumerate() {
            if index.insert(c, position as u64).is_some() {
                return Err(AlphabetError::Duplicate(c));
            }
        }

        Ok(Self { digits, index })
    }

    pub fn radix(&self) -> u64 {
        self.digits.len() as u64
    }

    pub fn contains(&self, c: char) -> bool {
        self.index.contains_key(&c)
    }

    pub fn as_string(&self) -> String {
        self.digits.iter().collect()
    }
}

/// Encode `value` most-significant digit first, no leading zero digits.
pub fn encode(mut value: u64, alphabet: &Alphabet) -> String {
    let radix = alphabet.radix();
    if value == 0 {
        return alphabet.digits[0].to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(alphabet.digits[(value % radix) as usize]);
        value /= radix;
    }
    out.iter().rev().collect()
}

/// Reverse of [`encode`]. Rejects empty text, foreign characters and values
/// that do not fit in 64 bits.
pub fn decode(text: &str, alphabet: &Alphabet) -> Result<u64, ClaimError> {
    if text.is_empty() {
        return Err(ClaimError::MalformedClaim("empty claim".to_string()));
    }

    let radix = alphabet.radix();
    text.chars().try_fold(0u64, |acc, c| {
        let digit = alphabet
            .index
            .get(&c)
            .ok_or_else(|| ClaimError::MalformedClaim(format!("character '{c}' not in alphabet")))?;
        acc.checked_mul(radix)
            .and_then(|v| v.checked_add(*digit))
            .ok_or_else(|| ClaimError::MalformedClaim("claim overflows 64 bits".to_string()))
    })
}

pub fn join<S: AsRef<str>>(fields: &[S], separator: char) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(field.as_ref());
    }
    out
}

pub fn split(composite: &str, separator: char, expected: usize) -> Result<Vec<&str>, ClaimError> {
    let fields: Vec<&str> = composite.split(separator).collect();
    if fields.len() != expected {
        return Err(ClaimError::MalformedToken {
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

/// Alphabet plus a separator guaranteed to lie outside it. Both must be
/// visible ASCII so composites survive as header values.
#[derive(Debug, Clone)]
pub struct ClaimCodec {
    alphabet: Alphabet,
    separator: char,
}

impl ClaimCodec {
    pub fn new(alphabet: Alphabet, separator: char) -> Result<Self, AlphabetError> {
        if let Some(c) = alphabet
            .digits
            .iter()
            .copied()
            .chain(std::iter::once(separator))
            .find(|c| !c.is_ascii_graphic())
        {
            return Err(AlphabetError::NotVisibleAscii(c));
        }
        if alphabet.contains(separator) {
            return Err(AlphabetError::SeparatorInAlphabet(separator));
        }
        Ok(Self {
            alphabet,
            separator,
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn encode(&self, value: u64) -> String {
        encode(value, &self.alphabet)
    }

    pub fn decode(&self, text: &str) -> Result<u64, ClaimError> {
        decode(text, &self.alphabet)
    }

    pub fn join<S: AsRef<str>>(&self, fields: &[S]) -> String {
        join(fields, self.separator)
    }

    pub fn split<'a>(&self, composite: &'a str, expected: usize) -> Result<Vec<&'a str>, ClaimError> {
        split(composite, self.separator, expected)
    }
}
