use crate::error::ListError;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

const MAX_TOKEN_LEN: usize = 256;

const WORDS: &[&str] = &[
    "apple", "basil", "berry", "butter", "carrot", "celery", "cheddar", "cherry", "cocoa",
    "cumin", "fennel", "fig", "garlic", "ginger", "honey", "kale", "lemon", "lentil", "mango",
    "maple", "melon", "mint", "oat", "olive", "onion", "paprika", "peach", "pepper", "plum",
    "radish", "rice", "saffron", "sage", "salt", "squash", "thyme", "tomato", "walnut", "yam",
];

/// Shareable identifier of one list; also the name of its store collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListToken(String);

impl ListToken {
    /// Validate a caller-supplied token.
    pub fn parse(raw: &str) -> Result<Self, ListError> {
        let token = raw.trim();
        if token.is_empty() {
            return Err(ListError::InvalidToken("token is empty".to_string()));
        }
        if token.contains('/') {
            return Err(ListError::InvalidToken(format!(
                "{token:?} must not contain '/'"
            )));
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(ListError::InvalidToken(format!(
                "token is longer than {MAX_TOKEN_LEN} bytes"
            )));
        }
        Ok(Self(token.to_string()))
    }

    /// A fresh three-word token such as `"maple fig radish"`.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let words: Vec<&str> = WORDS.choose_multiple(rng, 3).copied().collect();
        Self(words.join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
