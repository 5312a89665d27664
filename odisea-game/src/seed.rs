//! Share codes: memorable names for session seeds, such as `OZ-HORDE42`.
//!
//! A code is a word from [`WORDS`] plus a two-digit number. Each code names
//! exactly one seed; the mapping runs from code to seed only, so seeds picked
//! as plain numbers have no code.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::SHARE_STREAM_TAG;
use crate::dice::derive_stream_seed;

const PREFIX: &str = "OZ";

pub const WORDS: [&str; 48] = [
    "HORDE", "ZOMBIE", "REFUGIO", "BUNKER", "RADIO", "CONVOY", "RUTA", "PUENTE", "NIEBLA",
    "TORMENTA", "CAMPO", "PUEBLO", "ALMACEN", "FARMACIA", "GASOIL", "LINTERNA", "MACHETE",
    "MOCHILA", "VENDAS", "BRUJULA", "MAPA", "SENAL", "VIGIA", "MURO", "TRINCHERA", "HOGUERA",
    "CUERVO", "LOBO", "CAZADOR", "MEDICO", "MECANICO", "SARGENTO", "ABUELA", "NINA", "BANDIDO",
    "MORDIDO", "ODISEA", "ALBA", "OCASO", "NOCHE", "LUNA", "SIGILO", "CAMINO", "FRONTERA",
    "VALLE", "COLINA", "RIO", "ESPERANZA",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareCodeError {
    #[error("share codes start with OZ-")]
    MissingPrefix,
    #[error("'{0}' is not a share code word")]
    UnknownWord(String),
    #[error("share codes end in two digits, found '{0}'")]
    BadNumber(String),
}

/// A parsed share code. Comparison ignores the spelling the player typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShareCode {
    word: usize,
    number: u8,
}

impl ShareCode {
    /// The seed this code names.
    #[must_use]
    pub fn seed(self) -> u64 {
        let word = u64::try_from(self.word).unwrap_or(u64::MAX);
        let ordinal = word.saturating_mul(100).saturating_add(u64::from(self.number));
        derive_stream_seed(ordinal, SHARE_STREAM_TAG)
    }
}

impl FromStr for ShareCode {
    type Err = ShareCodeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let body = raw
            .split_once('-')
            .filter(|(prefix, _)| prefix.eq_ignore_ascii_case(PREFIX))
            .map(|(_, body)| body)
            .ok_or(ShareCodeError::MissingPrefix)?;
        let split = body
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map_or(body.len(), |(at, _)| at);
        let (word, digits) = body.split_at(split);
        let word_index = WORDS
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(word))
            .ok_or_else(|| ShareCodeError::UnknownWord(word.to_string()))?;
        if digits.len() != 2 {
            return Err(ShareCodeError::BadNumber(digits.to_string()));
        }
        let number = digits
            .parse()
            .map_err(|_| ShareCodeError::BadNumber(digits.to_string()))?;
        Ok(Self {
            word: word_index,
            number,
        })
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}-{}{:02}", WORDS[self.word], self.number)
    }
}
