use anyhow::{Result, bail};
use odisea_game::ShareCode;
use std::collections::HashSet;

/// Seed metadata resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<ShareCode>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, code: None }
    }

    #[must_use]
    pub fn from_share_code(code: ShareCode) -> Self {
        Self {
            seed: code.seed(),
            code: Some(code),
        }
    }

    /// Label for verbose output: the seed, plus the code it was typed as.
    #[must_use]
    pub fn label(&self) -> String {
        match self.code {
            Some(code) => format!("{} ({code})", self.seed),
            None => self.seed.to_string(),
        }
    }
}

/// Resolve CLI seed tokens into canonical seeds.
///
/// Accepts literal integers (negative values use their magnitude) and
/// `OZ-` share codes. Duplicates collapse to the first spelling, and an
/// empty list falls back to seed 1337.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let info = if let Ok(value) = token.parse::<u64>() {
            SeedInfo::from_numeric(value)
        } else if let Ok(value) = token.parse::<i64>() {
            SeedInfo::from_numeric(value.unsigned_abs())
        } else {
            match token.parse::<ShareCode>() {
                Ok(code) => SeedInfo::from_share_code(code),
                Err(err) => bail!("Unrecognized seed token: {token} ({err})"),
            }
        };

        if seen.insert(info.seed) {
            resolved.push(info);
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(1337));
    }

    Ok(resolved)
}
