//! Six-sided die sources and seeded RNG streams.
use hmac::{Hmac, Mac};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::collections::VecDeque;

use crate::constants::{DECK_STREAM_TAG, DICE_STREAM_TAG, DIE_FACES};

/// Anything that can roll a d6. Resolution code only ever sees this trait,
/// so tests can feed fixed sequences.
pub trait DieSource {
    /// Roll one die, returning a face in `1..=6`.
    fn roll_d6(&mut self) -> u8;

    /// Restart the source for a new session seed. Sources that do not
    /// depend on the seed keep their current sequence.
    fn reseed(&mut self, _seed: u64) {}
}

impl<D: DieSource + ?Sized> DieSource for &mut D {
    fn roll_d6(&mut self) -> u8 {
        (**self).roll_d6()
    }

    fn reseed(&mut self, seed: u64) {
        (**self).reseed(seed);
    }
}

impl<D: DieSource + ?Sized> DieSource for Box<D> {
    fn roll_d6(&mut self) -> u8 {
        (**self).roll_d6()
    }

    fn reseed(&mut self, seed: u64) {
        (**self).reseed(seed);
    }
}

/// ChaCha-backed die derived from the session seed.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha20Rng,
    rolls: u64,
}

impl SeededDice {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, DICE_STREAM_TAG)),
            rolls: 0,
        }
    }

    /// Number of rolls performed so far.
    #[must_use]
    pub const fn rolls(&self) -> u64 {
        self.rolls
    }
}

impl DieSource for SeededDice {
    fn roll_d6(&mut self) -> u8 {
        self.rolls = self.rolls.saturating_add(1);
        self.rng.gen_range(1..=DIE_FACES)
    }

    fn reseed(&mut self, seed: u64) {
        *self = Self::from_seed(seed);
    }
}

/// Replays a fixed sequence of faces; once exhausted it keeps returning the
/// last face.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
    last: u8,
}

impl ScriptedDice {
    /// Faces are clamped into `1..=6`.
    #[must_use]
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        Self {
            faces: faces
                .into_iter()
                .map(|face| face.clamp(1, DIE_FACES))
                .collect(),
            last: 1,
        }
    }

    pub fn push(&mut self, face: u8) {
        self.faces.push_back(face.clamp(1, DIE_FACES));
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DieSource for ScriptedDice {
    fn roll_d6(&mut self) -> u8 {
        if let Some(face) = self.faces.pop_front() {
            self.last = face;
        }
        self.last
    }
}

/// RNG used for shuffles, starting grants, and play chances.
#[must_use]
pub fn deck_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, DECK_STREAM_TAG))
}

/// Derive an independent stream seed for `domain_tag` from the user seed.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_dice_stay_in_range_and_count_rolls() {
        let mut dice = SeededDice::from_seed(1337);
        for _ in 0..600 {
            let face = dice.roll_d6();
            assert!((1..=6).contains(&face));
        }
        assert_eq!(dice.rolls(), 600);
    }

    #[test]
    fn seeded_dice_are_reproducible() {
        let mut a = SeededDice::from_seed(42);
        let mut b = SeededDice::from_seed(42);
        let left: Vec<u8> = (0..32).map(|_| a.roll_d6()).collect();
        let right: Vec<u8> = (0..32).map(|_| b.roll_d6()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn reseeding_restarts_the_stream() {
        let mut dice = SeededDice::from_seed(5);
        let first: Vec<u8> = (0..8).map(|_| dice.roll_d6()).collect();
        dice.reseed(5);
        assert_eq!(dice.rolls(), 0);
        let again: Vec<u8> = (0..8).map(|_| dice.roll_d6()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn scripted_dice_replay_then_repeat_last() {
        let mut dice = ScriptedDice::new([3, 9, 0]);
        assert_eq!(dice.roll_d6(), 3);
        assert_eq!(dice.roll_d6(), 6);
        assert_eq!(dice.roll_d6(), 1);
        assert_eq!(dice.remaining(), 0);
        assert_eq!(dice.roll_d6(), 1);
        dice.push(5);
        assert_eq!(dice.roll_d6(), 5);
        assert_eq!(dice.roll_d6(), 5);
    }

    #[test]
    fn stream_seeds_are_domain_separated() {
        let seed = 0xDEAD_BEEF;
        assert_ne!(
            derive_stream_seed(seed, DECK_STREAM_TAG),
            derive_stream_seed(seed, DICE_STREAM_TAG)
        );
        assert_eq!(
            derive_stream_seed(seed, DICE_STREAM_TAG),
            derive_stream_seed(seed, DICE_STREAM_TAG)
        );
    }

    #[test]
    fn mutable_references_are_die_sources() {
        fn roll_twice(mut dice: impl DieSource) -> (u8, u8) {
            (dice.roll_d6(), dice.roll_d6())
        }
        let mut dice = ScriptedDice::new([2, 4, 6]);
        assert_eq!(roll_twice(&mut dice), (2, 4));
        assert_eq!(dice.roll_d6(), 6);
    }
}
