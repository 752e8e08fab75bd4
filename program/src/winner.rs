use crate::error::RaffleError;

/// A 256-bit random value delivered by the oracle, big-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomWord(pub [u8; 32]);

impl RandomWord {
    /// Remainder of the full 256-bit value divided by `modulus`.
    pub fn rem(&self, modulus: u64) -> Option<u64> {
        if modulus == 0 {
            return None;
        }
        let modulus = modulus as u128;
        let remainder = self
            .0
            .iter()
            .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus);
        Some(remainder as u64)
    }
}

impl From<u64> for RandomWord {
    fn from(value: u64) -> Self {
        Self::from(value as u128)
    }
}

impl From<u128> for RandomWord {
    fn from(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

/// Index of the winning entry: `random_word mod participant_count`.
pub fn select_winner(random_word: &RandomWord, participant_count: u64) -> Result<u64, RaffleError> {
    random_word
        .rem(participant_count)
        .ok_or(RaffleError::InvariantViolation)
}
