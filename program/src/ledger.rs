// Entry ledger: participants of the current round and the pooled balance
use solana_program::pubkey::Pubkey;

use crate::{
    error::RaffleError,
    state::{Config, Phase, Round, MAX_PARTICIPANTS},
};

impl Round {
    /// Records one entry and returns the new participant count.
    ///
    /// Only `config.entrance_fee` is credited to the pool; any amount offered
    /// above it is never collected.
    pub fn record_entry(
        &mut self,
        config: &Config,
        participant: Pubkey,
        amount_paid: u64,
    ) -> Result<u64, RaffleError> {
        if self.phase != Phase::Open {
            return Err(RaffleError::RoundNotOpen);
        }
        if amount_paid < config.entrance_fee {
            return Err(RaffleError::InsufficientPayment);
        }
        if self.participants.len() >= MAX_PARTICIPANTS {
            return Err(RaffleError::RoundFull);
        }

        let pooled_balance = self
            .pooled_balance
            .checked_add(config.entrance_fee)
            .ok_or(RaffleError::InvariantViolation)?;

        self.participants.push(participant);
        self.pooled_balance = pooled_balance;
        Ok(self.participant_count())
    }

    pub fn participant_at(&self, index: u64) -> Result<Pubkey, RaffleError> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.participants.get(index))
            .copied()
            .ok_or(RaffleError::IndexOutOfRange)
    }

    pub fn participant_count(&self) -> u64 {
        self.participants.len() as u64
    }

    pub fn current_balance(&self) -> u64 {
        self.pooled_balance
    }

    /// Empties the ledger after a payout.
    pub(crate) fn clear_entries(&mut self) {
        self.participants.clear();
        self.pooled_balance = 0;
    }
}
