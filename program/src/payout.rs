use solana_program::{account_info::AccountInfo, clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::{error::RaffleError, state::Round};

/// Moves the prize to a participant
pub trait FundsTransfer {
    fn transfer(&mut self, to: &Pubkey, lamports: u64) -> Result<(), RaffleError>;
}

/// Outcome of a successful payout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub winner: Pubkey,
    pub winner_index: u64,
    pub amount: u64,
}

/// Pays the whole pool to `participants[winner_index]` and empties the ledger.
///
/// The round is left untouched if the transfer fails.
pub fn payout<T: FundsTransfer>(
    round: &mut Round,
    winner_index: u64,
    now: UnixTimestamp,
    transfer: &mut T,
) -> Result<Settlement, RaffleError> {
    let winner = round.participant_at(winner_index)?;
    let amount = round.current_balance();

    transfer.transfer(&winner, amount)?;

    round.clear_entries();
    round.last_settled_at = now;
    round.recent_winner = Some(winner);

    Ok(Settlement {
        winner,
        winner_index,
        amount,
    })
}

/// Pays out of the program-owned round account by moving lamports directly.
pub struct LamportTransfer<'a, 'b> {
    vault: &'b AccountInfo<'a>,
    destination: &'b AccountInfo<'a>,
}

impl<'a, 'b> LamportTransfer<'a, 'b> {
    pub fn new(vault: &'b AccountInfo<'a>, destination: &'b AccountInfo<'a>) -> Self {
        Self { vault, destination }
    }
}

impl<'a, 'b> FundsTransfer for LamportTransfer<'a, 'b> {
    fn transfer(&mut self, to: &Pubkey, lamports: u64) -> Result<(), RaffleError> {
        if self.destination.key != to {
            msg!("Expected winner account {}, got {}", to, self.destination.key);
            return Err(RaffleError::WinnerAccountMismatch);
        }
        if !self.destination.is_writable || self.destination.executable {
            msg!("Winner account {} cannot receive lamports", to);
            return Err(RaffleError::TransferFailed);
        }
        if self.vault.key == self.destination.key {
            return Err(RaffleError::TransferFailed);
        }

        let vault_balance = self
            .vault
            .lamports()
            .checked_sub(lamports)
            .ok_or(RaffleError::InvariantViolation)?;
        let winner_balance = self
            .destination
            .lamports()
            .checked_add(lamports)
            .ok_or(RaffleError::TransferFailed)?;

        **self
            .vault
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::TransferFailed)? = vault_balance;
        **self
            .destination
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::TransferFailed)? = winner_balance;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Config;

    struct Recorder {
        fail: bool,
        sent: Vec<(Pubkey, u64)>,
    }

    impl FundsTransfer for Recorder {
        fn transfer(&mut self, to: &Pubkey, lamports: u64) -> Result<(), RaffleError> {
            if self.fail {
                return Err(RaffleError::TransferFailed);
            }
            self.sent.push((*to, lamports));
            Ok(())
        }
    }

    fn funded_round(entrants: &[Pubkey]) -> Round {
        let config = Config {
            is_initialized: true,
            entrance_fee: 100,
            upkeep_interval: 30,
            ..Config::default()
        };
        let mut round = Round::new(0);
        for entrant in entrants {
            round.record_entry(&config, *entrant, 100).unwrap();
        }
        round
    }

    #[test]
    fn pays_whole_pool_and_clears_ledger() {
        let entrants = [Pubkey::new_unique(), Pubkey::new_unique()];
        let mut round = funded_round(&entrants);
        let mut recorder = Recorder {
            fail: false,
            sent: vec![],
        };

        let settlement = payout(&mut round, 1, 40, &mut recorder).unwrap();

        assert_eq!(recorder.sent, vec![(entrants[1], 200)]);
        assert_eq!(settlement.winner, entrants[1]);
        assert_eq!(settlement.amount, 200);
        assert_eq!(round.participant_count(), 0);
        assert_eq!(round.current_balance(), 0);
        assert_eq!(round.last_settled_at, 40);
        assert_eq!(round.recent_winner, Some(entrants[1]));
    }

    #[test]
    fn failed_transfer_leaves_round_intact() {
        let entrants = [Pubkey::new_unique()];
        let mut round = funded_round(&entrants);
        let before = round.clone();
        let mut recorder = Recorder {
            fail: true,
            sent: vec![],
        };

        assert_eq!(
            payout(&mut round, 0, 40, &mut recorder),
            Err(RaffleError::TransferFailed)
        );
        assert_eq!(round, before);
    }

    #[test]
    fn bad_index_is_rejected_before_transfer() {
        let mut round = funded_round(&[Pubkey::new_unique()]);
        let mut recorder = Recorder {
            fail: false,
            sent: vec![],
        };
        assert_eq!(
            payout(&mut round, 5, 40, &mut recorder),
            Err(RaffleError::IndexOutOfRange)
        );
        assert!(recorder.sent.is_empty());
    }

    #[test]
    fn lamport_transfer_moves_funds_to_matching_account() {
        let program_id = Pubkey::new_unique();
        let system_id = Pubkey::default();
        let vault_key = Pubkey::new_unique();
        let winner_key = Pubkey::new_unique();
        let mut vault_lamports = 1_000u64;
        let mut winner_lamports = 5u64;
        let mut vault_data = vec![];
        let mut winner_data = vec![];
        let vault = AccountInfo::new(
            &vault_key,
            false,
            true,
            &mut vault_lamports,
            &mut vault_data,
            &program_id,
            false,
            0,
        );
        let winner = AccountInfo::new(
            &winner_key,
            false,
            true,
            &mut winner_lamports,
            &mut winner_data,
            &system_id,
            false,
            0,
        );

        let mut transfer = LamportTransfer::new(&vault, &winner);
        assert_eq!(
            transfer.transfer(&Pubkey::new_unique(), 300),
            Err(RaffleError::WinnerAccountMismatch)
        );
        transfer.transfer(&winner_key, 300).unwrap();

        assert_eq!(vault.lamports(), 700);
        assert_eq!(winner.lamports(), 305);
    }

    #[test]
    fn lamport_transfer_refuses_read_only_destination() {
        let program_id = Pubkey::new_unique();
        let system_id = Pubkey::default();
        let vault_key = Pubkey::new_unique();
        let winner_key = Pubkey::new_unique();
        let mut vault_lamports = 1_000u64;
        let mut winner_lamports = 0u64;
        let mut vault_data = vec![];
        let mut winner_data = vec![];
        let vault = AccountInfo::new(
            &vault_key,
            false,
            true,
            &mut vault_lamports,
            &mut vault_data,
            &program_id,
            false,
            0,
        );
        let winner = AccountInfo::new(
            &winner_key,
            false,
            false,
            &mut winner_lamports,
            &mut winner_data,
            &system_id,
            false,
            0,
        );

        let mut transfer = LamportTransfer::new(&vault, &winner);
        assert_eq!(
            transfer.transfer(&winner_key, 300),
            Err(RaffleError::TransferFailed)
        );
        assert_eq!(vault.lamports(), 1_000);
    }
}
