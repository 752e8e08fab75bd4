// Raffle state machine: the only code that mutates a Round
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    payout::{self, FundsTransfer, Settlement},
    state::{Config, Phase, Round},
    upkeep::{self, UpkeepStatus},
    vrf::{RandomnessRequest, RandomnessRequestClient, NUM_WORDS},
    winner::{self, RandomWord},
};

/// Owns one round and validates every transition on it.
///
/// Mutating operations take `&mut self`, so a host sharing the machine between
/// callers must serialize them; on chain the runtime's account lock does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaffleStateMachine {
    config: Config,
    round: Round,
    events: Vec<RaffleEvent>,
}

impl RaffleStateMachine {
    /// Starts a fresh round at `now`.
    pub fn new(config: Config, now: UnixTimestamp) -> Self {
        Self::from_parts(config, Round::new(now))
    }

    /// Resumes a round loaded from storage.
    pub fn from_parts(config: Config, round: Round) -> Self {
        Self {
            config,
            round,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn into_round(self) -> Round {
        self.round
    }

    /// Takes the notifications produced since the last call.
    pub fn drain_events(&mut self) -> Vec<RaffleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> Phase {
        self.round.phase
    }

    pub fn entrance_fee(&self) -> u64 {
        self.config.entrance_fee
    }

    pub fn upkeep_interval(&self) -> u64 {
        self.config.upkeep_interval
    }

    pub fn last_settled_at(&self) -> UnixTimestamp {
        self.round.last_settled_at
    }

    pub fn participant_at(&self, index: u64) -> Result<Pubkey, RaffleError> {
        self.round.participant_at(index)
    }

    pub fn participant_count(&self) -> u64 {
        self.round.participant_count()
    }

    pub fn pooled_balance(&self) -> u64 {
        self.round.current_balance()
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.round.recent_winner
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.round.pending_request_id
    }

    pub fn resolved_winner(&self) -> Option<u64> {
        self.round.resolved_winner
    }

    pub fn request_confirmations(&self) -> u16 {
        self.config.oracle.request_confirmations
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }

    pub fn enter(&mut self, participant: Pubkey, amount_paid: u64) -> Result<(), RaffleError> {
        let participant_count =
            self.round
                .record_entry(&self.config, participant, amount_paid)?;
        self.events.push(RaffleEvent::Entered {
            participant,
            participant_count,
        });
        Ok(())
    }

    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepStatus {
        upkeep::check_upkeep(&self.round, &self.config, now)
    }

    /// Closes the round and asks the oracle for randomness.
    ///
    /// Nothing changes unless the request is accepted.
    pub fn perform_upkeep<C: RandomnessRequestClient>(
        &mut self,
        now: UnixTimestamp,
        client: &mut C,
    ) -> Result<u64, RaffleError> {
        if !upkeep::is_upkeep_eligible(&self.round, &self.config, now) {
            let status = self.check_upkeep(now);
            msg!(
                "Upkeep not needed: phase={:?} balance={} participants={} elapsed={}",
                status.phase,
                status.balance,
                status.participant_count,
                status.elapsed
            );
            return Err(RaffleError::UpkeepNotNeeded);
        }

        let request_nonce = self
            .round
            .request_nonce
            .checked_add(1)
            .ok_or(RaffleError::InvariantViolation)?;
        let request = RandomnessRequest::new(&self.config.oracle, request_nonce);
        let request_id = client.request_random_word(&request)?;

        self.round.request_nonce = request_nonce;
        self.round.phase = Phase::Calculating;
        self.round.pending_request_id = Some(request_id);
        self.events
            .push(RaffleEvent::RequestedRaffleWinner { request_id });
        Ok(request_id)
    }

    /// Oracle callback: picks the winner for the pending request and pays them.
    ///
    /// If the transfer fails the winner stays recorded and only the payout
    /// may be retried, through `retry_payout`.
    pub fn fulfill_randomness<T: FundsTransfer>(
        &mut self,
        request_id: u64,
        random_word: &RandomWord,
        now: UnixTimestamp,
        transfer: &mut T,
    ) -> Result<Settlement, RaffleError> {
        if self.round.phase != Phase::Calculating
            || self.round.pending_request_id != Some(request_id)
            || self.round.resolved_winner.is_some()
        {
            msg!(
                "Rejected callback for request {} (pending {:?})",
                request_id,
                self.round.pending_request_id
            );
            return Err(RaffleError::UnknownRequest);
        }

        let winner_index = winner::select_winner(random_word, self.round.participant_count())?;
        self.round.resolved_winner = Some(winner_index);
        self.settle(winner_index, now, transfer)
    }

    /// Pays a winner resolved by an earlier callback whose transfer failed.
    pub fn retry_payout<T: FundsTransfer>(
        &mut self,
        now: UnixTimestamp,
        transfer: &mut T,
    ) -> Result<Settlement, RaffleError> {
        match (self.round.phase, self.round.resolved_winner) {
            (Phase::Calculating, Some(winner_index)) => self.settle(winner_index, now, transfer),
            _ => Err(RaffleError::NoPayoutPending),
        }
    }

    fn settle<T: FundsTransfer>(
        &mut self,
        winner_index: u64,
        now: UnixTimestamp,
        transfer: &mut T,
    ) -> Result<Settlement, RaffleError> {
        match payout::payout(&mut self.round, winner_index, now, transfer) {
            Ok(settlement) => {
                self.round.phase = Phase::Open;
                self.round.pending_request_id = None;
                self.round.resolved_winner = None;
                self.events.push(RaffleEvent::WinnerPicked {
                    winner: settlement.winner,
                    winner_index: settlement.winner_index,
                    amount: settlement.amount,
                });
                Ok(settlement)
            }
            Err(error) => {
                self.events.push(RaffleEvent::PayoutFailed {
                    winner_index,
                    error,
                });
                Err(error)
            }
        }
    }
}
