use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;

use crate::state::{Config, Phase, Round};

/// Answer to `CheckUpkeep`, also published as instruction return data.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub upkeep_needed: bool,
    pub phase: Phase,
    pub balance: u64,
    pub participant_count: u64,
    /// Seconds since the last settlement; negative if the clock went backwards
    pub elapsed: i64,
}

fn interval_elapsed(round: &Round, config: &Config, now: UnixTimestamp) -> bool {
    match u64::try_from(now.saturating_sub(round.last_settled_at)) {
        Ok(elapsed) => elapsed >= config.upkeep_interval,
        Err(_) => false,
    }
}

/// True iff the round is open, the interval has passed since the last
/// settlement, and there is at least one entry with funds behind it.
pub fn is_upkeep_eligible(round: &Round, config: &Config, now: UnixTimestamp) -> bool {
    round.phase == Phase::Open
        && interval_elapsed(round, config, now)
        && round.participant_count() > 0
        && round.current_balance() > 0
}

pub fn check_upkeep(round: &Round, config: &Config, now: UnixTimestamp) -> UpkeepStatus {
    UpkeepStatus {
        upkeep_needed: is_upkeep_eligible(round, config, now),
        phase: round.phase,
        balance: round.current_balance(),
        participant_count: round.participant_count(),
        elapsed: now.saturating_sub(round.last_settled_at),
    }
}
