use std::fmt;

use solana_program::{msg, native_token::lamports_to_sol, pubkey::Pubkey};

use crate::error::RaffleError;

/// Notifications for off-chain observers, written to the program log
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    Entered {
        participant: Pubkey,
        participant_count: u64,
    },
    RequestedRaffleWinner {
        request_id: u64,
    },
    WinnerPicked {
        winner: Pubkey,
        winner_index: u64,
        amount: u64,
    },
    PayoutFailed {
        winner_index: u64,
        error: RaffleError,
    },
}

impl fmt::Display for RaffleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaffleEvent::Entered {
                participant,
                participant_count,
            } => write!(
                f,
                "RaffleEnter: participant={} participants={}",
                participant, participant_count
            ),
            RaffleEvent::RequestedRaffleWinner { request_id } => {
                write!(f, "RequestedRaffleWinner: request_id={}", request_id)
            }
            RaffleEvent::WinnerPicked {
                winner,
                winner_index,
                amount,
            } => write!(
                f,
                "WinnerPicked: winner={} index={} prize={} SOL",
                winner,
                winner_index,
                lamports_to_sol(*amount)
            ),
            RaffleEvent::PayoutFailed {
                winner_index,
                error,
            } => write!(f, "PayoutFailed: index={} error={}", winner_index, error),
        }
    }
}

pub fn emit(event: &RaffleEvent) {
    msg!("{}", event);
}
