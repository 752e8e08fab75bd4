// Upkeep Raffle
// A verifiably-fair lottery: entries pool a fixed fee, an upkeep trigger
// requests randomness from an oracle, and the callback pays one winner.

// Core modules
pub mod error;
pub mod events;
pub mod ledger;
pub mod machine;
pub mod payout;
pub mod state;
pub mod upkeep;
pub mod vrf;
pub mod winner;

// Program modules
pub mod entrypoint;
pub mod instruction;
pub mod processor;
pub mod utils;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
