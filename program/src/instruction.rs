use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;

use crate::{
    error::RaffleError,
    state::OracleParams,
    utils::{find_config_address, find_round_address},
    winner::RandomWord,
};

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the config and round accounts
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer funding both accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The round account (PDA)
    /// 3. `[]` The system program
    InitializeRaffle {
        /// Lamports collected per entry
        entrance_fee: u64,
        /// Seconds between settlement and the next upkeep
        upkeep_interval: u64,
        oracle: OracleParams,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The entrant, pays the entrance fee
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[]` The system program
    Enter {
        /// Lamports offered; only the entrance fee is collected
        amount: u64,
    },

    /// Report whether upkeep is due. Read-only; the status is set as return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[]` The round account
    CheckUpkeep,

    /// Close the round and request randomness
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[]` The randomness coordinator program
    PerformUpkeep,

    /// Oracle callback delivering the random word for a request
    ///
    /// Accounts expected:
    /// 0. `[signer]` The configured oracle authority
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[writable]` The winning participant
    FulfillRandomWords {
        request_id: u64,
        random_word: RandomWord,
    },

    /// Retry a payout whose transfer failed
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[writable]` The resolved winner
    RetryPayout,
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (upkeep_interval, rest) = Self::unpack_u64(rest)?;
                let oracle = OracleParams::unpack_from_slice(rest)
                    .map_err(|_| RaffleError::InvalidInstructionData)?;
                Self::InitializeRaffle {
                    entrance_fee,
                    upkeep_interval,
                    oracle,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let random_word = rest
                    .get(..32)
                    .and_then(|slice| slice.try_into().ok())
                    .map(RandomWord)
                    .ok_or(RaffleError::InvalidInstructionData)?;
                Self::FulfillRandomWords {
                    request_id,
                    random_word,
                }
            }
            5 => Self::RetryPayout,
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeRaffle {
                entrance_fee,
                upkeep_interval,
                oracle,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&upkeep_interval.to_le_bytes());
                let mut oracle_buf = [0u8; OracleParams::LEN];
                oracle.pack_into_slice(&mut oracle_buf);
                buf.extend_from_slice(&oracle_buf);
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_word,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&random_word.0);
            }
            Self::RetryPayout => buf.push(5),
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(RaffleError::InvalidInstructionData)?;
        Ok((value, &input[8..]))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    payer: &Pubkey,
    entrance_fee: u64,
    upkeep_interval: u64,
    oracle: OracleParams,
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);
    let data = RaffleInstruction::InitializeRaffle {
        entrance_fee,
        upkeep_interval,
        oracle,
    }
    .pack();

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(config, false),
            AccountMeta::new(round, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

/// Create enter instruction
pub fn enter(program_id: &Pubkey, entrant: &Pubkey, amount: u64) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*entrant, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(round, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::Enter { amount }.pack(),
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(config, false),
            AccountMeta::new_readonly(round, false),
        ],
        data: RaffleInstruction::CheckUpkeep.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    coordinator_program: &Pubkey,
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(round, false),
            AccountMeta::new_readonly(*coordinator_program, false),
        ],
        data: RaffleInstruction::PerformUpkeep.pack(),
    }
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_word: RandomWord,
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*oracle_authority, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(round, false),
            AccountMeta::new(*winner, false),
        ],
        data: RaffleInstruction::FulfillRandomWords {
            request_id,
            random_word,
        }
        .pack(),
    }
}

/// Create retry_payout instruction
pub fn retry_payout(program_id: &Pubkey, caller: &Pubkey, winner: &Pubkey) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(round, false),
            AccountMeta::new(*winner, false),
        ],
        data: RaffleInstruction::RetryPayout.pack(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_layout_matches_unpack() {
        let instruction = RaffleInstruction::InitializeRaffle {
            entrance_fee: 100_000_000,
            upkeep_interval: 30,
            oracle: OracleParams {
                coordinator_program: Pubkey::new_unique(),
                oracle_authority: Pubkey::new_unique(),
                key_hash: [9u8; 32],
                subscription_id: 1,
                callback_gas_limit: 500_000,
                request_confirmations: 3,
            },
        };
        let packed = instruction.pack();
        assert_eq!(packed.len(), 1 + 8 + 8 + OracleParams::LEN);
        assert_eq!(RaffleInstruction::unpack(&packed).unwrap(), instruction);
    }

    #[test]
    fn fulfill_carries_full_random_word() {
        let mut word = [0u8; 32];
        word[0] = 0x80;
        word[31] = 0xca;
        let packed = RaffleInstruction::FulfillRandomWords {
            request_id: 7,
            random_word: RandomWord(word),
        }
        .pack();

        assert_eq!(packed[0], 4);
        assert_eq!(&packed[1..9], &7u64.to_le_bytes());
        assert_eq!(&packed[9..], &word);
    }

    #[test]
    fn truncated_payloads_are_rejected() {
        let invalid = ProgramError::Custom(RaffleError::InvalidInstructionData as u32);
        assert_eq!(RaffleInstruction::unpack(&[]).unwrap_err(), invalid);
        assert_eq!(RaffleInstruction::unpack(&[1, 0, 0]).unwrap_err(), invalid);
        assert_eq!(
            RaffleInstruction::unpack(&[4, 1, 0, 0, 0, 0, 0, 0, 0, 9]).unwrap_err(),
            invalid
        );
        assert_eq!(RaffleInstruction::unpack(&[0; 20]).unwrap_err(), invalid);
        assert_eq!(RaffleInstruction::unpack(&[42]).unwrap_err(), invalid);
    }
}
