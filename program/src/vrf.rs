// Randomness requests to the external coordinator program
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::invoke_signed,
    pubkey::Pubkey,
};

use crate::{error::RaffleError, state::OracleParams};

/// Random words requested per round
pub const NUM_WORDS: u32 = 1;

/// One randomness request as the coordinator receives it
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    /// Correlation id the callback must echo back
    pub request_id: u64,
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl RandomnessRequest {
    pub fn new(oracle: &OracleParams, request_id: u64) -> Self {
        Self {
            request_id,
            key_hash: oracle.key_hash,
            subscription_id: oracle.subscription_id,
            request_confirmations: oracle.request_confirmations,
            callback_gas_limit: oracle.callback_gas_limit,
            num_words: NUM_WORDS,
        }
    }
}

/// Instructions understood by the coordinator program
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorInstruction {
    /// Request random words for the signing consumer
    ///
    /// Accounts expected:
    /// 0. `[signer]` The consumer (raffle round PDA)
    RequestRandomWords(RandomnessRequest),
}

/// Sends randomness requests to the oracle. Implementations send exactly one
/// request per call and never retry.
pub trait RandomnessRequestClient {
    /// Returns the id the oracle will echo back in its callback.
    fn request_random_word(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError>;
}

/// Requests randomness by invoking the coordinator program, signing as the round PDA.
pub struct CoordinatorClient<'a, 'b> {
    coordinator_program: &'b AccountInfo<'a>,
    consumer: &'b AccountInfo<'a>,
    expected_coordinator: Pubkey,
    consumer_seeds: &'b [&'b [u8]],
}

impl<'a, 'b> CoordinatorClient<'a, 'b> {
    pub fn new(
        coordinator_program: &'b AccountInfo<'a>,
        consumer: &'b AccountInfo<'a>,
        oracle: &OracleParams,
        consumer_seeds: &'b [&'b [u8]],
    ) -> Self {
        Self {
            coordinator_program,
            consumer,
            expected_coordinator: oracle.coordinator_program,
            consumer_seeds,
        }
    }
}

impl<'a, 'b> RandomnessRequestClient for CoordinatorClient<'a, 'b> {
    fn request_random_word(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError> {
        if *self.coordinator_program.key != self.expected_coordinator {
            msg!(
                "Coordinator {} does not match configured coordinator {}",
                self.coordinator_program.key,
                self.expected_coordinator
            );
            return Err(RaffleError::OracleUnavailable);
        }

        let data = CoordinatorInstruction::RequestRandomWords(request.clone())
            .try_to_vec()
            .map_err(|_| RaffleError::InvariantViolation)?;

        invoke_signed(
            &Instruction {
                program_id: self.expected_coordinator,
                accounts: vec![AccountMeta::new_readonly(*self.consumer.key, true)],
                data,
            },
            &[self.consumer.clone(), self.coordinator_program.clone()],
            &[self.consumer_seeds],
        )
        .map_err(|err| {
            msg!("Randomness request rejected: {}", err);
            RaffleError::OracleUnavailable
        })?;

        msg!("Randomness requested: id={}", request.request_id);
        Ok(request.request_id)
    }
}
