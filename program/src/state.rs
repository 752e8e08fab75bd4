use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

/// Most entries a single round account can hold
pub const MAX_PARTICIPANTS: usize = 256;

/// Phase of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Accepting entries
    Open,
    /// Waiting for the oracle to deliver randomness
    Calculating,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Open
    }
}

/// Connection parameters passed through to the randomness coordinator.
/// The raffle itself only interprets `coordinator_program` and `oracle_authority`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OracleParams {
    /// Program that accepts randomness requests
    pub coordinator_program: Pubkey,
    /// The only key allowed to deliver randomness callbacks
    pub oracle_authority: Pubkey,
    /// Gas lane selecting the oracle's proving key
    pub key_hash: [u8; 32],
    /// Subscription funding the requests
    pub subscription_id: u64,
    /// Compute budget the oracle grants the callback
    pub callback_gas_limit: u32,
    /// Confirmations the oracle waits for before answering
    pub request_confirmations: u16,
}

impl OracleParams {
    pub const LEN: usize = 32 + 32 + 32 + 8 + 4 + 2;

    pub fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        if src.len() < Self::LEN {
            return Err(ProgramError::InvalidInstructionData);
        }
        let src = array_ref![src, 0, OracleParams::LEN];
        let (
            coordinator_program,
            oracle_authority,
            key_hash,
            subscription_id,
            callback_gas_limit,
            request_confirmations,
        ) = array_refs![src, 32, 32, 32, 8, 4, 2];

        Ok(OracleParams {
            coordinator_program: Pubkey::new_from_array(*coordinator_program),
            oracle_authority: Pubkey::new_from_array(*oracle_authority),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            request_confirmations: u16::from_le_bytes(*request_confirmations),
        })
    }

    pub fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, OracleParams::LEN];
        let (
            coordinator_program_dst,
            oracle_authority_dst,
            key_hash_dst,
            subscription_id_dst,
            callback_gas_limit_dst,
            request_confirmations_dst,
        ) = mut_array_refs![dst, 32, 32, 32, 8, 4, 2];

        coordinator_program_dst.copy_from_slice(self.coordinator_program.as_ref());
        oracle_authority_dst.copy_from_slice(self.oracle_authority.as_ref());
        *key_hash_dst = self.key_hash;
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *request_confirmations_dst = self.request_confirmations.to_le_bytes();
    }
}

/// Raffle configuration account. Written once by `InitializeRaffle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Lamports collected per entry
    pub entrance_fee: u64,
    /// Seconds that must pass after a settlement before upkeep is due
    pub upkeep_interval: u64,
    pub oracle: OracleParams,
    pub config_bump: u8,
    pub round_bump: u8,
}

impl Sealed for Config {}

impl IsInitialized for Config {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Config {
    const LEN: usize = 1 + 8 + 8 + OracleParams::LEN + 1 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Config::LEN];
        let (is_initialized, entrance_fee, upkeep_interval, oracle, config_bump, round_bump) =
            array_refs![src, 1, 8, 8, OracleParams::LEN, 1, 1];

        let is_initialized = match is_initialized[0] {
            0 => false,
            1 => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(Config {
            is_initialized,
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            upkeep_interval: u64::from_le_bytes(*upkeep_interval),
            oracle: OracleParams::unpack_from_slice(oracle)?,
            config_bump: config_bump[0],
            round_bump: round_bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Config::LEN];
        let (
            is_initialized_dst,
            entrance_fee_dst,
            upkeep_interval_dst,
            oracle_dst,
            config_bump_dst,
            round_bump_dst,
        ) = mut_array_refs![dst, 1, 8, 8, OracleParams::LEN, 1, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *upkeep_interval_dst = self.upkeep_interval.to_le_bytes();
        self.oracle.pack_into_slice(oracle_dst);
        config_bump_dst[0] = self.config_bump;
        round_bump_dst[0] = self.round_bump;
    }
}

/// Round account data. The account also holds the pooled lamports.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Round {
    /// Is the account initialized
    pub is_initialized: bool,
    pub phase: Phase,
    /// Entrants in arrival order; duplicates allowed
    pub participants: Vec<Pubkey>,
    /// Lamports collected since the last payout
    pub pooled_balance: u64,
    /// Time of the last payout, or of round creation
    pub last_settled_at: UnixTimestamp,
    /// In-flight randomness request; present iff `phase == Calculating`
    pub pending_request_id: Option<u64>,
    /// Winner chosen by an accepted callback whose payout has not gone through
    pub resolved_winner: Option<u64>,
    /// Number of randomness requests issued so far
    pub request_nonce: u64,
    /// Participant paid in the most recent settlement
    pub recent_winner: Option<Pubkey>,
}

impl Round {
    /// Serialized size with a full participant list
    pub const LEN: usize =
        1 + 1 + (4 + 32 * MAX_PARTICIPANTS) + 8 + 8 + (1 + 8) + (1 + 8) + 8 + (1 + 32);

    pub fn new(created_at: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            last_settled_at: created_at,
            ..Self::default()
        }
    }

    /// Reads a round from account data. Trailing capacity is ignored.
    pub fn load(src: &[u8]) -> Result<Self, ProgramError> {
        let round =
            Self::deserialize(&mut &src[..]).map_err(|_| ProgramError::InvalidAccountData)?;
        if !round.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(round)
    }

    pub fn store(&self, dst: &mut [u8]) -> ProgramResult {
        let mut writer = dst;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            is_initialized: true,
            entrance_fee: 100_000_000,
            upkeep_interval: 30,
            oracle: OracleParams {
                coordinator_program: Pubkey::new_unique(),
                oracle_authority: Pubkey::new_unique(),
                key_hash: [7u8; 32],
                subscription_id: 42,
                callback_gas_limit: 500_000,
                request_confirmations: 3,
            },
            config_bump: 254,
            round_bump: 253,
        }
    }

    #[test]
    fn config_survives_account_layout() {
        let config = sample_config();
        let mut data = vec![0u8; Config::LEN];
        Config::pack(config, &mut data).unwrap();

        assert_eq!(Config::unpack(&data).unwrap(), config);
    }

    #[test]
    fn zeroed_config_is_uninitialized() {
        let data = vec![0u8; Config::LEN];
        assert_eq!(
            Config::unpack(&data).unwrap_err(),
            ProgramError::UninitializedAccount
        );
    }

    #[test]
    fn full_round_fits_account() {
        let mut round = Round::new(1_700_000_000);
        round.participants = vec![Pubkey::new_unique(); MAX_PARTICIPANTS];
        round.pending_request_id = Some(u64::MAX);
        round.resolved_winner = Some(3);
        round.recent_winner = Some(Pubkey::new_unique());

        let mut data = vec![0u8; Round::LEN];
        round.store(&mut data).unwrap();
        assert_eq!(Round::load(&data).unwrap(), round);
    }

    #[test]
    fn short_round_loads_from_oversized_account() {
        let mut round = Round::new(10);
        round.participants.push(Pubkey::new_unique());
        round.pooled_balance = 5;

        let mut data = vec![0u8; Round::LEN];
        round.store(&mut data).unwrap();
        assert_eq!(Round::load(&data).unwrap(), round);
    }

    #[test]
    fn zeroed_round_is_uninitialized() {
        let data = vec![0u8; Round::LEN];
        assert_eq!(
            Round::load(&data).unwrap_err(),
            ProgramError::UninitializedAccount
        );
    }
}
