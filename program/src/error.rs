use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Payment is below the entrance fee
    #[error("Payment is below the entrance fee")]
    InsufficientPayment,

    /// Entries are only accepted while the round is open
    #[error("Round is not open")]
    RoundNotOpen,

    /// No participant at the requested index
    #[error("Participant index out of range")]
    IndexOutOfRange,

    /// The round account has no room for another entry
    #[error("Round is full")]
    RoundFull,

    /// Round is not eligible for upkeep yet
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Callback does not match the pending randomness request
    #[error("Unknown randomness request")]
    UnknownRequest,

    /// Callback was not signed by the configured oracle authority
    #[error("Only the coordinator can fulfill randomness requests")]
    OnlyCoordinatorCanFulfill,

    /// There is no resolved winner waiting for a payout
    #[error("No payout pending")]
    NoPayoutPending,

    /// The randomness coordinator could not accept the request
    #[error("Oracle unavailable")]
    OracleUnavailable,

    /// Destination account does not belong to the resolved winner
    #[error("Winner account does not match the resolved winner")]
    WinnerAccountMismatch,

    /// Destination account cannot receive the prize
    #[error("Transfer to winner failed")]
    TransferFailed,

    /// Internal accounting defect
    #[error("Invariant violation")]
    InvariantViolation,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
