// Account address derivation and loading helpers
use solana_program::{
    account_info::AccountInfo, msg, program_error::ProgramError, program_pack::Pack,
    pubkey::Pubkey,
};

use crate::state::{Config, Round};

pub const CONFIG_SEED: &[u8] = b"config";
pub const ROUND_SEED: &[u8] = b"round";

/// Find the program derived address of the config account
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the round account
pub fn find_round_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ROUND_SEED], program_id)
}

fn check_pda(
    program_id: &Pubkey,
    account_info: &AccountInfo,
    seed: &[u8],
    bump: u8,
) -> Result<(), ProgramError> {
    let expected = Pubkey::create_program_address(&[seed, &[bump]], program_id)
        .map_err(|_| ProgramError::InvalidSeeds)?;
    if *account_info.key != expected {
        msg!("Invalid account address {}", account_info.key);
        return Err(ProgramError::InvalidArgument);
    }
    Ok(())
}

/// Load the config account, checking owner and address
pub fn load_config(program_id: &Pubkey, config_info: &AccountInfo) -> Result<Config, ProgramError> {
    if config_info.owner != program_id {
        msg!("Config account must be owned by this program");
        return Err(ProgramError::IncorrectProgramId);
    }
    let config = Config::unpack(&config_info.data.borrow())?;
    check_pda(program_id, config_info, CONFIG_SEED, config.config_bump)?;
    Ok(config)
}

/// Load the round account belonging to `config`, checking owner and address
pub fn load_round(
    program_id: &Pubkey,
    config: &Config,
    round_info: &AccountInfo,
) -> Result<Round, ProgramError> {
    if round_info.owner != program_id {
        msg!("Round account must be owned by this program");
        return Err(ProgramError::IncorrectProgramId);
    }
    check_pda(program_id, round_info, ROUND_SEED, config.round_bump)?;
    Round::load(&round_info.data.borrow())
}
