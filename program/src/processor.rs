use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    native_token::lamports_to_sol,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    error::RaffleError,
    events,
    instruction::RaffleInstruction,
    machine::RaffleStateMachine,
    payout::{LamportTransfer, Settlement},
    state::{Config, OracleParams, Round},
    utils::{
        find_config_address, find_round_address, load_config, load_round, CONFIG_SEED, ROUND_SEED,
    },
    vrf::CoordinatorClient,
    winner::RandomWord,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                upkeep_interval,
                oracle,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(
                    program_id,
                    accounts,
                    entrance_fee,
                    upkeep_interval,
                    oracle,
                )
            }
            RaffleInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(program_id, accounts, amount)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(program_id, accounts)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(program_id, accounts)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_word,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(program_id, accounts, request_id, random_word)
            }
            RaffleInstruction::RetryPayout => {
                msg!("Instruction: Retry Payout");
                Self::process_retry_payout(program_id, accounts)
            }
        }
    }

    /// Creates the config and round PDAs. The config never changes afterwards.
    fn process_initialize_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        entrance_fee: u64,
        upkeep_interval: u64,
        oracle: OracleParams,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        if entrance_fee == 0 || upkeep_interval == 0 {
            msg!("Entrance fee and upkeep interval must be greater than zero");
            return Err(ProgramError::InvalidArgument);
        }

        let (expected_config, config_bump) = find_config_address(program_id);
        let (expected_round, round_bump) = find_round_address(program_id);
        if *config_info.key != expected_config || *round_info.key != expected_round {
            msg!("Invalid config or round account address");
            return Err(ProgramError::InvalidArgument);
        }
        if config_info.owner == program_id || round_info.owner == program_id {
            msg!("Raffle is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let rent = Rent::get()?;
        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                config_info.key,
                rent.minimum_balance(Config::LEN),
                Config::LEN as u64,
                program_id,
            ),
            &[payer_info.clone(), config_info.clone(), system_program_info.clone()],
            &[&[CONFIG_SEED, &[config_bump]]],
        )?;
        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                round_info.key,
                rent.minimum_balance(Round::LEN),
                Round::LEN as u64,
                program_id,
            ),
            &[payer_info.clone(), round_info.clone(), system_program_info.clone()],
            &[&[ROUND_SEED, &[round_bump]]],
        )?;

        let config = Config {
            is_initialized: true,
            entrance_fee,
            upkeep_interval,
            oracle,
            config_bump,
            round_bump,
        };
        Config::pack(config, &mut config_info.data.borrow_mut())?;

        let clock = Clock::get()?;
        Round::new(clock.unix_timestamp).store(&mut round_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: fee={} SOL interval={}s coordinator={} oracle={}",
            lamports_to_sol(entrance_fee),
            upkeep_interval,
            oracle.coordinator_program,
            oracle.oracle_authority
        );
        Ok(())
    }

    fn process_enter(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let entrant_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !entrant_info.is_signer {
            msg!("Entrant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = load_config(program_id, config_info)?;
        let round = load_round(program_id, &config, round_info)?;
        let mut machine = RaffleStateMachine::from_parts(config, round);

        machine.enter(*entrant_info.key, amount)?;

        invoke(
            &system_instruction::transfer(entrant_info.key, round_info.key, config.entrance_fee),
            &[entrant_info.clone(), round_info.clone(), system_program_info.clone()],
        )?;

        Self::commit(machine, round_info)
    }

    fn process_check_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;

        let config = load_config(program_id, config_info)?;
        let round = load_round(program_id, &config, round_info)?;
        let clock = Clock::get()?;

        let status =
            RaffleStateMachine::from_parts(config, round).check_upkeep(clock.unix_timestamp);
        msg!(
            "Upkeep needed={} phase={:?} balance={} participants={} elapsed={}s",
            status.upkeep_needed,
            status.phase,
            status.balance,
            status.participant_count,
            status.elapsed
        );

        let data = status
            .try_to_vec()
            .map_err(|_| ProgramError::from(RaffleError::InvariantViolation))?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = load_config(program_id, config_info)?;
        let round = load_round(program_id, &config, round_info)?;
        let clock = Clock::get()?;
        let mut machine = RaffleStateMachine::from_parts(config, round);

        let round_bump = [config.round_bump];
        let round_seeds: &[&[u8]] = &[ROUND_SEED, &round_bump];
        let mut client =
            CoordinatorClient::new(coordinator_info, round_info, &config.oracle, round_seeds);
        machine.perform_upkeep(clock.unix_timestamp, &mut client)?;

        Self::commit(machine, round_info)
    }

    fn process_fulfill_random_words(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        random_word: RandomWord,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !oracle_info.is_signer {
            msg!("Oracle authority must sign the callback");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = load_config(program_id, config_info)?;
        if *oracle_info.key != config.oracle.oracle_authority {
            msg!("Callback signed by {}, not the oracle authority", oracle_info.key);
            return Err(RaffleError::OnlyCoordinatorCanFulfill.into());
        }
        let round = load_round(program_id, &config, round_info)?;
        let clock = Clock::get()?;
        let mut machine = RaffleStateMachine::from_parts(config, round);

        let mut transfer = LamportTransfer::new(round_info, winner_info);
        let result = machine.fulfill_randomness(
            request_id,
            &random_word,
            clock.unix_timestamp,
            &mut transfer,
        );
        Self::settle(machine, round_info, result)
    }

    fn process_retry_payout(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = load_config(program_id, config_info)?;
        let round = load_round(program_id, &config, round_info)?;
        let clock = Clock::get()?;
        let mut machine = RaffleStateMachine::from_parts(config, round);

        let mut transfer = LamportTransfer::new(round_info, winner_info);
        let result = machine.retry_payout(clock.unix_timestamp, &mut transfer);
        Self::settle(machine, round_info, result)
    }

    /// Transfer and destination errors keep the resolved winner and are
    /// committed; any other error aborts the instruction.
    fn settle(
        machine: RaffleStateMachine,
        round_info: &AccountInfo,
        result: Result<Settlement, RaffleError>,
    ) -> ProgramResult {
        match result {
            Ok(settlement) => {
                msg!(
                    "Paid {} SOL to {}",
                    lamports_to_sol(settlement.amount),
                    settlement.winner
                );
            }
            Err(error @ (RaffleError::TransferFailed | RaffleError::WinnerAccountMismatch)) => {
                msg!(
                    "Payout failed ({}); winner stays resolved until RetryPayout succeeds",
                    error
                );
            }
            Err(err) => return Err(err.into()),
        }
        Self::commit(machine, round_info)
    }

    fn commit(mut machine: RaffleStateMachine, round_info: &AccountInfo) -> ProgramResult {
        for event in machine.drain_events() {
            events::emit(&event);
        }
        machine.round().store(&mut round_info.data.borrow_mut())
    }
}
