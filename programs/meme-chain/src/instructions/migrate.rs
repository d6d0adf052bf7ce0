use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::errors::MemeChainError;
use crate::settlement::{mint_tokens, revoke_mint_authorities, transfer_lamports_signed};
use crate::state::*;
use crate::text::trim_fixed;

/// Withdraw the reserves of a graduated curve for DEX liquidity migration
///
/// Moves the vault's real SOL and mints the supply the curve never sold to
/// the protocol authority, then revokes the mint so the supply is final.
/// Creating the DEX pool itself happens outside this program.
///
/// Accounts:
/// - authority: Protocol authority (signer, receives the reserves)
/// - protocol: Protocol configuration
/// - meme: Graduated bonding curve state account
/// - mint: Token mint
/// - vault: SOL vault of the curve (PDA)
/// - authority_token_account: Authority's ATA, created if needed
/// - token_program: SPL Token program
/// - associated_token_program: Associated Token program
/// - system_program: System program
#[derive(Accounts)]
pub struct WithdrawForMigration<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        seeds = [PROTOCOL_SEED],
        bump = protocol.bump,
        has_one = authority @ MemeChainError::Unauthorized
    )]
    pub protocol: Box<Account<'info, Protocol>>,

    #[account(
        mut,
        seeds = [MEME_SEED, meme.creator.as_ref(), meme.symbol_seed()],
        bump = meme.bump
    )]
    pub meme: Box<Account<'info, MemeToken>>,

    #[account(
        mut,
        seeds = [MINT_SEED, meme.key().as_ref()],
        bump = meme.mint_bump
    )]
    pub mint: Box<Account<'info, Mint>>,

    #[account(
        mut,
        seeds = [VAULT_SEED, meme.key().as_ref()],
        bump = meme.vault_bump
    )]
    pub vault: SystemAccount<'info>,

    #[account(
        init_if_needed,
        payer = authority,
        associated_token::mint = mint,
        associated_token::authority = authority,
    )]
    pub authority_token_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<WithdrawForMigration>) -> Result<()> {
    WithdrawForMigration::execute(ctx)
}

impl<'info> WithdrawForMigration<'info> {
    fn execute(ctx: Context<WithdrawForMigration>) -> Result<()> {
        let accounts = ctx.accounts;
        let meme_key = accounts.meme.key();

        let amounts = accounts.meme.take_migration_reserves()?;

        let vault_bump = [accounts.meme.vault_bump];
        let vault_seeds: &[&[u8]] = &[VAULT_SEED, meme_key.as_ref(), &vault_bump];
        transfer_lamports_signed(
            accounts.vault.to_account_info(),
            accounts.authority.to_account_info(),
            accounts.system_program.to_account_info(),
            &[vault_seeds],
            amounts.sol,
        )?;

        let creator_key = accounts.meme.creator;
        let symbol = accounts.meme.symbol;
        let meme_bump = [accounts.meme.bump];
        let meme_seeds: &[&[u8]] = &[
            MEME_SEED,
            creator_key.as_ref(),
            trim_fixed(&symbol),
            &meme_bump,
        ];

        if amounts.tokens > 0 {
            mint_tokens(
                accounts.mint.to_account_info(),
                accounts.authority_token_account.to_account_info(),
                accounts.meme.to_account_info(),
                accounts.token_program.to_account_info(),
                &[meme_seeds],
                amounts.tokens,
            )?;
        }
        revoke_mint_authorities(
            accounts.mint.to_account_info(),
            accounts.meme.to_account_info(),
            accounts.token_program.to_account_info(),
            &[meme_seeds],
        )?;

        msg!(
            "Migration withdrawal: {} lamports, {} tokens",
            amounts.sol,
            amounts.tokens
        );

        emit!(MigrationWithdrawn {
            meme: meme_key,
            mint: accounts.meme.mint,
            authority: accounts.authority.key(),
            sol_amount: amounts.sol,
            token_amount: amounts.tokens,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}

#[event]
pub struct MigrationWithdrawn {
    pub meme: Pubkey,
    pub mint: Pubkey,
    pub authority: Pubkey,
    pub sol_amount: u64,
    pub token_amount: u64,
    pub timestamp: i64,
}
