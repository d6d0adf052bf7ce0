use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::errors::MemeChainError;
use crate::settlement::SellSettlement;
use crate::state::*;

/// Sell tokens back to the bonding curve
///
/// Formula: constant product (x * y = k) where:
/// - x = virtual SOL reserve
/// - y = virtual token reserve
/// - k = x * y before the trade
///
/// When selling: tokens in, SOL out
/// proceeds = x - ceil(k / (y + tokens_in)), fees taken out of the proceeds
///
/// Accounts:
/// - seller: Token seller (signer, tokens burned from their account)
/// - protocol: Protocol configuration
/// - meme: Bonding curve state account
/// - mint: Token mint
/// - vault: SOL vault of the curve (PDA, pays the proceeds)
/// - seller_token_account: Seller's token account
/// - fee_recipient: Receives the platform fee
/// - creator: Receives the creator fee
/// - token_program: SPL Token program
/// - system_program: System program
#[derive(Accounts)]
pub struct SellTokens<'info> {
    #[account(mut)]
    pub seller: Signer<'info>,

    #[account(
        seeds = [PROTOCOL_SEED],
        bump = protocol.bump
    )]
    pub protocol: Box<Account<'info, Protocol>>,

    #[account(
        mut,
        seeds = [MEME_SEED, meme.creator.as_ref(), meme.symbol_seed()],
        bump = meme.bump,
        constraint = !meme.is_graduated @ MemeChainError::AlreadyGraduated
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
        mut,
        token::mint = mint,
        constraint = seller_token_account.owner == seller.key() @ MemeChainError::Unauthorized
    )]
    pub seller_token_account: Box<Account<'info, TokenAccount>>,

    /// CHECK: Fee destination, validated against the protocol account
    #[account(
        mut,
        address = protocol.fee_recipient @ MemeChainError::Unauthorized
    )]
    pub fee_recipient: UncheckedAccount<'info>,

    /// CHECK: Creator fee destination, validated against the meme account
    #[account(
        mut,
        address = meme.creator @ MemeChainError::Unauthorized
    )]
    pub creator: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<SellTokens>,
    token_amount: u64,
    min_sol_out: u64,
    max_slippage_bps: u16,
) -> Result<()> {
    SellTokens::execute(ctx, token_amount, min_sol_out, max_slippage_bps)
}

impl<'info> SellTokens<'info> {
    fn execute(
        ctx: Context<SellTokens>,
        token_amount: u64,
        min_sol_out: u64,
        max_slippage_bps: u16,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let accounts = ctx.accounts;

        let meme_key = accounts.meme.key();
        let seller_key = accounts.seller.key();

        msg!(
            "Sell: {} tokens, min out {}, max slippage {} bps",
            token_amount,
            min_sol_out,
            max_slippage_bps
        );

        let outcome = accounts.meme.sell(
            &accounts.protocol,
            accounts.seller_token_account.amount,
            token_amount,
            min_sol_out,
            max_slippage_bps,
        )?;

        let bump = [accounts.meme.vault_bump];
        let vault_seeds: &[&[u8]] = &[VAULT_SEED, meme_key.as_ref(), &bump];

        SellSettlement {
            seller: accounts.seller.to_account_info(),
            seller_token_account: accounts.seller_token_account.to_account_info(),
            mint: accounts.mint.to_account_info(),
            vault: accounts.vault.to_account_info(),
            fee_recipient: accounts.fee_recipient.to_account_info(),
            creator: accounts.creator.to_account_info(),
            token_program: accounts.token_program.to_account_info(),
            system_program: accounts.system_program.to_account_info(),
        }
        .settle(&outcome, &[vault_seeds])?;

        let meme = &accounts.meme;
        emit!(TokensSold {
            meme: meme_key,
            mint: meme.mint,
            seller: seller_key,
            token_amount: outcome.token_amount,
            sol_proceeds: outcome.proceeds,
            platform_fee: outcome.fees.platform_fee,
            creator_fee: outcome.fees.creator_fee,
            seller_received: outcome.net,
            virtual_sol_reserves: meme.virtual_sol_reserves,
            virtual_token_reserves: meme.virtual_token_reserves,
            real_sol_reserves: meme.real_sol_reserves,
            tokens_sold: meme.tokens_sold,
            timestamp: now,
        });

        Ok(())
    }
}

#[event]
pub struct TokensSold {
    pub meme: Pubkey,
    pub mint: Pubkey,
    pub seller: Pubkey,
    pub token_amount: u64,
    /// Released by the vault, before fees
    pub sol_proceeds: u64,
    pub platform_fee: u64,
    pub creator_fee: u64,
    /// Net of fees; the creator fee is added back when the seller is the creator
    pub seller_received: u64,
    pub virtual_sol_reserves: u64,
    pub virtual_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub tokens_sold: u64,
    pub timestamp: i64,
}
