use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::errors::MemeChainError;
use crate::settlement::BuySettlement;
use crate::state::*;
use crate::text::trim_fixed;

/// Buy an exact amount of tokens from the bonding curve
///
/// Formula: constant product (x * y = k) where:
/// - x = virtual SOL reserve
/// - y = virtual token reserve
/// - k = x * y before the trade
///
/// When buying: tokens out, SOL in
/// cost = ceil(k / (y - tokens_out)) - x, fees charged on top of it
///
/// Accounts:
/// - buyer: Token buyer (signer, pays SOL)
/// - protocol: Protocol configuration (fees, launch guard, graduation threshold)
/// - meme: Bonding curve state account
/// - mint: Token mint (authority = meme PDA)
/// - vault: SOL vault of the curve (PDA)
/// - buyer_token_account: Buyer's ATA, created if needed
/// - buyer_purchase: Buyer's cumulative purchase record, created if needed
/// - fee_recipient: Receives the platform fee
/// - creator: Receives the creator fee
/// - token_program: SPL Token program
/// - associated_token_program: Associated Token program
/// - system_program: System program
#[derive(Accounts)]
pub struct BuyTokens<'info> {
    #[account(mut)]
    pub buyer: Signer<'info>,

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
        init_if_needed,
        payer = buyer,
        associated_token::mint = mint,
        associated_token::authority = buyer,
    )]
    pub buyer_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = 8 + WalletPurchase::INIT_SPACE,
        seeds = [PURCHASE_SEED, meme.key().as_ref(), buyer.key().as_ref()],
        bump
    )]
    pub buyer_purchase: Box<Account<'info, WalletPurchase>>,

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
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<BuyTokens>, token_amount: u64, max_sol_cost: u64) -> Result<()> {
    BuyTokens::execute(ctx, token_amount, max_sol_cost)
}

impl<'info> BuyTokens<'info> {
    fn execute(ctx: Context<BuyTokens>, token_amount: u64, max_sol_cost: u64) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let purchase_bump = ctx.bumps.buyer_purchase;
        let accounts = ctx.accounts;

        let meme_key = accounts.meme.key();
        let buyer_key = accounts.buyer.key();
        let buyer_is_creator = buyer_key == accounts.meme.creator;

        msg!("Buy: {} tokens, max cost {}", token_amount, max_sol_cost);

        accounts
            .buyer_purchase
            .bind(meme_key, buyer_key, purchase_bump);
        let outcome = accounts.meme.buy(
            &accounts.protocol,
            &mut accounts.buyer_purchase,
            token_amount,
            max_sol_cost,
            buyer_is_creator,
            now,
        )?;

        let creator_key = accounts.meme.creator;
        let symbol = accounts.meme.symbol;
        let bump = [accounts.meme.bump];
        let meme_seeds: &[&[u8]] = &[MEME_SEED, creator_key.as_ref(), trim_fixed(&symbol), &bump];

        BuySettlement {
            buyer: accounts.buyer.to_account_info(),
            buyer_token_account: accounts.buyer_token_account.to_account_info(),
            meme: accounts.meme.to_account_info(),
            mint: accounts.mint.to_account_info(),
            vault: accounts.vault.to_account_info(),
            fee_recipient: accounts.fee_recipient.to_account_info(),
            creator: accounts.creator.to_account_info(),
            token_program: accounts.token_program.to_account_info(),
            system_program: accounts.system_program.to_account_info(),
        }
        .settle(&outcome, &[meme_seeds])?;

        emit_buy_events(&accounts.meme, meme_key, buyer_key, &outcome, now);

        Ok(())
    }
}

/// Emits `TokensBought`, and `MemeGraduated` when the buy crossed the threshold.
pub(crate) fn emit_buy_events(
    meme: &MemeToken,
    meme_key: Pubkey,
    buyer: Pubkey,
    outcome: &BuyOutcome,
    timestamp: i64,
) {
    emit!(TokensBought {
        meme: meme_key,
        mint: meme.mint,
        buyer,
        token_amount: outcome.token_amount,
        sol_cost: outcome.cost,
        platform_fee: outcome.fees.platform_fee,
        creator_fee: outcome.fees.creator_fee,
        virtual_sol_reserves: meme.virtual_sol_reserves,
        virtual_token_reserves: meme.virtual_token_reserves,
        real_sol_reserves: meme.real_sol_reserves,
        tokens_sold: meme.tokens_sold,
        timestamp,
    });

    if outcome.graduated {
        msg!("Meme {} graduated", meme_key);
        emit!(MemeGraduated {
            meme: meme_key,
            mint: meme.mint,
            sol_raised: meme.sol_raised(),
            real_sol_reserves: meme.real_sol_reserves,
            tokens_sold: meme.tokens_sold,
            timestamp,
        });
    }
}

#[event]
pub struct TokensBought {
    pub meme: Pubkey,
    pub mint: Pubkey,
    pub buyer: Pubkey,
    pub token_amount: u64,
    /// Total paid by the buyer, fees included
    pub sol_cost: u64,
    pub platform_fee: u64,
    pub creator_fee: u64,
    pub virtual_sol_reserves: u64,
    pub virtual_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub tokens_sold: u64,
    pub timestamp: i64,
}

#[event]
pub struct MemeGraduated {
    pub meme: Pubkey,
    pub mint: Pubkey,
    pub sol_raised: u64,
    pub real_sol_reserves: u64,
    pub tokens_sold: u64,
    pub timestamp: i64,
}
