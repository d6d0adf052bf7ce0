use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::errors::MemeChainError;
use crate::instructions::buy::emit_buy_events;
use crate::settlement::{transfer_lamports, BuySettlement};
use crate::state::*;
use crate::text::{symbol_seed, trim_fixed};

/// Optional purchase made by the creator in the creation transaction
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FirstBuy {
    pub token_amount: u64,
    pub max_sol_cost: u64,
}

/// Creates a new meme token with its mint, SOL vault and bonding curve
///
/// Accounts:
/// - creator: Token creator (signer, pays rent and the optional first buy)
/// - protocol: Protocol configuration account
/// - meme: Bonding curve state account (PDA of creator and symbol)
/// - mint: Token mint (PDA, mint and freeze authority = meme)
/// - vault: SOL vault of the curve (PDA)
/// - creator_token_account: Creator's ATA
/// - creator_purchase: Creator's cumulative purchase record
/// - fee_recipient: Receives the platform fee of the first buy
/// - token_program: SPL Token program
/// - associated_token_program: Associated Token program
/// - system_program: System program
/// - rent: Rent sysvar
#[derive(Accounts)]
#[instruction(name: String, symbol: String)]
pub struct CreateMemeToken<'info> {
    #[account(mut)]
    pub creator: Signer<'info>,

    #[account(
        mut,
        seeds = [PROTOCOL_SEED],
        bump = protocol.bump
    )]
    pub protocol: Box<Account<'info, Protocol>>,

    /// Re-running creation reaches the handler, which rejects it
    #[account(
        init_if_needed,
        payer = creator,
        space = 8 + MemeToken::INIT_SPACE,
        seeds = [MEME_SEED, creator.key().as_ref(), symbol_seed(&symbol)],
        bump
    )]
    pub meme: Box<Account<'info, MemeToken>>,

    #[account(
        init_if_needed,
        payer = creator,
        seeds = [MINT_SEED, meme.key().as_ref()],
        bump,
        mint::decimals = TOKEN_DECIMALS,
        mint::authority = meme,
        mint::freeze_authority = meme,
    )]
    pub mint: Box<Account<'info, Mint>>,

    #[account(
        mut,
        seeds = [VAULT_SEED, meme.key().as_ref()],
        bump
    )]
    pub vault: SystemAccount<'info>,

    #[account(
        init_if_needed,
        payer = creator,
        associated_token::mint = mint,
        associated_token::authority = creator,
    )]
    pub creator_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = creator,
        space = 8 + WalletPurchase::INIT_SPACE,
        seeds = [PURCHASE_SEED, meme.key().as_ref(), creator.key().as_ref()],
        bump
    )]
    pub creator_purchase: Box<Account<'info, WalletPurchase>>,

    /// CHECK: Fee destination, validated against the protocol account
    #[account(
        mut,
        address = protocol.fee_recipient @ MemeChainError::Unauthorized
    )]
    pub fee_recipient: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[allow(clippy::too_many_arguments)]
pub fn handler(
    ctx: Context<CreateMemeToken>,
    name: String,
    symbol: String,
    uri: String,
    image_hash: [u8; 32],
    initial_virtual_sol_reserves: u64,
    initial_virtual_token_reserves: u64,
    first_buy: Option<FirstBuy>,
) -> Result<()> {
    CreateMemeToken::execute(
        ctx,
        name,
        symbol,
        uri,
        image_hash,
        initial_virtual_sol_reserves,
        initial_virtual_token_reserves,
        first_buy,
    )
}

impl<'info> CreateMemeToken<'info> {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        ctx: Context<CreateMemeToken>,
        name: String,
        symbol: String,
        uri: String,
        image_hash: [u8; 32],
        initial_virtual_sol_reserves: u64,
        initial_virtual_token_reserves: u64,
        first_buy: Option<FirstBuy>,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let bumps = MemeBumps {
            meme: ctx.bumps.meme,
            mint: ctx.bumps.mint,
            vault: ctx.bumps.vault,
        };
        let purchase_bump = ctx.bumps.creator_purchase;
        let accounts = ctx.accounts;

        require!(!accounts.meme.exists(), MemeChainError::AlreadyExists);

        let creator_key = accounts.creator.key();
        let meme_key = accounts.meme.key();
        let mint_key = accounts.mint.key();

        let metadata = MemeMetadata::encode(&name, &symbol, &uri, image_hash)?;
        accounts.meme.initialize(
            creator_key,
            mint_key,
            accounts.vault.key(),
            metadata,
            initial_virtual_sol_reserves,
            initial_virtual_token_reserves,
            bumps,
            now,
        )?;

        // the vault must stay rent exempt
        let rent_minimum = accounts.rent.minimum_balance(0);
        let vault_balance = accounts.vault.lamports();
        if vault_balance < rent_minimum {
            transfer_lamports(
                accounts.creator.to_account_info(),
                accounts.vault.to_account_info(),
                accounts.system_program.to_account_info(),
                rent_minimum - vault_balance,
            )?;
        }

        accounts
            .creator_purchase
            .bind(meme_key, creator_key, purchase_bump);

        accounts.protocol.total_memes_created = accounts
            .protocol
            .total_memes_created
            .checked_add(1)
            .ok_or(MemeChainError::ArithmeticOverflow)?;

        msg!("Meme created: {} ({}) by {}", name, symbol, creator_key);

        emit!(MemeCreated {
            meme: meme_key,
            mint: mint_key,
            creator: creator_key,
            name,
            symbol,
            uri,
            image_hash,
            initial_virtual_sol_reserves,
            initial_virtual_token_reserves,
            timestamp: now,
        });

        let Some(first_buy) = first_buy else {
            return Ok(());
        };

        let outcome = accounts.meme.buy(
            &accounts.protocol,
            &mut accounts.creator_purchase,
            first_buy.token_amount,
            first_buy.max_sol_cost,
            true,
            now,
        )?;

        let symbol_bytes = accounts.meme.symbol;
        let bump = [accounts.meme.bump];
        let meme_seeds: &[&[u8]] = &[
            MEME_SEED,
            creator_key.as_ref(),
            trim_fixed(&symbol_bytes),
            &bump,
        ];

        BuySettlement {
            buyer: accounts.creator.to_account_info(),
            buyer_token_account: accounts.creator_token_account.to_account_info(),
            meme: accounts.meme.to_account_info(),
            mint: accounts.mint.to_account_info(),
            vault: accounts.vault.to_account_info(),
            fee_recipient: accounts.fee_recipient.to_account_info(),
            creator: accounts.creator.to_account_info(),
            token_program: accounts.token_program.to_account_info(),
            system_program: accounts.system_program.to_account_info(),
        }
        .settle(&outcome, &[meme_seeds])?;

        emit_buy_events(&accounts.meme, meme_key, creator_key, &outcome, now);

        Ok(())
    }
}

#[event]
pub struct MemeCreated {
    pub meme: Pubkey,
    pub mint: Pubkey,
    pub creator: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub image_hash: [u8; 32],
    pub initial_virtual_sol_reserves: u64,
    pub initial_virtual_token_reserves: u64,
    pub timestamp: i64,
}
