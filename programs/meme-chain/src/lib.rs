use anchor_lang::prelude::*;

pub mod constants;
pub mod curve;
pub mod errors;
pub mod fees;
pub mod guard;
pub mod instructions;
pub mod settlement;
pub mod state;
pub mod text;

use instructions::*;

declare_id!("FgKLBQuE6Ksctz4gjFk1BjiBCcUqmnYFy7986ecuNqLS");

#[program]
pub mod meme_chain {
    use super::*;

    /// Initialize the protocol configuration
    ///
    /// This should be called once; the signer becomes the protocol authority.
    pub fn initialize_protocol(
        ctx: Context<InitializeProtocol>,
        fee_recipient: Pubkey,
        platform_fee: u16,
        creator_fee: u16,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, fee_recipient, platform_fee, creator_fee)
    }

    /// Update fees, launch parameters or the protocol authority
    pub fn update_protocol(ctx: Context<UpdateProtocol>, update: ProtocolUpdate) -> Result<()> {
        instructions::update_protocol::handler(ctx, update)
    }

    /// Create a new meme token with its bonding curve
    ///
    /// Creates the mint, the SOL vault and the curve state, and optionally
    /// buys the creator's first allocation in the same transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn create_meme_token(
        ctx: Context<CreateMemeToken>,
        name: String,
        symbol: String,
        uri: String,
        image_hash: [u8; 32],
        initial_virtual_sol_reserves: u64,
        initial_virtual_token_reserves: u64,
        first_buy: Option<FirstBuy>,
    ) -> Result<()> {
        instructions::create::handler(
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

    /// Buy an exact amount of tokens from the bonding curve
    ///
    /// `max_sol_cost` bounds the total paid, fees included.
    pub fn buy_tokens(ctx: Context<BuyTokens>, token_amount: u64, max_sol_cost: u64) -> Result<()> {
        instructions::buy::handler(ctx, token_amount, max_sol_cost)
    }

    /// Sell tokens back to the bonding curve
    pub fn sell_tokens(
        ctx: Context<SellTokens>,
        token_amount: u64,
        min_sol_out: u64,
        max_slippage_bps: u16,
    ) -> Result<()> {
        instructions::sell::handler(ctx, token_amount, min_sol_out, max_slippage_bps)
    }

    /// Withdraw the reserves of a graduated curve for DEX migration
    pub fn withdraw_for_migration(ctx: Context<WithdrawForMigration>) -> Result<()> {
        instructions::migrate::handler(ctx)
    }
}

// Re-export for external use
pub use constants::*;
pub use errors::*;
pub use state::*;
