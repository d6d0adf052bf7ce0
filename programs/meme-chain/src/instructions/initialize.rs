use anchor_lang::prelude::*;

use crate::constants::*;
use crate::state::*;

/// Initialize the protocol configuration account
///
/// This must be called once to set up fees, the fee recipient and the
/// launch defaults. The signer becomes the protocol authority.
///
/// Accounts:
/// - authority: Protocol authority (signer, pays rent)
/// - protocol: Protocol configuration account (PDA)
/// - system_program: System program
#[derive(Accounts)]
pub struct InitializeProtocol<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + Protocol::INIT_SPACE,
        seeds = [PROTOCOL_SEED],
        bump
    )]
    pub protocol: Account<'info, Protocol>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<InitializeProtocol>,
    fee_recipient: Pubkey,
    platform_fee: u16,
    creator_fee: u16,
) -> Result<()> {
    InitializeProtocol::execute(ctx, fee_recipient, platform_fee, creator_fee)
}

impl<'info> InitializeProtocol<'info> {
    fn execute(
        ctx: Context<InitializeProtocol>,
        fee_recipient: Pubkey,
        platform_fee: u16,
        creator_fee: u16,
    ) -> Result<()> {
        let authority = ctx.accounts.authority.key();
        let protocol = &mut ctx.accounts.protocol;

        protocol.initialize(
            authority,
            fee_recipient,
            platform_fee,
            creator_fee,
            ctx.bumps.protocol,
        )?;

        msg!(
            "Protocol initialized: platform fee {} bps, creator fee {} bps",
            platform_fee,
            creator_fee
        );

        emit!(ProtocolInitialized {
            authority,
            fee_recipient,
            platform_fee,
            creator_fee,
            graduation_threshold: protocol.graduation_threshold,
            launch_window: protocol.launch_window,
            max_wallet_bps: protocol.max_wallet_bps,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}

#[event]
pub struct ProtocolInitialized {
    pub authority: Pubkey,
    pub fee_recipient: Pubkey,
    pub platform_fee: u16,
    pub creator_fee: u16,
    pub graduation_threshold: u64,
    pub launch_window: i64,
    pub max_wallet_bps: u16,
    pub timestamp: i64,
}
