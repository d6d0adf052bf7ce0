use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::MemeChainError;
use crate::state::*;

/// Change fees, fee recipient, launch parameters or hand over authority
///
/// Accounts:
/// - authority: Current protocol authority (signer)
/// - protocol: Protocol configuration account
#[derive(Accounts)]
pub struct UpdateProtocol<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [PROTOCOL_SEED],
        bump = protocol.bump,
        has_one = authority @ MemeChainError::Unauthorized
    )]
    pub protocol: Account<'info, Protocol>,
}

pub fn handler(ctx: Context<UpdateProtocol>, update: ProtocolUpdate) -> Result<()> {
    UpdateProtocol::execute(ctx, update)
}

impl<'info> UpdateProtocol<'info> {
    fn execute(ctx: Context<UpdateProtocol>, update: ProtocolUpdate) -> Result<()> {
        let protocol = &mut ctx.accounts.protocol;
        protocol.apply_update(&update)?;

        msg!("Protocol updated by {}", ctx.accounts.authority.key());

        emit!(ProtocolUpdated {
            authority: protocol.authority,
            fee_recipient: protocol.fee_recipient,
            platform_fee: protocol.platform_fee,
            creator_fee: protocol.creator_fee,
            graduation_threshold: protocol.graduation_threshold,
            launch_window: protocol.launch_window,
            max_wallet_bps: protocol.max_wallet_bps,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}

/// Configuration after the update was applied
#[event]
pub struct ProtocolUpdated {
    pub authority: Pubkey,
    pub fee_recipient: Pubkey,
    pub platform_fee: u16,
    pub creator_fee: u16,
    pub graduation_threshold: u64,
    pub launch_window: i64,
    pub max_wallet_bps: u16,
    pub timestamp: i64,
}
