use anchor_lang::prelude::*;

use crate::constants::BPS_DENOMINATOR;
use crate::errors::MemeChainError;

/// Protocol and creator shares of a trade amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeSplit {
    pub platform_fee: u64,
    pub creator_fee: u64,
}

/// Rejects fee rates whose sum exceeds 100%.
pub fn validate_fee_bps(platform_fee_bps: u16, creator_fee_bps: u16) -> Result<()> {
    let total = platform_fee_bps as u64 + creator_fee_bps as u64;
    require!(total <= BPS_DENOMINATOR, MemeChainError::InvalidFee);
    Ok(())
}

fn bps_of(amount: u64, bps: u16) -> Result<u64> {
    let fee = (amount as u128)
        .checked_mul(bps as u128)
        .ok_or(MemeChainError::ArithmeticOverflow)?
        .checked_div(BPS_DENOMINATOR as u128)
        .ok_or(MemeChainError::ArithmeticOverflow)?;
    // fee <= amount whenever bps <= 10000
    u64::try_from(fee).map_err(|_| error!(MemeChainError::ArithmeticOverflow))
}

impl FeeSplit {
    /// Fees on `amount`, each rounded down.
    pub fn compute(amount: u64, platform_fee_bps: u16, creator_fee_bps: u16) -> Result<Self> {
        validate_fee_bps(platform_fee_bps, creator_fee_bps)?;
        Ok(Self {
            platform_fee: bps_of(amount, platform_fee_bps)?,
            creator_fee: bps_of(amount, creator_fee_bps)?,
        })
    }

    pub fn total(&self) -> Result<u64> {
        self.platform_fee
            .checked_add(self.creator_fee)
            .ok_or_else(|| error!(MemeChainError::ArithmeticOverflow))
    }

    /// `amount` minus both fees.
    pub fn net_of(&self, amount: u64) -> Result<u64> {
        amount
            .checked_sub(self.total()?)
            .ok_or_else(|| error!(MemeChainError::ArithmeticOverflow))
    }
}
