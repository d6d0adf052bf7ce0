use anchor_lang::prelude::*;

use crate::constants::BPS_DENOMINATOR;
use crate::errors::MemeChainError;

/// Per-wallet purchase cap applied during the launch window.
///
/// While `now - created_at < window`, a wallet's cumulative purchases may not
/// exceed `floor(reference_supply * max_wallet_bps / 10000)`. A buy that would
/// cross the cap is rejected as a whole, never truncated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchGuard {
    pub window: i64,
    pub max_wallet_bps: u16,
}

impl LaunchGuard {
    pub fn new(window: i64, max_wallet_bps: u16) -> Result<Self> {
        let guard = Self {
            window,
            max_wallet_bps,
        };
        guard.validate()?;
        Ok(guard)
    }

    pub fn validate(&self) -> Result<()> {
        require!(self.window >= 0, MemeChainError::InvalidGuardConfig);
        require!(
            self.max_wallet_bps > 0 && self.max_wallet_bps as u64 <= BPS_DENOMINATOR,
            MemeChainError::InvalidGuardConfig
        );
        Ok(())
    }

    /// A clock behind `created_at` counts as inside the window.
    pub fn is_active(&self, created_at: i64, now: i64) -> bool {
        now.saturating_sub(created_at) < self.window
    }

    pub fn wallet_cap(&self, reference_supply: u64) -> Result<u64> {
        let cap = (reference_supply as u128)
            .checked_mul(self.max_wallet_bps as u128)
            .ok_or(MemeChainError::ArithmeticOverflow)?
            / BPS_DENOMINATOR as u128;
        u64::try_from(cap).map_err(|_| error!(MemeChainError::ArithmeticOverflow))
    }

    pub fn check(
        &self,
        created_at: i64,
        now: i64,
        reference_supply: u64,
        already_bought: u64,
        amount: u64,
    ) -> Result<()> {
        if !self.is_active(created_at, now) {
            return Ok(());
        }

        let cap = self.wallet_cap(reference_supply)?;
        let total = already_bought
            .checked_add(amount)
            .ok_or(MemeChainError::ArithmeticOverflow)?;

        if total > cap {
            msg!(
                "Launch window cap hit: bought {} + {} > cap {}",
                already_bought,
                amount,
                cap
            );
            return err!(MemeChainError::LargeBuyDetected);
        }
        Ok(())
    }
}
