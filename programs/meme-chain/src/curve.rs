//! Constant product bonding curve math.
//!
//! Pricing uses `k = virtual_sol * virtual_token` taken from the reserves
//! before each trade. Every amount the program charges is rounded up and every
//! amount it pays out is rounded down. The reserves written back always satisfy
//! `virtual_sol * virtual_token <= k`; rounding dust ends up in the vault as
//! real SOL, never in the pricing reserves.

use anchor_lang::prelude::*;

use crate::constants::BPS_DENOMINATOR;
use crate::errors::MemeChainError;

/// Calculate the constant product k = x * y
/// where x = virtual SOL reserve, y = virtual token reserve
#[inline]
pub fn calculate_k(sol_reserve: u64, token_reserve: u64) -> u128 {
    (sol_reserve as u128) * (token_reserve as u128)
}

fn ceil_div(numerator: u128, denominator: u128) -> Result<u128> {
    require!(denominator > 0, MemeChainError::ArithmeticOverflow);
    let quotient = numerator / denominator;
    if numerator % denominator == 0 {
        Ok(quotient)
    } else {
        quotient
            .checked_add(1)
            .ok_or_else(|| error!(MemeChainError::ArithmeticOverflow))
    }
}

fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| error!(MemeChainError::ArithmeticOverflow))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuyQuote {
    /// Lamports charged by the curve, before fees
    pub cost: u64,
    /// Virtual SOL reserve sitting exactly on the curve after the trade
    pub curve_sol_reserve: u64,
    pub new_token_reserve: u64,
}

/// Cost of buying exactly `tokens_out` from the curve.
///
/// new_token_reserve = token_reserve - tokens_out
/// cost = ceil(k / new_token_reserve) - sol_reserve
pub fn quote_buy(sol_reserve: u64, token_reserve: u64, tokens_out: u64) -> Result<BuyQuote> {
    require!(tokens_out > 0, MemeChainError::InvalidAmount);
    require!(sol_reserve > 0, MemeChainError::InvalidReserves);
    require!(token_reserve > 0, MemeChainError::InvalidReserves);
    require!(
        tokens_out < token_reserve,
        MemeChainError::InsufficientLiquidity
    );

    let k = calculate_k(sol_reserve, token_reserve);
    let new_token_reserve = token_reserve - tokens_out;

    let sol_ceil = ceil_div(k, new_token_reserve as u128)?;
    let sol_floor = k / new_token_reserve as u128;

    let cost = to_u64(sol_ceil)?
        .checked_sub(sol_reserve)
        .ok_or(MemeChainError::ArithmeticOverflow)?;

    Ok(BuyQuote {
        cost,
        curve_sol_reserve: to_u64(sol_floor)?,
        new_token_reserve,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SellQuote {
    /// Lamports released by the curve, before fees
    pub proceeds: u64,
    /// Virtual SOL reserve sitting exactly on the curve after the trade
    pub curve_sol_reserve: u64,
    pub new_token_reserve: u64,
}

/// Proceeds of selling `tokens_in` back to the curve.
///
/// new_token_reserve = token_reserve + tokens_in
/// proceeds = sol_reserve - ceil(k / new_token_reserve)
pub fn quote_sell(sol_reserve: u64, token_reserve: u64, tokens_in: u64) -> Result<SellQuote> {
    require!(tokens_in > 0, MemeChainError::InvalidAmount);
    require!(sol_reserve > 0, MemeChainError::InvalidReserves);
    require!(token_reserve > 0, MemeChainError::InvalidReserves);

    let k = calculate_k(sol_reserve, token_reserve);
    let new_token_reserve = token_reserve
        .checked_add(tokens_in)
        .ok_or(MemeChainError::ArithmeticOverflow)?;

    let sol_ceil = to_u64(ceil_div(k, new_token_reserve as u128)?)?;
    let sol_floor = to_u64(k / new_token_reserve as u128)?;
    require!(sol_floor > 0, MemeChainError::InsufficientLiquidity);

    // sol_ceil <= sol_reserve since new_token_reserve > token_reserve
    let proceeds = sol_reserve
        .checked_sub(sol_ceil)
        .ok_or(MemeChainError::ArithmeticOverflow)?;

    Ok(SellQuote {
        proceeds,
        curve_sol_reserve: sol_floor,
        new_token_reserve,
    })
}

/// Value of `tokens` at the current marginal price, rounded down.
pub fn spot_value(sol_reserve: u64, token_reserve: u64, tokens: u64) -> Result<u64> {
    require!(token_reserve > 0, MemeChainError::InvalidReserves);
    let value = (tokens as u128)
        .checked_mul(sol_reserve as u128)
        .ok_or(MemeChainError::ArithmeticOverflow)?
        / token_reserve as u128;
    to_u64(value)
}

/// Lowest proceeds accepted when at most `max_slippage_bps` of the spot value may be lost.
pub fn min_out_for_slippage(spot: u64, max_slippage_bps: u16) -> Result<u64> {
    require!(
        (max_slippage_bps as u64) <= BPS_DENOMINATOR,
        MemeChainError::InvalidSlippage
    );
    let keep_bps = BPS_DENOMINATOR - max_slippage_bps as u64;
    let min_out = (spot as u128)
        .checked_mul(keep_bps as u128)
        .ok_or(MemeChainError::ArithmeticOverflow)?
        / BPS_DENOMINATOR as u128;
    to_u64(min_out)
}
