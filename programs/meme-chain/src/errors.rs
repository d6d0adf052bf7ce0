use anchor_lang::prelude::*;

#[error_code]
pub enum MemeChainError {
    #[msg("Meme token already exists for this creator and symbol")]
    AlreadyExists,

    #[msg("Text field exceeds its fixed capacity")]
    FieldTooLong,

    #[msg("Text field is empty or contains a NUL byte")]
    InvalidFieldEncoding,

    #[msg("Invalid reserves: reserves must be greater than zero")]
    InvalidReserves,

    #[msg("Invalid amount: must be greater than zero")]
    InvalidAmount,

    #[msg("Insufficient liquidity in bonding curve")]
    InsufficientLiquidity,

    #[msg("Slippage tolerance exceeded")]
    SlippageExceeded,

    #[msg("Invalid slippage: basis points must not exceed 10000")]
    InvalidSlippage,

    #[msg("Purchase exceeds the per-wallet cap during the launch window")]
    LargeBuyDetected,

    #[msg("Bonding curve already graduated")]
    AlreadyGraduated,

    #[msg("Bonding curve not yet graduated")]
    NotGraduated,

    #[msg("Graduated reserves already withdrawn for migration")]
    AlreadyMigrated,

    #[msg("Math overflow occurred")]
    ArithmeticOverflow,

    #[msg("Unauthorized: signer does not match the expected authority")]
    Unauthorized,

    #[msg("Invalid fee configuration: total fee exceeds 10000 basis points")]
    InvalidFee,

    #[msg("Invalid launch guard configuration")]
    InvalidGuardConfig,

    #[msg("Insufficient token balance")]
    InsufficientTokenBalance,
}
