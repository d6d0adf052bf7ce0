use solana_program::native_token::LAMPORTS_PER_SOL;

pub const PROTOCOL_SEED: &[u8] = b"protocol";
pub const MEME_SEED: &[u8] = b"meme";
pub const MINT_SEED: &[u8] = b"mint";
pub const VAULT_SEED: &[u8] = b"vault";
pub const PURCHASE_SEED: &[u8] = b"purchase";

/// Fixed capacities of the on-chain text fields, in bytes
pub const MAX_NAME_LEN: usize = 32;
pub const MAX_SYMBOL_LEN: usize = 10;
pub const MAX_URI_LEN: usize = 200;

pub const TOKEN_DECIMALS: u8 = 6;

/// Total token supply: 1 billion tokens with 6 decimals
pub const TOTAL_SUPPLY: u64 = 1_000_000_000_000_000; // 1B * 10^6

/// Tokens the bonding curve may sell (800M tokens)
/// The rest is minted to the migration authority at graduation
pub const CURVE_TOKEN_SUPPLY: u64 = 800_000_000_000_000; // 800M * 10^6

/// Default virtual reserves suggested to creators
pub const DEFAULT_VIRTUAL_SOL_RESERVES: u64 = 30 * LAMPORTS_PER_SOL;
pub const DEFAULT_VIRTUAL_TOKEN_RESERVES: u64 = 1_073_000_000_000_000; // 1.073B * 10^6

/// SOL that must be raised above the initial virtual reserve to graduate
pub const GRADUATION_THRESHOLD: u64 = 85 * LAMPORTS_PER_SOL;

/// Anti-bundling window after creation (15 minutes)
pub const LAUNCH_WINDOW_SECS: i64 = 15 * 60;

/// Per-wallet cap during the launch window (2.4% of the initial virtual token reserve)
pub const MAX_WALLET_BPS: u16 = 240;

pub const BPS_DENOMINATOR: u64 = 10_000;
