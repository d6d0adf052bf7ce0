use anchor_lang::prelude::*;

use crate::constants::*;
use crate::curve::{self, calculate_k};
use crate::errors::MemeChainError;
use crate::fees::{validate_fee_bps, FeeSplit};
use crate::guard::LaunchGuard;
use crate::text::{self, decode_fixed, encode_fixed, encode_fixed_optional, trim_fixed};

/// Global configuration account storing protocol-wide settings
#[account]
#[derive(InitSpace)]
pub struct Protocol {
    /// Authority that can update protocol parameters and withdraw graduated reserves
    pub authority: Pubkey,
    /// Receives the platform share of every trade
    pub fee_recipient: Pubkey,
    /// Platform fee in basis points
    pub platform_fee: u16,
    /// Creator fee in basis points
    pub creator_fee: u16,
    /// SOL to raise above the initial virtual reserve before graduating
    pub graduation_threshold: u64,
    /// Seconds after creation during which wallet caps apply
    pub launch_window: i64,
    /// Per-wallet cap during the launch window, in basis points
    pub max_wallet_bps: u16,
    pub total_memes_created: u64,
    pub bump: u8,
}

/// Optional changes applied by `update_protocol`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtocolUpdate {
    pub authority: Option<Pubkey>,
    pub fee_recipient: Option<Pubkey>,
    pub platform_fee: Option<u16>,
    pub creator_fee: Option<u16>,
    pub graduation_threshold: Option<u64>,
    pub launch_window: Option<i64>,
    pub max_wallet_bps: Option<u16>,
}

impl Protocol {
    pub fn find_address() -> (Pubkey, u8) {
        Pubkey::find_program_address(&[PROTOCOL_SEED], &crate::ID)
    }

    pub fn initialize(
        &mut self,
        authority: Pubkey,
        fee_recipient: Pubkey,
        platform_fee: u16,
        creator_fee: u16,
        bump: u8,
    ) -> Result<()> {
        validate_fee_bps(platform_fee, creator_fee)?;

        self.authority = authority;
        self.fee_recipient = fee_recipient;
        self.platform_fee = platform_fee;
        self.creator_fee = creator_fee;
        self.graduation_threshold = GRADUATION_THRESHOLD;
        self.launch_window = LAUNCH_WINDOW_SECS;
        self.max_wallet_bps = MAX_WALLET_BPS;
        self.total_memes_created = 0;
        self.bump = bump;
        Ok(())
    }

    /// Validates the merged configuration before writing any field.
    pub fn apply_update(&mut self, update: &ProtocolUpdate) -> Result<()> {
        let platform_fee = update.platform_fee.unwrap_or(self.platform_fee);
        let creator_fee = update.creator_fee.unwrap_or(self.creator_fee);
        validate_fee_bps(platform_fee, creator_fee)?;

        let graduation_threshold = update
            .graduation_threshold
            .unwrap_or(self.graduation_threshold);
        require!(graduation_threshold > 0, MemeChainError::InvalidGuardConfig);

        let guard = LaunchGuard::new(
            update.launch_window.unwrap_or(self.launch_window),
            update.max_wallet_bps.unwrap_or(self.max_wallet_bps),
        )?;

        if let Some(authority) = update.authority {
            self.authority = authority;
        }
        if let Some(fee_recipient) = update.fee_recipient {
            self.fee_recipient = fee_recipient;
        }
        self.platform_fee = platform_fee;
        self.creator_fee = creator_fee;
        self.graduation_threshold = graduation_threshold;
        self.launch_window = guard.window;
        self.max_wallet_bps = guard.max_wallet_bps;
        Ok(())
    }

    pub fn guard(&self) -> Result<LaunchGuard> {
        LaunchGuard::new(self.launch_window, self.max_wallet_bps)
    }

    pub fn fee_split(&self, amount: u64) -> Result<FeeSplit> {
        FeeSplit::compute(amount, self.platform_fee, self.creator_fee)
    }
}

/// Name, symbol, uri and image fingerprint of a meme token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemeMetadata {
    pub name: [u8; MAX_NAME_LEN],
    pub symbol: [u8; MAX_SYMBOL_LEN],
    pub uri: [u8; MAX_URI_LEN],
    pub image_hash: [u8; 32],
}

impl MemeMetadata {
    pub fn encode(name: &str, symbol: &str, uri: &str, image_hash: [u8; 32]) -> Result<Self> {
        Ok(Self {
            name: encode_fixed(name)?,
            symbol: encode_fixed(symbol)?,
            uri: encode_fixed_optional(uri)?,
            image_hash,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemeBumps {
    pub meme: u8,
    pub mint: u8,
    pub vault: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemePhase {
    Trading,
    Graduated,
    Migrated,
}

/// Bonding curve state of one meme token
#[account]
#[derive(InitSpace)]
pub struct MemeToken {
    pub creator: Pubkey,
    pub name: [u8; MAX_NAME_LEN],
    pub symbol: [u8; MAX_SYMBOL_LEN],
    pub uri: [u8; MAX_URI_LEN],
    pub image_hash: [u8; 32],
    pub mint: Pubkey,
    pub vault: Pubkey,
    /// Virtual reserves pricing the curve
    pub virtual_sol_reserves: u64,
    pub virtual_token_reserves: u64,
    pub initial_virtual_sol_reserves: u64,
    pub initial_virtual_token_reserves: u64,
    /// Constant product at creation, an upper bound for every later product
    pub k: u128,
    /// Lamports held by the vault for sellers and migration
    pub real_sol_reserves: u64,
    /// Tokens the curve can still mint to buyers
    pub real_token_reserves: u64,
    pub total_supply: u64,
    pub tokens_sold: u64,
    pub created_at: i64,
    pub is_graduated: bool,
    /// 0 until graduation
    pub graduated_at: i64,
    pub is_migrated: bool,
    pub bump: u8,
    pub mint_bump: u8,
    pub vault_bump: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuyOutcome {
    pub token_amount: u64,
    /// Total lamports paid by the buyer, fees included
    pub cost: u64,
    pub fees: FeeSplit,
    /// Curve cost, credited to the vault
    pub net: u64,
    /// Set when this buy moved the curve to `Graduated`
    pub graduated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SellOutcome {
    pub token_amount: u64,
    /// Lamports released by the vault
    pub proceeds: u64,
    pub fees: FeeSplit,
    /// Lamports received by the seller
    pub net: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MigrationAmounts {
    pub sol: u64,
    pub tokens: u64,
}

impl MemeToken {
    pub fn find_address(creator: &Pubkey, symbol: &str) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[MEME_SEED, creator.as_ref(), text::symbol_seed(symbol)],
            &crate::ID,
        )
    }

    pub fn find_mint_address(meme: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[MINT_SEED, meme.as_ref()], &crate::ID)
    }

    pub fn find_vault_address(meme: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[VAULT_SEED, meme.as_ref()], &crate::ID)
    }

    /// Set once the account has been initialized by `create_meme_token`
    pub fn exists(&self) -> bool {
        self.mint != Pubkey::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        creator: Pubkey,
        mint: Pubkey,
        vault: Pubkey,
        metadata: MemeMetadata,
        initial_virtual_sol_reserves: u64,
        initial_virtual_token_reserves: u64,
        bumps: MemeBumps,
        created_at: i64,
    ) -> Result<()> {
        require!(!self.exists(), MemeChainError::AlreadyExists);
        require!(
            initial_virtual_sol_reserves > 0 && initial_virtual_token_reserves > 0,
            MemeChainError::InvalidReserves
        );

        self.creator = creator;
        self.name = metadata.name;
        self.symbol = metadata.symbol;
        self.uri = metadata.uri;
        self.image_hash = metadata.image_hash;
        self.mint = mint;
        self.vault = vault;
        self.virtual_sol_reserves = initial_virtual_sol_reserves;
        self.virtual_token_reserves = initial_virtual_token_reserves;
        self.initial_virtual_sol_reserves = initial_virtual_sol_reserves;
        self.initial_virtual_token_reserves = initial_virtual_token_reserves;
        self.k = calculate_k(initial_virtual_sol_reserves, initial_virtual_token_reserves);
        self.real_sol_reserves = 0;
        self.real_token_reserves = CURVE_TOKEN_SUPPLY.min(initial_virtual_token_reserves);
        self.total_supply = TOTAL_SUPPLY;
        self.tokens_sold = 0;
        self.created_at = created_at;
        self.is_graduated = false;
        self.graduated_at = 0;
        self.is_migrated = false;
        self.bump = bumps.meme;
        self.mint_bump = bumps.mint;
        self.vault_bump = bumps.vault;
        Ok(())
    }

    pub fn name(&self) -> String {
        decode_fixed(&self.name)
    }

    pub fn symbol(&self) -> String {
        decode_fixed(&self.symbol)
    }

    pub fn uri(&self) -> String {
        decode_fixed(&self.uri)
    }

    /// Symbol bytes as used in the meme PDA seeds
    pub fn symbol_seed(&self) -> &[u8] {
        trim_fixed(&self.symbol)
    }

    pub fn phase(&self) -> MemePhase {
        match (self.is_graduated, self.is_migrated) {
            (false, _) => MemePhase::Trading,
            (true, false) => MemePhase::Graduated,
            (true, true) => MemePhase::Migrated,
        }
    }

    pub fn current_k(&self) -> u128 {
        calculate_k(self.virtual_sol_reserves, self.virtual_token_reserves)
    }

    /// SOL raised on the curve so far
    pub fn sol_raised(&self) -> u64 {
        self.virtual_sol_reserves
            .saturating_sub(self.initial_virtual_sol_reserves)
    }

    /// Buys exactly `token_amount` tokens, counted against `purchase`.
    ///
    /// Every check runs before any field is written, so a failed buy leaves
    /// both accounts untouched. A creator buying their own token is not
    /// charged the creator fee.
    pub fn buy(
        &mut self,
        protocol: &Protocol,
        purchase: &mut WalletPurchase,
        token_amount: u64,
        max_sol_cost: u64,
        buyer_is_creator: bool,
        now: i64,
    ) -> Result<BuyOutcome> {
        require!(!self.is_graduated, MemeChainError::AlreadyGraduated);
        require!(
            token_amount <= self.real_token_reserves,
            MemeChainError::InsufficientLiquidity
        );

        let quote = curve::quote_buy(
            self.virtual_sol_reserves,
            self.virtual_token_reserves,
            token_amount,
        )?;

        // fees ride on top of the curve cost, the vault keeps the whole curve cost
        let mut fees = protocol.fee_split(quote.cost)?;
        if buyer_is_creator {
            fees.creator_fee = 0;
        }
        let cost = quote
            .cost
            .checked_add(fees.total()?)
            .ok_or(MemeChainError::ArithmeticOverflow)?;
        require!(cost <= max_sol_cost, MemeChainError::SlippageExceeded);

        protocol.guard()?.check(
            self.created_at,
            now,
            self.initial_virtual_token_reserves,
            purchase.tokens_bought,
            token_amount,
        )?;

        let real_sol_reserves = self
            .real_sol_reserves
            .checked_add(quote.cost)
            .ok_or(MemeChainError::ArithmeticOverflow)?;
        let real_token_reserves = self
            .real_token_reserves
            .checked_sub(token_amount)
            .ok_or(MemeChainError::InsufficientLiquidity)?;
        let tokens_sold = self
            .tokens_sold
            .checked_add(token_amount)
            .ok_or(MemeChainError::ArithmeticOverflow)?;
        let tokens_bought = purchase
            .tokens_bought
            .checked_add(token_amount)
            .ok_or(MemeChainError::ArithmeticOverflow)?;

        self.virtual_sol_reserves = quote.curve_sol_reserve;
        self.virtual_token_reserves = quote.new_token_reserve;
        self.real_sol_reserves = real_sol_reserves;
        self.real_token_reserves = real_token_reserves;
        self.tokens_sold = tokens_sold;
        purchase.tokens_bought = tokens_bought;

        let graduated = self.try_graduate(protocol.graduation_threshold, now);

        Ok(BuyOutcome {
            token_amount,
            cost,
            fees,
            net: quote.cost,
            graduated,
        })
    }

    /// Sells `token_amount` tokens back to the curve.
    pub fn sell(
        &mut self,
        protocol: &Protocol,
        seller_balance: u64,
        token_amount: u64,
        min_sol_out: u64,
        max_slippage_bps: u16,
    ) -> Result<SellOutcome> {
        require!(!self.is_graduated, MemeChainError::AlreadyGraduated);
        require!(token_amount > 0, MemeChainError::InvalidAmount);
        require!(
            seller_balance >= token_amount,
            MemeChainError::InsufficientTokenBalance
        );

        let spot = curve::spot_value(
            self.virtual_sol_reserves,
            self.virtual_token_reserves,
            token_amount,
        )?;
        let min_from_slippage = curve::min_out_for_slippage(spot, max_slippage_bps)?;

        let quote = curve::quote_sell(
            self.virtual_sol_reserves,
            self.virtual_token_reserves,
            token_amount,
        )?;
        require!(quote.proceeds > 0, MemeChainError::InvalidAmount);
        require!(
            quote.proceeds <= self.real_sol_reserves,
            MemeChainError::InsufficientLiquidity
        );
        require!(
            quote.proceeds >= min_sol_out && quote.proceeds >= min_from_slippage,
            MemeChainError::SlippageExceeded
        );

        let fees = protocol.fee_split(quote.proceeds)?;
        let net = fees.net_of(quote.proceeds)?;

        let real_sol_reserves = self.real_sol_reserves - quote.proceeds;
        let real_token_reserves = self
            .real_token_reserves
            .checked_add(token_amount)
            .ok_or(MemeChainError::ArithmeticOverflow)?;
        let tokens_sold = self
            .tokens_sold
            .checked_sub(token_amount)
            .ok_or(MemeChainError::ArithmeticOverflow)?;

        self.virtual_sol_reserves = quote.curve_sol_reserve;
        self.virtual_token_reserves = quote.new_token_reserve;
        self.real_sol_reserves = real_sol_reserves;
        self.real_token_reserves = real_token_reserves;
        self.tokens_sold = tokens_sold;

        Ok(SellOutcome {
            token_amount,
            proceeds: quote.proceeds,
            fees,
            net,
        })
    }

    /// One-way transition to `Graduated`. Returns true only on the transition itself.
    pub fn try_graduate(&mut self, threshold: u64, now: i64) -> bool {
        if self.is_graduated || self.sol_raised() < threshold {
            return false;
        }
        self.is_graduated = true;
        self.graduated_at = now;
        true
    }

    /// Releases the graduated reserves: the vault SOL and the supply the curve never minted.
    pub fn take_migration_reserves(&mut self) -> Result<MigrationAmounts> {
        require!(self.is_graduated, MemeChainError::NotGraduated);
        require!(!self.is_migrated, MemeChainError::AlreadyMigrated);

        let tokens = self
            .total_supply
            .checked_sub(self.tokens_sold)
            .ok_or(MemeChainError::ArithmeticOverflow)?;
        let amounts = MigrationAmounts {
            sol: self.real_sol_reserves,
            tokens,
        };

        self.real_sol_reserves = 0;
        self.real_token_reserves = 0;
        self.is_migrated = true;
        Ok(amounts)
    }
}

/// Cumulative purchases of one wallet on one meme token
///
/// Owned by the program and never closed, so the counter survives the buyer
/// closing and reopening token accounts.
#[account]
#[derive(InitSpace)]
pub struct WalletPurchase {
    pub meme: Pubkey,
    pub wallet: Pubkey,
    pub tokens_bought: u64,
    pub bump: u8,
}

impl WalletPurchase {
    pub fn find_address(meme: &Pubkey, wallet: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[PURCHASE_SEED, meme.as_ref(), wallet.as_ref()],
            &crate::ID,
        )
    }

    /// Fills in the owner fields of a freshly created record; no-op afterwards.
    pub fn bind(&mut self, meme: Pubkey, wallet: Pubkey, bump: u8) {
        if self.wallet == Pubkey::default() {
            self.meme = meme;
            self.wallet = wallet;
            self.tokens_bought = 0;
            self.bump = bump;
        }
    }
}
