use anchor_lang::prelude::*;
use anchor_lang::system_program::{transfer, Transfer};
use anchor_spl::token::spl_token::instruction::AuthorityType;
use anchor_spl::token::{burn, mint_to, set_authority, Burn, MintTo, SetAuthority};

use crate::errors::MemeChainError;
use crate::state::{BuyOutcome, SellOutcome};

/// Moves lamports out of a signing wallet.
pub fn transfer_lamports<'info>(
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    system_program: AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let cpi_ctx = CpiContext::new(system_program, Transfer { from, to });
    transfer(cpi_ctx, amount)
}

/// Moves lamports out of a system-owned PDA such as the curve vault.
pub fn transfer_lamports_signed<'info>(
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    system_program: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let cpi_ctx = CpiContext::new_with_signer(system_program, Transfer { from, to }, signer_seeds);
    transfer(cpi_ctx, amount)
}

pub fn mint_tokens<'info>(
    mint: AccountInfo<'info>,
    to: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    let cpi_accounts = MintTo {
        mint,
        to,
        authority,
    };
    let cpi_ctx = CpiContext::new_with_signer(token_program, cpi_accounts, signer_seeds);
    mint_to(cpi_ctx, amount)
}

pub fn burn_tokens<'info>(
    mint: AccountInfo<'info>,
    from: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    let cpi_accounts = Burn {
        mint,
        from,
        authority,
    };
    burn(CpiContext::new(token_program, cpi_accounts), amount)
}

/// Drops both the mint and the freeze authority, fixing the supply for good.
pub fn revoke_mint_authorities<'info>(
    mint: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    for authority_type in [AuthorityType::MintTokens, AuthorityType::FreezeAccount] {
        let cpi_ctx = CpiContext::new_with_signer(
            token_program.clone(),
            SetAuthority {
                account_or_mint: mint.clone(),
                current_authority: authority.clone(),
            },
            signer_seeds,
        );
        set_authority(cpi_ctx, authority_type, None)?;
    }
    Ok(())
}

/// Accounts touched when a buy is paid for and delivered.
///
/// Shared by `buy_tokens` and the optional first buy of `create_meme_token`.
pub struct BuySettlement<'info> {
    pub buyer: AccountInfo<'info>,
    pub buyer_token_account: AccountInfo<'info>,
    pub meme: AccountInfo<'info>,
    pub mint: AccountInfo<'info>,
    pub vault: AccountInfo<'info>,
    pub fee_recipient: AccountInfo<'info>,
    pub creator: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
    pub system_program: AccountInfo<'info>,
}

impl<'info> BuySettlement<'info> {
    /// Buyer pays the curve cost into the vault and both fees on top, then the
    /// meme PDA mints the tokens. The creator fee is already zero when the
    /// creator is the buyer.
    pub fn settle(&self, outcome: &BuyOutcome, meme_seeds: &[&[&[u8]]]) -> Result<()> {
        transfer_lamports(
            self.buyer.clone(),
            self.vault.clone(),
            self.system_program.clone(),
            outcome.net,
        )?;
        transfer_lamports(
            self.buyer.clone(),
            self.fee_recipient.clone(),
            self.system_program.clone(),
            outcome.fees.platform_fee,
        )?;
        transfer_lamports(
            self.buyer.clone(),
            self.creator.clone(),
            self.system_program.clone(),
            outcome.fees.creator_fee,
        )?;

        mint_tokens(
            self.mint.clone(),
            self.buyer_token_account.clone(),
            self.meme.clone(),
            self.token_program.clone(),
            meme_seeds,
            outcome.token_amount,
        )
    }
}

/// Accounts touched when a sell is burned and paid out.
pub struct SellSettlement<'info> {
    pub seller: AccountInfo<'info>,
    pub seller_token_account: AccountInfo<'info>,
    pub mint: AccountInfo<'info>,
    pub vault: AccountInfo<'info>,
    pub fee_recipient: AccountInfo<'info>,
    pub creator: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
    pub system_program: AccountInfo<'info>,
}

impl<'info> SellSettlement<'info> {
    /// Burns the sold tokens, then the vault pays the proceeds out split
    /// between seller, fee recipient and creator.
    pub fn settle(&self, outcome: &SellOutcome, vault_seeds: &[&[&[u8]]]) -> Result<()> {
        burn_tokens(
            self.mint.clone(),
            self.seller_token_account.clone(),
            self.seller.clone(),
            self.token_program.clone(),
            outcome.token_amount,
        )?;

        let seller_is_creator = self.seller.key() == self.creator.key();
        let seller_amount = if seller_is_creator {
            outcome
                .net
                .checked_add(outcome.fees.creator_fee)
                .ok_or(MemeChainError::ArithmeticOverflow)?
        } else {
            outcome.net
        };

        transfer_lamports_signed(
            self.vault.clone(),
            self.seller.clone(),
            self.system_program.clone(),
            vault_seeds,
            seller_amount,
        )?;
        transfer_lamports_signed(
            self.vault.clone(),
            self.fee_recipient.clone(),
            self.system_program.clone(),
            vault_seeds,
            outcome.fees.platform_fee,
        )?;
        if !seller_is_creator {
            transfer_lamports_signed(
                self.vault.clone(),
                self.creator.clone(),
                self.system_program.clone(),
                vault_seeds,
                outcome.fees.creator_fee,
            )?;
        }
        Ok(())
    }
}
