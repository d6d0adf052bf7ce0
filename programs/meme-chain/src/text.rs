//! Fixed-capacity text fields.
//!
//! Names, symbols and URIs live in fixed byte arrays so every account field
//! keeps a fixed offset. Writers left-justify and zero-pad, readers strip the
//! trailing zero bytes.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::pubkey::MAX_SEED_LEN;

use crate::errors::MemeChainError;

/// Encodes `value` into a zero-padded `[u8; N]`.
///
/// Empty values and values containing a NUL byte are rejected: a NUL would be
/// indistinguishable from padding once decoded.
pub fn encode_fixed<const N: usize>(value: &str) -> Result<[u8; N]> {
    let bytes = value.as_bytes();
    require!(bytes.len() <= N, MemeChainError::FieldTooLong);
    require!(
        !bytes.is_empty() && !bytes.contains(&0),
        MemeChainError::InvalidFieldEncoding
    );

    let mut buf = [0u8; N];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(buf)
}

/// Like [`encode_fixed`] but an empty value is allowed (optional fields such as the URI).
pub fn encode_fixed_optional<const N: usize>(value: &str) -> Result<[u8; N]> {
    if value.is_empty() {
        return Ok([0u8; N]);
    }
    encode_fixed(value)
}

/// The meaningful bytes of a fixed field, without the zero padding.
pub fn trim_fixed(buf: &[u8]) -> &[u8] {
    let end = buf.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    &buf[..end]
}

/// Symbol bytes used as a PDA seed, cut at the seed length limit.
///
/// Account constraints derive the meme address before any handler check runs;
/// an overlong symbol still gets an address and is then rejected by
/// [`encode_fixed`] with `FieldTooLong`.
pub fn symbol_seed(symbol: &str) -> &[u8] {
    let bytes = symbol.as_bytes();
    &bytes[..bytes.len().min(MAX_SEED_LEN)]
}

/// Decodes a fixed field for display. Invalid UTF-8 is replaced, never rejected.
pub fn decode_fixed(buf: &[u8]) -> String {
    String::from_utf8_lossy(trim_fixed(buf)).into_owned()
}
