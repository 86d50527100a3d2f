//! Low-level value encoding.
//!
//! Calldata words are narrower than 256 bits, so uint256 values travel as two
//! 128-bit limbs (low first) and strings travel as a byte length followed by
//! little-endian packed 8-byte words.

use crate::constants::STRING_WORD_BYTES;
use crate::error::{Result, RoundError};
use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt::LowerHex;

/// Number of hex digits in a normalized address
const ADDRESS_HEX_DIGITS: usize = 64;

/// A string encoded as its UTF-8 byte length plus packed words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSequence {
    /// UTF-8 length of the source string in bytes
    pub byte_length: u32,
    /// Little-endian packed 8-byte words
    pub words: Vec<u64>,
}

impl WordSequence {
    /// Number of words in the sequence
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

/// Split a uint256 into `(low, high)` 128-bit limbs.
pub fn split_uint256(value: U256) -> (u128, u128) {
    let limbs = value.as_limbs();
    let low = (limbs[0] as u128) | ((limbs[1] as u128) << 64);
    let high = (limbs[2] as u128) | ((limbs[3] as u128) << 64);
    (low, high)
}

/// Recombine limbs produced by [`split_uint256`].
pub fn combine_uint256(low: u128, high: u128) -> U256 {
    (U256::from(high) << 128) | U256::from(low)
}

/// Pack bytes into little-endian 8-byte words. The last word is zero-filled.
pub fn bytes_to_words(bytes: &[u8]) -> Vec<u64> {
    bytes
        .chunks(STRING_WORD_BYTES)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u64, |word, (i, byte)| word | (u64::from(*byte) << (8 * i)))
        })
        .collect()
}

/// Unpack `byte_length` bytes from words produced by [`bytes_to_words`].
pub fn words_to_bytes(words: &[u64], byte_length: usize) -> Result<Vec<u8>> {
    let expected_words = byte_length.div_ceil(STRING_WORD_BYTES);
    if words.len() != expected_words {
        return Err(RoundError::InvalidFieldElement(format!(
            "{} bytes need {} words, got {}",
            byte_length,
            expected_words,
            words.len()
        )));
    }

    let mut bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    bytes.truncate(byte_length);
    Ok(bytes)
}

/// Encode a string as a byte length and packed words.
pub fn string_to_word_sequence(s: &str) -> WordSequence {
    WordSequence {
        byte_length: s.len() as u32,
        words: bytes_to_words(s.as_bytes()),
    }
}

/// Decode a [`WordSequence`] back into the original string.
pub fn word_sequence_to_string(sequence: &WordSequence) -> Result<String> {
    let bytes = words_to_bytes(&sequence.words, sequence.byte_length as usize)?;
    String::from_utf8(bytes)
        .map_err(|e| RoundError::InvalidFieldElement(format!("not UTF-8: {}", e)))
}

/// Lower-case, `0x`-prefixed hex with no leading zeros.
pub fn to_hex<T: LowerHex>(value: T) -> String {
    format!("0x{:x}", value)
}

/// Parse a calldata word given as `0x` hex or decimal.
pub fn parse_word(value: &str) -> Result<U256> {
    let parsed = match strip_hex_prefix(value) {
        Some(digits) if !digits.is_empty() => U256::from_str_radix(digits, 16),
        None if !value.is_empty() => U256::from_str_radix(value, 10),
        _ => return Err(RoundError::InvalidFieldElement(value.to_string())),
    };
    parsed.map_err(|_| RoundError::InvalidFieldElement(value.to_string()))
}

/// Normalize an address into registry key form: `0x` plus 64 lower-case hex
/// digits, zero-padded on the left.
pub fn normalize_address(address: &str) -> Result<String> {
    let digits = strip_hex_prefix(address.trim())
        .ok_or_else(|| RoundError::InvalidAddress(address.to_string()))?;

    if digits.is_empty()
        || digits.len() > ADDRESS_HEX_DIGITS
        || !digits.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(RoundError::InvalidAddress(address.to_string()));
    }

    Ok(format!(
        "0x{:0>width$}",
        digits.to_ascii_lowercase(),
        width = ADDRESS_HEX_DIGITS
    ))
}

/// Parse an address into a 32-byte big-endian value.
pub fn address_to_b256(address: &str) -> Result<B256> {
    let normalized = normalize_address(address)?;
    let bytes = hex::decode(&normalized[2..])?;
    Ok(B256::from_slice(&bytes))
}

/// Entrypoint selector: keccak-256 of the name truncated to 250 bits.
pub fn selector_from_name(name: &str) -> U256 {
    let hash = U256::from_be_bytes(keccak256(name.as_bytes()).0);
    hash & ((U256::from(1u8) << 250) - U256::from(1u8))
}

fn strip_hex_prefix(value: &str) -> Option<&str> {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
}
