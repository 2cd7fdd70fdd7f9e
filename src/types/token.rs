//! Token amounts and unit conversion.

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;

use crate::error::{AppError, Result};

/// Largest decimals count whose scale factor `10^decimals` fits in a U256.
pub const MAX_TOKEN_DECIMALS: u8 = 77;

/// Metadata of the token contract on the current chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Number of decimals reported by the contract.
    pub decimals: u8,
    /// Token contract address.
    pub contract_address: Address,
}

/// A balance in smallest units together with the decimals used to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    /// Raw balance in smallest units.
    pub raw: U256,
    /// Decimals of the token the balance belongs to.
    pub decimals: u8,
}

impl TokenBalance {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Full-precision human-readable balance.
    pub fn exact(&self) -> String {
        format_units(self.raw, self.decimals)
    }

    /// Balance rounded for presentation.
    pub fn display(&self, places: u8) -> String {
        format_rounded(self.raw, self.decimals, places)
    }
}

/// Format a U256 value with decimals to a human-readable string.
pub fn format_units(value: U256, decimals: u8) -> String {
    if value == U256::ZERO {
        return "0".to_string();
    }

    let value_str = value.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return value_str;
    }

    let len = value_str.len();
    if len <= decimals {
        // Value is less than 1, pad with zeros
        let zeros = decimals - len;
        let decimal_part = value_str.trim_end_matches('0');
        if decimal_part.is_empty() {
            "0".to_string()
        } else {
            format!("0.{}{}", "0".repeat(zeros), decimal_part)
        }
    } else {
        let (integer, decimal) = value_str.split_at(len - decimals);
        let decimal = decimal.trim_end_matches('0');
        if decimal.is_empty() {
            integer.to_string()
        } else {
            format!("{}.{}", integer, decimal)
        }
    }
}

/// Format a U256 value rounded half-up to `places` fractional digits.
///
/// Trailing zeros are dropped, so a whole amount renders without a fraction.
pub fn format_rounded(value: U256, decimals: u8, places: u8) -> String {
    if decimals <= places {
        return format_units(value, decimals);
    }

    // Every U256 is below half of 10^78, so an unrepresentable scale rounds to zero
    let Some(scale) = U256::from(10).checked_pow(U256::from(decimals - places)) else {
        return "0".to_string();
    };
    let half = scale / U256::from(2);
    let rounded = value.saturating_add(half) / scale;
    format_units(rounded, places)
}

/// Parse a human-readable amount string to U256 with decimals.
///
/// Digits beyond `decimals` are truncated.
pub fn parse_units(amount: &str, decimals: u8) -> std::result::Result<U256, String> {
    let amount = amount.trim();

    if amount.is_empty() {
        return Err("Amount cannot be empty".to_string());
    }

    if amount.starts_with('-') {
        return Err("Amount cannot be negative".to_string());
    }

    let multiplier = U256::from(10)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| format!("Unsupported decimals: {}", decimals))?;
    let decimals = decimals as usize;
    let parts: Vec<&str> = amount.split('.').collect();

    match parts.len() {
        1 => {
            let value = parts[0].parse::<U256>().map_err(|e| format!("Invalid amount: {}", e))?;
            value.checked_mul(multiplier).ok_or_else(|| "Amount is too large".to_string())
        }
        2 => {
            let integer = parts[0];
            let mut fraction = parts[1].to_string();

            if fraction.len() > decimals {
                fraction.truncate(decimals);
            } else {
                fraction.push_str(&"0".repeat(decimals - fraction.len()));
            }

            let integer_value = if integer.is_empty() {
                U256::ZERO
            } else {
                integer.parse::<U256>().map_err(|e| format!("Invalid integer part: {}", e))?
            };

            let fraction_value = if fraction.is_empty() {
                U256::ZERO
            } else {
                fraction.parse::<U256>().map_err(|e| format!("Invalid fraction part: {}", e))?
            };

            integer_value
                .checked_mul(multiplier)
                .and_then(|v| v.checked_add(fraction_value))
                .ok_or_else(|| "Amount is too large".to_string())
        }
        _ => Err("Invalid amount format".to_string()),
    }
}

/// Convert a user-entered decimal amount to smallest units.
///
/// Uses the unrounded amount; digits finer than the token supports are cut off.
pub fn decimal_to_units(amount: Decimal, decimals: u8) -> Result<U256> {
    parse_units(&amount.normalize().to_string(), decimals).map_err(AppError::Parse)
}
