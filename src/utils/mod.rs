/*
 * Amount scaling and address helpers
 */

use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use num_bigint::BigUint;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use rust_decimal::Decimal;
use std::str::FromStr;
use crate::models::{QuoterError, Result};

/// Largest scale `Decimal` can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// 2^96 - 1, the largest `Decimal` mantissa.
const MAX_DECIMAL_MANTISSA: u128 = 79_228_162_514_264_337_593_543_950_335;

fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

/// Integer division rounding half away from zero.
fn div_round(value: &BigUint, divisor: &BigUint) -> BigUint {
    let quotient = value / divisor;
    let remainder = value % divisor;
    if remainder * 2u32 >= *divisor {
        quotient + 1u32
    } else {
        quotient
    }
}

#[must_use]
pub fn u256_to_biguint(value: U256) -> BigUint {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    BigUint::from_bytes_be(&buf)
}

pub fn biguint_to_u256(value: &BigUint) -> Result<U256> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(QuoterError::CalculationError(format!(
            "Amount {value} does not fit in 256 bits"
        )));
    }
    Ok(U256::from_big_endian(&bytes))
}

/// Converts a human-readable amount into the token's smallest unit.
///
/// `round(amount * 10^decimals)` computed on arbitrary-precision integers.
pub fn scale_amount(amount: Decimal, decimals: u8) -> Result<U256> {
    if amount <= Decimal::ZERO {
        return Err(QuoterError::InvalidAmount(format!(
            "Amount must be positive, got {amount}"
        )));
    }

    let mantissa = BigUint::from(amount.mantissa().unsigned_abs());
    let scale = amount.scale();
    let decimals = u32::from(decimals);

    let raw = if decimals >= scale {
        mantissa * pow10(decimals - scale)
    } else {
        div_round(&mantissa, &pow10(scale - decimals))
    };

    if raw.is_zero() {
        return Err(QuoterError::InvalidAmount(format!(
            "{amount} is below the smallest unit of a {decimals}-decimal token"
        )));
    }

    biguint_to_u256(&raw)
}

/// Converts a raw on-chain amount back into a decimal for display.
///
/// Precision beyond what `Decimal` can carry is rounded off.
pub fn unscale_amount(raw: U256, decimals: u8) -> Result<Decimal> {
    let mut value = u256_to_biguint(raw);
    let mut scale = u32::from(decimals);
    let max_mantissa = BigUint::from(MAX_DECIMAL_MANTISSA);
    let ten = BigUint::from(10u32);

    while scale > MAX_DECIMAL_SCALE || value > max_mantissa {
        if scale == 0 {
            return Err(QuoterError::CalculationError(format!(
                "Raw amount {raw} is too large to represent"
            )));
        }
        value = div_round(&value, &ten);
        scale -= 1;
    }

    let mantissa = value
        .to_i128()
        .ok_or_else(|| QuoterError::CalculationError(format!("Raw amount {raw} overflowed")))?;

    Decimal::try_from_i128_with_scale(mantissa, scale)
        .map_err(|e| QuoterError::CalculationError(format!("Failed to build decimal: {e}")))
}

pub fn parse_amount(text: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(text.trim())
        .or_else(|_| Decimal::from_scientific(text.trim()))
        .map_err(|e| QuoterError::InvalidAmount(format!("Cannot parse amount {text:?}: {e}")))?;
    ensure_positive(amount)
}

pub fn amount_from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(QuoterError::InvalidAmount(format!("Amount must be finite, got {value}")));
    }
    let amount = Decimal::from_f64(value)
        .ok_or_else(|| QuoterError::InvalidAmount(format!("Amount {value} is out of range")))?;
    ensure_positive(amount)
}

fn ensure_positive(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(QuoterError::InvalidAmount(format!(
            "Amount must be positive, got {amount}"
        )));
    }
    Ok(amount)
}

/// Parses a 20-byte hex address, rejecting wrong lengths and bad EIP-55 checksums.
pub fn parse_address(text: &str) -> Result<Address> {
    let hex = text
        .strip_prefix("0x")
        .ok_or_else(|| QuoterError::ConfigError(format!("Address {text} must start with 0x")))?;

    if hex.len() != 40 {
        return Err(QuoterError::ConfigError(format!(
            "Address {text} has {} hex digits, expected 40",
            hex.len()
        )));
    }

    let address = Address::from_str(hex)
        .map_err(|e| QuoterError::ConfigError(format!("Invalid address {text}: {e}")))?;

    let mixed_case = hex.chars().any(|c| c.is_ascii_lowercase())
        && hex.chars().any(|c| c.is_ascii_uppercase());
    if mixed_case && to_checksum(&address, None) != text {
        return Err(QuoterError::ConfigError(format!(
            "Address {text} fails its checksum, expected {}",
            to_checksum(&address, None)
        )));
    }

    Ok(address)
}
