use ethers::types::U256;

use crate::error::AmmError;

pub const FEE_NUMERATOR: u64 = 997;
pub const FEE_DENOMINATOR: u64 = 1000;

// floor(amount_in * 997 * reserve_out / (reserve_in * 1000 + amount_in * 997))
pub fn get_amount_out(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
) -> Result<U256, AmmError> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(AmmError::InsufficientLiquidity);
    }
    if amount_in.is_zero() {
        return Ok(U256::zero());
    }

    let amount_in_with_fee = amount_in
        .checked_mul(U256::from(FEE_NUMERATOR))
        .ok_or(AmmError::Overflow)?;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out)
        .ok_or(AmmError::Overflow)?;
    let denominator = reserve_in
        .checked_mul(U256::from(FEE_DENOMINATOR))
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or(AmmError::Overflow)?;

    Ok(numerator / denominator)
}
