use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdResult, Uint128, Uint256};

/// Decimal precision of every normalized [Rate].
pub const RATE_DECIMALS: u8 = 27;

/// `1.0` at [RATE_DECIMALS] precision (1e27).
pub const RAY: Uint256 = Uint256::from_u128(1_000_000_000_000_000_000_000_000_000);

/// 100% in basis points.
pub const MAX_BPS: u16 = 10_000;

/// Rounding direction of a multiply-divide.
/// Issuance rounds [Rounding::Floor] so it never favors the depositor,
/// burn-for-loss rounds [Rounding::Ceil] so it never favors the protocol.
#[cw_serde]
#[derive(Copy, Eq)]
pub enum Rounding {
    Floor,
    Ceil,
}

/// `value * numerator / denominator` in 256-bit arithmetic with explicit rounding.
pub fn mul_div(
    value: Uint256,
    numerator: Uint256,
    denominator: Uint256,
    rounding: Rounding,
) -> StdResult<Uint256> {
    let product = value.checked_mul(numerator)?;
    let quotient = product.checked_div(denominator)?;
    match rounding {
        Rounding::Ceil if !product.checked_rem(denominator)?.is_zero() => {
            Ok(quotient.checked_add(Uint256::one())?)
        }
        _ => Ok(quotient),
    }
}

/// [mul_div] over [Uint128] operands, the result must fit back into a [Uint128].
pub fn mul_div_u128(
    value: Uint128,
    numerator: Uint128,
    denominator: Uint128,
    rounding: Rounding,
) -> StdResult<Uint128> {
    let result = mul_div(
        Uint256::from(value),
        Uint256::from(numerator),
        Uint256::from(denominator),
        rounding,
    )?;
    Ok(Uint128::try_from(result)?)
}

/// `amount * bps / MAX_BPS`, rounded down.
pub fn bps_of(amount: Uint128, bps: u16) -> StdResult<Uint128> {
    mul_div_u128(
        amount,
        Uint128::from(bps),
        Uint128::from(MAX_BPS),
        Rounding::Floor,
    )
}

/// An exchange rate (value units per asset unit) normalized to [RATE_DECIMALS].
///
/// A zero rate is representable; conversions through it fail with a divide-by-zero,
/// callers are expected to fall back to proportional conversion (see [Rate::is_zero]).
#[cw_serde]
#[derive(Copy, Eq, Default)]
pub struct Rate(Uint256);

impl Rate {
    /// Rescale a `rate` expressed with `decimals` of precision to [RATE_DECIMALS].
    /// Multiplies when the source precision is lower, divides when it is higher.
    pub fn from_source(rate: Uint128, decimals: u8) -> StdResult<Self> {
        let rate = Uint256::from(rate);
        let ten = Uint256::from(10u128);
        let normalized = match decimals.cmp(&RATE_DECIMALS) {
            std::cmp::Ordering::Less => {
                let scale = ten.checked_pow(u32::from(RATE_DECIMALS - decimals))?;
                rate.checked_mul(scale)?
            }
            std::cmp::Ordering::Greater => {
                let scale = ten.checked_pow(u32::from(decimals - RATE_DECIMALS))?;
                rate.checked_div(scale)?
            }
            std::cmp::Ordering::Equal => rate,
        };
        Ok(Self(normalized))
    }

    pub const fn from_ray(ray: Uint256) -> Self {
        Self(ray)
    }

    pub fn ray(&self) -> Uint256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Asset units to value units: `assets * rate / RAY`
    pub fn assets_to_value(&self, assets: Uint128, rounding: Rounding) -> StdResult<Uint128> {
        let value = mul_div(Uint256::from(assets), self.0, RAY, rounding)?;
        Ok(Uint128::try_from(value)?)
    }

    /// Value units to asset units: `value * RAY / rate`
    pub fn value_to_assets(&self, value: Uint128, rounding: Rounding) -> StdResult<Uint128> {
        let assets = mul_div(Uint256::from(value), RAY, self.0, rounding)?;
        Ok(Uint128::try_from(assets)?)
    }

    /// Whether `assets` valued at this rate are worth at least `value`.
    /// Compared exactly as `assets * rate >= value * RAY`, without rounding either side.
    pub fn covers(&self, assets: Uint128, value: Uint128) -> StdResult<bool> {
        let held = Uint256::from(assets).checked_mul(self.0)?;
        let owed = Uint256::from(value).checked_mul(RAY)?;
        Ok(held >= owed)
    }
}
