use crate::error::StrategyError;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Event, MessageInfo, Response, StdResult, Storage, Uint128, Uint256};
use cw_storage_plus::Item;
use vault_library::rate::{Rate, MAX_BPS};
use vault_library::roles;

/// Bounds on the change a single report may book.
#[cw_serde]
pub struct HealthCheck {
    /// Largest accepted increase, in bps of the previous figure. Can exceed 100%.
    pub profit_limit_ratio: u16,
    /// Largest accepted decrease, in bps of the previous figure. Under 100%.
    pub loss_limit_ratio: u16,
    /// When false the next report skips the check and turns it back on.
    pub do_health_check: bool,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            profit_limit_ratio: MAX_BPS,
            loss_limit_ratio: 0,
            do_health_check: true,
        }
    }
}

const HEALTH_CHECK: Item<HealthCheck> = Item::new("health_check");

/// Get the [HealthCheck], defaults if never configured.
pub fn get_health_check(storage: &dyn Storage) -> StdResult<HealthCheck> {
    Ok(HEALTH_CHECK.may_load(storage)?.unwrap_or_default())
}

fn save_health_check(storage: &mut dyn Storage, config: &HealthCheck) -> StdResult<()> {
    HEALTH_CHECK.save(storage, config)
}

/// Change measured by a report.
/// Donating strategies compare total assets, Skimming strategies compare exchange rates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthDelta {
    Assets { previous: Uint128, current: Uint128 },
    Rate { previous: Rate, current: Rate },
}

impl HealthDelta {
    fn bounds(&self) -> Option<(Uint256, Uint256)> {
        match self {
            HealthDelta::Assets { previous, current } => {
                Some((Uint256::from(*previous), Uint256::from(*current)))
            }
            // No rate observed yet, nothing to compare against.
            HealthDelta::Rate { previous, .. } if previous.is_zero() => None,
            HealthDelta::Rate { previous, current } => Some((previous.ray(), current.ray())),
        }
    }
}

/// Fails if `delta` moved by more than the configured ratio, in either direction.
pub fn check(config: &HealthCheck, delta: &HealthDelta) -> Result<(), StrategyError> {
    let Some((previous, current)) = delta.bounds() else {
        return Ok(());
    };
    let max_bps = Uint256::from(MAX_BPS);

    if current > previous {
        let profit = current.checked_sub(previous)?;
        let limit = previous.checked_mul(Uint256::from(config.profit_limit_ratio))?;
        if profit.checked_mul(max_bps)? > limit {
            return Err(StrategyError::health_check("profit over limit"));
        }
    } else if current < previous {
        let loss = previous.checked_sub(current)?;
        let limit = previous.checked_mul(Uint256::from(config.loss_limit_ratio))?;
        if loss.checked_mul(max_bps)? > limit {
            return Err(StrategyError::health_check("loss over limit"));
        }
    }
    Ok(())
}

/// Run the gate for one report.
/// A disabled check is turned back on and skipped, returns whether the delta was checked.
pub fn gate(storage: &mut dyn Storage, delta: &HealthDelta) -> Result<bool, StrategyError> {
    let mut config = get_health_check(storage)?;
    if !config.do_health_check {
        config.do_health_check = true;
        save_health_check(storage, &config)?;
        return Ok(false);
    }
    check(&config, delta)?;
    Ok(true)
}

pub fn set_profit_limit_ratio(
    storage: &mut dyn Storage,
    info: &MessageInfo,
    ratio: u16,
) -> Result<Response, StrategyError> {
    roles::assert_management(storage, info)?;
    if ratio == 0 {
        return Err(StrategyError::invalid_config("profit limit cannot be zero"));
    }

    let mut config = get_health_check(storage)?;
    config.profit_limit_ratio = ratio;
    save_health_check(storage, &config)?;

    Ok(Response::new().add_event(
        Event::new("UpdateProfitLimitRatio").add_attribute("profit_limit_ratio", ratio.to_string()),
    ))
}

pub fn set_loss_limit_ratio(
    storage: &mut dyn Storage,
    info: &MessageInfo,
    ratio: u16,
) -> Result<Response, StrategyError> {
    roles::assert_management(storage, info)?;
    if ratio >= MAX_BPS {
        return Err(StrategyError::invalid_config("loss limit must be under 10000"));
    }

    let mut config = get_health_check(storage)?;
    config.loss_limit_ratio = ratio;
    save_health_check(storage, &config)?;

    Ok(Response::new().add_event(
        Event::new("UpdateLossLimitRatio").add_attribute("loss_limit_ratio", ratio.to_string()),
    ))
}

pub fn set_do_health_check(
    storage: &mut dyn Storage,
    info: &MessageInfo,
    enabled: bool,
) -> Result<Response, StrategyError> {
    roles::assert_management(storage, info)?;

    let mut config = get_health_check(storage)?;
    config.do_health_check = enabled;
    save_health_check(storage, &config)?;

    Ok(Response::new().add_event(
        Event::new("UpdateHealthCheck").add_attribute("do_health_check", enabled.to_string()),
    ))
}
