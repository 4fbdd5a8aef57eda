use crate::state::{StrategyParams, VaultState};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Uint128;

#[cw_serde]
pub struct InstantiateMsg {
    /// The address of the `management`, it configures the vault and its strategies.
    pub management: String,
    /// The address of the `keeper`, it rebalances debt and processes reports.
    pub keeper: String,
    /// Idle floor kept out of strategies.
    pub minimum_total_idle: Uint128,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// ExecuteMsg Deposit assets from the sender into the idle reserve.
    /// The sender must have approved the vault for `amount`.
    Deposit { amount: Uint128 },

    /// ExecuteMsg AddStrategy activates a strategy with a `max_debt` of zero.
    /// Only callable by the `management`.
    AddStrategy { strategy: String },

    /// ExecuteMsg RevokeStrategy removes a strategy that no longer holds any debt.
    /// Only callable by the `management`.
    RevokeStrategy { strategy: String },

    /// ExecuteMsg UpdateMaxDebt sets the cap of a strategy's debt.
    /// Only callable by the `management`.
    UpdateMaxDebt {
        strategy: String,
        max_debt: Uint128,
    },

    /// ExecuteMsg SetMinimumTotalIdle sets the idle floor.
    /// Only callable by the `management`.
    SetMinimumTotalIdle { amount: Uint128 },

    /// ExecuteMsg Shutdown stops deposits and forces every debt update toward zero.
    /// Only callable by the `management`, cannot be undone.
    Shutdown {},

    /// ExecuteMsg UpdateDebt rebalances a strategy toward `target_debt`.
    /// `max_loss_bps` defaults to 10_000 (any loss accepted).
    /// Only callable by the `keeper`.
    UpdateDebt {
        strategy: String,
        target_debt: Uint128,
        max_loss_bps: Option<u16>,
    },

    /// ExecuteMsg ProcessReport books the gain or loss of a strategy into its debt.
    /// Only callable by the `keeper`.
    ProcessReport { strategy: String },

    /// ExecuteMsg SetManagement replaces the `management`.
    SetManagement { management: String },

    /// ExecuteMsg SetKeeper replaces the `keeper`.
    SetKeeper { keeper: String },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// QueryMsg VaultState: get the idle, debt and floor of the vault.
    #[returns(VaultStateResponse)]
    VaultState {},

    /// QueryMsg Strategy: get the debt record of an active strategy.
    #[returns(StrategyResponse)]
    Strategy { strategy: String },

    /// QueryMsg TotalAssets: get `total_idle + total_debt`.
    #[returns(TotalAssetsResponse)]
    TotalAssets {},

    /// QueryMsg UnrealisedLosses: the loss the vault would take withdrawing `assets_needed`.
    /// Requires the strategy adapter.
    #[returns(UnrealisedLossesResponse)]
    UnrealisedLosses {
        strategy: String,
        assets_needed: Uint128,
    },
}

#[cw_serde]
pub struct VaultStateResponse(pub VaultState);

#[cw_serde]
pub struct StrategyResponse(pub StrategyParams);

/// This is just a wrapper around `Uint128`, so that the schema can be generated.
#[cw_serde]
pub struct TotalAssetsResponse(pub Uint128);

/// This is just a wrapper around `Uint128`, so that the schema can be generated.
#[cw_serde]
pub struct UnrealisedLossesResponse(pub Uint128);
