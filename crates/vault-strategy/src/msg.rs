use crate::health::HealthCheck;
use crate::operator::PendingOperator;
use crate::state::AccountingMode;
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128};
use vault_library::rate::Rate;

#[cw_serde]
pub struct InstantiateMsg {
    pub name: String,
    /// The address of the asset token held by the strategy.
    pub asset: String,
    /// The address of the yield source idle assets are deployed to, if any.
    pub yield_source: Option<String>,
    /// The address of the `management`, configures the strategy.
    pub management: String,
    /// The address of the `keeper`, triggers reports.
    pub keeper: String,
    /// The address of the `operator`, receives the captured profit.
    pub operator: String,
    /// Accounting mode, cannot be changed after instantiation.
    pub mode: AccountingMode,
    /// Burn operator shares to cover reported losses.
    pub enable_burning: bool,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// ExecuteMsg Deposit `assets` from the sender, shares are minted to `receiver`.
    Deposit { assets: Uint128, receiver: String },

    /// ExecuteMsg Mint exactly `shares` to `receiver`, the assets needed are pulled from the sender.
    Mint { shares: Uint128, receiver: String },

    /// ExecuteMsg Withdraw `assets` to `receiver`, burning the sender's shares.
    /// `max_loss_bps` defaults to 0: any shortfall freeing the assets fails the withdrawal.
    Withdraw {
        assets: Uint128,
        receiver: String,
        max_loss_bps: Option<u16>,
    },

    /// ExecuteMsg Redeem `shares` of the sender for assets sent to `receiver`.
    /// `max_loss_bps` defaults to 10_000: any shortfall is accepted.
    Redeem {
        shares: Uint128,
        receiver: String,
        max_loss_bps: Option<u16>,
    },

    /// ExecuteMsg Transfer `amount` of the sender's shares to `recipient`.
    Transfer { recipient: String, amount: Uint128 },

    /// ExecuteMsg Report harvests the yield source and books the profit or loss.
    /// Only callable by the `keeper`.
    Report {},

    /// ExecuteMsg SetProfitLimitRatio, in bps. Only callable by the `management`.
    SetProfitLimitRatio { ratio: u16 },

    /// ExecuteMsg SetLossLimitRatio, in bps, under 10_000. Only callable by the `management`.
    SetLossLimitRatio { ratio: u16 },

    /// ExecuteMsg SetDoHealthCheck, a disabled check is re-enabled by the next report.
    /// Only callable by the `management`.
    SetDoHealthCheck { enabled: bool },

    /// ExecuteMsg SetEnableBurning. Only callable by the `management`.
    SetEnableBurning { enabled: bool },

    /// ExecuteMsg SetOperator starts an operator change, effective after a 14 day cooldown.
    /// Only callable by the `management`.
    SetOperator { operator: String },

    /// ExecuteMsg CancelOperatorChange drops the pending operator change.
    /// Only callable by the `management`.
    CancelOperatorChange {},

    /// ExecuteMsg FinalizeOperatorChange completes the pending change once the cooldown has elapsed.
    FinalizeOperatorChange {},

    /// ExecuteMsg Shutdown stops deposits, withdrawals and reports keep working.
    /// Only callable by the `management`, cannot be undone.
    Shutdown {},

    /// ExecuteMsg EmergencyWithdraw frees `amount` from the yield source back to idle.
    /// Only callable by the `management` once shut down.
    EmergencyWithdraw { amount: Uint128 },

    /// ExecuteMsg SetManagement replaces the `management`.
    SetManagement { management: String },

    /// ExecuteMsg SetKeeper replaces the `keeper`.
    SetKeeper { keeper: String },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// QueryMsg Shares: get the shares of a holder.
    #[returns(SharesResponse)]
    Shares { holder: String },

    /// QueryMsg TotalSupply: get the total shares in circulation.
    #[returns(TotalSupplyResponse)]
    TotalSupply {},

    /// QueryMsg TotalAssets: get the assets accounted by the strategy.
    #[returns(TotalAssetsResponse)]
    TotalAssets {},

    /// QueryMsg ConvertToShares: convert assets to shares, rounded down.
    #[returns(ConvertToSharesResponse)]
    ConvertToShares { assets: Uint128 },

    /// QueryMsg ConvertToAssets: convert shares to assets, rounded down.
    #[returns(ConvertToAssetsResponse)]
    ConvertToAssets { shares: Uint128 },

    /// QueryMsg PreviewDeposit: shares minted for depositing `assets`.
    #[returns(ConvertToSharesResponse)]
    PreviewDeposit { assets: Uint128 },

    /// QueryMsg PreviewMint: assets needed to mint `shares`, rounded up.
    #[returns(ConvertToAssetsResponse)]
    PreviewMint { shares: Uint128 },

    /// QueryMsg PreviewWithdraw: shares burned withdrawing `assets`, rounded up.
    #[returns(ConvertToSharesResponse)]
    PreviewWithdraw { assets: Uint128 },

    /// QueryMsg PreviewRedeem: assets returned redeeming `shares`.
    #[returns(ConvertToAssetsResponse)]
    PreviewRedeem { shares: Uint128 },

    /// QueryMsg MaxDeposit: assets that can be deposited.
    #[returns(ConvertToAssetsResponse)]
    MaxDeposit {},

    /// QueryMsg MaxMint: shares that can be minted.
    #[returns(ConvertToSharesResponse)]
    MaxMint {},

    /// QueryMsg MaxWithdraw: assets `owner` can withdraw.
    #[returns(ConvertToAssetsResponse)]
    MaxWithdraw { owner: String },

    /// QueryMsg MaxRedeem: shares `owner` can redeem.
    #[returns(ConvertToSharesResponse)]
    MaxRedeem { owner: String },

    /// QueryMsg AvailableDepositLimit: assets the yield source can take.
    #[returns(ConvertToAssetsResponse)]
    AvailableDepositLimit {},

    /// QueryMsg AvailableWithdrawLimit: assets that can leave the strategy.
    #[returns(ConvertToAssetsResponse)]
    AvailableWithdrawLimit {},

    /// QueryMsg HealthCheck: get the health check limits.
    #[returns(HealthCheck)]
    HealthCheck {},

    /// QueryMsg Operator: get the current operator.
    #[returns(Addr)]
    Operator {},

    /// QueryMsg PendingOperator: get the pending operator change, if any.
    #[returns(Option<PendingOperator>)]
    PendingOperator {},

    /// QueryMsg Skimming: get the value-debt counters of a Skimming strategy.
    #[returns(SkimmingResponse)]
    Skimming {},

    /// QueryMsg StrategyInfo: get the strategy information.
    #[returns(StrategyInfoResponse)]
    StrategyInfo {},
}

/// This is just a wrapper around `Uint128`, so that the schema can be generated.
#[cw_serde]
pub struct SharesResponse(pub Uint128);

/// This is just a wrapper around `Uint128`, so that the schema can be generated.
#[cw_serde]
pub struct TotalSupplyResponse(pub Uint128);

/// This is just a wrapper around `Uint128`, so that the schema can be generated.
#[cw_serde]
pub struct TotalAssetsResponse(pub Uint128);

/// Amount of shares.
/// This is just a wrapper around `Uint128`, so that the schema can be generated.
#[cw_serde]
pub struct ConvertToSharesResponse(pub Uint128);

/// Amount of assets.
/// This is just a wrapper around `Uint128`, so that the schema can be generated.
#[cw_serde]
pub struct ConvertToAssetsResponse(pub Uint128);

#[cw_serde]
pub struct SkimmingResponse {
    pub user_debt: Uint128,
    pub operator_debt: Uint128,
    pub last_rate: Rate,
    /// Rate read for this query.
    pub current_rate: Rate,
    pub insolvent: bool,
}

#[cw_serde]
pub struct StrategyInfoResponse {
    pub name: String,
    pub asset: Addr,
    pub yield_source: Option<Addr>,
    pub mode: AccountingMode,
    pub management: Addr,
    pub keeper: Addr,
    pub operator: Addr,
    pub total_assets: Uint128,
    pub total_supply: Uint128,
    /// Unix seconds of the last report.
    pub last_report: u64,
    pub enable_burning: bool,
    pub shutdown: bool,

    /// The name of the strategy contract, see [`cw2::set_contract_version`] for more information.
    pub contract: String,

    /// The version of the strategy contract, see [`cw2::set_contract_version`] for more information.
    pub version: String,
}
