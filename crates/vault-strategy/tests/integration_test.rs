use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    from_json, Addr, DepsMut, Env, MemoryStorage, Order, OwnedDeps, QuerierWrapper, Record,
    Response, StdError, StdResult, Storage, Uint128,
};
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::rc::Rc;
use vault_library::adapter::{AssetToken, YieldSource};
use vault_library::reentrancy::{self, ReentrancyError};
use vault_library::roles::RoleError;
use vault_library::testing::{MockRate, MockToken, MockYieldSource, ReturnStyle};
use vault_library::token::TokenError;
use vault_library::time::DAYS;
use vault_strategy::contract::{execute, instantiate, query, Adapters, QueryAdapters};
use vault_strategy::health::HealthCheck;
use vault_strategy::msg::{
    ConvertToAssetsResponse, ExecuteMsg, InstantiateMsg, QueryMsg, SharesResponse,
    SkimmingResponse, TotalAssetsResponse, TotalSupplyResponse,
};
use vault_strategy::state::AccountingMode;
use vault_strategy::StrategyError;

struct TestStrategy {
    deps: OwnedDeps<MemoryStorage, MockApi, MockQuerier>,
    env: Env,
    management: Addr,
    keeper: Addr,
    operator: Addr,
    token: MockToken,
    source: MockYieldSource,
    /// Rate with 2 decimals, `100` is 1.0 value per asset.
    rate: MockRate,
}

impl TestStrategy {
    fn init(mode: AccountingMode) -> Self {
        let mut deps = mock_dependencies();
        let env = mock_env();
        let management = deps.api.addr_make("management");
        let keeper = deps.api.addr_make("keeper");
        let operator = deps.api.addr_make("operator");

        let token = MockToken::new();
        let source = MockYieldSource::new(
            deps.api.addr_make("source"),
            env.contract.address.clone(),
            token.clone(),
        );

        let msg = InstantiateMsg {
            name: "Test Strategy".to_string(),
            asset: deps.api.addr_make("asset").to_string(),
            yield_source: Some(source.address().to_string()),
            management: management.to_string(),
            keeper: keeper.to_string(),
            operator: operator.to_string(),
            mode,
            enable_burning: true,
        };
        instantiate(
            deps.as_mut(),
            env.clone(),
            message_info(&management, &[]),
            msg,
        )
        .unwrap();

        Self {
            deps,
            env,
            management,
            keeper,
            operator,
            token,
            source,
            rate: MockRate::new(Uint128::new(100), 2),
        }
    }

    fn execute(&mut self, sender: &Addr, msg: ExecuteMsg) -> Result<Response, StrategyError> {
        let mut asset = self.token.clone();
        let mut source = self.source.clone();
        execute(
            self.deps.as_mut(),
            self.env.clone(),
            message_info(sender, &[]),
            Adapters {
                asset: &mut asset,
                yield_source: Some(&mut source),
                rate: Some(&self.rate),
            },
            msg,
        )
    }

    fn query<T: DeserializeOwned>(&self, msg: QueryMsg) -> T {
        let res = query(
            self.deps.as_ref(),
            self.env.clone(),
            QueryAdapters {
                asset: &self.token,
                yield_source: Some(&self.source),
                rate: Some(&self.rate),
            },
            msg,
        )
        .unwrap();
        from_json(res).unwrap()
    }

    fn user(&self, name: &str) -> Addr {
        self.deps.api.addr_make(name)
    }

    /// Fund `user` with `assets` and approve the strategy to pull them.
    fn fund(&self, user: &Addr, assets: u128) {
        self.token.mint(user, Uint128::new(assets));
        let mut asset = self.token.clone();
        asset
            .approve(user, &self.env.contract.address, Uint128::new(assets))
            .unwrap();
    }

    fn deposit(&mut self, user: &Addr, assets: u128) -> Result<Response, StrategyError> {
        self.fund(user, assets);
        self.execute(
            user,
            ExecuteMsg::Deposit {
                assets: Uint128::new(assets),
                receiver: user.to_string(),
            },
        )
    }

    fn redeem(
        &mut self,
        user: &Addr,
        shares: u128,
        max_loss_bps: Option<u16>,
    ) -> Result<Response, StrategyError> {
        self.execute(
            user,
            ExecuteMsg::Redeem {
                shares: Uint128::new(shares),
                receiver: user.to_string(),
                max_loss_bps,
            },
        )
    }

    fn report(&mut self) -> Result<Response, StrategyError> {
        let keeper = self.keeper.clone();
        self.execute(&keeper, ExecuteMsg::Report {})
    }

    fn management(&mut self, msg: ExecuteMsg) -> Result<Response, StrategyError> {
        let management = self.management.clone();
        self.execute(&management, msg)
    }

    fn shares(&self, holder: &Addr) -> Uint128 {
        let SharesResponse(shares) = self.query(QueryMsg::Shares {
            holder: holder.to_string(),
        });
        shares
    }

    fn total_assets(&self) -> Uint128 {
        let TotalAssetsResponse(total) = self.query(QueryMsg::TotalAssets {});
        total
    }

    fn total_supply(&self) -> Uint128 {
        let TotalSupplyResponse(supply) = self.query(QueryMsg::TotalSupply {});
        supply
    }

    fn skimming(&self) -> SkimmingResponse {
        self.query(QueryMsg::Skimming {})
    }
}

fn attribute(res: &Response, event: &str, key: &str) -> String {
    res.events
        .iter()
        .find(|e| e.ty == event)
        .and_then(|e| e.attributes.iter().find(|a| a.key == key))
        .map(|a| a.value.clone())
        .unwrap()
}

#[test]
fn donating_round_trip() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");

    let res = strategy.deposit(&alice, 10_000).unwrap();
    assert_eq!(attribute(&res, "Deposit", "shares"), "10000");
    assert_eq!(strategy.shares(&alice), Uint128::new(10_000));
    assert_eq!(strategy.total_assets(), Uint128::new(10_000));
    // Deployed on deposit
    assert_eq!(strategy.source.total_assets(), Uint128::new(10_000));
    assert_eq!(strategy.token.balance(&strategy.env.contract.address), Uint128::zero());

    strategy.redeem(&alice, 10_000, None).unwrap();
    assert_eq!(strategy.token.balance(&alice), Uint128::new(10_000));
    assert_eq!(strategy.shares(&alice), Uint128::zero());
    assert_eq!(strategy.total_supply(), Uint128::zero());
    assert_eq!(strategy.total_assets(), Uint128::zero());
}

#[test]
fn deposit_zero_rejected() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");

    let err = strategy.deposit(&alice, 0).unwrap_err();
    assert_eq!(err, StrategyError::zero("Deposit assets cannot be zero"));
}

#[test]
fn mint_pulls_assets_rounded_up() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    let bob = strategy.user("bob");
    strategy.deposit(&alice, 1_500).unwrap();

    // Unburned loss takes the share price to 2/3
    strategy
        .management(ExecuteMsg::SetEnableBurning { enabled: false })
        .unwrap();
    strategy
        .management(ExecuteMsg::SetLossLimitRatio { ratio: 5_000 })
        .unwrap();
    strategy.source.lose(Uint128::new(500));
    strategy.report().unwrap();
    assert_eq!(strategy.total_assets(), Uint128::new(1_000));
    assert_eq!(strategy.total_supply(), Uint128::new(1_500));

    let ConvertToAssetsResponse(needed) = strategy.query(QueryMsg::PreviewMint {
        shares: Uint128::new(4),
    });
    assert_eq!(needed, Uint128::new(3));

    strategy.fund(&bob, 3);
    strategy
        .execute(
            &bob,
            ExecuteMsg::Mint {
                shares: Uint128::new(4),
                receiver: bob.to_string(),
            },
        )
        .unwrap();
    assert_eq!(strategy.shares(&bob), Uint128::new(4));
    assert_eq!(strategy.token.balance(&bob), Uint128::zero());
    assert_eq!(strategy.total_assets(), Uint128::new(1_003));
}

#[test]
fn health_check_profit_limit() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    strategy.deposit(&alice, 10_000).unwrap();

    strategy
        .management(ExecuteMsg::SetProfitLimitRatio { ratio: 1_000 })
        .unwrap();

    // 20% gain over a 10% limit
    strategy.source.gain(Uint128::new(2_000));
    let err = strategy.report().unwrap_err();
    assert_eq!(err, StrategyError::health_check("profit over limit"));
    assert_eq!(strategy.total_assets(), Uint128::new(10_000));
    assert_eq!(strategy.shares(&strategy.operator.clone()), Uint128::zero());

    strategy
        .management(ExecuteMsg::SetDoHealthCheck { enabled: false })
        .unwrap();
    let res = strategy.report().unwrap();
    assert_eq!(attribute(&res, "Reported", "profit"), "2000");
    assert_eq!(attribute(&res, "Reported", "health_checked"), "false");
    assert_eq!(strategy.total_assets(), Uint128::new(12_000));
    assert_eq!(strategy.shares(&strategy.operator.clone()), Uint128::new(2_000));

    let health: HealthCheck = strategy.query(QueryMsg::HealthCheck {});
    assert!(health.do_health_check);
    assert_eq!(health.profit_limit_ratio, 1_000);
}

#[test]
fn donating_loss_burns_operator_shares() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    let operator = strategy.operator.clone();
    strategy.deposit(&alice, 10_000).unwrap();

    strategy.source.gain(Uint128::new(1_000));
    strategy.report().unwrap();
    assert_eq!(strategy.shares(&operator), Uint128::new(1_000));

    strategy.source.lose(Uint128::new(1_100));
    // Default loss limit is 0
    let err = strategy.report().unwrap_err();
    assert_eq!(err, StrategyError::health_check("loss over limit"));

    strategy
        .management(ExecuteMsg::SetLossLimitRatio { ratio: 5_000 })
        .unwrap();
    let res = strategy.report().unwrap();
    assert_eq!(attribute(&res, "Reported", "loss"), "1100");
    // 1100 shares needed, the operator only has 1000
    assert_eq!(attribute(&res, "Reported", "shares_burned"), "1000");
    assert_eq!(strategy.shares(&operator), Uint128::zero());
    assert_eq!(strategy.total_supply(), Uint128::new(10_000));
    assert_eq!(strategy.total_assets(), Uint128::new(9_900));

    let ConvertToAssetsResponse(assets) = strategy.query(QueryMsg::ConvertToAssets {
        shares: Uint128::new(10_000),
    });
    assert_eq!(assets, Uint128::new(9_900));
}

#[test]
fn report_without_burning() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    let operator = strategy.operator.clone();
    strategy.deposit(&alice, 10_000).unwrap();
    strategy.source.gain(Uint128::new(1_000));
    strategy.report().unwrap();

    strategy
        .management(ExecuteMsg::SetEnableBurning { enabled: false })
        .unwrap();
    strategy
        .management(ExecuteMsg::SetLossLimitRatio { ratio: 5_000 })
        .unwrap();
    strategy.source.lose(Uint128::new(1_100));
    strategy.report().unwrap();

    assert_eq!(strategy.shares(&operator), Uint128::new(1_000));
    assert_eq!(strategy.total_supply(), Uint128::new(11_000));
    assert_eq!(strategy.total_assets(), Uint128::new(9_900));
}

#[test]
fn report_only_keeper() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");

    let err = strategy.execute(&alice, ExecuteMsg::Report {}).unwrap_err();
    assert_eq!(
        err,
        StrategyError::Role(RoleError::unauthorized("not keeper"))
    );

    // Management stands in for the keeper
    strategy.management(ExecuteMsg::Report {}).unwrap();
}

#[test]
fn withdraw_loss_tolerance() {
    for (max_loss_bps, accepted) in [(None, false), (Some(10), false), (Some(20), true)] {
        let mut strategy = TestStrategy::init(AccountingMode::Donating);
        let alice = strategy.user("alice");
        strategy.deposit(&alice, 1_000).unwrap();
        strategy.source.set_withdraw_shortfall(Uint128::new(1));

        let res = strategy.execute(
            &alice,
            ExecuteMsg::Withdraw {
                assets: Uint128::new(500),
                receiver: alice.to_string(),
                max_loss_bps,
            },
        );

        if accepted {
            res.unwrap();
            assert_eq!(strategy.token.balance(&alice), Uint128::new(499));
            assert_eq!(strategy.shares(&alice), Uint128::new(500));
            assert_eq!(strategy.total_assets(), Uint128::new(500));
        } else {
            assert_eq!(
                res.unwrap_err(),
                StrategyError::too_much_loss("withdrew 499 of 500")
            );
            assert_eq!(strategy.token.balance(&alice), Uint128::zero());
            assert_eq!(strategy.shares(&alice), Uint128::new(1_000));
            assert_eq!(strategy.total_supply(), Uint128::new(1_000));
            assert_eq!(strategy.total_assets(), Uint128::new(1_000));
        }
    }
}

#[test]
fn withdraw_more_than_max() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    strategy.deposit(&alice, 1_000).unwrap();

    let err = strategy
        .execute(
            &alice,
            ExecuteMsg::Withdraw {
                assets: Uint128::new(1_001),
                receiver: alice.to_string(),
                max_loss_bps: None,
            },
        )
        .unwrap_err();
    assert_eq!(err, StrategyError::exceeds_max("withdraw more than max"));

    strategy.source.set_withdraw_limit(Some(Uint128::new(600)));
    let err = strategy.redeem(&alice, 700, None).unwrap_err();
    assert_eq!(err, StrategyError::exceeds_max("redeem more than max"));
    strategy.redeem(&alice, 600, None).unwrap();
}

#[test]
fn transfer_shares() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    let bob = strategy.user("bob");
    strategy.deposit(&alice, 1_000).unwrap();

    let err = strategy
        .execute(
            &alice,
            ExecuteMsg::Transfer {
                recipient: bob.to_string(),
                amount: Uint128::zero(),
            },
        )
        .unwrap_err();
    assert_eq!(err, StrategyError::zero("Transfer amount cannot be zero"));

    strategy
        .execute(
            &alice,
            ExecuteMsg::Transfer {
                recipient: bob.to_string(),
                amount: Uint128::new(400),
            },
        )
        .unwrap();
    assert_eq!(strategy.shares(&alice), Uint128::new(600));
    assert_eq!(strategy.shares(&bob), Uint128::new(400));
    assert_eq!(strategy.total_supply(), Uint128::new(1_000));
}

#[test]
fn skimming_solvency_boundary() {
    let mut strategy = TestStrategy::init(AccountingMode::Skimming);
    let alice = strategy.user("alice");
    strategy.deposit(&alice, 1_000).unwrap();

    let skimming = strategy.skimming();
    assert_eq!(skimming.user_debt, Uint128::new(1_000));
    assert_eq!(skimming.operator_debt, Uint128::zero());
    assert!(!skimming.insolvent);

    // 1000 assets at 0.99 are worth 990
    strategy.rate.set(Uint128::new(99));
    assert!(strategy.skimming().insolvent);
    let ConvertToAssetsResponse(max) = strategy.query(QueryMsg::MaxDeposit {});
    assert_eq!(max, Uint128::zero());
    let err = strategy.deposit(&alice, 100).unwrap_err();
    assert_eq!(err, StrategyError::Insolvent {});

    // Exactly covered is solvent
    strategy.rate.set(Uint128::new(100));
    assert!(!strategy.skimming().insolvent);
    strategy.deposit(&alice, 100).unwrap();
}

#[test]
fn skimming_report_captures_surplus() {
    let mut strategy = TestStrategy::init(AccountingMode::Skimming);
    let alice = strategy.user("alice");
    let operator = strategy.operator.clone();
    strategy.deposit(&alice, 1_000).unwrap();

    strategy.rate.set(Uint128::new(120));
    let res = strategy.report().unwrap();
    assert_eq!(attribute(&res, "Reported", "profit"), "200");
    assert_eq!(strategy.shares(&operator), Uint128::new(200));

    let skimming = strategy.skimming();
    assert_eq!(skimming.user_debt, Uint128::new(1_000));
    assert_eq!(skimming.operator_debt, Uint128::new(200));
    assert_eq!(skimming.last_rate, skimming.current_rate);

    // Rate falls back to 1.0: 1000 value against 1200 debt
    strategy.rate.set(Uint128::new(100));
    assert!(strategy.skimming().insolvent);

    let err = strategy.redeem(&operator, 200, None).unwrap_err();
    assert_eq!(err, StrategyError::Insolvent {});
    let ConvertToAssetsResponse(max) = strategy.query(QueryMsg::MaxWithdraw {
        owner: operator.to_string(),
    });
    assert_eq!(max, Uint128::zero());

    // Depositors exit at the proportional price
    strategy.redeem(&alice, 600, None).unwrap();
    assert_eq!(strategy.token.balance(&alice), Uint128::new(500));
    assert_eq!(strategy.skimming().user_debt, Uint128::new(400));
}

#[test]
fn skimming_operator_cannot_receive_deposits() {
    let mut strategy = TestStrategy::init(AccountingMode::Skimming);
    let alice = strategy.user("alice");
    let operator = strategy.operator.clone();

    strategy.fund(&alice, 100);
    let err = strategy
        .execute(
            &alice,
            ExecuteMsg::Deposit {
                assets: Uint128::new(100),
                receiver: operator.to_string(),
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        StrategyError::unauthorized("operator cannot receive deposits")
    );
}

#[test]
fn skimming_transfer_moves_debt() {
    let mut strategy = TestStrategy::init(AccountingMode::Skimming);
    let alice = strategy.user("alice");
    let operator = strategy.operator.clone();
    strategy.deposit(&alice, 1_000).unwrap();
    strategy.rate.set(Uint128::new(150));
    strategy.report().unwrap();

    strategy
        .execute(
            &operator,
            ExecuteMsg::Transfer {
                recipient: alice.to_string(),
                amount: Uint128::new(100),
            },
        )
        .unwrap();
    let skimming = strategy.skimming();
    assert_eq!(skimming.user_debt, Uint128::new(1_100));
    assert_eq!(skimming.operator_debt, Uint128::new(400));

    let err = strategy
        .execute(
            &operator,
            ExecuteMsg::Transfer {
                recipient: operator.to_string(),
                amount: Uint128::new(100),
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        StrategyError::unauthorized("operator cannot transfer to itself")
    );
}

#[test]
fn operator_debt_migration() {
    let mut strategy = TestStrategy::init(AccountingMode::Skimming);
    let alice = strategy.user("alice");
    let bob = strategy.user("bob");
    let operator = strategy.operator.clone();
    strategy.deposit(&alice, 1_000).unwrap();

    // Operator captures X = 500
    strategy.rate.set(Uint128::new(150));
    strategy.report().unwrap();
    assert_eq!(strategy.shares(&operator), Uint128::new(500));

    // Bob holds Y = 450 as a depositor
    strategy.deposit(&bob, 300).unwrap();
    assert_eq!(strategy.shares(&bob), Uint128::new(450));

    let before = strategy.skimming();
    assert_eq!(before.user_debt, Uint128::new(1_450));
    assert_eq!(before.operator_debt, Uint128::new(500));

    strategy
        .management(ExecuteMsg::SetOperator {
            operator: bob.to_string(),
        })
        .unwrap();
    let err = strategy
        .execute(&alice, ExecuteMsg::FinalizeOperatorChange {})
        .unwrap_err();
    assert_eq!(err, StrategyError::Cooldown {});

    strategy.env.block.time = strategy.env.block.time.plus_seconds(14 * DAYS);
    strategy
        .execute(&alice, ExecuteMsg::FinalizeOperatorChange {})
        .unwrap();

    let new_operator: Addr = strategy.query(QueryMsg::Operator {});
    assert_eq!(new_operator, bob);
    let pending: Option<vault_strategy::operator::PendingOperator> =
        strategy.query(QueryMsg::PendingOperator {});
    assert_eq!(pending, None);

    let after = strategy.skimming();
    assert_eq!(after.user_debt, Uint128::new(1_500));
    assert_eq!(after.operator_debt, Uint128::new(450));
    assert_eq!(
        after.user_debt + after.operator_debt,
        before.user_debt + before.operator_debt
    );
}

#[test]
fn shutdown_and_emergency_withdraw() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    strategy.deposit(&alice, 1_000).unwrap();

    let err = strategy
        .management(ExecuteMsg::EmergencyWithdraw {
            amount: Uint128::new(400),
        })
        .unwrap_err();
    assert_eq!(err, StrategyError::NotShutdown {});

    strategy.management(ExecuteMsg::Shutdown {}).unwrap();
    let err = strategy.management(ExecuteMsg::Shutdown {}).unwrap_err();
    assert_eq!(err, StrategyError::Shutdown {});

    let err = strategy.deposit(&alice, 100).unwrap_err();
    assert_eq!(err, StrategyError::exceeds_max("deposit more than max"));

    strategy
        .management(ExecuteMsg::EmergencyWithdraw {
            amount: Uint128::new(400),
        })
        .unwrap();
    let this = strategy.env.contract.address.clone();
    assert_eq!(strategy.token.balance(&this), Uint128::new(400));
    assert_eq!(strategy.source.total_assets(), Uint128::new(600));
    assert_eq!(strategy.total_assets(), Uint128::new(1_000));

    strategy.redeem(&alice, 1_000, None).unwrap();
    assert_eq!(strategy.token.balance(&alice), Uint128::new(1_100));
}

#[test]
fn yield_source_must_be_provided() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    let mut asset = strategy.token.clone();

    let err = execute(
        strategy.deps.as_mut(),
        strategy.env.clone(),
        message_info(&alice, &[]),
        Adapters {
            asset: &mut asset,
            yield_source: None,
            rate: None,
        },
        ExecuteMsg::Deposit {
            assets: Uint128::new(100),
            receiver: alice.to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        StrategyError::invalid_config("yield source not provided")
    );
}

#[test]
fn reentrant_call_rejected() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");

    reentrancy::enter(strategy.deps.as_mut().storage).unwrap();
    let err = strategy.deposit(&alice, 100).unwrap_err();
    assert_eq!(err, StrategyError::Reentrancy(ReentrancyError::Reentered));
}

#[test]
fn failed_payout_leaves_books_unchanged() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    strategy.deposit(&alice, 1_000).unwrap();

    strategy.token.set_return_style(ReturnStyle::False);
    let err = strategy.redeem(&alice, 400, None).unwrap_err();
    assert_eq!(
        err,
        StrategyError::Token(TokenError::failed("transfer", "returned false"))
    );
    assert_eq!(strategy.shares(&alice), Uint128::new(1_000));
    assert_eq!(strategy.total_supply(), Uint128::new(1_000));
    assert_eq!(strategy.total_assets(), Uint128::new(1_000));
    assert_eq!(strategy.token.balance(&alice), Uint128::zero());

    // The freed assets wait idle in the strategy
    let this = strategy.env.contract.address.clone();
    assert_eq!(strategy.token.balance(&this), Uint128::new(400));
    assert_eq!(strategy.source.total_assets(), Uint128::new(600));

    strategy.token.set_return_style(ReturnStyle::Standard);
    strategy.redeem(&alice, 400, None).unwrap();
    assert_eq!(strategy.token.balance(&alice), Uint128::new(400));
    assert_eq!(strategy.shares(&alice), Uint128::new(600));
    assert_eq!(strategy.total_assets(), Uint128::new(600));
}

#[test]
fn deposit_refunded_when_source_refuses() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    strategy.source.set_paused(true);

    let err = strategy.deposit(&alice, 1_000).unwrap_err();
    assert_eq!(
        err,
        StrategyError::Std(StdError::generic_err("yield source paused"))
    );
    let this = strategy.env.contract.address.clone();
    assert_eq!(strategy.token.balance(&alice), Uint128::new(1_000));
    assert_eq!(strategy.token.balance(&this), Uint128::zero());
    assert_eq!(
        strategy.token.allowance(&this, &strategy.source.address()).unwrap(),
        Uint128::zero()
    );
    assert_eq!(strategy.shares(&alice), Uint128::zero());
    assert_eq!(strategy.total_supply(), Uint128::zero());
    assert_eq!(strategy.total_assets(), Uint128::zero());

    let mut asset = strategy.token.clone();
    asset.approve(&alice, &this, Uint128::new(500)).unwrap();
    let mint = strategy.execute(
        &alice,
        ExecuteMsg::Mint {
            shares: Uint128::new(500),
            receiver: alice.to_string(),
        },
    );
    assert_eq!(
        mint.unwrap_err(),
        StrategyError::Std(StdError::generic_err("yield source paused"))
    );
    assert_eq!(strategy.token.balance(&alice), Uint128::new(1_000));
    assert_eq!(strategy.shares(&alice), Uint128::zero());
}

#[test]
fn failed_redeploy_on_report_books_nothing() {
    let mut strategy = TestStrategy::init(AccountingMode::Donating);
    let alice = strategy.user("alice");
    let operator = strategy.operator.clone();
    strategy.deposit(&alice, 1_000).unwrap();

    // Rewards land idle and cannot be put back to work
    let this = strategy.env.contract.address.clone();
    strategy.token.mint(&this, Uint128::new(100));
    strategy.source.set_paused(true);

    let err = strategy.report().unwrap_err();
    assert_eq!(
        err,
        StrategyError::Std(StdError::generic_err("yield source paused"))
    );
    assert_eq!(strategy.total_assets(), Uint128::new(1_000));
    assert_eq!(strategy.total_supply(), Uint128::new(1_000));
    assert_eq!(strategy.shares(&operator), Uint128::zero());

    strategy.source.set_paused(false);
    let res = strategy.report().unwrap();
    assert_eq!(attribute(&res, "Reported", "profit"), "100");
    assert_eq!(strategy.total_assets(), Uint128::new(1_100));
    assert_eq!(strategy.source.total_assets(), Uint128::new(1_100));
}

/// Storage handle shared by an outer call and a call a collaborator makes back into the strategy.
#[derive(Clone, Default)]
struct SharedStorage(Rc<RefCell<MemoryStorage>>);

impl Storage for SharedStorage {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.borrow().get(key)
    }

    fn range<'a>(
        &'a self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'a> {
        let records: Vec<Record> = self.0.borrow().range(start, end, order).collect();
        Box::new(records.into_iter())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.0.borrow_mut().set(key, value)
    }

    fn remove(&mut self, key: &[u8]) {
        self.0.borrow_mut().remove(key)
    }
}

fn shared_deps<'a>(
    storage: &'a mut SharedStorage,
    api: &'a MockApi,
    querier: &'a MockQuerier,
) -> DepsMut<'a> {
    DepsMut {
        storage,
        api,
        querier: QuerierWrapper::new(querier),
    }
}

/// Asset token that calls `msg` back into the strategy from inside `transfer_from`.
struct CallbackToken {
    inner: MockToken,
    storage: SharedStorage,
    env: Env,
    caller: Addr,
    msg: ExecuteMsg,
    outcome: Rc<RefCell<Option<Result<Response, StrategyError>>>>,
}

impl CallbackToken {
    fn call_back(&self) {
        let api = MockApi::default();
        let querier: MockQuerier = MockQuerier::new(&[]);
        let mut storage = self.storage.clone();
        let mut asset = self.inner.clone();
        let res = execute(
            shared_deps(&mut storage, &api, &querier),
            self.env.clone(),
            message_info(&self.caller, &[]),
            Adapters {
                asset: &mut asset,
                yield_source: None,
                rate: None,
            },
            self.msg.clone(),
        );
        *self.outcome.borrow_mut() = Some(res);
    }
}

impl AssetToken for CallbackToken {
    fn balance_of(&self, account: &Addr) -> StdResult<Uint128> {
        self.inner.balance_of(account)
    }

    fn allowance(&self, owner: &Addr, spender: &Addr) -> StdResult<Uint128> {
        self.inner.allowance(owner, spender)
    }

    fn transfer(
        &mut self,
        sender: &Addr,
        recipient: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<bool>> {
        self.inner.transfer(sender, recipient, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Addr,
        owner: &Addr,
        recipient: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<bool>> {
        self.call_back();
        self.inner.transfer_from(spender, owner, recipient, amount)
    }

    fn approve(
        &mut self,
        owner: &Addr,
        spender: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<bool>> {
        self.inner.approve(owner, spender, amount)
    }
}

#[test]
fn collaborator_callback_rejected() {
    let api = MockApi::default();
    let querier: MockQuerier = MockQuerier::new(&[]);
    let env = mock_env();
    let storage = SharedStorage::default();
    let mut outer = storage.clone();

    let management = api.addr_make("management");
    let alice = api.addr_make("alice");
    let token = MockToken::new();
    let mut source =
        MockYieldSource::new(api.addr_make("source"), env.contract.address.clone(), token.clone());

    instantiate(
        shared_deps(&mut outer, &api, &querier),
        env.clone(),
        message_info(&management, &[]),
        InstantiateMsg {
            name: "Test Strategy".to_string(),
            asset: api.addr_make("asset").to_string(),
            yield_source: Some(source.address().to_string()),
            management: management.to_string(),
            keeper: api.addr_make("keeper").to_string(),
            operator: api.addr_make("operator").to_string(),
            mode: AccountingMode::Donating,
            enable_burning: true,
        },
    )
    .unwrap();

    token.mint(&alice, Uint128::new(1_500));
    let mut handle = token.clone();
    handle
        .approve(&alice, &env.contract.address, Uint128::new(1_500))
        .unwrap();

    // The token tries to redeem on alice's behalf while her deposit is being pulled
    let outcome = Rc::new(RefCell::new(None));
    let mut asset = CallbackToken {
        inner: token.clone(),
        storage: storage.clone(),
        env: env.clone(),
        caller: alice.clone(),
        msg: ExecuteMsg::Redeem {
            shares: Uint128::new(1),
            receiver: alice.to_string(),
            max_loss_bps: None,
        },
        outcome: outcome.clone(),
    };
    let res = execute(
        shared_deps(&mut outer, &api, &querier),
        env.clone(),
        message_info(&alice, &[]),
        Adapters {
            asset: &mut asset,
            yield_source: Some(&mut source),
            rate: None,
        },
        ExecuteMsg::Deposit {
            assets: Uint128::new(1_000),
            receiver: alice.to_string(),
        },
    )
    .unwrap();
    assert_eq!(attribute(&res, "Deposit", "shares"), "1000");

    let inner = outcome.borrow_mut().take();
    assert_eq!(
        inner,
        Some(Err(StrategyError::Reentrancy(ReentrancyError::Reentered)))
    );
    assert!(!reentrancy::is_entered(&outer).unwrap());

    // Outside of a guarded call the same entry point works
    let mut plain = token.clone();
    execute(
        shared_deps(&mut outer, &api, &querier),
        env.clone(),
        message_info(&alice, &[]),
        Adapters {
            asset: &mut plain,
            yield_source: Some(&mut source),
            rate: None,
        },
        ExecuteMsg::Deposit {
            assets: Uint128::new(500),
            receiver: alice.to_string(),
        },
    )
    .unwrap();
    assert_eq!(token.balance(&alice), Uint128::zero());
    assert_eq!(source.total_assets(), Uint128::new(1_500));
}
