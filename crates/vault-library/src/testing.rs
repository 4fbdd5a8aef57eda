#![cfg(not(target_arch = "wasm32"))]
// Only exposed on unit and integration testing, not compiled to Wasm.

use crate::adapter::{AssetToken, RateSource, YieldSource};
use crate::rate::{mul_div_u128, Rounding};
use cosmwasm_std::{Addr, StdError, StdResult, Uint128};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// How the [MockToken] answers mutating calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnStyle {
    /// Moves the tokens and returns `Some(true)`.
    #[default]
    Standard,
    /// Moves nothing and returns `Some(false)`.
    False,
    /// Moves the tokens and returns nothing.
    Silent,
    /// Moves nothing and returns nothing.
    SilentNoop,
}

#[derive(Debug, Default)]
struct TokenLedger {
    balances: BTreeMap<Addr, Uint128>,
    allowances: BTreeMap<(Addr, Addr), Uint128>,
    style: ReturnStyle,
    require_zero_allowance: bool,
}

/// In-memory asset token. Clones share the same ledger,
/// so a test can keep a handle while another clone is lent to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockToken(Rc<RefCell<TokenLedger>>);

impl MockToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self, to: &Addr, amount: Uint128) {
        let mut ledger = self.0.borrow_mut();
        let balance = ledger.balances.entry(to.clone()).or_default();
        *balance += amount;
    }

    pub fn burn(&self, from: &Addr, amount: Uint128) {
        let mut ledger = self.0.borrow_mut();
        let balance = ledger.balances.entry(from.clone()).or_default();
        *balance = balance.saturating_sub(amount);
    }

    pub fn balance(&self, account: &Addr) -> Uint128 {
        self.0
            .borrow()
            .balances
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_return_style(&self, style: ReturnStyle) {
        self.0.borrow_mut().style = style;
    }

    /// Refuse to change a non-zero allowance to another non-zero value.
    pub fn set_require_zero_allowance(&self, required: bool) {
        self.0.borrow_mut().require_zero_allowance = required;
    }

    fn style(&self) -> ReturnStyle {
        self.0.borrow().style
    }

    fn move_balance(&self, from: &Addr, to: &Addr, amount: Uint128) -> StdResult<()> {
        let mut ledger = self.0.borrow_mut();
        let from_balance = ledger.balances.get(from).copied().unwrap_or_default();
        let remaining = from_balance
            .checked_sub(amount)
            .map_err(|_| StdError::generic_err("insufficient balance"))?;
        ledger.balances.insert(from.clone(), remaining);
        let to_balance = ledger.balances.entry(to.clone()).or_default();
        *to_balance = to_balance.checked_add(amount)?;
        Ok(())
    }

    fn spend_allowance(&self, owner: &Addr, spender: &Addr, amount: Uint128) -> StdResult<()> {
        let mut ledger = self.0.borrow_mut();
        let key = (owner.clone(), spender.clone());
        let allowance = ledger.allowances.get(&key).copied().unwrap_or_default();
        let remaining = allowance
            .checked_sub(amount)
            .map_err(|_| StdError::generic_err("insufficient allowance"))?;
        ledger.allowances.insert(key, remaining);
        Ok(())
    }

    fn moved(&self) -> Option<bool> {
        match self.style() {
            ReturnStyle::Silent => None,
            _ => Some(true),
        }
    }
}

impl AssetToken for MockToken {
    fn balance_of(&self, account: &Addr) -> StdResult<Uint128> {
        Ok(self.balance(account))
    }

    fn allowance(&self, owner: &Addr, spender: &Addr) -> StdResult<Uint128> {
        Ok(self
            .0
            .borrow()
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_default())
    }

    fn transfer(
        &mut self,
        sender: &Addr,
        recipient: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<bool>> {
        match self.style() {
            ReturnStyle::False => return Ok(Some(false)),
            ReturnStyle::SilentNoop => return Ok(None),
            _ => {}
        }
        self.move_balance(sender, recipient, amount)?;
        Ok(self.moved())
    }

    fn transfer_from(
        &mut self,
        spender: &Addr,
        owner: &Addr,
        recipient: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<bool>> {
        match self.style() {
            ReturnStyle::False => return Ok(Some(false)),
            ReturnStyle::SilentNoop => return Ok(None),
            _ => {}
        }
        self.spend_allowance(owner, spender, amount)?;
        self.move_balance(owner, recipient, amount)?;
        Ok(self.moved())
    }

    fn approve(
        &mut self,
        owner: &Addr,
        spender: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<bool>> {
        match self.style() {
            ReturnStyle::False => return Ok(Some(false)),
            ReturnStyle::SilentNoop => return Ok(None),
            _ => {}
        }
        let current = self.allowance(owner, spender)?;
        if self.0.borrow().require_zero_allowance && !current.is_zero() && !amount.is_zero() {
            return Ok(Some(false));
        }
        self.0
            .borrow_mut()
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
        Ok(self.moved())
    }
}

#[derive(Debug, Default)]
struct SourceState {
    shares: Uint128,
    max_deposit: Option<Uint128>,
    withdraw_limit: Option<Uint128>,
    withdraw_shortfall: Uint128,
    withdraw_bonus: Uint128,
    paused: bool,
}

/// In-memory ERC-4626 style yield source with a single depositor.
/// Its assets are whatever [MockToken] balance its `address` holds,
/// so [MockYieldSource::gain] and [MockYieldSource::lose] move the share price.
#[derive(Debug, Clone)]
pub struct MockYieldSource {
    address: Addr,
    depositor: Addr,
    token: MockToken,
    state: Rc<RefCell<SourceState>>,
}

impl MockYieldSource {
    pub fn new(address: Addr, depositor: Addr, token: MockToken) -> Self {
        Self {
            address,
            depositor,
            token,
            state: Rc::default(),
        }
    }

    /// Total assets held by the source.
    pub fn total_assets(&self) -> Uint128 {
        self.token.balance(&self.address)
    }

    pub fn gain(&self, assets: Uint128) {
        self.token.mint(&self.address, assets);
    }

    pub fn lose(&self, assets: Uint128) {
        self.token.burn(&self.address, assets);
    }

    pub fn set_max_deposit(&self, max: Option<Uint128>) {
        self.state.borrow_mut().max_deposit = max;
    }

    pub fn set_withdraw_limit(&self, limit: Option<Uint128>) {
        self.state.borrow_mut().withdraw_limit = limit;
    }

    /// Deliver `shortfall` fewer assets than requested on every withdraw.
    pub fn set_withdraw_shortfall(&self, shortfall: Uint128) {
        self.state.borrow_mut().withdraw_shortfall = shortfall;
    }

    /// Deliver `bonus` more assets than requested on every withdraw.
    pub fn set_withdraw_bonus(&self, bonus: Uint128) {
        self.state.borrow_mut().withdraw_bonus = bonus;
    }

    /// Fail every deposit and withdraw without moving anything.
    pub fn set_paused(&self, paused: bool) {
        self.state.borrow_mut().paused = paused;
    }

    fn assert_not_paused(&self) -> StdResult<()> {
        if self.state.borrow().paused {
            return Err(StdError::generic_err("yield source paused"));
        }
        Ok(())
    }

    fn to_shares(&self, assets: Uint128, rounding: Rounding) -> StdResult<Uint128> {
        let shares = self.state.borrow().shares;
        let total_assets = self.total_assets();
        if shares.is_zero() || total_assets.is_zero() {
            return Ok(assets);
        }
        mul_div_u128(assets, shares, total_assets, rounding)
    }
}

impl YieldSource for MockYieldSource {
    fn address(&self) -> Addr {
        self.address.clone()
    }

    fn deposit(&mut self, assets: Uint128) -> StdResult<Uint128> {
        self.assert_not_paused()?;
        if assets > self.max_deposit()? {
            return Err(StdError::generic_err("deposit more than max"));
        }
        let shares = self.to_shares(assets, Rounding::Floor)?;
        self.token
            .spend_allowance(&self.depositor, &self.address, assets)?;
        self.token
            .move_balance(&self.depositor, &self.address, assets)?;
        self.state.borrow_mut().shares += shares;
        Ok(shares)
    }

    fn withdraw(&mut self, assets: Uint128) -> StdResult<Uint128> {
        self.assert_not_paused()?;
        if assets > self.max_withdraw()? {
            return Err(StdError::generic_err("withdraw more than max"));
        }
        let burned = self.to_shares(assets, Rounding::Ceil)?;
        let (shortfall, bonus) = {
            let state = self.state.borrow();
            (state.withdraw_shortfall, state.withdraw_bonus)
        };
        let delivered = assets.saturating_sub(shortfall) + bonus;
        let delivered = delivered.min(self.total_assets());
        self.token
            .move_balance(&self.address, &self.depositor, delivered)?;

        let mut state = self.state.borrow_mut();
        let burned = burned.min(state.shares);
        state.shares -= burned;
        Ok(burned)
    }

    fn balance(&self) -> StdResult<Uint128> {
        Ok(self.state.borrow().shares)
    }

    fn max_deposit(&self) -> StdResult<Uint128> {
        Ok(self.state.borrow().max_deposit.unwrap_or(Uint128::MAX))
    }

    fn max_withdraw(&self) -> StdResult<Uint128> {
        let held = self.convert_to_assets(self.balance()?)?;
        let limit = self.state.borrow().withdraw_limit.unwrap_or(Uint128::MAX);
        Ok(held.min(limit))
    }

    fn convert_to_assets(&self, shares: Uint128) -> StdResult<Uint128> {
        let total_shares = self.state.borrow().shares;
        if total_shares.is_zero() {
            return Ok(shares);
        }
        mul_div_u128(shares, self.total_assets(), total_shares, Rounding::Floor)
    }
}

/// Adjustable exchange rate. Clones share the same rate.
#[derive(Debug, Clone)]
pub struct MockRate(Rc<RefCell<(Uint128, u8)>>);

impl MockRate {
    pub fn new(rate: Uint128, decimals: u8) -> Self {
        Self(Rc::new(RefCell::new((rate, decimals))))
    }

    pub fn set(&self, rate: Uint128) {
        self.0.borrow_mut().0 = rate;
    }
}

impl RateSource for MockRate {
    fn exchange_rate(&self) -> StdResult<Uint128> {
        Ok(self.0.borrow().0)
    }

    fn decimals(&self) -> StdResult<u8> {
        Ok(self.0.borrow().1)
    }
}
