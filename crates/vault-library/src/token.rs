use crate::adapter::AssetToken;
use cosmwasm_std::{Addr, StdError, Uint128};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Token {op} failed: {msg}")]
    Failed { op: String, msg: String },
}

impl TokenError {
    pub fn failed(op: impl Into<String>, msg: impl Into<String>) -> Self {
        TokenError::Failed {
            op: op.into(),
            msg: msg.into(),
        }
    }
}

/// Transfer `amount` from `sender` to `recipient`.
/// A token that returns nothing is accepted only if the recipient balance grew by `amount`.
pub fn safe_transfer(
    token: &mut dyn AssetToken,
    sender: &Addr,
    recipient: &Addr,
    amount: Uint128,
) -> Result<(), TokenError> {
    let before = token.balance_of(recipient)?;
    let result = token.transfer(sender, recipient, amount)?;
    assert_moved(token, "transfer", result, recipient, before, amount)
}

/// Transfer `amount` from `owner` to `recipient` on behalf of `spender`.
/// Same return value handling as [safe_transfer].
pub fn safe_transfer_from(
    token: &mut dyn AssetToken,
    spender: &Addr,
    owner: &Addr,
    recipient: &Addr,
    amount: Uint128,
) -> Result<(), TokenError> {
    let before = token.balance_of(recipient)?;
    let result = token.transfer_from(spender, owner, recipient, amount)?;
    assert_moved(token, "transfer_from", result, recipient, before, amount)
}

/// Set the allowance of `spender` to exactly `amount`.
/// If the token refuses a direct change (non-zero to non-zero), reset to zero and retry once.
pub fn force_approve(
    token: &mut dyn AssetToken,
    owner: &Addr,
    spender: &Addr,
    amount: Uint128,
) -> Result<(), TokenError> {
    if try_approve(token, owner, spender, amount)? {
        return Ok(());
    }
    if !try_approve(token, owner, spender, Uint128::zero())? {
        return Err(TokenError::failed("approve", "reset to zero refused"));
    }
    if !try_approve(token, owner, spender, amount)? {
        return Err(TokenError::failed("approve", "refused"));
    }
    Ok(())
}

fn try_approve(
    token: &mut dyn AssetToken,
    owner: &Addr,
    spender: &Addr,
    amount: Uint128,
) -> Result<bool, TokenError> {
    match token.approve(owner, spender, amount)? {
        Some(approved) => Ok(approved),
        None => Ok(token.allowance(owner, spender)? == amount),
    }
}

fn assert_moved(
    token: &dyn AssetToken,
    op: &str,
    result: Option<bool>,
    recipient: &Addr,
    before: Uint128,
    amount: Uint128,
) -> Result<(), TokenError> {
    match result {
        Some(true) => Ok(()),
        Some(false) => Err(TokenError::failed(op, "returned false")),
        None => {
            let after = token.balance_of(recipient)?;
            if after.saturating_sub(before) < amount {
                return Err(TokenError::failed(op, "balance did not move"));
            }
            Ok(())
        }
    }
}
