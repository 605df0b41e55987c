//! How a deposit is divided between tenant and landlord when it is paid out.

use escrow_primitives::{errors::MoneyError, money::Money};

/// The two shares of a paid out deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundSplit {
    /// What the tenant gets back.
    pub tenant: Money,
    /// What the landlord keeps to cover the deductions.
    pub landlord: Money,
}

/// Splits `deposit` given the settled `deductions` total.
///
/// The tenant receives `deposit - deductions` and the landlord receives whatever the tenant does
/// not, so the shares always add up to the deposit. Fails if the deductions exceed the deposit
/// or are in another currency.
pub fn split_refund(deposit: Money, deductions: Money) -> Result<RefundSplit, MoneyError> {
    let tenant = deposit.checked_sub(deductions)?;
    let landlord = deposit.checked_sub(tenant)?;

    Ok(RefundSplit { tenant, landlord })
}
