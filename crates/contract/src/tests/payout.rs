use escrow_primitives::{deduction::ArbitratorDeduction, party::Role};
use escrow_test_utils::prelude::*;

use super::*;
use crate::errors::ContractViolation;

#[test]
fn undeducted_deposit_is_refunded_in_full() {
    let cast = Cast::generate();
    let input = funded_record(&cast);

    assert_eq!(
        verify_payout(
            DepositCommand::Refund,
            &cast,
            &input,
            &refunded(&input),
            payments(&cast, pounds(1_000), pounds(0)),
        ),
        Ok(())
    );
}

#[test]
fn settled_deductions_go_to_the_landlord() {
    let cast = Cast::generate();
    let input = accepted(&with_tenant_deductions(
        &deducted_record(&cast),
        vec![deduction("carpet damage", pounds(50))],
    ));

    assert_eq!(
        verify_payout(
            DepositCommand::Refund,
            &cast,
            &input,
            &refunded(&input),
            payments(&cast, pounds(950), pounds(50)),
        ),
        Ok(())
    );
}

#[test]
fn refund_must_follow_the_split() {
    let cast = Cast::generate();
    let input = accepted(&with_tenant_deductions(
        &deducted_record(&cast),
        vec![deduction("carpet damage", pounds(50))],
    ));

    assert_eq!(
        verify_payout(
            DepositCommand::Refund,
            &cast,
            &input,
            &refunded(&input),
            payments(&cast, pounds(1_000), pounds(0)),
        ),
        Err(ContractViolation::PayoutMismatch {
            role: Role::Tenant,
            expected: pounds(950),
            actual: pounds(1_000),
        })
    );
}

#[test]
fn unsettled_deductions_block_the_refund() {
    let cast = Cast::generate();
    let input = deducted_record(&cast);

    assert_eq!(
        verify_payout(
            DepositCommand::Refund,
            &cast,
            &input,
            &refunded(&input),
            payments(&cast, pounds(1_000), pounds(0)),
        ),
        Err(ContractViolation::UnsettledDeductions)
    );
}

#[test]
fn refund_must_set_the_terminal_marker() {
    let cast = Cast::generate();
    let input = funded_record(&cast);

    assert_eq!(
        verify_payout(
            DepositCommand::Refund,
            &cast,
            &input,
            &input,
            payments(&cast, pounds(1_000), pounds(0)),
        ),
        Err(ContractViolation::FieldNotSet {
            command: DepositCommand::Refund,
            field: escrow_primitives::deposit::DepositField::RefundedAt,
        })
    );
}

#[test]
fn a_refunded_deposit_cannot_be_refunded_again() {
    let cast = Cast::generate();
    let input = refunded(&funded_record(&cast));

    assert_eq!(
        verify_payout(
            DepositCommand::Refund,
            &cast,
            &input,
            &input,
            payments(&cast, pounds(1_000), pounds(0)),
        ),
        Err(ContractViolation::AlreadyRefunded)
    );
}

#[test]
fn arbitration_splits_by_the_ruling() {
    let cast = Cast::generate();
    let input = with_tenant_deductions(
        &deducted_record(&cast),
        vec![deduction("carpet damage", pounds(10))],
    );
    let output = refunded(&DepositRecord {
        contested_deductions: Some(vec![ArbitratorDeduction::new(
            "carpet damage",
            pounds(30),
        )]),
        ..input.clone()
    });

    assert_eq!(
        verify_payout(
            DepositCommand::Arbitrate,
            &cast,
            &input,
            &output,
            payments(&cast, pounds(970), pounds(30)),
        ),
        Ok(())
    );
}

#[test]
fn arbitration_is_only_for_unsettled_deposits() {
    let cast = Cast::generate();
    let input = accepted(&with_tenant_deductions(
        &deducted_record(&cast),
        vec![deduction("carpet damage", pounds(50))],
    ));
    let output = refunded(&DepositRecord {
        contested_deductions: Some(vec![]),
        ..input.clone()
    });

    assert_eq!(
        verify_payout(
            DepositCommand::Arbitrate,
            &cast,
            &input,
            &output,
            payments(&cast, pounds(1_000), pounds(0)),
        ),
        Err(ContractViolation::AlreadyAccepted)
    );
}

#[test]
fn arbitration_cannot_award_more_than_the_deposit() {
    let cast = Cast::generate();
    let input = deducted_record(&cast);
    let output = refunded(&DepositRecord {
        contested_deductions: Some(vec![ArbitratorDeduction::new(
            "everything",
            pounds(1_001),
        )]),
        ..input.clone()
    });

    assert_eq!(
        verify_payout(
            DepositCommand::Arbitrate,
            &cast,
            &input,
            &output,
            payments(&cast, pounds(0), pounds(1_000)),
        ),
        Err(ContractViolation::DeductionsExceedDeposit {
            total: pounds(1_001),
            deposit: pounds(1_000),
        })
    );
}
