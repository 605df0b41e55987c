use escrow_test_utils::prelude::*;

use super::*;
use crate::errors::ContractViolation;

/// The tenant pays `paid` to the scheme out of a £1200 balance, keeping the change.
fn fund_tx(
    cast: &Cast,
    input: &DepositRecord,
    output: DepositRecord,
    paid: Money,
) -> LedgerTransaction {
    let balance = pounds(1_200);
    let change = balance.checked_sub(paid).expect("paid must not exceed balance");

    let mut outputs: Vec<LedgerState> = vec![
        output.into(),
        CashState::new(cast.issuer.key(), paid).into(),
    ];
    if !change.is_zero() {
        outputs.push(CashState::new(cast.tenant.key(), change).into());
    }

    ledger_tx(
        vec![
            input.clone().into(),
            CashState::new(cast.tenant.key(), balance).into(),
        ],
        outputs,
        vec![
            signed_by_required(DepositCommand::Fund, cast),
            Command::cash(CashCommand::Move, [cast.tenant.key()]),
        ],
    )
}

#[test]
fn funding_with_the_exact_deposit_verifies() {
    let cast = Cast::generate();
    let input = generate_record(&cast);

    let tx = fund_tx(&cast, &input, funded(&input), pounds(1_000));

    assert_eq!(verify(&tx), Ok(()));
}

#[test]
fn issuer_must_receive_exactly_the_recorded_amount() {
    let cast = Cast::generate();
    let input = generate_record(&cast);

    for paid in [pounds(999), pounds(1_001)] {
        let tx = fund_tx(&cast, &input, funded(&input), paid);

        assert_eq!(
            verify(&tx),
            Err(ContractViolation::IssuerPaymentMismatch {
                expected: pounds(1_000),
                actual: paid,
            })
        );
    }
}

#[test]
fn recorded_amount_must_equal_the_agreed_deposit() {
    let cast = Cast::generate();
    let input = generate_record(&cast);
    let underpaid = DepositRecord {
        amount_deposited: Some(pounds(500)),
        ..input.clone()
    };

    let tx = fund_tx(&cast, &input, underpaid, pounds(500));

    assert_eq!(
        verify(&tx),
        Err(ContractViolation::DepositedAmountMismatch {
            expected: pounds(1_000),
            actual: Some(pounds(500)),
        })
    );
}

#[test]
fn funding_must_spend_cash_and_pay_the_issuer() {
    let cast = Cast::generate();
    let input = generate_record(&cast);

    let no_cash = ledger_tx(
        vec![input.clone().into()],
        vec![funded(&input).into()],
        vec![signed_by_required(DepositCommand::Fund, &cast)],
    );
    assert_eq!(verify(&no_cash), Err(ContractViolation::FundCashInputs(0)));

    let pays_landlord = ledger_tx(
        vec![
            input.clone().into(),
            CashState::new(cast.tenant.key(), pounds(1_000)).into(),
        ],
        vec![
            funded(&input).into(),
            CashState::new(cast.landlord.key(), pounds(1_000)).into(),
        ],
        vec![
            signed_by_required(DepositCommand::Fund, &cast),
            Command::cash(CashCommand::Move, [cast.tenant.key()]),
        ],
    );
    assert_eq!(
        verify(&pays_landlord),
        Err(ContractViolation::MissingIssuerPayment)
    );
}

#[test]
fn funding_spends_a_single_cash_state() {
    let cast = Cast::generate();
    let input = generate_record(&cast);

    let split_payment = ledger_tx(
        vec![
            input.clone().into(),
            CashState::new(cast.tenant.key(), pounds(600)).into(),
            CashState::new(cast.tenant.key(), pounds(400)).into(),
        ],
        vec![
            funded(&input).into(),
            CashState::new(cast.issuer.key(), pounds(1_000)).into(),
        ],
        vec![
            signed_by_required(DepositCommand::Fund, &cast),
            Command::cash(CashCommand::Move, [cast.tenant.key()]),
        ],
    );

    assert_eq!(
        verify(&split_payment),
        Err(ContractViolation::FundCashInputs(2))
    );
}

#[test]
fn a_deposit_is_funded_only_once() {
    let cast = Cast::generate();
    let input = funded_record(&cast);

    let tx = fund_tx(&cast, &input, input.clone(), pounds(1_000));

    assert_eq!(verify(&tx), Err(ContractViolation::AlreadyFunded));
}

#[test]
fn funding_may_not_touch_other_fields() {
    let cast = Cast::generate();
    let input = generate_record(&cast);
    let mut output = funded(&input);
    output.property_id = "somewhere else".to_string();

    let tx = fund_tx(&cast, &input, output, pounds(1_000));

    assert_eq!(
        verify(&tx),
        Err(ContractViolation::ForbiddenChange {
            command: DepositCommand::Fund,
            field: escrow_primitives::deposit::DepositField::PropertyId,
        })
    );
}
