//! Deriving the next version of a deposit and the cash that moves with it.
//!
//! Nothing here touches the ledger or the network, so every step can be checked in isolation.

use escrow_contract::{
    commands::DepositCommand, errors::ContractViolation, settlement::split_refund,
};
use escrow_primitives::{
    attachment::AttachmentRef,
    deduction::{ArbitratorDeduction, Deduction},
    deposit::DepositRecord,
    money::Money,
    party::{Party, Role},
    types::Timestamp,
};
use secp256k1::XOnlyPublicKey;

use crate::{
    errors::{FlowError, FlowResult},
    requests::{FlowRequest, NewDeposit},
};

/// Cash one party pays to others as part of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payments {
    pub payer: XOnlyPublicKey,

    /// `(payee, amount)` pairs. Zero amounts are allowed and pay nothing.
    pub payees: Vec<(XOnlyPublicKey, Money)>,
}

/// The first version of a deposit `landlord` proposes.
pub fn first_version(landlord: Party, terms: &NewDeposit) -> DepositRecord {
    DepositRecord::new(
        landlord,
        terms.tenant.clone(),
        terms.issuer.clone(),
        terms.property_id.clone(),
        terms.deposit_amount,
        terms.inventory,
    )
}

/// The version that follows `prior` under `request`, or `None` if the step retires the deposit.
pub fn successor(
    request: &FlowRequest,
    prior: &DepositRecord,
    now: Timestamp,
) -> FlowResult<Option<DepositRecord>> {
    let mut next = prior.clone();

    match request {
        FlowRequest::Create(_) => {
            return Err(FlowError::InvalidRequest(
                "a new deposit has no predecessor".to_string(),
            ))
        }
        FlowRequest::CoSign { .. } => {}
        FlowRequest::Fund { .. } => next.amount_deposited = Some(prior.deposit_amount),
        FlowRequest::LandlordDeduct { deductions, .. } => {
            if deductions.is_empty() {
                return Err(FlowError::InvalidRequest("no deductions given".to_string()));
            }

            let mut all = prior.landlord_deductions.clone().unwrap_or_default();
            all.extend(deductions.iter().cloned());
            next.landlord_deductions = Some(all);
        }
        FlowRequest::TenantDeduct { deductions, .. } => {
            next.tenant_deductions = Some(deductions.clone());

            if prior.landlord_deductions.as_ref() == Some(deductions) {
                next.accepted_deductions = Some(deductions.clone());
            }
        }
        FlowRequest::AcceptDeductions { .. } => {
            next.accepted_deductions = prior.tenant_deductions.clone();
        }
        FlowRequest::RequestRefund { .. } => next.refund_requested_at = Some(now),
        FlowRequest::Refund { .. } => next.refunded_at = Some(now),
        FlowRequest::Arbitrate { rulings, .. } => {
            next.contested_deductions = Some(rulings.clone());
            next.refunded_at = Some(now);
        }
        FlowRequest::Exit { .. } => return Ok(None),
    }

    Ok(Some(next))
}

/// The deductions a payout settles.
///
/// A refund settles the accepted deductions, or none if the landlord never asked for any. Any
/// other state is still being negotiated and cannot be paid out.
fn settled_total(command: DepositCommand, record: &DepositRecord) -> FlowResult<Money> {
    let currency = record.deposit_amount.currency;

    let total = match command {
        DepositCommand::Arbitrate => ArbitratorDeduction::total(
            record.contested_deductions.as_deref().unwrap_or_default(),
            currency,
        )?,
        _ => match (
            record.landlord_deductions.as_deref(),
            record.accepted_deductions.as_deref(),
        ) {
            (_, Some(accepted)) => Deduction::total(accepted, currency)?,
            (None, None) => Money::zero(currency),
            (Some(_), None) => return Err(ContractViolation::UnsettledDeductions.into()),
        },
    };

    Ok(total)
}

/// The cash that has to move for `command` to take `record` to its successor.
///
/// `record` is the successor for steps that have one and the prior version otherwise.
pub fn payments(command: DepositCommand, record: &DepositRecord) -> FlowResult<Option<Payments>> {
    let key = |role: Role| record.party(role).key;

    let payments = match command {
        DepositCommand::Fund => Payments {
            payer: key(Role::Tenant),
            payees: vec![(key(Role::Issuer), record.deposit_amount)],
        },
        DepositCommand::Refund | DepositCommand::Arbitrate => {
            let deposited = record
                .amount_deposited
                .ok_or(ContractViolation::NotFunded)?;
            let split = split_refund(deposited, settled_total(command, record)?)?;

            Payments {
                payer: key(Role::Issuer),
                payees: vec![
                    (key(Role::Tenant), split.tenant),
                    (key(Role::Landlord), split.landlord),
                ],
            }
        }
        _ => return Ok(None),
    };

    Ok(Some(payments))
}

/// The documents a step introduces and the initiator must be able to produce.
pub fn introduced_attachments(request: &FlowRequest) -> Vec<AttachmentRef> {
    match request {
        FlowRequest::Create(terms) => vec![terms.inventory],
        FlowRequest::LandlordDeduct { deductions, .. } => {
            deductions.iter().map(|d| d.evidence).collect()
        }
        _ => Vec::new(),
    }
}

/// Every document `record` refers to.
pub fn referenced_attachments(record: &DepositRecord) -> Vec<AttachmentRef> {
    let deductions = [
        &record.landlord_deductions,
        &record.tenant_deductions,
        &record.accepted_deductions,
    ];

    std::iter::once(record.inventory)
        .chain(
            deductions
                .into_iter()
                .flatten()
                .flatten()
                .map(|d| d.evidence),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use escrow_primitives::types::LinearId;
    use escrow_test_utils::prelude::*;

    use super::*;

    fn carpet() -> Deduction {
        deduction("carpet", pounds(50))
    }

    #[test]
    fn test_fund_sets_deposited_amount() {
        let cast = Cast::generate();
        let record = generate_record(&cast);
        let request = FlowRequest::Fund {
            linear_id: record.linear_id,
        };

        let next = successor(&request, &record, test_timestamp())
            .unwrap()
            .unwrap();

        assert_eq!(next.amount_deposited, Some(record.deposit_amount));
        assert_eq!(next.changed_fields(&record).len(), 1);
    }

    #[test]
    fn test_landlord_deductions_are_appended() {
        let cast = Cast::generate();
        let record = with_landlord_deductions(&funded(&generate_record(&cast)), vec![carpet()]);
        let paint = deduction("paint", pounds(20));
        let request = FlowRequest::LandlordDeduct {
            linear_id: record.linear_id,
            deductions: vec![paint.clone()],
        };

        let next = successor(&request, &record, test_timestamp())
            .unwrap()
            .unwrap();

        assert_eq!(next.landlord_deductions, Some(vec![carpet(), paint]));
    }

    #[test]
    fn test_landlord_deduct_needs_a_deduction() {
        let cast = Cast::generate();
        let record = funded(&generate_record(&cast));
        let request = FlowRequest::LandlordDeduct {
            linear_id: record.linear_id,
            deductions: vec![],
        };

        let err = successor(&request, &record, test_timestamp()).unwrap_err();
        assert!(matches!(err, FlowError::InvalidRequest(_)));
    }

    #[test]
    fn test_tenant_agreeing_to_everything_settles() {
        let cast = Cast::generate();
        let record = with_landlord_deductions(&funded(&generate_record(&cast)), vec![carpet()]);

        let agree = FlowRequest::TenantDeduct {
            linear_id: record.linear_id,
            deductions: vec![carpet()],
        };
        let next = successor(&agree, &record, test_timestamp())
            .unwrap()
            .unwrap();
        assert_eq!(next.accepted_deductions, Some(vec![carpet()]));

        let haggle = FlowRequest::TenantDeduct {
            linear_id: record.linear_id,
            deductions: vec![carpet().with_amount(pounds(30))],
        };
        let next = successor(&haggle, &record, test_timestamp())
            .unwrap()
            .unwrap();
        assert_eq!(next.accepted_deductions, None);
        assert_eq!(
            next.tenant_deductions,
            Some(vec![carpet().with_amount(pounds(30))])
        );
    }

    #[test]
    fn test_exit_has_no_successor() {
        let cast = Cast::generate();
        let record = refunded(&funded(&generate_record(&cast)));
        let request = FlowRequest::Exit {
            linear_id: record.linear_id,
        };

        assert_eq!(successor(&request, &record, test_timestamp()).unwrap(), None);
    }

    #[test]
    fn test_create_has_no_predecessor() {
        let cast = Cast::generate();
        let record = generate_record(&cast);
        let terms = NewDeposit {
            tenant: cast.tenant.party.clone(),
            issuer: cast.issuer.party.clone(),
            property_id: "1 Main Street".to_string(),
            deposit_amount: pounds(500),
            inventory: record.inventory,
        };

        let request = FlowRequest::Create(terms.clone());
        assert!(successor(&request, &record, test_timestamp()).is_err());

        let first = first_version(cast.landlord.party.clone(), &terms);
        assert_eq!(first.deposit_amount, pounds(500));
        assert_eq!(first.landlord, cast.landlord.party);
        assert_ne!(first.linear_id, LinearId::from([0u8; 16]));
    }

    #[test]
    fn test_fund_payments() {
        let cast = Cast::generate();
        let record = funded(&generate_record(&cast));

        let payments = payments(DepositCommand::Fund, &record).unwrap().unwrap();

        assert_eq!(payments.payer, cast.tenant.key());
        assert_eq!(payments.payees, vec![(cast.issuer.key(), pounds(1_000))]);
    }

    #[test]
    fn test_refund_payments_after_settlement() {
        let cast = Cast::generate();
        let record = with_landlord_deductions(&funded(&generate_record(&cast)), vec![carpet()]);
        let record = accepted(&with_tenant_deductions(&record, vec![carpet()]));

        let payments = payments(DepositCommand::Refund, &record).unwrap().unwrap();

        assert_eq!(payments.payer, cast.issuer.key());
        assert_eq!(
            payments.payees,
            vec![
                (cast.tenant.key(), pounds(950)),
                (cast.landlord.key(), pounds(50)),
            ]
        );
    }

    #[test]
    fn test_refund_without_deductions_pays_tenant_in_full() {
        let cast = Cast::generate();
        let record = funded(&generate_record(&cast));

        let payments = payments(DepositCommand::Refund, &record).unwrap().unwrap();

        assert_eq!(
            payments.payees,
            vec![
                (cast.tenant.key(), pounds(1_000)),
                (cast.landlord.key(), pounds(0)),
            ]
        );
    }

    #[test]
    fn test_refund_with_unsettled_deductions() {
        let cast = Cast::generate();
        let record = with_landlord_deductions(&funded(&generate_record(&cast)), vec![carpet()]);

        let err = payments(DepositCommand::Refund, &record).unwrap_err();
        assert!(matches!(
            err,
            FlowError::ValidationFailure(ContractViolation::UnsettledDeductions)
        ));
    }

    #[test]
    fn test_arbitrate_payments_use_rulings() {
        let cast = Cast::generate();
        let record = with_landlord_deductions(&funded(&generate_record(&cast)), vec![carpet()]);
        let record = DepositRecord {
            contested_deductions: Some(vec![ArbitratorDeduction::new("carpet", pounds(25))]),
            ..record
        };

        let payments = payments(DepositCommand::Arbitrate, &record).unwrap().unwrap();

        assert_eq!(
            payments.payees,
            vec![
                (cast.tenant.key(), pounds(975)),
                (cast.landlord.key(), pounds(25)),
            ]
        );
    }

    #[test]
    fn test_unfunded_payout() {
        let cast = Cast::generate();
        let record = generate_record(&cast);

        let err = payments(DepositCommand::Refund, &record).unwrap_err();
        assert!(matches!(
            err,
            FlowError::ValidationFailure(ContractViolation::NotFunded)
        ));
    }

    #[test]
    fn test_steps_without_cash() {
        let cast = Cast::generate();
        let record = funded(&generate_record(&cast));

        for command in [
            DepositCommand::Create,
            DepositCommand::CoSign,
            DepositCommand::LandlordDeduct,
            DepositCommand::TenantDeduct,
            DepositCommand::AcceptDeductions,
            DepositCommand::RequestRefund,
            DepositCommand::Exit,
        ] {
            assert_eq!(payments(command, &record).unwrap(), None, "{command}");
        }
    }

    #[test]
    fn test_referenced_attachments() {
        let cast = Cast::generate();
        let record = with_landlord_deductions(&funded(&generate_record(&cast)), vec![carpet()]);

        assert_eq!(
            referenced_attachments(&record),
            vec![record.inventory, carpet().evidence]
        );
    }
}
