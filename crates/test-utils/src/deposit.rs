//! Deposit records at each stage of their lifecycle.
//!
//! Each helper returns the *next* version of the given record, mirroring what a workflow would
//! propose, so tests can walk a record forward without going through the flows.

use chrono::{TimeZone, Utc};
use escrow_primitives::{
    attachment::AttachmentRef, deduction::Deduction, deposit::DepositRecord, money::Money,
    types::Timestamp,
};

use crate::{money::pounds, parties::Cast};

/// The deposit every fixture uses, in whole pounds.
pub const TEST_DEPOSIT_POUNDS: u64 = 1_000;

/// A fixed instant used for the timestamp fields.
pub fn test_timestamp() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Creates a fresh, unfunded £1000 deposit between the members of `cast`.
pub fn generate_record(cast: &Cast) -> DepositRecord {
    DepositRecord::new(
        cast.landlord.party.clone(),
        cast.tenant.party.clone(),
        cast.issuer.party.clone(),
        "12 Acacia Avenue",
        pounds(TEST_DEPOSIT_POUNDS),
        AttachmentRef::of(b"inventory.pdf"),
    )
}

/// A deduction whose evidence is derived from its reason.
pub fn deduction(reason: &str, amount: Money) -> Deduction {
    Deduction::new(reason, amount, AttachmentRef::of(reason.as_bytes()))
}

/// The funded successor of `record`.
pub fn funded(record: &DepositRecord) -> DepositRecord {
    DepositRecord {
        amount_deposited: Some(record.deposit_amount),
        ..record.clone()
    }
}

/// The successor of `record` with `deductions` proposed by the landlord.
pub fn with_landlord_deductions(
    record: &DepositRecord,
    deductions: Vec<Deduction>,
) -> DepositRecord {
    DepositRecord {
        landlord_deductions: Some(deductions),
        ..record.clone()
    }
}

/// The successor of `record` with `deductions` agreed by the tenant, without accepting them.
pub fn with_tenant_deductions(
    record: &DepositRecord,
    deductions: Vec<Deduction>,
) -> DepositRecord {
    DepositRecord {
        tenant_deductions: Some(deductions),
        ..record.clone()
    }
}

/// The successor of `record` that settles on the tenant's deductions.
pub fn accepted(record: &DepositRecord) -> DepositRecord {
    DepositRecord {
        accepted_deductions: record.tenant_deductions.clone(),
        ..record.clone()
    }
}

/// The successor of `record` in which the tenant has asked for the deposit back.
pub fn refund_requested(record: &DepositRecord) -> DepositRecord {
    DepositRecord {
        refund_requested_at: Some(test_timestamp()),
        ..record.clone()
    }
}

/// The paid out successor of `record`.
pub fn refunded(record: &DepositRecord) -> DepositRecord {
    DepositRecord {
        refunded_at: Some(test_timestamp()),
        ..record.clone()
    }
}
