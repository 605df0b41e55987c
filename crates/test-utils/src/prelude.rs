//! Re-exports of the fixtures most tests need.

pub use crate::{
    deposit::{
        accepted, deduction, funded, generate_record, refund_requested, refunded, test_timestamp,
        with_landlord_deductions, with_tenant_deductions, TEST_DEPOSIT_POUNDS,
    },
    money::{arb_money, pence, pounds},
    parties::{generate_keypair, generate_xonly_pubkey, Cast, TestParty},
};
