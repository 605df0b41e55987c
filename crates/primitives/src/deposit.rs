//! The deposit record: one immutable version of a deposit's full state.
//!
//! A deposit is never mutated in place. Every lifecycle step consumes the current version and
//! produces a successor that differs from it only in the fields that step is allowed to touch.
//! [`DepositRecord::equal_excluding`] is the comparison every contract rule is built on.

use secp256k1::XOnlyPublicKey;
use serde::{Deserialize, Serialize};

use crate::{
    attachment::AttachmentRef,
    deduction::{ArbitratorDeduction, Deduction},
    money::Money,
    party::{Party, Role},
    types::{LinearId, Timestamp},
};

/// One version of a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    /// The identifier shared by every version of this deposit.
    pub linear_id: LinearId,
    /// The party letting the property.
    pub landlord: Party,
    /// The party renting the property.
    pub tenant: Party,
    /// The deposit backing scheme.
    pub issuer: Party,
    /// The off-ledger key of the let property.
    pub property_id: String,
    /// The amount the tenant owes as deposit.
    pub deposit_amount: Money,
    /// The amount actually paid into the scheme, set once when the deposit is funded.
    pub amount_deposited: Option<Money>,
    /// The check-in inventory.
    pub inventory: AttachmentRef,
    /// The deductions the landlord proposes at the end of the tenancy.
    pub landlord_deductions: Option<Vec<Deduction>>,
    /// The landlord deductions the tenant agrees to, possibly with revised amounts.
    pub tenant_deductions: Option<Vec<Deduction>>,
    /// The deductions both sides settled on.
    pub accepted_deductions: Option<Vec<Deduction>>,
    /// The arbitrator's ruling on a disputed deposit.
    pub contested_deductions: Option<Vec<ArbitratorDeduction>>,
    /// When the tenant asked the scheme to release the deposit.
    pub refund_requested_at: Option<Timestamp>,
    /// When the deposit was paid out. No further changes are possible once set.
    pub refunded_at: Option<Timestamp>,
}

/// The fields of a [`DepositRecord`], used to name what a transition may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DepositField {
    /// [`DepositRecord::linear_id`]
    LinearId,
    /// [`DepositRecord::landlord`]
    Landlord,
    /// [`DepositRecord::tenant`]
    Tenant,
    /// [`DepositRecord::issuer`]
    Issuer,
    /// [`DepositRecord::property_id`]
    PropertyId,
    /// [`DepositRecord::deposit_amount`]
    DepositAmount,
    /// [`DepositRecord::amount_deposited`]
    AmountDeposited,
    /// [`DepositRecord::inventory`]
    Inventory,
    /// [`DepositRecord::landlord_deductions`]
    LandlordDeductions,
    /// [`DepositRecord::tenant_deductions`]
    TenantDeductions,
    /// [`DepositRecord::accepted_deductions`]
    AcceptedDeductions,
    /// [`DepositRecord::contested_deductions`]
    ContestedDeductions,
    /// [`DepositRecord::refund_requested_at`]
    RefundRequestedAt,
    /// [`DepositRecord::refunded_at`]
    RefundedAt,
}

impl DepositField {
    /// Every field of a [`DepositRecord`].
    pub const ALL: [DepositField; 14] = [
        DepositField::LinearId,
        DepositField::Landlord,
        DepositField::Tenant,
        DepositField::Issuer,
        DepositField::PropertyId,
        DepositField::DepositAmount,
        DepositField::AmountDeposited,
        DepositField::Inventory,
        DepositField::LandlordDeductions,
        DepositField::TenantDeductions,
        DepositField::AcceptedDeductions,
        DepositField::ContestedDeductions,
        DepositField::RefundRequestedAt,
        DepositField::RefundedAt,
    ];
}

impl std::fmt::Display for DepositField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let field_str = match self {
            DepositField::LinearId => "linear_id",
            DepositField::Landlord => "landlord",
            DepositField::Tenant => "tenant",
            DepositField::Issuer => "issuer",
            DepositField::PropertyId => "property_id",
            DepositField::DepositAmount => "deposit_amount",
            DepositField::AmountDeposited => "amount_deposited",
            DepositField::Inventory => "inventory",
            DepositField::LandlordDeductions => "landlord_deductions",
            DepositField::TenantDeductions => "tenant_deductions",
            DepositField::AcceptedDeductions => "accepted_deductions",
            DepositField::ContestedDeductions => "contested_deductions",
            DepositField::RefundRequestedAt => "refund_requested_at",
            DepositField::RefundedAt => "refunded_at",
        };
        write!(f, "{}", field_str)
    }
}

impl DepositRecord {
    /// Creates the first version of a deposit with a fresh [`LinearId`].
    pub fn new(
        landlord: Party,
        tenant: Party,
        issuer: Party,
        property_id: impl Into<String>,
        deposit_amount: Money,
        inventory: AttachmentRef,
    ) -> Self {
        Self {
            linear_id: LinearId::new_random(),
            landlord,
            tenant,
            issuer,
            property_id: property_id.into(),
            deposit_amount,
            amount_deposited: None,
            inventory,
            landlord_deductions: None,
            tenant_deductions: None,
            accepted_deductions: None,
            contested_deductions: None,
            refund_requested_at: None,
            refunded_at: None,
        }
    }

    /// Returns the party playing `role`.
    pub const fn party(&self, role: Role) -> &Party {
        match role {
            Role::Landlord => &self.landlord,
            Role::Tenant => &self.tenant,
            Role::Issuer => &self.issuer,
        }
    }

    /// Returns the role the owner of `key` plays in this deposit, if any.
    ///
    /// The landlord is checked first, so a key shared between roles resolves to the landlord.
    pub fn role_of(&self, key: &XOnlyPublicKey) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| &self.party(*role).key == key)
    }

    /// All parties that must store this deposit.
    pub fn participants(&self) -> [&Party; 3] {
        [&self.landlord, &self.tenant, &self.issuer]
    }

    /// Returns `true` once the deposit has been paid into the scheme.
    pub const fn is_funded(&self) -> bool {
        self.amount_deposited.is_some()
    }

    /// Returns `true` once the deposit has been paid out.
    pub const fn is_refunded(&self) -> bool {
        self.refunded_at.is_some()
    }

    /// Compares one field of two records.
    pub fn field_eq(&self, other: &DepositRecord, field: DepositField) -> bool {
        match field {
            DepositField::LinearId => self.linear_id == other.linear_id,
            DepositField::Landlord => self.landlord == other.landlord,
            DepositField::Tenant => self.tenant == other.tenant,
            DepositField::Issuer => self.issuer == other.issuer,
            DepositField::PropertyId => self.property_id == other.property_id,
            DepositField::DepositAmount => self.deposit_amount == other.deposit_amount,
            DepositField::AmountDeposited => self.amount_deposited == other.amount_deposited,
            DepositField::Inventory => self.inventory == other.inventory,
            DepositField::LandlordDeductions => {
                self.landlord_deductions == other.landlord_deductions
            }
            DepositField::TenantDeductions => self.tenant_deductions == other.tenant_deductions,
            DepositField::AcceptedDeductions => {
                self.accepted_deductions == other.accepted_deductions
            }
            DepositField::ContestedDeductions => {
                self.contested_deductions == other.contested_deductions
            }
            DepositField::RefundRequestedAt => {
                self.refund_requested_at == other.refund_requested_at
            }
            DepositField::RefundedAt => self.refunded_at == other.refunded_at,
        }
    }

    /// Returns `true` if the two records agree on every field not named in `excluded`.
    pub fn equal_excluding(&self, other: &DepositRecord, excluded: &[DepositField]) -> bool {
        self.changed_fields(other)
            .iter()
            .all(|field| excluded.contains(field))
    }

    /// Lists the fields in which `other` differs from `self`.
    pub fn changed_fields(&self, other: &DepositRecord) -> Vec<DepositField> {
        // A new field must be added to `DepositField` before this compiles again.
        let DepositRecord {
            linear_id: _,
            landlord: _,
            tenant: _,
            issuer: _,
            property_id: _,
            deposit_amount: _,
            amount_deposited: _,
            inventory: _,
            landlord_deductions: _,
            tenant_deductions: _,
            accepted_deductions: _,
            contested_deductions: _,
            refund_requested_at: _,
            refunded_at: _,
        } = self;

        DepositField::ALL
            .into_iter()
            .filter(|field| !self.field_eq(other, *field))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use secp256k1::{Keypair, SECP256K1};

    use super::*;
    use crate::money::Currency;

    fn party(name: &str) -> Party {
        let keypair = Keypair::new(SECP256K1, &mut rand::thread_rng());
        Party::new(name, keypair.x_only_public_key().0)
    }

    fn record() -> DepositRecord {
        DepositRecord::new(
            party("landlord"),
            party("tenant"),
            party("scheme"),
            "flat-1",
            Money::new(100_000, Currency::GBP),
            AttachmentRef::of(b"inventory"),
        )
    }

    /// Returns a copy of `base` that differs from it in exactly `field`.
    fn perturb(base: &DepositRecord, field: DepositField) -> DepositRecord {
        let mut other = base.clone();
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let deduction = Deduction::new(
            "carpet damage",
            Money::new(5_000, Currency::GBP),
            AttachmentRef::of(b"carpet"),
        );

        match field {
            DepositField::LinearId => other.linear_id = LinearId::new_random(),
            DepositField::Landlord => other.landlord = party("other landlord"),
            DepositField::Tenant => other.tenant = party("other tenant"),
            DepositField::Issuer => other.issuer = party("other scheme"),
            DepositField::PropertyId => other.property_id = "flat-2".to_string(),
            DepositField::DepositAmount => {
                other.deposit_amount = Money::new(1, Currency::GBP);
            }
            DepositField::AmountDeposited => {
                other.amount_deposited = Some(base.deposit_amount);
            }
            DepositField::Inventory => other.inventory = AttachmentRef::of(b"other"),
            DepositField::LandlordDeductions => {
                other.landlord_deductions = Some(vec![deduction]);
            }
            DepositField::TenantDeductions => other.tenant_deductions = Some(vec![deduction]),
            DepositField::AcceptedDeductions => {
                other.accepted_deductions = Some(vec![deduction]);
            }
            DepositField::ContestedDeductions => {
                other.contested_deductions = Some(vec![ArbitratorDeduction::new(
                    "carpet damage",
                    Money::new(1, Currency::GBP),
                )]);
            }
            DepositField::RefundRequestedAt => other.refund_requested_at = Some(ts),
            DepositField::RefundedAt => other.refunded_at = Some(ts),
        }

        other
    }

    #[test]
    fn identical_records_are_equal_excluding_nothing() {
        let r = record();
        assert!(r.equal_excluding(&r.clone(), &[]));
        assert!(r.changed_fields(&r.clone()).is_empty());
    }

    #[test]
    fn every_single_field_perturbation_is_detected() {
        let base = record();

        for field in DepositField::ALL {
            let other = perturb(&base, field);

            assert_eq!(base.changed_fields(&other), vec![field]);
            assert!(
                !base.equal_excluding(&other, &[]),
                "{field} must be compared"
            );
            assert!(
                base.equal_excluding(&other, &[field]),
                "{field} must be ignored when excluded"
            );

            // excluding any other field does not hide the change
            for unrelated in DepositField::ALL.into_iter().filter(|f| *f != field) {
                assert!(
                    !base.equal_excluding(&other, &[unrelated]),
                    "excluding {unrelated} must not hide a change to {field}"
                );
            }
        }
    }

    #[test]
    fn roles_resolve_by_key() {
        let r = record();

        assert_eq!(r.role_of(&r.landlord.key), Some(Role::Landlord));
        assert_eq!(r.role_of(&r.tenant.key), Some(Role::Tenant));
        assert_eq!(r.role_of(&r.issuer.key), Some(Role::Issuer));
        assert_eq!(r.role_of(&party("stranger").key), None);
    }

    #[test]
    fn new_record_is_unfunded_and_open() {
        let r = record();

        assert!(!r.is_funded());
        assert!(!r.is_refunded());
        assert_eq!(r.party(Role::Issuer), &r.issuer);
    }
}
