//! The commands a transaction can carry and the parties each one must be signed by.

use std::{collections::BTreeSet, fmt};

use escrow_primitives::{deposit::DepositField, party::Role};
use secp256k1::XOnlyPublicKey;
use serde::{Deserialize, Serialize};

/// A step in the lifecycle of a deposit.
///
/// Exactly one of these must accompany every transaction that consumes or produces a deposit
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DepositCommand {
    /// Records a new deposit agreement.
    Create,
    /// Re-affirms the current version without changing it.
    CoSign,
    /// Pays the deposit into the scheme.
    Fund,
    /// The landlord proposes (further) deductions.
    LandlordDeduct,
    /// The tenant responds to the landlord's deductions, optionally accepting them outright.
    TenantDeduct,
    /// The landlord settles on the tenant's counter-proposal.
    AcceptDeductions,
    /// The tenant asks the scheme to release the deposit.
    RequestRefund,
    /// The scheme pays the deposit out according to the settled deductions.
    Refund,
    /// The scheme rules on disputed deductions and pays the deposit out accordingly.
    Arbitrate,
    /// Removes a paid out deposit from the set of live states.
    Exit,
}

impl DepositCommand {
    /// Every deposit command.
    pub const ALL: [DepositCommand; 10] = [
        DepositCommand::Create,
        DepositCommand::CoSign,
        DepositCommand::Fund,
        DepositCommand::LandlordDeduct,
        DepositCommand::TenantDeduct,
        DepositCommand::AcceptDeductions,
        DepositCommand::RequestRefund,
        DepositCommand::Refund,
        DepositCommand::Arbitrate,
        DepositCommand::Exit,
    ];

    /// The roles whose keys must be in the signer set of this command.
    pub const fn required_roles(&self) -> &'static [Role] {
        match self {
            DepositCommand::LandlordDeduct
            | DepositCommand::TenantDeduct
            | DepositCommand::AcceptDeductions => &[Role::Landlord, Role::Tenant],
            DepositCommand::RequestRefund => &[Role::Tenant, Role::Issuer],
            DepositCommand::Create
            | DepositCommand::CoSign
            | DepositCommand::Fund
            | DepositCommand::Refund
            | DepositCommand::Arbitrate
            | DepositCommand::Exit => &Role::ALL,
        }
    }

    /// The role that must start the workflow for this command.
    ///
    /// Returns `None` if any participant may start it.
    pub const fn initiator(&self) -> Option<Role> {
        match self {
            DepositCommand::Create
            | DepositCommand::LandlordDeduct
            | DepositCommand::AcceptDeductions => Some(Role::Landlord),
            DepositCommand::Fund | DepositCommand::TenantDeduct | DepositCommand::RequestRefund => {
                Some(Role::Tenant)
            }
            DepositCommand::Refund | DepositCommand::Arbitrate | DepositCommand::Exit => {
                Some(Role::Issuer)
            }
            DepositCommand::CoSign => None,
        }
    }

    /// The fields of the deposit record this command may change.
    pub const fn permitted_fields(&self) -> &'static [DepositField] {
        match self {
            DepositCommand::Create | DepositCommand::CoSign | DepositCommand::Exit => &[],
            DepositCommand::Fund => &[DepositField::AmountDeposited],
            DepositCommand::LandlordDeduct => &[DepositField::LandlordDeductions],
            DepositCommand::TenantDeduct => &[
                DepositField::TenantDeductions,
                DepositField::AcceptedDeductions,
            ],
            DepositCommand::AcceptDeductions => &[DepositField::AcceptedDeductions],
            DepositCommand::RequestRefund => &[DepositField::RefundRequestedAt],
            DepositCommand::Refund => &[DepositField::RefundedAt],
            DepositCommand::Arbitrate => &[
                DepositField::ContestedDeductions,
                DepositField::RefundedAt,
            ],
        }
    }

    /// Returns `true` if transactions carrying this command also move cash.
    pub const fn moves_cash(&self) -> bool {
        matches!(
            self,
            DepositCommand::Fund | DepositCommand::Refund | DepositCommand::Arbitrate
        )
    }
}

impl fmt::Display for DepositCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let command_str = match self {
            DepositCommand::Create => "Create",
            DepositCommand::CoSign => "CoSign",
            DepositCommand::Fund => "Fund",
            DepositCommand::LandlordDeduct => "LandlordDeduct",
            DepositCommand::TenantDeduct => "TenantDeduct",
            DepositCommand::AcceptDeductions => "AcceptDeductions",
            DepositCommand::RequestRefund => "RequestRefund",
            DepositCommand::Refund => "Refund",
            DepositCommand::Arbitrate => "Arbitrate",
            DepositCommand::Exit => "Exit",
        };
        write!(f, "{}", command_str)
    }
}

/// A movement of fungible cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CashCommand {
    /// Brings new cash onto the ledger.
    Issue,
    /// Moves existing cash between owners.
    Move,
}

impl fmt::Display for CashCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashCommand::Issue => write!(f, "Issue"),
            CashCommand::Move => write!(f, "Move"),
        }
    }
}

/// What a [`Command`] asks the contracts to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// A deposit lifecycle step.
    Deposit(DepositCommand),
    /// A cash movement.
    Cash(CashCommand),
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Deposit(command) => write!(f, "deposit/{command}"),
            CommandKind::Cash(command) => write!(f, "cash/{command}"),
        }
    }
}

/// A command together with the keys that must sign the transaction carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// The command.
    pub kind: CommandKind,
    /// The keys that must sign.
    pub signers: BTreeSet<XOnlyPublicKey>,
}

impl Command {
    /// Creates a new command.
    pub fn new(kind: CommandKind, signers: impl IntoIterator<Item = XOnlyPublicKey>) -> Self {
        Self {
            kind,
            signers: signers.into_iter().collect(),
        }
    }

    /// Creates a deposit command.
    pub fn deposit(
        command: DepositCommand,
        signers: impl IntoIterator<Item = XOnlyPublicKey>,
    ) -> Self {
        Self::new(CommandKind::Deposit(command), signers)
    }

    /// Creates a cash command.
    pub fn cash(command: CashCommand, signers: impl IntoIterator<Item = XOnlyPublicKey>) -> Self {
        Self::new(CommandKind::Cash(command), signers)
    }

    /// Returns the deposit command, if this is one.
    pub const fn as_deposit(&self) -> Option<DepositCommand> {
        match self.kind {
            CommandKind::Deposit(command) => Some(command),
            CommandKind::Cash(_) => None,
        }
    }

    /// Returns the cash command, if this is one.
    pub const fn as_cash(&self) -> Option<CashCommand> {
        match self.kind {
            CommandKind::Cash(command) => Some(command),
            CommandKind::Deposit(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_initiator_is_a_required_signer() {
        for command in DepositCommand::ALL {
            if let Some(initiator) = command.initiator() {
                assert!(
                    command.required_roles().contains(&initiator),
                    "{command} is started by {initiator} who does not sign it"
                );
            }
        }
    }

    #[test]
    fn only_fund_and_payouts_move_cash() {
        let moving: Vec<_> = DepositCommand::ALL
            .into_iter()
            .filter(DepositCommand::moves_cash)
            .collect();

        assert_eq!(
            moving,
            vec![
                DepositCommand::Fund,
                DepositCommand::Refund,
                DepositCommand::Arbitrate
            ]
        );
    }

    #[test]
    fn payouts_may_set_the_terminal_marker() {
        for command in DepositCommand::ALL {
            let sets_refunded = command
                .permitted_fields()
                .contains(&DepositField::RefundedAt);

            assert_eq!(
                sets_refunded,
                matches!(command, DepositCommand::Refund | DepositCommand::Arbitrate),
                "{command}"
            );
        }
    }
}
