//! What a party can ask its node to do to a deposit.

use escrow_contract::commands::DepositCommand;
use escrow_primitives::{
    attachment::AttachmentRef,
    deduction::{ArbitratorDeduction, Deduction},
    money::Money,
    party::Party,
    types::LinearId,
};

/// The terms of a new deposit, as proposed by the landlord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeposit {
    pub tenant: Party,

    pub issuer: Party,

    /// The off-ledger key of the let property.
    pub property_id: String,

    /// The amount the tenant is to pay in.
    pub deposit_amount: Money,

    /// The signed check-in inventory.
    pub inventory: AttachmentRef,
}

/// A request to start the workflow for one lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowRequest {
    /// Records a new deposit.
    Create(NewDeposit),

    /// Re-affirms the current version.
    CoSign { linear_id: LinearId },

    /// Pays the deposit into the scheme.
    Fund { linear_id: LinearId },

    /// Appends deductions to the landlord's list.
    LandlordDeduct {
        linear_id: LinearId,
        /// The deductions to add. Earlier ones are kept.
        deductions: Vec<Deduction>,
    },

    /// Answers the landlord's deductions.
    ///
    /// Agreeing to every landlord deduction unchanged settles them in the same step.
    TenantDeduct {
        linear_id: LinearId,
        /// The deductions the tenant agrees to, possibly for lower amounts.
        deductions: Vec<Deduction>,
    },

    /// Settles on the tenant's counter-proposal.
    AcceptDeductions { linear_id: LinearId },

    /// Asks the scheme to release the deposit.
    RequestRefund { linear_id: LinearId },

    /// Pays the deposit out according to the settled deductions.
    Refund { linear_id: LinearId },

    /// Rules on the deductions and pays the deposit out accordingly.
    Arbitrate {
        linear_id: LinearId,
        /// The ruling on each contested item.
        rulings: Vec<ArbitratorDeduction>,
    },

    /// Retires a paid out deposit.
    Exit { linear_id: LinearId },
}

impl FlowRequest {
    /// The command the resulting transaction carries.
    pub const fn command(&self) -> DepositCommand {
        match self {
            FlowRequest::Create(_) => DepositCommand::Create,
            FlowRequest::CoSign { .. } => DepositCommand::CoSign,
            FlowRequest::Fund { .. } => DepositCommand::Fund,
            FlowRequest::LandlordDeduct { .. } => DepositCommand::LandlordDeduct,
            FlowRequest::TenantDeduct { .. } => DepositCommand::TenantDeduct,
            FlowRequest::AcceptDeductions { .. } => DepositCommand::AcceptDeductions,
            FlowRequest::RequestRefund { .. } => DepositCommand::RequestRefund,
            FlowRequest::Refund { .. } => DepositCommand::Refund,
            FlowRequest::Arbitrate { .. } => DepositCommand::Arbitrate,
            FlowRequest::Exit { .. } => DepositCommand::Exit,
        }
    }

    /// The deposit the request applies to. `None` for [`FlowRequest::Create`].
    pub const fn linear_id(&self) -> Option<LinearId> {
        match self {
            FlowRequest::Create(_) => None,
            FlowRequest::CoSign { linear_id }
            | FlowRequest::Fund { linear_id }
            | FlowRequest::LandlordDeduct { linear_id, .. }
            | FlowRequest::TenantDeduct { linear_id, .. }
            | FlowRequest::AcceptDeductions { linear_id }
            | FlowRequest::RequestRefund { linear_id }
            | FlowRequest::Refund { linear_id }
            | FlowRequest::Arbitrate { linear_id, .. }
            | FlowRequest::Exit { linear_id } => Some(*linear_id),
        }
    }
}
