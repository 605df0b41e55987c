//! Configuration shared by every workflow a node runs.

use escrow_primitives::money::Currency;

/// Whether a responder signs proposals that pass the contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SigningPolicy {
    /// Sign every proposal the contract accepts.
    #[default]
    ContractOnly,

    /// Refuse every proposal.
    DeclineAll,
}

/// Node-wide workflow configuration.
///
/// These values are fixed for the lifetime of a node, so it is built once and shared behind an
/// [`Arc`](std::sync::Arc).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowCfg {
    /// The only currency deposits may be taken in.
    pub currency: Currency,

    /// How this node answers proposals from others.
    pub signing_policy: SigningPolicy,
}

impl Default for FlowCfg {
    fn default() -> Self {
        Self {
            currency: Currency::GBP,
            signing_policy: SigningPolicy::default(),
        }
    }
}
