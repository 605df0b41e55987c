//! The steps every workflow goes through and a tracker that only lets it move forward.

use std::fmt;

use escrow_contract::commands::DepositCommand;
use escrow_primitives::types::LinearId;
use thiserror::Error;
use tracing::{info, warn};

/// A step of an initiating workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlowStep {
    /// Looking up the current version of the deposit.
    LocatingPriorState,
    /// Building the next version and checking it against the contract.
    BuildingProposal,
    /// Sharing cash states and identities with the counterparties.
    ExchangingContext,
    /// Gathering the counterparties' signatures.
    CollectingSignatures,
    /// Submitting the signed transaction to the ledger.
    Finalizing,
    /// The transaction is committed.
    Done,
    /// The workflow ended without committing anything.
    Failed,
}

impl FlowStep {
    /// Returns `true` if no further step can follow.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, FlowStep::Done | FlowStep::Failed)
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step_str = match self {
            FlowStep::LocatingPriorState => "LOCATING_PRIOR_STATE",
            FlowStep::BuildingProposal => "BUILDING_PROPOSAL",
            FlowStep::ExchangingContext => "EXCHANGING_CONTEXT",
            FlowStep::CollectingSignatures => "COLLECTING_SIGNATURES",
            FlowStep::Finalizing => "FINALIZING",
            FlowStep::Done => "DONE",
            FlowStep::Failed => "FAILED",
        };
        write!(f, "{}", step_str)
    }
}

/// Errors raised when a workflow tries to move to a step it cannot reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProgressError {
    /// The target step does not come after the current one.
    #[error("cannot move from {from} back to {to}")]
    Backwards {
        /// The current step.
        from: FlowStep,
        /// The requested step.
        to: FlowStep,
    },

    /// The workflow has already ended.
    #[error("workflow already ended in {0}")]
    Ended(FlowStep),
}

/// Records and logs the steps of one workflow instance.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    command: DepositCommand,

    linear_id: Option<LinearId>,

    history: Vec<FlowStep>,
}

impl ProgressTracker {
    /// Creates a tracker for a workflow running `command` that has not started any step yet.
    pub const fn new(command: DepositCommand) -> Self {
        Self {
            command,
            linear_id: None,
            history: Vec::new(),
        }
    }

    /// Ties the workflow to a deposit so that later log lines carry its id.
    pub fn set_linear_id(&mut self, linear_id: LinearId) {
        self.linear_id = Some(linear_id);
    }

    pub const fn command(&self) -> DepositCommand {
        self.command
    }

    /// The step the workflow is currently in, if it has started.
    pub fn current(&self) -> Option<FlowStep> {
        self.history.last().copied()
    }

    /// Every step taken so far, in order.
    pub fn history(&self) -> &[FlowStep] {
        &self.history
    }

    /// Moves to `step`. Steps may be skipped but never revisited.
    ///
    /// [`FlowStep::Failed`] is reachable from every step that is not terminal.
    pub fn advance(&mut self, step: FlowStep) -> Result<(), ProgressError> {
        if let Some(current) = self.current() {
            if current.is_terminal() {
                return Err(ProgressError::Ended(current));
            }

            if step <= current {
                return Err(ProgressError::Backwards {
                    from: current,
                    to: step,
                });
            }
        }

        self.history.push(step);

        match self.linear_id {
            Some(linear_id) => {
                info!(command = %self.command, %linear_id, %step, "workflow progressed")
            }
            None => info!(command = %self.command, %step, "workflow progressed"),
        }

        Ok(())
    }

    /// Moves to [`FlowStep::Failed`] unless the workflow has already ended.
    pub fn fail(&mut self, reason: &dyn fmt::Display) {
        if self.current().is_some_and(|step| step.is_terminal()) {
            return;
        }

        warn!(command = %self.command, linear_id = ?self.linear_id, %reason, "workflow failed");
        self.history.push(FlowStep::Failed);
    }
}
