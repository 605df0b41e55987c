//! The transaction envelope: what a party proposes, signs and submits.
//!
//! A [`WireTransaction`] only *references* its inputs. Before the contract can judge it, the
//! inputs must be looked up in the ledger, which yields a [`LedgerTransaction`]. Signatures are
//! carried alongside the wire form in a [`SignedTransaction`].

use std::collections::BTreeSet;

use escrow_primitives::{
    attachment::AttachmentRef,
    deposit::DepositRecord,
    types::{StateRef, TxId},
};
use rand::RngCore;
use secp256k1::{schnorr, Keypair, Message, XOnlyPublicKey, SECP256K1};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    cash::CashState,
    commands::{Command, CommandKind},
    errors::TransactionError,
};

/// Anything that can live on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerState {
    /// A version of a deposit record.
    Deposit(DepositRecord),
    /// Fungible cash.
    Cash(CashState),
}

impl LedgerState {
    /// Returns the deposit record, if this is one.
    pub const fn as_deposit(&self) -> Option<&DepositRecord> {
        match self {
            LedgerState::Deposit(record) => Some(record),
            LedgerState::Cash(_) => None,
        }
    }

    /// Returns the cash state, if this is one.
    pub const fn as_cash(&self) -> Option<&CashState> {
        match self {
            LedgerState::Cash(cash) => Some(cash),
            LedgerState::Deposit(_) => None,
        }
    }

    /// The keys of everyone who must store this state.
    pub fn participants(&self) -> Vec<XOnlyPublicKey> {
        match self {
            LedgerState::Deposit(record) => record.participants().map(|p| p.key).to_vec(),
            LedgerState::Cash(cash) => vec![cash.owner],
        }
    }
}

impl From<DepositRecord> for LedgerState {
    fn from(value: DepositRecord) -> Self {
        LedgerState::Deposit(value)
    }
}

impl From<CashState> for LedgerState {
    fn from(value: CashState) -> Self {
        LedgerState::Cash(value)
    }
}

/// A state together with its location on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAndRef<S = LedgerState> {
    /// The state.
    pub state: S,
    /// Where the state lives.
    pub state_ref: StateRef,
}

impl<S> StateAndRef<S> {
    /// Pairs a state with its location.
    pub const fn new(state: S, state_ref: StateRef) -> Self {
        Self { state, state_ref }
    }

    /// Widens a typed state into a [`LedgerState`].
    pub fn into_ledger_state(self) -> StateAndRef<LedgerState>
    where
        S: Into<LedgerState>,
    {
        StateAndRef::new(self.state.into(), self.state_ref)
    }
}

/// The unsigned body of a transaction as it travels between parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    /// The states consumed.
    pub inputs: Vec<StateRef>,
    /// The states produced.
    pub outputs: Vec<LedgerState>,
    /// The commands, each with the keys that must sign.
    pub commands: Vec<Command>,
    /// Off-ledger documents the transaction refers to.
    pub attachments: Vec<AttachmentRef>,
    /// Random bytes that make the id of otherwise identical transactions unique.
    pub salt: [u8; 32],
}

impl WireTransaction {
    /// Computes the id of this transaction: the sha256 of its bincode encoding.
    pub fn id(&self) -> Result<TxId, TransactionError> {
        let bytes = bincode::serialize(self)?;

        Ok(TxId::from(<[u8; 32]>::from(Sha256::digest(&bytes))))
    }

    /// The union of the signer sets of every command.
    pub fn required_signers(&self) -> BTreeSet<XOnlyPublicKey> {
        self.commands
            .iter()
            .flat_map(|command| command.signers.iter().copied())
            .collect()
    }

    /// Returns the location each output will have once this transaction is committed.
    pub fn output_refs(&self) -> Result<Vec<StateRef>, TransactionError> {
        let txid = self.id()?;

        Ok((0..self.outputs.len() as u32)
            .map(|index| StateRef::new(txid, index))
            .collect())
    }

    /// Combines this transaction with the states its inputs point to.
    ///
    /// `resolved` must hold an entry for every input; extra entries are ignored.
    pub fn resolve(
        &self,
        resolved: Vec<StateAndRef>,
    ) -> Result<LedgerTransaction, TransactionError> {
        let mut inputs = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            let state = resolved
                .iter()
                .find(|r| &r.state_ref == input)
                .ok_or(TransactionError::UnresolvedInput(*input))?;
            inputs.push(state.clone());
        }

        Ok(LedgerTransaction {
            id: self.id()?,
            inputs,
            outputs: self.outputs.clone(),
            commands: self.commands.clone(),
            attachments: self.attachments.clone(),
        })
    }
}

/// A transaction with its inputs resolved, ready for contract verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    /// The id of the underlying [`WireTransaction`].
    pub id: TxId,
    /// The consumed states.
    pub inputs: Vec<StateAndRef>,
    /// The produced states.
    pub outputs: Vec<LedgerState>,
    /// The commands.
    pub commands: Vec<Command>,
    /// The referenced attachments.
    pub attachments: Vec<AttachmentRef>,
}

impl LedgerTransaction {
    /// The consumed deposit records.
    pub fn deposit_inputs(&self) -> Vec<&DepositRecord> {
        self.inputs
            .iter()
            .filter_map(|input| input.state.as_deposit())
            .collect()
    }

    /// The produced deposit records.
    pub fn deposit_outputs(&self) -> Vec<&DepositRecord> {
        self.outputs.iter().filter_map(LedgerState::as_deposit).collect()
    }

    /// The consumed cash.
    pub fn cash_inputs(&self) -> Vec<&CashState> {
        self.inputs
            .iter()
            .filter_map(|input| input.state.as_cash())
            .collect()
    }

    /// The produced cash.
    pub fn cash_outputs(&self) -> Vec<&CashState> {
        self.outputs.iter().filter_map(LedgerState::as_cash).collect()
    }

    /// The deposit commands with their signer sets.
    pub fn deposit_commands(&self) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|c| matches!(c.kind, CommandKind::Deposit(_)))
            .collect()
    }

    /// The cash commands with their signer sets.
    pub fn cash_commands(&self) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|c| matches!(c.kind, CommandKind::Cash(_)))
            .collect()
    }
}

/// A BIP-340 signature over a transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySignature {
    /// The signing key.
    pub by: XOnlyPublicKey,
    /// The signature over the transaction id.
    pub signature: schnorr::Signature,
}

impl PartySignature {
    /// Signs `txid` with `keypair`.
    pub fn sign(txid: &TxId, keypair: &Keypair) -> Self {
        let message = Message::from_digest(*txid.as_bytes());
        let signature = SECP256K1.sign_schnorr_no_aux_rand(&message, keypair);

        Self {
            by: keypair.x_only_public_key().0,
            signature,
        }
    }

    /// Checks the signature against `txid`.
    pub fn verify(&self, txid: &TxId) -> Result<(), TransactionError> {
        let message = Message::from_digest(*txid.as_bytes());

        SECP256K1
            .verify_schnorr(&self.signature, &message, &self.by)
            .map_err(|_| TransactionError::InvalidSignature(self.by))
    }
}

/// A transaction together with the signatures collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The transaction body.
    pub tx: WireTransaction,
    /// The signatures over [`WireTransaction::id`].
    pub signatures: Vec<PartySignature>,
}

impl SignedTransaction {
    /// Wraps an unsigned transaction.
    pub const fn new(tx: WireTransaction) -> Self {
        Self {
            tx,
            signatures: Vec::new(),
        }
    }

    /// The id of the transaction body.
    pub fn id(&self) -> Result<TxId, TransactionError> {
        self.tx.id()
    }

    /// Adds a signature, replacing any earlier one by the same key.
    pub fn with_signature(mut self, signature: PartySignature) -> Self {
        self.signatures.retain(|s| s.by != signature.by);
        self.signatures.push(signature);
        self
    }

    /// The keys that have signed.
    pub fn signed_by(&self) -> BTreeSet<XOnlyPublicKey> {
        self.signatures.iter().map(|s| s.by).collect()
    }

    /// The required signers that have not signed yet.
    pub fn missing_signers(&self) -> BTreeSet<XOnlyPublicKey> {
        let signed = self.signed_by();

        self.tx
            .required_signers()
            .into_iter()
            .filter(|key| !signed.contains(key))
            .collect()
    }

    /// Checks every signature present, without requiring completeness.
    pub fn verify_present_signatures(&self) -> Result<(), TransactionError> {
        let txid = self.id()?;

        self.signatures
            .iter()
            .try_for_each(|signature| signature.verify(&txid))
    }

    /// Checks every signature present and that every required signer has signed.
    pub fn verify_signatures(&self) -> Result<(), TransactionError> {
        self.verify_present_signatures()?;

        match self.missing_signers().into_iter().next() {
            Some(missing) => Err(TransactionError::MissingSignature(missing)),
            None => Ok(()),
        }
    }
}

/// Assembles a [`WireTransaction`] step by step.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    inputs: Vec<StateRef>,
    outputs: Vec<LedgerState>,
    commands: Vec<Command>,
    attachments: Vec<AttachmentRef>,
    salt: [u8; 32],
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuilder {
    /// Creates an empty builder with a fresh salt.
    pub fn new() -> Self {
        let mut salt = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut salt);

        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: Vec::new(),
            attachments: Vec::new(),
            salt,
        }
    }

    /// Consumes a state.
    pub fn add_input(&mut self, state_ref: StateRef) -> &mut Self {
        self.inputs.push(state_ref);
        self
    }

    /// Produces a state.
    pub fn add_output(&mut self, state: impl Into<LedgerState>) -> &mut Self {
        self.outputs.push(state.into());
        self
    }

    /// Adds a command.
    pub fn add_command(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// References an attachment. Duplicates are ignored.
    pub fn add_attachment(&mut self, attachment: AttachmentRef) -> &mut Self {
        if !self.attachments.contains(&attachment) {
            self.attachments.push(attachment);
        }
        self
    }

    /// The inputs added so far.
    pub fn inputs(&self) -> &[StateRef] {
        &self.inputs
    }

    /// Finishes the transaction.
    pub fn build(self) -> WireTransaction {
        WireTransaction {
            inputs: self.inputs,
            outputs: self.outputs,
            commands: self.commands,
            attachments: self.attachments,
            salt: self.salt,
        }
    }
}

#[cfg(test)]
mod tests {
    use escrow_test_utils::prelude::*;

    use super::*;
    use crate::commands::{CashCommand, DepositCommand};

    fn transfer(payer: &TestParty, payee: &TestParty) -> WireTransaction {
        let mut builder = TransactionBuilder::new();
        builder
            .add_input(StateRef::new(TxId::from([7u8; 32]), 0))
            .add_output(CashState::new(payee.key(), pounds(10)))
            .add_command(Command::cash(CashCommand::Move, [payer.key()]));
        builder.build()
    }

    #[test]
    fn id_commits_to_every_part_of_the_body() {
        let cast = Cast::generate();
        let tx = transfer(&cast.tenant, &cast.issuer);
        let id = tx.id().unwrap();

        assert_eq!(id, tx.clone().id().unwrap(), "id must be deterministic");

        let mut more_outputs = tx.clone();
        more_outputs
            .outputs
            .push(CashState::new(cast.landlord.key(), pence(1)).into());
        assert_ne!(id, more_outputs.id().unwrap());

        let mut other_signers = tx.clone();
        other_signers.commands[0].signers.insert(cast.issuer.key());
        assert_ne!(id, other_signers.id().unwrap());
    }

    #[test]
    fn signatures_must_be_complete_and_valid() {
        let cast = Cast::generate();
        let mut builder = TransactionBuilder::new();
        builder.add_output(generate_record(&cast)).add_command(Command::deposit(
            DepositCommand::Create,
            [cast.landlord.key(), cast.tenant.key(), cast.issuer.key()],
        ));
        let tx = builder.build();
        let txid = tx.id().unwrap();

        let mut stx = SignedTransaction::new(tx);
        for party in [&cast.landlord, &cast.tenant] {
            stx = stx.with_signature(PartySignature::sign(&txid, &party.keypair));
        }

        assert!(stx.verify_present_signatures().is_ok());
        assert!(matches!(
            stx.verify_signatures(),
            Err(TransactionError::MissingSignature(key)) if key == cast.issuer.key()
        ));

        let stx = stx.with_signature(PartySignature::sign(&txid, &cast.issuer.keypair));
        assert!(stx.verify_signatures().is_ok());
        assert!(stx.missing_signers().is_empty());
    }

    #[test]
    fn signature_over_another_transaction_is_rejected() {
        let cast = Cast::generate();
        let tx = transfer(&cast.tenant, &cast.issuer);
        let other = transfer(&cast.tenant, &cast.landlord);

        let forged = PartySignature::sign(&other.id().unwrap(), &cast.tenant.keypair);
        let stx = SignedTransaction::new(tx).with_signature(forged);

        assert!(matches!(
            stx.verify_present_signatures(),
            Err(TransactionError::InvalidSignature(_))
        ));
    }

    #[test]
    fn resolve_requires_every_input() {
        let cast = Cast::generate();
        let tx = transfer(&cast.tenant, &cast.issuer);

        assert!(matches!(
            tx.resolve(vec![]),
            Err(TransactionError::UnresolvedInput(_))
        ));

        let input = StateAndRef::new(
            CashState::new(cast.tenant.key(), pounds(10)).into(),
            tx.inputs[0],
        );
        let ltx = tx.resolve(vec![input]).unwrap();
        assert_eq!(ltx.cash_inputs().len(), 1);
        assert_eq!(ltx.cash_outputs().len(), 1);
        assert!(ltx.deposit_inputs().is_empty());
    }
}
