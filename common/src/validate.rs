//! Structural validation rules for creation proposals.
//!
//! Both sides of the protocol apply exactly this rule set: the initiator
//! before requesting any signature, and the responder again on receipt.
//! Trust is never transitively assumed from the initiator's verification.

use crate::{PactLedgerError, Result, TransactionProposal};

/// Verify a creation proposal against the structural rules.
///
/// Fails with [`PactLedgerError::InvalidProposal`] naming the first violated
/// rule. Must be called before any signing or network interaction.
pub fn validate_proposal(proposal: &TransactionProposal) -> Result<()> {
    if !proposal.inputs.is_empty() {
        return Err(PactLedgerError::invalid_proposal(
            "no inputs may be consumed when issuing a record",
        ));
    }

    if proposal.outputs.len() != 1 {
        return Err(PactLedgerError::invalid_proposal(format!(
            "exactly one output record required, got {}",
            proposal.outputs.len()
        )));
    }

    let record = &proposal.outputs[0];

    if record.lender == record.borrower {
        return Err(PactLedgerError::invalid_proposal(
            "lender and borrower cannot be the same party",
        ));
    }

    if record.value <= 0 {
        return Err(PactLedgerError::invalid_proposal(format!(
            "record value must be strictly positive, got {}",
            record.value
        )));
    }

    let signers = proposal.command.required_signers();
    for participant in record.participants() {
        if !signers.contains(&participant) {
            return Err(PactLedgerError::invalid_proposal(format!(
                "participant {} missing from required signers",
                participant
            )));
        }
    }

    Ok(())
}
