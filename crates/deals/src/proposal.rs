//! Proposal assembly and duplicate resolution

use alloy_primitives::{Address, U256};
use iroh_blobs::Hash;

use crate::deal::{PaymentInfo, Proposal};
use crate::error::DealError;

/// `price * size * duration`, or `None` when the product does not fit in
/// 256 bits
pub fn total_price(price: U256, size: u64, duration: u64) -> Option<U256> {
    price
        .checked_mul(U256::from(size))?
        .checked_mul(U256::from(duration))
}

/// Assemble an unfunded proposal
pub fn build_proposal(
    miner: Address,
    data: Hash,
    size: u64,
    price: U256,
    duration: u64,
) -> Result<Proposal, DealError> {
    let total_price =
        total_price(price, size, duration).ok_or(DealError::PriceOverflow { size, duration })?;

    Ok(Proposal {
        piece_ref: data,
        size,
        total_price,
        duration,
        miner_address: miner,
        payment: PaymentInfo::default(),
        last_duplicate: None,
    })
}

/// Find an identity for `proposal` that `exists` does not know about.
///
/// While the identity collides, `last_duplicate` is pointed at the colliding
/// identity and the hash recomputed. A chain of distinct colliding identities
/// can be at most `known` long, so the walk gives up after `known + 1` steps
/// instead of spinning on a cycle.
pub fn resolve_duplicates<F>(
    mut proposal: Proposal,
    allow_duplicates: bool,
    known: usize,
    exists: F,
) -> Result<(Proposal, Hash), DealError>
where
    F: Fn(&Hash) -> bool,
{
    let mut cid = proposal.cid().map_err(DealError::ProposalCid)?;
    if !exists(&cid) {
        return Ok((proposal, cid));
    }
    if !allow_duplicates {
        return Err(DealError::Duplicate);
    }

    let max_attempts = known + 1;
    for attempt in 1..=max_attempts {
        tracing::debug!(collision = %cid, attempt, "proposal collides with an existing deal");
        proposal.last_duplicate = Some(cid.to_string());
        cid = proposal.cid().map_err(DealError::ProposalCid)?;
        if !exists(&cid) {
            return Ok((proposal, cid));
        }
    }

    Err(DealError::DuplicateResolution(max_attempts))
}
