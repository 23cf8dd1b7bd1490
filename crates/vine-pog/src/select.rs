//! Confirmed-address selection: the entry point block-reward assembly
//! calls to pick ambassador reward recipients for a block.

use tracing::debug;

use vine_core::error::SelectionError;
use vine_core::traits::{AnvSnapshotProvider, ReferralStore};
use vine_core::types::{Address, AddressAnv, AddressType, ConfirmedAddress, Hash256};
use vine_referral::ReferralCache;

use crate::selector::WalletSelector;

/// Whether an address type participates in the ambassador lottery.
///
/// Parameterized addresses carry contract-controlled spend conditions and
/// are excluded from rewards.
pub fn is_valid_ambassador_destination(address_type: AddressType) -> bool {
    matches!(address_type, AddressType::Key | AddressType::Script)
}

/// Select up to `n` confirmed ambassador reward recipients for a block.
///
/// Draws the full without-replacement winner sequence over the
/// lottery-eligible ANV snapshot at `height`, then walks it in draw order:
/// confirmed candidates are accepted until `n` are gathered; unconfirmed
/// candidates are recorded in `unconfirmed_invites` while its size stays
/// under `max_outstanding_invites`, and skipped once the budget is spent.
///
/// An empty or zero-weight snapshot is the bootstrap case: the genesis
/// address is the sole selectee.
#[allow(clippy::too_many_arguments)]
pub fn select_confirmed_addresses<S, P>(
    cache: &ReferralCache<S>,
    snapshots: &P,
    height: u64,
    seed: &Hash256,
    genesis_address: &Address,
    n: usize,
    unconfirmed_invites: &mut Vec<Address>,
    max_outstanding_invites: usize,
) -> Result<Vec<ConfirmedAddress>, SelectionError>
where
    S: ReferralStore,
    P: AnvSnapshotProvider,
{
    let snapshot: Vec<AddressAnv> = snapshots
        .anv_snapshot(height)?
        .into_iter()
        .filter(|e| is_valid_ambassador_destination(e.address_type))
        .collect();

    let selector = WalletSelector::new(snapshot);
    if selector.size() == 0 {
        debug!(height, "empty lottery snapshot, selecting genesis address");
        return Ok(vec![confirmed_record(cache, genesis_address)?]);
    }

    // Draw every candidate up front; the walk below decides who counts.
    let candidates = selector.select(seed, selector.size());
    let mut confirmed = Vec::with_capacity(n.min(candidates.len()));

    for candidate in candidates {
        if confirmed.len() == n {
            break;
        }
        if cache.is_confirmed_address(&candidate.address)? {
            confirmed.push(confirmed_record(cache, &candidate.address)?);
        } else if unconfirmed_invites.len() < max_outstanding_invites
            && !unconfirmed_invites.contains(&candidate.address)
        {
            unconfirmed_invites.push(candidate.address);
        }
    }

    debug!(
        height,
        selected = confirmed.len(),
        requested = n,
        outstanding_invites = unconfirmed_invites.len(),
        "ambassador selection complete"
    );
    Ok(confirmed)
}

fn confirmed_record<S: ReferralStore>(
    cache: &ReferralCache<S>,
    address: &Address,
) -> Result<ConfirmedAddress, SelectionError> {
    let address_type = cache
        .get_referral_by_address(address)?
        .map(|r| r.address_type)
        .unwrap_or_default();
    let amount = cache.get_confirmation(address)?;
    Ok(ConfirmedAddress {
        address_type,
        address: *address,
        amount,
    })
}
