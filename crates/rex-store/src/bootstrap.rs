use tracing::{debug, info};

use rex_types::GenesisDescriptor;

use crate::error::{StoreError, StoreResult};
use crate::traits::StorageHandle;

/// Import `genesis` into the store unless it is already there.
///
/// Returns `true` if genesis was imported by this call and `false` if the
/// store was already bootstrapped with the same genesis. A store holding a
/// different genesis is an error.
pub async fn ensure_initial_import(
    handle: &dyn StorageHandle,
    genesis: &GenesisDescriptor,
) -> StoreResult<bool> {
    let incoming = genesis.hash();
    match handle.next_round_to_accept().await {
        Ok(next_round) => {
            if let Some(stored) = handle.genesis_hash().await? {
                if stored != incoming {
                    return Err(StoreError::GenesisMismatch { stored, incoming });
                }
            }
            debug!(next_round, genesis = %incoming.short_hex(), "genesis already imported");
            Ok(false)
        }
        Err(StoreError::NotInitialized) => {
            handle.load_genesis(genesis).await?;
            info!(
                network = %genesis.network,
                genesis = %incoming.short_hex(),
                accounts = genesis.allocations.len(),
                "imported genesis"
            );
            Ok(true)
        }
        Err(e) => Err(e),
    }
}
