use std::sync::Arc;

use rex_store::StorageHandle;
use rex_types::SharedRound;

use crate::policy::RetentionPolicy;
use crate::shutdown::{CancelSignal, ShutdownBarrier};

/// Everything a pruning task is handed when it starts.
#[derive(Clone)]
pub struct PruneContext {
    pub cancel: CancelSignal,
    /// Live counter, not a copy. Read it with [`SharedRound::load`] on every pass.
    pub round: SharedRound,
    pub handle: Arc<dyn StorageHandle>,
    pub policy: RetentionPolicy,
}

/// A background retention process.
///
/// Implementations spawn their work through `barrier` so the owner can
/// join it, and must exit promptly once `ctx.cancel` fires.
pub trait PruningTask: Send + Sync {
    fn start(&self, ctx: PruneContext, barrier: &mut ShutdownBarrier);
}
