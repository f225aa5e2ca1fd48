use tracing::{debug, info, warn};

use rex_types::Round;

use crate::shutdown::ShutdownBarrier;
use crate::task::{PruneContext, PruningTask};

/// Default delete loop.
///
/// Wakes every `poll_ms`, reads the live round counter, and when a pass is
/// due deletes every round older than the retention window. Failed passes
/// are logged and retried on the next wake.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetentionPruner;

impl PruningTask for RetentionPruner {
    fn start(&self, ctx: PruneContext, barrier: &mut ShutdownBarrier) {
        barrier.spawn(delete_loop(ctx));
    }
}

async fn delete_loop(mut ctx: PruneContext) {
    let period = ctx.policy.poll_interval();
    let mut last_pass: Option<Round> = None;
    info!(
        rounds = ctx.policy.rounds,
        interval = ctx.policy.interval,
        start_round = ctx.round.load(),
        "delete task started"
    );

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = tokio::time::sleep(period) => {}
        }

        let next_round = ctx.round.load();
        if !ctx.policy.is_due(next_round, last_pass) {
            continue;
        }
        let Some(keep_from) = ctx.policy.keep_from(next_round) else {
            continue;
        };

        match ctx.handle.delete_before(keep_from).await {
            Ok(removed) => {
                last_pass = Some(next_round);
                if removed > 0 {
                    info!(keep_from, removed, "deleted rounds outside retention window");
                } else {
                    debug!(keep_from, "nothing to delete");
                }
            }
            Err(e) => warn!(keep_from, error = %e, "delete pass failed"),
        }
    }

    info!(last_round = ctx.round.load(), "delete task stopped");
}
