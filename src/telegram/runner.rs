//! Long-polling loop

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::handlers::{handle_update, BotContext};
use super::types::Update;
use crate::error::Result;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
/// How long in-flight handlers may run after shutdown is requested
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Poll until Ctrl+C.
pub async fn run(ctx: Arc<BotContext>) -> Result<()> {
    run_until(ctx, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Handler tasks, chained so that one chat's updates run one after another
/// while different chats proceed concurrently.
struct Dispatcher {
    ctx: Arc<BotContext>,
    tasks: JoinSet<()>,
    /// Completion signal of the latest task per chat
    last_per_chat: HashMap<i64, oneshot::Receiver<()>>,
}

impl Dispatcher {
    fn new(ctx: Arc<BotContext>) -> Self {
        Self {
            ctx,
            tasks: JoinSet::new(),
            last_per_chat: HashMap::new(),
        }
    }

    fn dispatch(&mut self, update: Update) {
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let previous = match update.chat_id() {
            Some(chat_id) => self.last_per_chat.insert(chat_id, done_rx),
            None => None,
        };

        let ctx = Arc::clone(&self.ctx);
        self.tasks.spawn(async move {
            if let Some(previous) = previous {
                // resolves once the earlier task drops its sender, even on panic
                let _ = previous.await;
            }
            handle_update(&ctx, update).await;
            drop(done_tx);
        });
    }

    /// Forget finished chains and reap finished tasks.
    fn prune(&mut self) {
        self.last_per_chat.retain(|_, done| {
            matches!(done.try_recv(), Err(oneshot::error::TryRecvError::Empty))
        });
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                error!(error = %e, "Update handler task failed");
            }
        }
    }

    async fn drain(mut self, grace: Duration) {
        if self.tasks.is_empty() {
            return;
        }
        info!(pending = self.tasks.len(), "Waiting for in-flight updates");
        let finished = tokio::time::timeout(grace, async {
            while let Some(joined) = self.tasks.join_next().await {
                if let Err(e) = joined {
                    error!(error = %e, "Update handler task failed");
                }
            }
        })
        .await;

        if finished.is_err() {
            warn!(
                pending = self.tasks.len(),
                "In-flight updates did not finish in time, aborting them"
            );
            self.tasks.shutdown().await;
        }
    }
}

/// Poll until `shutdown` resolves.
///
/// Pending updates from before the start are dropped. Updates of one chat are
/// handled in arrival order; different chats run concurrently. Network
/// failures back off exponentially and retry; any other API failure stops the
/// loop. Either way, handlers already started get [`SHUTDOWN_GRACE`] to finish.
pub async fn run_until<F>(ctx: Arc<BotContext>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    ctx.api.delete_webhook(true).await?;
    info!("Bot started, polling for updates");

    let mut dispatcher = Dispatcher::new(Arc::clone(&ctx));
    let mut offset: Option<i64> = None;
    let mut backoff = INITIAL_BACKOFF;

    let outcome: Result<()> = loop {
        let polled = tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break Ok(());
            }
            polled = ctx.api.get_updates(offset) => polled,
        };

        match polled {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;
                dispatcher.prune();
                if !updates.is_empty() {
                    debug!(count = updates.len(), "Received updates");
                }
                for update in updates {
                    offset = Some(update.update_id + 1);
                    dispatcher.dispatch(update);
                }
            }
            Err(e) if e.is_transient() => {
                warn!(error = %e, retry_in = ?backoff, "Polling failed, retrying");
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("Received shutdown signal");
                        break Ok(());
                    }
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(e) => {
                error!(error = %e, "Polling stopped");
                break Err(e.into());
            }
        }
    };

    dispatcher.drain(SHUTDOWN_GRACE).await;
    info!("Bot stopped");
    outcome
}
