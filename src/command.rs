//! On-demand `/stock` command handling.
//!
//! The command runs a full cycle through the shared [`Dispatcher`], so a
//! user asking for stock also advances the stored snapshot and may trigger
//! the regular notification.

use crate::channels::DeferredReply;
use crate::dispatcher::Dispatcher;
use crate::notify::render_failure;
use tracing::{debug, warn};

/// Answer one stock command.
///
/// The reply is acknowledged before any upstream work starts and completed
/// exactly once, with either the rendered snapshot or the failure text.
///
/// # Errors
///
/// Returns the transport error if the acknowledgement or the completion
/// cannot be delivered. A failed acknowledgement skips the cycle entirely.
pub async fn answer_stock_command(
    dispatcher: &Dispatcher,
    mut reply: Box<dyn DeferredReply>,
) -> crate::Result<()> {
    if let Err(e) = reply.acknowledge().await {
        warn!(error = %e, "failed to acknowledge stock command");
        return Err(e);
    }

    let result = dispatcher.run_cycle().await;
    debug!(outcome = result.outcome(), "stock command cycle finished");
    let content = result.render().unwrap_or_else(render_failure);
    reply.complete(content).await
}
