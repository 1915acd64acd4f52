//! Blocking entry points for async use cases.

use crate::{InfraError, InfraResult};
use lab_finder_shared::{ErrorEnvelope, RequestContext};
use std::future::Future;

/// Run `op` to completion on a current-thread runtime.
///
/// Ctrl-C cancels `ctx`; the use case then fails with a `Cancelled` envelope
/// instead of the process dying mid-request.
pub fn run_async_with_ctx<F, T>(
    ctx: RequestContext,
    op: impl FnOnce(RequestContext) -> F,
) -> InfraResult<T>
where
    F: Future<Output = Result<T, ErrorEnvelope>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    runtime.block_on(async {
        let watcher = spawn_interrupt_watcher(&ctx);
        let result = op(ctx).await;
        watcher.abort();
        result
    })
}

fn spawn_interrupt_watcher(ctx: &RequestContext) -> tokio::task::JoinHandle<()> {
    let token = ctx.cancellation_token();
    tokio::spawn(async move {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    tracing::debug!("interrupt received; cancelling request");
                    token.cancel();
                }
            }
            () = token.cancelled() => {}
        }
    })
}
