use tokio_util::sync::CancellationToken;

/// Cancels `token` on the first SIGTERM or SIGINT.
///
/// Running tasks see the cancellation through their context; the runner
/// itself keeps going until the pool drains.
pub fn cancel_on_signal(token: CancellationToken) {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "received signal, cancelling the running job");
                token.cancel();
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install signal handlers");
            }
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
