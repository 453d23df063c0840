//! Retry with exponential backoff for task bodies.

use std::time::Duration;

use anyhow::Context;
use fanout_core::RunContext;

/// Upper bound on a single delay, before jitter.
pub const MAX_DELAY: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt - 1)`,
/// capped at [`MAX_DELAY`], then scaled into ±20% by `unit`, a sample from
/// `[0, 1)`.
pub fn backoff_delay(base: Duration, attempt: u32, unit: f64) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    let delay = base.saturating_mul(factor).min(MAX_DELAY);
    delay.mul_f64(0.8 + 0.4 * unit.clamp(0.0, 1.0))
}

/// Calls `op` until it succeeds or `attempts` calls have failed. `op` gets the
/// 1-based attempt number.
///
/// Cancellation of the run stops the retry loop; the last error is returned
/// with that context attached.
pub async fn retry_with_backoff<T, F, Fut>(
    ctx: &RunContext,
    attempts: u32,
    base: Duration,
    mut op: F,
) -> anyhow::Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        let err = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt >= attempts {
            return Err(err).with_context(|| format!("giving up after {attempts} attempts"));
        }
        if ctx.is_cancelled() {
            return Err(err).context("cancelled while retrying");
        }

        let delay = backoff_delay(base, attempt, rand::random::<f64>());
        tracing::warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %format!("{err:#}"),
            "attempt failed, retrying"
        );
        tokio::select! {
            _ = ctx.cancelled() => {
                return Err(err).context("cancelled while retrying");
            }
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
