//! Background vault expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use dgt_engine::Ledger;

/// Run the vault expiry sweep on a fixed interval, forever.
///
/// When a pass saturates its batch it runs again immediately, so a
/// backlog drains faster than one batch per interval.
pub async fn run_sweeper(ledger: Arc<Ledger>, interval_seconds: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        loop {
            match ledger.sweep_expired_vaults() {
                Ok(report) if report.saturated() => continue,
                Ok(_) => break,
                Err(err) => {
                    tracing::error!(error = %err, "vault sweep pass failed");
                    break;
                }
            }
        }
    }
}
