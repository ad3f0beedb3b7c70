//! Periodic timestamp records for the data-file build mode.
//!
//! When the device mirrors into a data file, a background task appends an
//! RFC-822-style `timestamp:<date>` record through the ordinary write
//! path every period, so it is framed, stored, and mirrored like any
//! other command.

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Local, TimeZone};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::device::Device;

/// Background task appending one timestamp record per period.
#[derive(Debug)]
pub struct Timestamper {
    device: Arc<Device>,
    period: Duration,
}

impl Timestamper {
    /// Creates a timestamper writing through `device` every `period`.
    pub fn new(device: Arc<Device>, period: Duration) -> Self {
        Self { device, period }
    }

    /// Runs until `shutdown` fires. The first record is appended one full
    /// period after start.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The interval's first tick completes immediately; skip it so the
        // first record lands a full period in.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let record = format_record(Local::now());
                    if let Err(error) = self.device.write(record.as_bytes()) {
                        warn!(message = "Failed to append timestamp record.", %error);
                    }
                }
            }
        }
        debug!(message = "Timestamper stopped.");
    }
}

/// Renders one `timestamp:<RFC-822-style date>` record, terminator
/// included.
fn format_record<Tz: TimeZone>(when: DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!("timestamp:{}\n", when.format("%a, %d %b %Y %H:%M:%S %z"))
}
