// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Expired Token Sweeper
//!
//! Background task that periodically deletes access-token records whose
//! expiry has passed. Verification never relies on it: an expired record
//! that has not been swept yet is still rejected at read time.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::TokenDatabase;

/// Background sweeper that purges expired access tokens.
pub struct ExpiredTokenSweeper {
    db: Arc<TokenDatabase>,
    interval: Duration,
}

impl ExpiredTokenSweeper {
    /// Create a sweeper running every `interval`.
    pub fn new(db: Arc<TokenDatabase>, interval: Duration) -> Self {
        Self { db, interval }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Expired token sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Expired token sweeper shutting down");
                return;
            }

            self.sweep_step();

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Expired token sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep. Returns the number of records removed.
    pub fn sweep_step(&self) -> usize {
        match self.db.purge_expired(Utc::now()) {
            Ok(0) => {
                debug!("Sweeper: no expired tokens");
                0
            }
            Ok(purged) => {
                info!(purged, "Sweeper: removed expired tokens");
                purged
            }
            Err(e) => {
                warn!(error = %e, "Sweeper: failed to purge expired tokens");
                0
            }
        }
    }
}
