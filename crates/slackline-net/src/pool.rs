//! Per-group connection pool.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use slackline_core::logging::targets;
use slackline_core::{ClientConfig, Error, Result};

/// A reqwest client owned by one resource group.
///
/// Concurrent calls of the group share it. [`release`](Self::release) drops
/// the group's handle on it exactly once; later acquisitions fail with
/// [`Error::Closed`].
#[derive(Debug)]
pub struct ConnectionPool {
    name: String,
    client: Mutex<Option<reqwest::Client>>,
    releases: AtomicUsize,
}

impl ConnectionPool {
    /// Open a pool configured with the client's user agent.
    pub fn open(name: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            name: name.into(),
            client: Mutex::new(Some(client)),
            releases: AtomicUsize::new(0),
        })
    }

    /// Get a handle on the pool for one call.
    pub fn acquire(&self) -> Result<reqwest::Client> {
        self.client
            .lock()
            .clone()
            .ok_or_else(|| Error::Closed(self.name.clone()))
    }

    /// Release the pool. Returns `false` if it was already released.
    ///
    /// Calls still holding a handle finish normally; the connections go away
    /// once the last of them completes.
    pub fn release(&self) -> bool {
        let released = self.client.lock().take().is_some();
        if released {
            self.releases.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                target: targets::CLIENT,
                group = %self.name,
                "connection pool released"
            );
        }
        released
    }

    /// Check if the pool has been released.
    pub fn is_released(&self) -> bool {
        self.client.lock().is_none()
    }

    /// How many times the pool has actually been released: 0 or 1.
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }
}
