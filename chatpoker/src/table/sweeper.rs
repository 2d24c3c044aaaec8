//! Periodic timeout sweep over every registered session.
//!
//! The sweeper never touches session state. It only queues a
//! [`SessionMessage::Tick`](super::messages::SessionMessage::Tick) on each
//! actor, which then checks its own turn clock.

use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use super::registry::SessionRegistry;

pub struct TimeoutSweeper {
    registry: SessionRegistry,
    interval: Duration,
}

impl TimeoutSweeper {
    pub fn new(registry: SessionRegistry, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Tick every session once. Returns how many ticks were queued.
    pub async fn sweep(&self) -> usize {
        let mut queued = 0;
        let mut stopped = 0;
        for handle in self.registry.handles().await {
            if handle.try_tick() {
                queued += 1;
            } else {
                stopped += 1;
            }
        }
        if stopped > 0 {
            self.registry.prune().await;
        }
        queued
    }

    /// Sweep on a fixed interval until the returned task is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            log::info!("Timeout sweeper running every {:?}", self.interval);
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ledger::InMemoryLedger, table::SessionConfig};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sweep_ticks_live_sessions_and_prunes_stopped() {
        let registry = SessionRegistry::new(Arc::new(InMemoryLedger::new(10_000)));
        registry.open_session(SessionConfig::default()).await.unwrap();
        let doomed = registry.open_session(SessionConfig::default()).await.unwrap();
        doomed.abort().await.unwrap();
        doomed.closed().await;

        let sweeper = TimeoutSweeper::new(registry.clone(), Duration::from_millis(10));
        assert_eq!(sweeper.sweep().await, 1);
        assert_eq!(registry.handles().await.len(), 1);
    }
}
