use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Enforces a minimum interval between dependent transactions.
///
/// The controller needs settling time after profile selection, program
/// state changes and output reads before the next command is accepted.
#[derive(Debug, Clone)]
pub struct CommandPacer {
    min_interval: Duration,
    last_mark: Option<Instant>,
}

impl CommandPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_mark: None,
        }
    }

    /// Record that a dependent transaction was just issued.
    pub fn mark(&mut self) {
        self.last_mark = Some(Instant::now());
    }

    /// Sleep until the minimum interval since the last mark has passed.
    pub async fn settle(&mut self) {
        if let Some(last) = self.last_mark {
            let ready_at = last + self.min_interval;
            if ready_at > Instant::now() {
                trace!("Settling for {:?}", ready_at - Instant::now());
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }

    /// Mark, then settle: the spacing used between two dependent commands.
    pub async fn pause(&mut self) {
        self.mark();
        self.settle().await;
    }
}
