use {
    async_trait::async_trait,
    hive_bees::{Event, EventReceiver},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info},
};

#[cfg(feature = "metrics")]
use {crate::hive_metrics, metrics::counter};

/// Consumer of the events bees emit.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Event);
}

/// Logs every event at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHandler;

#[async_trait]
impl EventHandler for LogHandler {
    async fn handle(&self, event: Event) {
        let options = serde_json::to_string(&event.options).unwrap_or_default();
        info!(bee = %event.bee, event = %event.name, %options, "event");
    }
}

/// Drains the event channel into a handler.
///
/// Runs until every sender is gone or the token is cancelled. Events still
/// queued at cancellation are dropped.
pub struct EventPump {
    rx: EventReceiver,
    cancel: CancellationToken,
}

impl EventPump {
    pub fn new(rx: EventReceiver, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Process events in arrival order. Returns how many were handled.
    pub async fn run(mut self, handler: &dyn EventHandler) -> usize {
        let mut handled = 0;
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!(handled, "event pump cancelled");
                    break;
                },
                next = self.rx.recv() => match next {
                    Some(event) => {
                        #[cfg(feature = "metrics")]
                        counter!(hive_metrics::EVENTS_TOTAL, "bee" => event.bee.clone()).increment(1);

                        handler.handle(event).await;
                        handled += 1;
                    },
                    None => {
                        debug!(handled, "event channel closed");
                        break;
                    },
                },
            }
        }
        handled
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        hive_bees::{Placeholders, event_channel},
        std::sync::Mutex,
    };

    #[derive(Default)]
    struct Collect(Mutex<Vec<Event>>);

    #[async_trait]
    impl EventHandler for Collect {
        async fn handle(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn drains_until_senders_drop() {
        let (tx, rx) = event_channel(4);
        for name in ["one", "two"] {
            tx.send(Event::new("b", name, Placeholders::new()))
                .await
                .unwrap();
        }
        drop(tx);

        let collect = Collect::default();
        let handled = EventPump::new(rx, CancellationToken::new())
            .run(&collect)
            .await;
        assert_eq!(handled, 2);
        let names: Vec<_> = collect
            .0
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect();
        assert_eq!(names, ["one", "two"]);
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let (_tx, rx) = event_channel(4);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let handled = EventPump::new(rx, cancel).run(&LogHandler).await;
        assert_eq!(handled, 0);
    }
}
