use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    chrono::Utc,
    hive_bees::{Action, Bee, BeeBase, BeeOptions, EventSender, PlaceholderValue, Placeholders},
    tracing::{debug, info, warn},
};

use crate::{
    client::{
        Cloudcast, CloudcastSource, DEFAULT_BASE_URL, MixcloudClient, collect_cloudcasts,
    },
    watermark::Watermark,
};

pub(crate) const NEW_CLOUDCAST: &str = "new_cloudcast";
pub(crate) const POLL_FEED: &str = "poll_feed";

struct State {
    base_url: String,
    feed: String,
    interval: u64,
    source: Option<Arc<dyn CloudcastSource>>,
    watermark: Watermark,
}

struct Inner {
    base: BeeBase,
    state: Mutex<State>,
    /// Held from claiming a window until its last event is emitted, so
    /// overlapping polls emit in window order.
    poll_guard: tokio::sync::Mutex<()>,
    polling: AtomicBool,
}

/// Polls one Mixcloud feed and emits a `new_cloudcast` event per upload.
///
/// `run` only stores the event channel. With `interval` above zero it also
/// starts a background task that polls on that cadence; the task stops once
/// `interval` is reloaded as zero or the hive drops the event receiver.
pub struct MixcloudBee {
    inner: Arc<Inner>,
}

impl MixcloudBee {
    pub fn new(name: &str, namespace: &str, description: &str, options: BeeOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                base: BeeBase::new(name, namespace, description, options),
                state: Mutex::new(State {
                    base_url: DEFAULT_BASE_URL.to_string(),
                    feed: String::new(),
                    interval: 0,
                    source: None,
                    watermark: Watermark::new(),
                }),
                poll_guard: tokio::sync::Mutex::new(()),
                polling: AtomicBool::new(false),
            }),
        }
    }

    /// Poll through `source` instead of the HTTP client. It is kept across
    /// reloads until `baseUrl` changes.
    #[must_use]
    pub fn with_source(self, source: Arc<dyn CloudcastSource>) -> Self {
        self.inner.lock_state().source = Some(source);
        self
    }

    pub fn feed(&self) -> String {
        self.inner.lock_state().feed.clone()
    }

    pub fn watermark(&self) -> Watermark {
        self.inner.lock_state().watermark
    }

    /// Fetch everything new since the last poll and emit it. Returns the
    /// number of events emitted.
    pub async fn poll_feed(&self) -> hive_bees::Result<usize> {
        self.inner.poll_feed().await
    }
}

impl Inner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply_options(&self, options: &BeeOptions) -> hive_bees::Result<()> {
        let mut state = self.lock_state();
        let mut base_url = state.base_url.clone();
        let mut feed = state.feed.clone();
        let mut interval = state.interval;
        options.bind("baseUrl", &mut base_url)?;
        options.bind("feed", &mut feed)?;
        options.bind("interval", &mut interval)?;

        if state.source.is_none() || base_url != state.base_url {
            let client = MixcloudClient::new(&base_url)?;
            state.source = Some(Arc::new(client));
        }
        state.base_url = base_url;
        state.feed = feed;
        state.interval = interval;
        Ok(())
    }

    async fn poll_feed(&self) -> hive_bees::Result<usize> {
        let name = self.base.name();
        let _poll = self.poll_guard.lock().await;
        let (feed, source, window) = {
            let mut state = self.lock_state();
            let Some(source) = state.source.clone() else {
                warn!(bee = name, "mixcloud bee polled before it was configured");
                return Ok(0);
            };
            if !self.base.is_running() {
                return Err(hive_bees::Error::not_running(name));
            }
            let window = state.watermark.advance(Utc::now());
            (state.feed.clone(), source, window)
        };

        debug!(bee = name, feed = %feed, since = %window.since, until = %window.until, "polling mixcloud feed");
        let cloudcasts = collect_cloudcasts(source.as_ref(), &feed, window).await;
        let count = cloudcasts.len();
        for cloudcast in cloudcasts {
            self.base
                .emit(NEW_CLOUDCAST, cloudcast_placeholders(cloudcast))
                .await?;
        }
        if count > 0 {
            info!(bee = name, feed = %feed, count, "emitted new cloudcasts");
        }
        Ok(count)
    }

    /// Start the background poller unless one is running or `interval` is 0.
    fn ensure_poller(self: &Arc<Self>) {
        if !self.base.is_running() {
            return;
        }
        {
            let state = self.lock_state();
            if state.interval == 0 || self.polling.swap(true, Ordering::SeqCst) {
                return;
            }
        }
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.poll_loop().await });
    }

    /// Current cadence, or `None` once the poller should stop. The `polling`
    /// flag is cleared under the state lock.
    fn next_interval(&self) -> Option<Duration> {
        let state = self.lock_state();
        if state.interval == 0 || self.base.is_closed() {
            self.polling.store(false, Ordering::SeqCst);
            return None;
        }
        Some(Duration::from_secs(state.interval))
    }

    async fn poll_loop(self: Arc<Self>) {
        let name = self.base.name();
        info!(bee = name, "mixcloud background polling started");
        while let Some(interval) = self.next_interval() {
            tokio::time::sleep(interval).await;
            if self.next_interval().is_none() {
                break;
            }
            match self.poll_feed().await {
                Ok(_) | Err(hive_bees::Error::ChannelClosed { .. }) => {},
                Err(e) => warn!(bee = name, error = %e, "scheduled mixcloud poll failed"),
            }
        }
        info!(bee = name, "mixcloud background polling stopped");
    }
}

fn cloudcast_placeholders(cloudcast: Cloudcast) -> Placeholders {
    Placeholders::new()
        .with("name", cloudcast.name)
        .with("url", PlaceholderValue::Url(cloudcast.url))
        .with("slug", cloudcast.slug)
}

#[async_trait]
impl Bee for MixcloudBee {
    fn name(&self) -> &str {
        self.inner.base.name()
    }

    fn namespace(&self) -> &str {
        self.inner.base.namespace()
    }

    fn description(&self) -> &str {
        self.inner.base.description()
    }

    async fn reload_options(&self, options: BeeOptions) -> hive_bees::Result<()> {
        self.inner.apply_options(&options)?;
        self.inner.base.set_options(options);
        debug!(bee = self.name(), feed = %self.feed(), "mixcloud options reloaded");
        self.inner.ensure_poller();
        Ok(())
    }

    async fn run(&self, events: EventSender) -> hive_bees::Result<()> {
        self.inner.base.attach(events)?;
        self.inner.ensure_poller();
        Ok(())
    }

    async fn action(&self, action: Action) -> hive_bees::Result<Placeholders> {
        match action.name.as_str() {
            POLL_FEED => {
                self.inner.poll_feed().await?;
                Ok(Placeholders::new())
            },
            _ => Err(self.inner.base.unknown_action(&action)),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            client::{CloudcastPage, Paging},
            watermark::PollWindow,
        },
        hive_bees::{Error, event_channel},
        std::sync::atomic::AtomicUsize,
        tokio::sync::Notify,
    };

    fn cloudcast(slug: &str) -> Cloudcast {
        Cloudcast {
            name: slug.to_string(),
            url: format!("https://www.mixcloud.com/dj/{slug}/"),
            slug: slug.to_string(),
        }
    }

    /// Returns the same single page for every poll and records each window.
    struct StaticFeed {
        slugs: Vec<&'static str>,
        windows: Mutex<Vec<PollWindow>>,
    }

    #[async_trait]
    impl CloudcastSource for StaticFeed {
        async fn cloudcasts(&self, _feed: &str, window: PollWindow) -> crate::Result<CloudcastPage> {
            self.windows.lock().unwrap().push(window);
            Ok(CloudcastPage {
                data: self.slugs.iter().map(|s| cloudcast(s)).collect(),
                paging: Paging::default(),
            })
        }

        async fn page(&self, _next_url: &str) -> crate::Result<CloudcastPage> {
            Ok(CloudcastPage::default())
        }
    }

    /// The first fetch waits for `release`; every fetch returns one cloudcast
    /// slugged after its call number.
    #[derive(Default)]
    struct HeldFeed {
        calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl CloudcastSource for HeldFeed {
        async fn cloudcasts(&self, _feed: &str, _window: PollWindow) -> crate::Result<CloudcastPage> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                self.release.notified().await;
            }
            Ok(CloudcastPage {
                data: vec![cloudcast(&format!("w{call}"))],
                paging: Paging::default(),
            })
        }

        async fn page(&self, _next_url: &str) -> crate::Result<CloudcastPage> {
            Ok(CloudcastPage::default())
        }
    }

    fn bee_with(source: Arc<dyn CloudcastSource>) -> MixcloudBee {
        MixcloudBee::new("mixes", "mixcloudbee", "", BeeOptions::new()).with_source(source)
    }

    fn feed(slugs: &[&'static str]) -> Arc<StaticFeed> {
        Arc::new(StaticFeed {
            slugs: slugs.to_vec(),
            windows: Mutex::new(Vec::new()),
        })
    }

    fn one_page() -> Arc<StaticFeed> {
        feed(&["late-set"])
    }

    fn every_minute() -> BeeOptions {
        BeeOptions::new()
            .with("feed", "spartacus")
            .with("interval", 60)
    }

    #[tokio::test]
    async fn poll_emits_named_events() {
        let bee = bee_with(one_page());
        let (tx, mut rx) = event_channel(8);
        bee.run(tx).await.unwrap();

        bee.action(Action::new("mixes", POLL_FEED)).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.bee, "mixes");
        assert_eq!(event.name, NEW_CLOUDCAST);
        let names: Vec<_> = event.options.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["name", "url", "slug"]);
        assert_eq!(
            event.options.value("url"),
            Some(&PlaceholderValue::Url(
                "https://www.mixcloud.com/dj/late-set/".into()
            ))
        );
    }

    #[tokio::test]
    async fn sequential_polls_advance_watermark() {
        let source = one_page();
        let bee = bee_with(Arc::clone(&source) as Arc<dyn CloudcastSource>);
        let (tx, _rx) = event_channel(8);
        bee.run(tx).await.unwrap();

        bee.poll_feed().await.unwrap();
        bee.poll_feed().await.unwrap();
        let windows = source.windows.lock().unwrap();
        assert_eq!(windows.len(), 2);
        assert!(windows[1].since >= windows[0].until);
        assert_eq!(bee.watermark().last(), windows[1].until);
    }

    #[tokio::test]
    async fn overlapping_polls_emit_in_window_order() {
        let source = Arc::new(HeldFeed::default());
        let bee = Arc::new(bee_with(Arc::clone(&source) as Arc<dyn CloudcastSource>));
        let (tx, mut rx) = event_channel(8);
        bee.run(tx).await.unwrap();

        let first = {
            let bee = Arc::clone(&bee);
            tokio::spawn(async move { bee.poll_feed().await })
        };
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let second = {
            let bee = Arc::clone(&bee);
            tokio::spawn(async move { bee.action(Action::new("mixes", POLL_FEED)).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        source.release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), 1);
        second.await.unwrap().unwrap();

        let mut slugs = Vec::new();
        while let Ok(event) = rx.try_recv() {
            slugs.push(event.options.value("slug").unwrap().to_string());
        }
        assert_eq!(slugs, ["w1", "w2"]);
    }

    #[tokio::test]
    async fn full_channel_holds_the_poll() {
        let bee = Arc::new(bee_with(feed(&["a", "b", "c"])));
        let (tx, mut rx) = event_channel(1);
        bee.run(tx).await.unwrap();

        let poll = {
            let bee = Arc::clone(&bee);
            tokio::spawn(async move { bee.poll_feed().await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!poll.is_finished());

        let mut slugs = Vec::new();
        for _ in 0..3 {
            let event = rx.recv().await.unwrap();
            slugs.push(event.options.value("slug").unwrap().to_string());
        }
        assert_eq!(poll.await.unwrap().unwrap(), 3);
        assert_eq!(slugs, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn unknown_action_is_contract_violation() {
        let bee = bee_with(one_page());
        let err = bee
            .action(Action::new("mixes", "explode"))
            .await
            .unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[tokio::test]
    async fn poll_before_run_keeps_watermark() {
        let source = one_page();
        let bee = bee_with(Arc::clone(&source) as Arc<dyn CloudcastSource>);
        let err = bee.poll_feed().await.unwrap_err();
        assert!(matches!(err, Error::NotRunning { .. }));
        assert_eq!(bee.watermark(), Watermark::new());
        assert!(source.windows.lock().unwrap().is_empty());

        let (tx, mut rx) = event_channel(8);
        bee.run(tx).await.unwrap();
        assert_eq!(bee.poll_feed().await.unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap().name, NEW_CLOUDCAST);
    }

    #[tokio::test]
    async fn unconfigured_poll_is_a_no_op() {
        let bee = MixcloudBee::new("mixes", "mixcloudbee", "", BeeOptions::new());
        assert_eq!(bee.poll_feed().await.unwrap(), 0);
        assert_eq!(bee.watermark(), Watermark::new());
    }

    #[tokio::test]
    async fn reload_binds_options() {
        let bee = MixcloudBee::new("mixes", "mixcloudbee", "", BeeOptions::new());
        bee.reload_options(
            BeeOptions::new()
                .with("feed", "spartacus")
                .with("interval", "0"),
        )
        .await
        .unwrap();
        assert_eq!(bee.feed(), "spartacus");
    }

    #[tokio::test]
    async fn reload_rejects_bad_base_url() {
        let bee = MixcloudBee::new("mixes", "mixcloudbee", "", BeeOptions::new());
        let err = bee
            .reload_options(BeeOptions::new().with("baseUrl", "not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::External { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_polls_in_background() {
        let source = one_page();
        let bee = MixcloudBee::new("mixes", "mixcloudbee", "", BeeOptions::new());
        bee.reload_options(every_minute()).await.unwrap();
        let bee = bee.with_source(Arc::clone(&source) as Arc<dyn CloudcastSource>);
        let (tx, mut rx) = event_channel(8);
        bee.run(tx).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, NEW_CLOUDCAST);
        assert!(!source.windows.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_stops_background_polling() {
        let source = one_page();
        let bee = bee_with(Arc::clone(&source) as Arc<dyn CloudcastSource>);
        bee.reload_options(every_minute()).await.unwrap();
        let (tx, mut rx) = event_channel(8);
        bee.run(tx).await.unwrap();
        rx.recv().await.unwrap();

        bee.reload_options(every_minute().with("interval", 0))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(180)).await;
        tokio::task::yield_now().await;

        assert_eq!(source.windows.lock().unwrap().len(), 1);
        assert!(!bee.inner.polling.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_receiver_stops_background_polling() {
        let source = one_page();
        let bee = bee_with(Arc::clone(&source) as Arc<dyn CloudcastSource>);
        bee.reload_options(every_minute()).await.unwrap();
        let (tx, mut rx) = event_channel(8);
        bee.run(tx).await.unwrap();
        rx.recv().await.unwrap();

        drop(rx);
        tokio::time::sleep(Duration::from_secs(180)).await;
        tokio::task::yield_now().await;

        assert_eq!(source.windows.lock().unwrap().len(), 1);
        assert!(!bee.inner.polling.load(Ordering::SeqCst));

        bee.reload_options(every_minute()).await.unwrap();
        assert!(bee.inner.polling.load(Ordering::SeqCst));
    }
}
