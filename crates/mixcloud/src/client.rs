use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tracing::{debug, error},
    url::Url,
};

use crate::{
    error::{Error, Result},
    watermark::PollWindow,
};

/// Public API endpoint used when no `baseUrl` is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.mixcloud.com";

/// One upload in a feed. Fields the bee does not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cloudcast {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

/// A page of a cloudcast listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CloudcastPage {
    #[serde(default)]
    pub data: Vec<Cloudcast>,
    #[serde(default)]
    pub paging: Paging,
}

impl CloudcastPage {
    /// Link to the following page, if there is one.
    pub fn next_url(&self) -> Option<&str> {
        self.paging.next.as_deref().filter(|next| !next.is_empty())
    }
}

/// Where cloudcast pages come from.
#[async_trait]
pub trait CloudcastSource: Send + Sync {
    /// First page of `feed`'s uploads inside `window`.
    async fn cloudcasts(&self, feed: &str, window: PollWindow) -> Result<CloudcastPage>;

    /// A follow-up page, addressed by the link the previous page returned.
    async fn page(&self, next_url: &str) -> Result<CloudcastPage>;
}

/// HTTP client for the Mixcloud API.
#[derive(Debug, Clone)]
pub struct MixcloudClient {
    base_url: Url,
    http: reqwest::Client,
}

impl MixcloudClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn cloudcasts_url(&self, feed: &str, window: PollWindow) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::message(format!("{} cannot carry a feed path", self.base_url)))?
            .pop_if_empty()
            .push(feed.trim_matches('/'))
            .push("cloudcasts")
            .push("");
        url.query_pairs_mut()
            .append_pair("since", &window.since.timestamp().to_string())
            .append_pair("until", &window.until.timestamp().to_string());
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<CloudcastPage> {
        debug!(%url, "fetching cloudcast page");
        let page = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<CloudcastPage>()
            .await?;
        Ok(page)
    }
}

#[async_trait]
impl CloudcastSource for MixcloudClient {
    async fn cloudcasts(&self, feed: &str, window: PollWindow) -> Result<CloudcastPage> {
        let url = self.cloudcasts_url(feed, window)?;
        self.fetch(url).await
    }

    async fn page(&self, next_url: &str) -> Result<CloudcastPage> {
        self.fetch(Url::parse(next_url)?).await
    }
}

/// Fetch every page of `feed` inside `window`, in listing order.
///
/// A failing first page yields nothing. A failing later page stops the walk
/// and keeps what was already fetched. Failures are logged, not returned.
pub async fn collect_cloudcasts(
    source: &dyn CloudcastSource,
    feed: &str,
    window: PollWindow,
) -> Vec<Cloudcast> {
    let first = match source.cloudcasts(feed, window).await {
        Ok(page) => page,
        Err(e) => {
            error!(feed, error = %e, "failed to fetch cloudcasts");
            return Vec::new();
        },
    };

    let mut next = first.next_url().map(ToString::to_string);
    let mut all = first.data;
    while let Some(url) = next.take() {
        match source.page(&url).await {
            Ok(page) => {
                next = page.next_url().map(ToString::to_string);
                all.extend(page.data);
            },
            Err(e) => {
                error!(feed, url = %url, error = %e, "failed to fetch next cloudcast page");
                break;
            },
        }
    }
    all
}
