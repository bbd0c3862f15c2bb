//! Serialized access to the one shared automated browser page.
//!
//! Catalog pages that refuse plain HTTP clients are fetched through a real
//! browser driven over WebDriver. Exactly one page exists process-wide, so
//! [`BrowserGate`] wraps it in an async mutex: any two logically concurrent
//! scraping operations are serialized, never interleaved, and the guard drop
//! releases the lock on every exit path, so a failed navigation never
//! deadlocks later callers.
//!
//! Page readiness is not signaled by the navigation itself (the site renders
//! late), so after navigating the gate polls for a marker element at a fixed
//! interval with a bounded attempt budget.

use crate::error::{PartmarkError, Result};
use async_trait::async_trait;
use fantoccini::{ClientBuilder, Locator};
use futures::future::BoxFuture;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_ATTEMPTS: u32 = 20;

/// Minimal surface of an automated page. Implemented over WebDriver in
/// production, by fakes in tests.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&mut self, url: &str) -> Result<()>;
    async fn element_exists(&mut self, css: &str) -> Result<bool>;
    async fn content(&mut self) -> Result<String>;
}

/// Pluggable session transport: the gate connects lazily on first use, so a
/// run that never escalates to scraping never needs a browser.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn PageDriver>>;
}

/// Poll `check` against `subject` every `interval` until it reports true,
/// giving up with [`PartmarkError::AutomationTimeout`] after `max_attempts`.
pub async fn poll_until<T, F>(
    subject: &mut T,
    interval: Duration,
    max_attempts: u32,
    mut check: F,
) -> Result<()>
where
    T: ?Sized,
    F: for<'a> FnMut(&'a mut T) -> BoxFuture<'a, Result<bool>>,
{
    for attempt in 1..=max_attempts {
        if check(subject).await? {
            return Ok(());
        }
        if attempt < max_attempts {
            debug!(attempt, "page not ready yet, waiting...");
            tokio::time::sleep(interval).await;
        }
    }
    Err(PartmarkError::AutomationTimeout {
        attempts: max_attempts,
    })
}

/// Mutual-exclusion wrapper around the single shared automated page.
pub struct BrowserGate {
    session: Mutex<Option<Box<dyn PageDriver>>>,
    factory: Box<dyn DriverFactory>,
    marker: String,
    poll_interval: Duration,
    max_attempts: u32,
}

impl BrowserGate {
    /// `marker` is the CSS selector whose presence means the page finished
    /// rendering.
    pub fn new(factory: Box<dyn DriverFactory>, marker: impl Into<String>) -> Self {
        Self {
            session: Mutex::new(None),
            factory,
            marker: marker.into(),
            poll_interval: POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }

    /// Override the readiness polling schedule.
    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_attempts = max_attempts;
        self
    }

    /// Navigate the shared page to `url`, wait for the readiness marker and
    /// return the rendered HTML. Callers block until the page is free.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let mut slot = self.session.lock().await;
        if slot.is_none() {
            info!("starting browser session...");
            *slot = Some(self.factory.connect().await?);
            info!("browser session started");
        }
        let driver = match slot.as_mut() {
            Some(driver) => driver,
            None => unreachable!("session populated above"),
        };

        driver.goto(url).await?;
        let marker = self.marker.clone();
        poll_until(driver.as_mut(), self.poll_interval, self.max_attempts, move |d| {
            let marker = marker.clone();
            Box::pin(async move { d.element_exists(&marker).await })
        })
        .await?;
        driver.content().await
    }
}

/// Production transport: a WebDriver session (chromedriver/geckodriver).
pub struct WebDriverFactory {
    endpoint: String,
    landing_url: String,
}

impl WebDriverFactory {
    /// `endpoint` is the WebDriver server URL; `landing_url` is navigated
    /// once at connect time to warm up cookies before any search.
    pub fn new(endpoint: impl Into<String>, landing_url: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            landing_url: landing_url.into(),
        }
    }
}

#[async_trait]
impl DriverFactory for WebDriverFactory {
    async fn connect(&self) -> Result<Box<dyn PageDriver>> {
        let client = ClientBuilder::native().connect(&self.endpoint).await?;
        client.goto(&self.landing_url).await?;
        Ok(Box::new(WebDriverPage { client }))
    }
}

struct WebDriverPage {
    client: fantoccini::Client,
}

#[async_trait]
impl PageDriver for WebDriverPage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn element_exists(&mut self, css: &str) -> Result<bool> {
        match self.client.find(Locator::Css(css)).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_no_such_element() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.client.source().await?)
    }
}
