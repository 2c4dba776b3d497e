// Shared fakes for pipeline tests.
#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use arxiv_digest::{Entry, FeedSource, Notifier};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub const FIXTURE_XML: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/arxiv_atom.xml"
));

/// Fixed "now" the fixture dates are written against.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

pub fn entry(id: &str, title: &str, summary: &str, age_days: i64, cats: &[&str]) -> Entry {
    Entry {
        id: id.into(),
        title: title.into(),
        summary: summary.into(),
        published: (now() - Duration::days(age_days)).to_rfc3339(),
        link: format!("http://arxiv.org/abs/{id}"),
        categories: cats.iter().map(|c| c.to_string()).collect(),
    }
}

pub enum FakeFeed {
    Entries(Vec<Entry>),
    Unreachable,
}

#[async_trait::async_trait]
impl FeedSource for FakeFeed {
    async fn fetch(&self) -> Result<Vec<Entry>> {
        match self {
            FakeFeed::Entries(v) => Ok(v.clone()),
            FakeFeed::Unreachable => Err(anyhow!("connection refused")),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Records every delivery; optionally fails them all.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, html_body: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("535 authentication failed"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), html_body.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
