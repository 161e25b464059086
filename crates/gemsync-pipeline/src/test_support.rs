//! In-memory collaborators and log capture shared by the pipeline tests

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gemsync_core::{
    OwnerList, OwnerRecord, PackageInfo, PackageName, Page, SyncError, VersionList, VersionRecord,
};
use gemsync_registry::{RegistryResult, SinkClient, SourceClient};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::retry::RetryConfig;

/// Retry settings with no backoff so exhaustion tests finish instantly
pub fn immediate_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        multiplier: 1.0,
    }
}

/// JSON log lines written by the thread-local subscriber from [`capture_logs`]
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl LogCapture {
    pub fn entries(&self) -> Vec<serde_json::Value> {
        let raw = self.buf.lock().unwrap().clone();
        String::from_utf8(raw)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Entries whose `event` field equals `event`
    pub fn with_event(&self, event: &str) -> Vec<serde_json::Value> {
        self.entries()
            .into_iter()
            .filter(|entry| entry["fields"]["event"] == event)
            .collect()
    }

    pub fn count(&self, event: &str) -> usize {
        self.with_event(event).len()
    }
}

/// Route events on this thread into a JSON buffer until the guard drops.
/// The guard is thread-local, so tests using it must run on a current-thread runtime.
pub fn capture_logs() -> (LogCapture, DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::DEBUG)
        .json()
        .finish();

    (capture, tracing::subscriber::set_default(subscriber))
}

/// Scripted answer for one source call
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Found(T),
    NotFound,
    /// Fail every attempt
    Fail,
    /// Fail this many attempts, then answer
    FailTimes(u32, T),
    Panic,
}

#[derive(Debug, Clone)]
pub struct FakePackage {
    pub info: Reply<PackageInfo>,
    pub versions: Reply<VersionList>,
    pub owners: Reply<OwnerList>,
}

impl FakePackage {
    /// A package every source call answers
    pub fn complete(name: &str) -> Self {
        Self {
            info: Reply::Found(PackageInfo::new(name).with_version("1.0.0")),
            versions: Reply::Found(vec![VersionRecord::new("1.0.0"), VersionRecord::new("0.9.0")]),
            owners: Reply::Found(vec![OwnerRecord::new(1, "maintainer")]),
        }
    }
}

/// Every source and sink call by package, in the order the calls happened
#[derive(Clone, Default)]
pub struct Timeline {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Timeline {
    fn touch(&self, name: &PackageName) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    /// Most packages in progress at once. A package is in progress from its first source
    /// call to its last sink write.
    pub fn max_in_flight(&self) -> usize {
        let calls = self.calls.lock().unwrap().clone();
        let mut spans: HashMap<&str, (usize, usize)> = HashMap::new();
        for (at, name) in calls.iter().enumerate() {
            spans.entry(name.as_str()).or_insert((at, at)).1 = at;
        }

        (0..calls.len())
            .map(|at| {
                spans
                    .values()
                    .filter(|(first, last)| *first <= at && at <= *last)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}

/// Source registry fake that records calls
#[derive(Default)]
pub struct FakeSource {
    packages: HashMap<String, FakePackage>,
    delay: Duration,
    timeline: Timeline,
    calls: Mutex<Vec<(&'static str, String)>>,
    attempts: Mutex<HashMap<(&'static str, String), u32>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, name: &str, package: FakePackage) -> Self {
        self.packages.insert(name.to_string(), package);
        self
    }

    /// Hold every call open for `delay`, so overlapping packages are visible
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeline(mut self, timeline: &Timeline) -> Self {
        self.timeline = timeline.clone();
        self
    }

    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.calls().iter().filter(|(call, _)| *call == op).count()
    }

    async fn answer<T: Clone>(
        &self,
        op: &'static str,
        name: &PackageName,
        pick: impl Fn(&FakePackage) -> &Reply<T>,
    ) -> RegistryResult<Option<T>> {
        self.timeline.touch(name);
        self.calls.lock().unwrap().push((op, name.to_string()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let count = attempts.entry((op, name.to_string())).or_insert(0);
            *count += 1;
            *count
        };

        let Some(package) = self.packages.get(name.as_str()) else {
            return Ok(None);
        };

        match pick(package) {
            Reply::Found(value) => Ok(Some(value.clone())),
            Reply::NotFound => Ok(None),
            Reply::Fail => Err(unavailable(op, name)),
            Reply::FailTimes(failures, _) if attempt <= *failures => Err(unavailable(op, name)),
            Reply::FailTimes(_, value) => Ok(Some(value.clone())),
            Reply::Panic => panic!("source exploded on {} for {}", op, name),
        }
    }
}

fn unavailable(op: &str, name: &PackageName) -> SyncError {
    SyncError::HttpStatus {
        method: "GET".to_string(),
        url: format!("https://rubygems.test/{}/{}", op, name),
        status: 503,
    }
}

#[async_trait]
impl SourceClient for FakeSource {
    async fn fetch_info(&self, name: &PackageName) -> RegistryResult<Option<PackageInfo>> {
        self.answer("fetch_info", name, |p| &p.info).await
    }

    async fn fetch_versions(&self, name: &PackageName) -> RegistryResult<Option<VersionList>> {
        self.answer("fetch_versions", name, |p| &p.versions).await
    }

    async fn fetch_owners(&self, name: &PackageName) -> RegistryResult<Option<OwnerList>> {
        self.answer("fetch_owners", name, |p| &p.owners).await
    }
}

/// One accepted sink write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkWrite {
    Detail(String),
    Dependencies(String),
    Versions(String, usize),
    Owners(String, usize),
}

impl SinkWrite {
    pub fn package(&self) -> &str {
        match self {
            SinkWrite::Detail(name)
            | SinkWrite::Dependencies(name)
            | SinkWrite::Versions(name, _)
            | SinkWrite::Owners(name, _) => name,
        }
    }
}

/// Sink fake serving a fixed catalog and recording writes
#[derive(Default)]
pub struct FakeSink {
    pages: Vec<Vec<String>>,
    failing_list_page: Option<u32>,
    failing_puts: HashSet<(&'static str, String)>,
    timeline: Timeline,
    list_calls: Mutex<Vec<u32>>,
    writes: Mutex<Vec<SinkWrite>>,
}

impl FakeSink {
    /// Pages are numbered from 1; anything past the last one is empty
    pub fn with_pages(pages: &[&[&str]]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|page| page.iter().map(|name| name.to_string()).collect())
                .collect(),
            ..Self::default()
        }
    }

    /// Every attempt to list `page` fails
    pub fn failing_list(mut self, page: u32) -> Self {
        self.failing_list_page = Some(page);
        self
    }

    /// Every `kind` write ("detail", "dependencies", "versions", "owners") for `name` fails
    pub fn failing_put(mut self, kind: &'static str, name: &str) -> Self {
        self.failing_puts.insert((kind, name.to_string()));
        self
    }

    pub fn with_timeline(mut self, timeline: &Timeline) -> Self {
        self.timeline = timeline.clone();
        self
    }

    pub fn list_calls(&self) -> Vec<u32> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<SinkWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_for(&self, name: &str) -> Vec<SinkWrite> {
        self.writes()
            .into_iter()
            .filter(|write| write.package() == name)
            .collect()
    }

    fn record(
        &self,
        kind: &'static str,
        name: &PackageName,
        write: SinkWrite,
    ) -> RegistryResult<()> {
        self.timeline.touch(name);
        if self.failing_puts.contains(&(kind, name.to_string())) {
            return Err(SyncError::HttpStatus {
                method: "PUT".to_string(),
                url: format!("https://bestgems.test/api/v2/gems/{}/{}", name, kind),
                status: 500,
            });
        }
        self.writes.lock().unwrap().push(write);
        Ok(())
    }
}

#[async_trait]
impl SinkClient for FakeSink {
    async fn list_page(&self, page: u32) -> RegistryResult<Page> {
        self.list_calls.lock().unwrap().push(page);

        if self.failing_list_page == Some(page) {
            return Err(SyncError::Network {
                message: format!("catalog page {} unreachable", page),
                source: None,
            });
        }

        let names = self
            .pages
            .get(page as usize - 1)
            .map(|names| names.iter().map(|name| PackageName::new(name.as_str())).collect())
            .unwrap_or_default();

        Ok(Page::new(page, names))
    }

    async fn put_detail(&self, info: &PackageInfo) -> RegistryResult<()> {
        self.record("detail", info.name(), SinkWrite::Detail(info.name().to_string()))
    }

    async fn put_dependencies(&self, info: &PackageInfo) -> RegistryResult<()> {
        self.record(
            "dependencies",
            info.name(),
            SinkWrite::Dependencies(info.name().to_string()),
        )
    }

    async fn put_versions(&self, name: &PackageName, versions: &VersionList) -> RegistryResult<()> {
        self.record("versions", name, SinkWrite::Versions(name.to_string(), versions.len()))
    }

    async fn put_owners(&self, name: &PackageName, owners: &OwnerList) -> RegistryResult<()> {
        self.record("owners", name, SinkWrite::Owners(name.to_string(), owners.len()))
    }
}
