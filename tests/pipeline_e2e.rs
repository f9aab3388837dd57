// tests/pipeline_e2e.rs
//
// Full runs against an in-memory fetcher: work set, fetch loop, merge,
// transform and render, all through the on-disk tables.
//
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tal_archive::config::options::{AppOptions, FailurePolicy, OutputOptions, StoreOptions, WorkMode};
use tal_archive::core::net::{Fetch, PageResponse};
use tal_archive::error::{Error, FetchError, StoreError};
use tal_archive::runner::Orchestrator;
use tal_archive::store::Store;
use tempfile::TempDir;

const ITEM: &str = "<item><num>{num}</num><title>{title}</title><pubDate>{pubdate}</pubDate><enc>{download_url}</enc></item>";
const FEED: &str = "<rss><refreshed>{last_refresh}</refreshed><missing>{missing_nums}</missing>\n{items}\n</rss>";

enum Reply {
    Page(String),
    Status(u16),
}

#[derive(Default)]
struct FakeFetcher {
    feed: String,
    pages: HashMap<u32, Reply>,
    feed_calls: usize,
    page_calls: Vec<u32>,
}

impl FakeFetcher {
    fn with_feed(nums: &[u32]) -> Self {
        Self { feed: feed_xml(nums), ..Default::default() }
    }

    fn page(mut self, num: u32, title: &str, date: &str) -> Self {
        self.pages.insert(num, Reply::Page(episode_html(title, date, num)));
        self
    }

    fn status(mut self, num: u32, status: u16) -> Self {
        self.pages.insert(num, Reply::Status(status));
        self
    }
}

impl Fetch for FakeFetcher {
    fn fetch_page(&mut self, num: u32) -> Result<PageResponse, FetchError> {
        self.page_calls.push(num);
        let url = format!("http://test/episode/{num}");
        match self.pages.get(&num) {
            Some(Reply::Page(text)) => Ok(PageResponse {
                final_url: format!("{url}/slug"),
                url,
                text: text.clone(),
            }),
            Some(Reply::Status(status)) => Err(FetchError::Status { url, status: *status }),
            None => Err(FetchError::Status { url, status: 404 }),
        }
    }

    fn fetch_feed(&mut self) -> Result<String, FetchError> {
        self.feed_calls += 1;
        Ok(self.feed.clone())
    }
}

fn feed_xml(nums: &[u32]) -> String {
    let items: String = nums
        .iter()
        .map(|n| format!("<item><title>{n}: Episode {n}</title></item>"))
        .chain(std::iter::once(s("<item><title>Fundraiser Announcement</title></item>")))
        .collect();
    format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>t</title><link>http://test/</link>\
         <description>d</description>{items}</channel></rss>"
    )
}

fn episode_html(title: &str, date: &str, num: u32) -> String {
    format!(
        r#"<html><body><div class="container">
          <div class="episode-title"><h1>{title}</h1></div>
          <div class="meta"><div class="field-name-field-radio-air-date">
            <span class="date-display-single">{date}</span></div></div>
          <div class="field-name-body">About episode {num} &amp; more</div>
          <ul class="actions"><li class="download">
            <a href="https://cdn.test/{num}.mp3?source=site">Download</a></li></ul>
        </div></body></html>"#
    )
}

fn s(v: &str) -> String { v.to_string() }

/// Temp workspace with templates and empty tables.
fn workspace() -> (TempDir, AppOptions) {
    let dir = TempDir::new().unwrap();
    let tpl = dir.path().join("templates");
    fs::create_dir_all(&tpl).unwrap();
    fs::write(tpl.join("item.xml"), ITEM).unwrap();
    fs::write(tpl.join("feed.xml"), FEED).unwrap();

    let mut opts = AppOptions::default();
    opts.store = StoreOptions::in_dir(dir.path().join("data"));
    opts.output = OutputOptions {
        template_dir: tpl,
        out_path: dir.path().join("out").join("feed.xml"),
        ..OutputOptions::default()
    };
    Store::new(opts.store.clone()).init().unwrap();
    (dir, opts)
}

fn at(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
}

fn read(p: &Path) -> String {
    fs::read_to_string(p).unwrap()
}

#[test]
fn fresh_archive_fetches_feed_episodes() {
    let (_dir, opts) = workspace();
    let fetcher = FakeFetcher::with_feed(&[700, 701])
        .page(700, "700: Hit the Road", "March 20, 2020")
        .page(701, "701: Front Row Seat", "March 27, 2020");

    let mut orch = Orchestrator::new(&opts, fetcher);
    let summary = orch.run_at(at("2020-04-01T12:00:00Z"), None).unwrap();
    assert_eq!(summary.targets, 2);
    assert_eq!(summary.fetched, 2);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.published, 2);

    let store = orch.store();
    let transformed = store.read_transformed().unwrap();
    let nums: Vec<u32> = transformed.iter().map(|r| r.num).collect();
    assert_eq!(nums, vec![701, 700]);
    assert_eq!(transformed[0].pubdate, "Fri, 27 Mar 2020 18:00:00 -0400");
    assert_eq!(transformed[0].download_url, "https://cdn.test/701.mp3");
    assert_eq!(transformed[0].description, "About episode 701 &amp; more");
    assert_eq!(transformed[0].url, "http://test/episode/701");
    assert_eq!(transformed[0].full_url, "http://test/episode/701/slug");
    assert!(store.read_failures().unwrap().is_empty());

    let doc = read(&opts.output.out_path);
    assert_eq!(doc.matches("<item>").count(), 2);
    assert!(doc.contains("<missing></missing>"));
    assert!(doc.contains("<refreshed>2020-04-01 12:00:00</refreshed>"));
    assert!(doc.find("<num>701</num>").unwrap() < doc.find("<num>700</num>").unwrap());
}

#[test]
fn failed_episode_is_recorded_and_skipped() {
    let (_dir, opts) = workspace();
    let fetcher = FakeFetcher::with_feed(&[700, 701])
        .page(700, "700: Hit the Road", "March 20, 2020")
        .status(701, 500);

    let mut orch = Orchestrator::new(&opts, fetcher);
    let summary = orch.run_at(at("2020-04-01T12:00:00Z"), None).unwrap();
    assert_eq!(summary.failed, vec![701]);

    let store = orch.store();
    let failures = store.read_failures().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].num, 701);
    assert_eq!(failures[0].reason, "HTTP 500 for http://test/episode/701");

    let raw: Vec<u32> = store.read_raw().unwrap().iter().map(|r| r.num).collect();
    let transformed: Vec<u32> = store.read_transformed().unwrap().iter().map(|r| r.num).collect();
    assert_eq!(raw, vec![700]);
    assert_eq!(transformed, vec![700]);

    assert!(read(&opts.output.out_path).contains("<missing>701</missing>"));
}

#[test]
fn parse_failures_are_recorded_too() {
    let (_dir, opts) = workspace();
    let mut fetcher = FakeFetcher::with_feed(&[5]);
    fetcher.pages.insert(5, Reply::Page(s("<html><body>maintenance</body></html>")));

    let mut orch = Orchestrator::new(&opts, fetcher);
    orch.run_at(at("2020-04-01T12:00:00Z"), None).unwrap();

    let failures = orch.store().read_failures().unwrap();
    assert_eq!(failures[0].reason, "episode page is missing title block");
}

#[test]
fn second_run_with_nothing_new_is_a_no_op() {
    let (_dir, opts) = workspace();
    let when = at("2020-04-01T12:00:00Z");

    let fetcher = FakeFetcher::with_feed(&[700, 701])
        .page(700, "700: Hit the Road", "March 20, 2020")
        .page(701, "701: Front Row Seat", "March 27, 2020");
    Orchestrator::new(&opts, fetcher).run_at(when, None).unwrap();

    let raw_before = read(&opts.store.raw_path());
    let transformed_before = read(&opts.store.transformed_path());
    let doc_before = read(&opts.output.out_path);

    let mut orch = Orchestrator::new(&opts, FakeFetcher::with_feed(&[700, 701]));
    let summary = orch.run_at(when, None).unwrap();
    assert_eq!(summary.targets, 0);

    assert_eq!(read(&opts.store.raw_path()), raw_before);
    assert_eq!(read(&opts.store.transformed_path()), transformed_before);
    assert_eq!(read(&opts.output.out_path), doc_before);
}

#[test]
fn only_missing_numbers_are_fetched() {
    let (_dir, opts) = workspace();
    let when = at("2020-04-01T12:00:00Z");

    let first = FakeFetcher::with_feed(&[700]).page(700, "700: Hit the Road", "March 20, 2020");
    Orchestrator::new(&opts, first).run_at(when, None).unwrap();

    let second = FakeFetcher::with_feed(&[700, 701]).page(701, "701: Front Row Seat", "March 27, 2020");
    let mut orch = Orchestrator::new(&opts, second);
    orch.run_at(when, None).unwrap();

    let nums: BTreeSet<u32> = orch.store().read_transformed().unwrap().iter().map(|r| r.num).collect();
    assert_eq!(nums, [700, 701].into_iter().collect());
}

#[test]
fn refresh_refetches_published_and_latest_fetch_wins() {
    let (_dir, mut opts) = workspace();
    let when = at("2020-04-01T12:00:00Z");

    let first = FakeFetcher::with_feed(&[700]).page(700, "700: Hit teh Road", "March 20, 2020");
    Orchestrator::new(&opts, first).run_at(when, None).unwrap();

    opts.run.mode = WorkMode::Refresh;
    let corrected = FakeFetcher::with_feed(&[]).page(700, "700: Hit the Road", "March 20, 2020");
    let mut orch = Orchestrator::new(&opts, corrected);
    let summary = orch.run_at(when, None).unwrap();
    assert_eq!(summary.targets, 1);

    let transformed = orch.store().read_transformed().unwrap();
    assert_eq!(transformed.len(), 1);
    assert_eq!(transformed[0].title, "700: Hit the Road");

    // same (num, download_url): the old raw row is merged away
    assert_eq!(orch.store().read_raw().unwrap().len(), 1);
}

#[test]
fn refresh_does_not_touch_the_feed() {
    let (_dir, mut opts) = workspace();
    opts.run.mode = WorkMode::Refresh;

    let mut orch = Orchestrator::new(&opts, FakeFetcher::default());
    let summary = orch.run_at(at("2020-04-01T12:00:00Z"), None).unwrap();
    assert_eq!(summary.targets, 0);
    assert_eq!(summary.published, 0);
}

#[test]
fn empty_message_policy_is_explicit() {
    struct Silent;
    impl Fetch for Silent {
        fn fetch_page(&mut self, num: u32) -> Result<PageResponse, FetchError> {
            Err(FetchError::Status { url: format!("x/{num}"), status: 503 })
        }
        fn fetch_feed(&mut self) -> Result<String, FetchError> {
            Ok(feed_xml(&[1]))
        }
    }

    // Our errors always carry a message, so both policies record it.
    for policy in [FailurePolicy::RecordAll, FailurePolicy::SkipEmptyMessages] {
        let (_dir, mut opts) = workspace();
        opts.run.failure_policy = policy;
        let mut orch = Orchestrator::new(&opts, Silent);
        orch.run_at(at("2020-04-01T12:00:00Z"), None).unwrap();
        assert_eq!(orch.store().read_failures().unwrap().len(), 1);
    }
}

#[test]
fn missing_tables_are_fatal() {
    let (dir, mut opts) = workspace();
    opts.store = StoreOptions::in_dir(dir.path().join("nowhere"));

    let mut orch = Orchestrator::new(&opts, FakeFetcher::with_feed(&[1]));
    let err = orch.run_at(at("2020-04-01T12:00:00Z"), None).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Missing(_))));
    assert!(!opts.output.out_path.exists());
}

#[test]
fn broken_template_leaves_output_untouched() {
    let (_dir, opts) = workspace();
    fs::write(opts.output.item_template_path(), "<item>{nope}</item>").unwrap();

    let fetcher = FakeFetcher::with_feed(&[700]).page(700, "700: Hit the Road", "March 20, 2020");
    let mut orch = Orchestrator::new(&opts, fetcher);
    let err = orch.run_at(at("2020-04-01T12:00:00Z"), None).unwrap_err();
    assert!(matches!(err, Error::Template(_)));
    assert!(!opts.output.out_path.exists());
}

#[test]
fn abbreviated_air_dates_are_published() {
    let (_dir, opts) = workspace();
    let fetcher = FakeFetcher::with_feed(&[700, 701])
        .page(700, "700: Hit the Road", "March 20 2020")
        .page(701, "701: Front Row Seat", "Mar. 27, 2020");

    let mut orch = Orchestrator::new(&opts, fetcher);
    let summary = orch.run_at(at("2020-04-01T12:00:00Z"), None).unwrap();
    assert!(summary.failed.is_empty());

    let pubdates: Vec<String> = orch.store().read_transformed().unwrap().into_iter().map(|r| r.pubdate).collect();
    assert_eq!(pubdates, vec!["Fri, 27 Mar 2020 18:00:00 -0400", "Fri, 20 Mar 2020 18:00:00 -0400"]);
}

#[test]
fn unreadable_air_date_never_reaches_raw() {
    let (_dir, opts) = workspace();
    let when = at("2020-04-01T12:00:00Z");
    let fetcher = FakeFetcher::with_feed(&[700, 701])
        .page(700, "700: Hit the Road", "March 20, 2020")
        .page(701, "701: Front Row Seat", "Spring 2020");

    let mut orch = Orchestrator::new(&opts, fetcher);
    let summary = orch.run_at(when, None).unwrap();
    assert_eq!(summary.failed, vec![701]);

    let store = orch.store();
    let failures = store.read_failures().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].num, 701);
    assert_eq!(failures[0].reason, "episode page has an unreadable air date `Spring 2020`");

    let raw: Vec<u32> = store.read_raw().unwrap().iter().map(|r| r.num).collect();
    assert_eq!(raw, vec![700]);
    assert!(read(&opts.output.out_path).contains("<missing>701</missing>"));

    // Later runs and renders keep working.
    let again = FakeFetcher::with_feed(&[700, 701]).page(701, "701: Front Row Seat", "Spring 2020");
    Orchestrator::new(&opts, again).run_at(when, None).unwrap();
    assert_eq!(tal_archive::runner::render_only(&opts, when).unwrap(), 1);
}
