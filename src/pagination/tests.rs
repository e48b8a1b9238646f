//! Tests for pagination module

use super::*;
use crate::decode::JsonDecoder;
use crate::error::{Error, Result};
use crate::http::{Opt, QueryParams, Response, Transport};
use crate::types::Method;
use async_trait::async_trait;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use reqwest::header::HeaderMap;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;

// ============================================================================
// Stub transport
// ============================================================================

enum StubPage {
    Body(Value),
    Raw(&'static str),
    Status(u16),
}

/// Serves fixed pages for one collection path and records every call
struct StubTransport {
    pages: HashMap<u32, StubPage>,
    link: Option<String>,
    delays: HashMap<u32, Duration>,
    stall: Option<Duration>,
    calls: AtomicUsize,
    queries: Mutex<Vec<QueryParams>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubTransport {
    /// `count` pages of `per_page` objects each, advertising `last=count`
    fn uniform(count: u32, per_page: u32) -> Self {
        let pages = (1..=count)
            .map(|page| {
                let objects: Vec<Value> = (0..per_page)
                    .map(|i| json!({"id": page * 100 + i, "page": page}))
                    .collect();
                (page, StubPage::Body(Value::Array(objects)))
            })
            .collect();
        Self::new(pages).with_link(&format!(
            "<https://lms.example.com/api/v1/folders?page={count}&per_page={per_page}>; rel=\"last\""
        ))
    }

    fn new(pages: HashMap<u32, StubPage>) -> Self {
        Self {
            pages,
            link: None,
            delays: HashMap::new(),
            stall: None,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    fn with_page(mut self, page: u32, stub: StubPage) -> Self {
        self.pages.insert(page, stub);
        self
    }

    fn with_delay(mut self, page: u32, delay: Duration) -> Self {
        self.delays.insert(page, delay);
        self
    }

    /// Delay every page after the first that has no explicit delay
    fn with_stall(mut self, delay: Duration) -> Self {
        self.stall = Some(delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn queries(&self) -> Vec<QueryParams> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, method: Method, _path: &str, query: &QueryParams) -> Result<Response> {
        assert_eq!(method, Method::GET);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        let page: u32 = query.get("page").unwrap().parse().unwrap();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = self
            .delays
            .get(&page)
            .copied()
            .or(self.stall.filter(|_| page > 1));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut headers = HeaderMap::new();
        if let Some(link) = &self.link {
            headers.insert("link", link.parse().unwrap());
        }

        match self.pages.get(&page) {
            Some(StubPage::Body(body)) => Ok(Response::new(200, headers, body.to_string())),
            Some(StubPage::Raw(raw)) => Ok(Response::new(200, headers, *raw)),
            Some(StubPage::Status(status)) => Err(Error::http_status(*status, "stub failure")),
            None => Err(Error::http_status(404, "no such page")),
        }
    }
}

fn paginator(transport: &Arc<StubTransport>) -> Paginator<Value> {
    Paginator::new(transport.clone(), "folders", JsonDecoder::<Value>::new())
}

fn ids(values: &[Value]) -> Vec<u64> {
    let mut ids: Vec<u64> = values.iter().map(|v| v["id"].as_u64().unwrap()).collect();
    ids.sort_unstable();
    ids
}

// ============================================================================
// LinkSet Tests
// ============================================================================

#[test]
fn test_link_set_parses_all_relations() {
    let header = concat!(
        "<https://lms.example.com/api/v1/courses/1/files?page=2&per_page=10>; rel=\"current\",",
        "<https://lms.example.com/api/v1/courses/1/files?page=3&per_page=10>; rel=\"next\",",
        "<https://lms.example.com/api/v1/courses/1/files?page=1&per_page=10>; rel=\"prev\",",
        "<https://lms.example.com/api/v1/courses/1/files?page=1&per_page=10>; rel=\"first\",",
        "<https://lms.example.com/api/v1/courses/1/files?page=7&per_page=10>; rel=\"last\""
    );

    let links = LinkSet::parse(header).unwrap();

    assert_eq!(links.len(), 5);
    assert_eq!(links.next().unwrap().page, 3);
    assert_eq!(links.prev().unwrap().page, 1);
    assert_eq!(links.first().unwrap().page, 1);
    assert_eq!(links.last_page(), Some(7));
    assert_eq!(links.get("current").unwrap().page, 2);
    assert_eq!(links.last().unwrap().url.path(), "/api/v1/courses/1/files");
}

#[test]
fn test_link_set_empty_header() {
    let links = LinkSet::parse("").unwrap();
    assert!(links.is_empty());
    assert_eq!(links.last_page(), None);
}

#[test]
fn test_link_set_from_headers_without_link() {
    let links = LinkSet::from_headers(&HeaderMap::new()).unwrap();
    assert!(links.is_empty());
}

#[test]
fn test_link_set_relative_url() {
    let links = LinkSet::parse("</api/v1/folders?page=3>; rel=\"last\"").unwrap();
    assert_eq!(links.last_page(), Some(3));
}

#[test_case("<https://x/folders?page=abc>; rel=\"last\"" ; "non numeric page")]
#[test_case("<https://x/folders?per_page=10>; rel=\"last\"" ; "missing page")]
#[test_case("<https://x/folders?page=>; rel=\"next\"" ; "empty page")]
#[test_case("<https://x/folders?page=-2>; rel=\"last\"" ; "negative page")]
fn test_link_set_malformed_page_is_error(header: &str) {
    let err = LinkSet::parse(header).unwrap_err();
    assert!(matches!(err, Error::LinkParse { .. }), "got {err:?}");
}

#[test]
fn test_link_set_lenient_keeps_good_relations() {
    let header = "<https://x/f?page=oops>; rel=\"next\", <https://x/f?page=4>; rel=\"last\"";

    let (links, failures) = LinkSet::parse_lenient(header);

    assert_eq!(links.last_page(), Some(4));
    assert!(links.next().is_none());
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "next");
}

#[test]
fn test_page_link_parse() {
    let link = PageLink::parse("https://x/y?per_page=5&page=12").unwrap();
    assert_eq!(link.page, 12);
    assert_eq!(link.url.query(), Some("per_page=5&page=12"));
}

// ============================================================================
// Config / Request Tests
// ============================================================================

#[test]
fn test_pagination_config_default() {
    let config = PaginationConfig::default();
    assert_eq!(config.per_page, DEFAULT_PER_PAGE);
    assert_eq!(config.per_page, 10);
    assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    assert!(config.job_timeout.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_pagination_config_builder() {
    let config = PaginationConfig::new()
        .with_per_page(50)
        .with_max_concurrency(2)
        .with_channel_capacity(4)
        .with_job_timeout(Duration::from_secs(3));

    assert_eq!(config.per_page, 50);
    assert_eq!(config.max_concurrency, 2);
    assert_eq!(config.channel_capacity, 4);
    assert_eq!(config.job_timeout, Some(Duration::from_secs(3)));
}

#[test]
fn test_pagination_config_validate() {
    assert!(PaginationConfig::new().with_per_page(0).validate().is_err());
    assert!(PaginationConfig::new()
        .with_max_concurrency(0)
        .validate()
        .is_err());
    assert!(PaginationConfig::new()
        .with_channel_capacity(0)
        .validate()
        .is_err());
    assert!(PaginationConfig::new()
        .with_job_timeout(Duration::ZERO)
        .validate()
        .is_err());
}

#[test]
fn test_page_request_query_caller_wins() {
    let caller = QueryParams::new()
        .with("per_page", "100")
        .with("search_term", "notes");
    let request = PageRequest::new("courses/1/files", caller, 10);

    let query = request.page_query(4);

    assert_eq!(query.get("page"), Some("4"));
    assert_eq!(query.get("per_page"), Some("100"));
    assert_eq!(query.get("search_term"), Some("notes"));
}

// ============================================================================
// Engine + Collector Tests
// ============================================================================

#[tokio::test]
async fn test_collect_three_pages_of_two() {
    let transport = Arc::new(StubTransport::uniform(3, 2));

    let objects = paginator(&transport).collect().await.unwrap();

    assert_eq!(objects.len(), 6);
    assert_eq!(ids(&objects), vec![100, 101, 200, 201, 300, 301]);
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_collect_is_stable_under_reordering() {
    // Later pages answer first.
    let transport = Arc::new(
        StubTransport::uniform(5, 3)
            .with_delay(2, Duration::from_millis(40))
            .with_delay(3, Duration::from_millis(30))
            .with_delay(4, Duration::from_millis(20))
            .with_delay(5, Duration::from_millis(1)),
    );

    let objects = paginator(&transport).collect().await.unwrap();

    assert_eq!(objects.len(), 15);
    let expected: Vec<u64> = (1..=5u64)
        .flat_map(|p| (0..3u64).map(move |i| p * 100 + i))
        .collect();
    assert_eq!(ids(&objects), expected);
}

#[tokio::test]
async fn test_collect_preserves_order_within_page() {
    let transport = Arc::new(StubTransport::uniform(3, 4));

    let objects = paginator(&transport).collect().await.unwrap();

    for page in 1..=3u64 {
        let in_page: Vec<u64> = objects
            .iter()
            .filter(|v| v["page"].as_u64() == Some(page))
            .map(|v| v["id"].as_u64().unwrap())
            .collect();
        assert_eq!(in_page, (0..4u64).map(|i| page * 100 + i).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn test_repeated_runs_yield_same_count() {
    let transport = Arc::new(
        StubTransport::uniform(4, 5)
            .with_delay(2, Duration::from_millis(5))
            .with_delay(4, Duration::from_millis(2)),
    );

    for _ in 0..5 {
        let objects = paginator(&transport).collect().await.unwrap();
        assert_eq!(objects.len(), 20);
    }
}

#[tokio::test]
async fn test_single_page() {
    let transport = Arc::new(StubTransport::uniform(1, 3));

    let results = paginator(&transport).start().await;
    assert_eq!(results.pages(), 1);

    let objects = results.collect().await.unwrap();
    assert_eq!(objects.len(), 3);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_empty_last_page_is_not_an_error() {
    let transport = Arc::new(StubTransport::uniform(3, 2).with_page(3, StubPage::Body(json!([]))));

    let objects = paginator(&transport).collect().await.unwrap();
    assert_eq!(objects.len(), 4);
}

#[tokio::test]
async fn test_missing_last_relation_fails_without_fanout() {
    let transport = Arc::new(
        StubTransport::uniform(3, 2)
            .with_link("<https://lms.example.com/api/v1/folders?page=2>; rel=\"next\""),
    );

    let results = paginator(&transport).start().await;
    assert_eq!(results.pages(), 0);

    let err = results.collect().await.unwrap_err();
    assert!(matches!(err, Error::PageCountUnavailable { .. }), "got {err:?}");

    // Give any stray task a chance to run before counting.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_missing_link_header_fails() {
    let mut pages = HashMap::new();
    pages.insert(1, StubPage::Body(json!([{"id": 1}])));
    let transport = Arc::new(StubTransport::new(pages));

    let err = paginator(&transport).collect().await.unwrap_err();
    assert!(matches!(err, Error::PageCountUnavailable { .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_malformed_last_page_fails() {
    let transport = Arc::new(
        StubTransport::uniform(3, 2).with_link("<https://x/folders?page=three>; rel=\"last\""),
    );

    let err = paginator(&transport).collect().await.unwrap_err();
    assert!(matches!(err, Error::LinkParse { .. }), "got {err:?}");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_malformed_non_essential_relation_is_ignored() {
    let transport = Arc::new(StubTransport::uniform(2, 2).with_link(
        "<https://x/folders?page=bad>; rel=\"next\", <https://x/folders?page=2>; rel=\"last\"",
    ));

    let objects = paginator(&transport).collect().await.unwrap();
    assert_eq!(objects.len(), 4);
}

#[tokio::test]
async fn test_first_request_failure() {
    let transport = Arc::new(StubTransport::uniform(3, 2).with_page(1, StubPage::Status(500)));

    let results = paginator(&transport).start().await;
    let (mut objects, mut errors) = results.into_parts();

    let err = errors.recv().await.unwrap();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert!(errors.recv().await.is_none());
    assert!(objects.recv().await.is_none());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_collect_fails_on_any_page_error() {
    let transport = Arc::new(StubTransport::uniform(4, 2).with_page(3, StubPage::Status(503)));

    let result = paginator(&transport).collect().await;

    match result {
        Err(Error::HttpStatus { status, .. }) => assert_eq!(status, 503),
        other => panic!("Expected HttpStatus error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_collect_fails_on_decode_error() {
    let transport = Arc::new(StubTransport::uniform(3, 2).with_page(2, StubPage::Raw("{not json")));

    let err = paginator(&transport).collect().await.unwrap_err();
    assert!(err.is_decode());
    assert_eq!(err.page(), Some(2));
}

#[tokio::test]
async fn test_raw_parts_report_each_failed_page_once() {
    let transport = Arc::new(
        StubTransport::uniform(5, 2)
            .with_page(2, StubPage::Status(500))
            .with_page(4, StubPage::Raw("garbage")),
    );

    let (mut objects, mut errors) = paginator(&transport).start().await.into_parts();

    let mut count = 0;
    while objects.recv().await.is_some() {
        count += 1;
    }
    let mut failures = Vec::new();
    while let Some(err) = errors.recv().await {
        failures.push(err);
    }

    assert_eq!(count, 6);
    assert_eq!(failures.len(), 2);
    assert_eq!(failures.iter().filter(|e| e.is_transport()).count(), 1);
    assert_eq!(failures.iter().filter(|e| e.is_decode()).count(), 1);
}

#[tokio::test]
async fn test_query_parameters_sent() {
    let transport = Arc::new(StubTransport::uniform(2, 25));

    let objects = Paginator::new(transport.clone(), "folders", JsonDecoder::<Value>::new())
        .per_page(25)
        .option(Opt::new("sort", "name"))
        .options(&[Opt::new("include[]", "user"), Opt::new("include[]", "usage_rights")])
        .collect()
        .await
        .unwrap();
    assert_eq!(objects.len(), 50);

    let mut queries = transport.queries();
    queries.sort_by_key(|q| q.get("page").map(str::to_string));

    assert_eq!(queries.len(), 2);
    for (idx, query) in queries.iter().enumerate() {
        assert_eq!(query.get("page"), Some((idx + 1).to_string().as_str()));
        assert_eq!(query.get("per_page"), Some("25"));
        assert_eq!(query.get("sort"), Some("name"));
        assert_eq!(query.get_all("include[]"), vec!["user", "usage_rights"]);
    }
}

#[tokio::test]
async fn test_caller_query_overrides_per_page() {
    let transport = Arc::new(StubTransport::uniform(1, 1));

    Paginator::new(transport.clone(), "folders", JsonDecoder::<Value>::new())
        .with_query(&QueryParams::new().with("per_page", "100"))
        .collect()
        .await
        .unwrap();

    assert_eq!(transport.queries()[0].get("per_page"), Some("100"));
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let mut transport = StubTransport::uniform(12, 1);
    for page in 2..=12 {
        transport = transport.with_delay(page, Duration::from_millis(15));
    }
    let transport = Arc::new(transport);

    let objects = paginator(&transport)
        .with_config(PaginationConfig::new().with_max_concurrency(3))
        .collect()
        .await
        .unwrap();

    assert_eq!(objects.len(), 12);
    assert!(transport.peak_in_flight.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn test_huge_page_count_keeps_live_jobs_bounded() {
    let transport = Arc::new(
        StubTransport::uniform(1, 1)
            .with_link("<https://x/folders?page=3000000>; rel=\"last\"")
            .with_stall(Duration::from_secs(3600)),
    );

    let results = paginator(&transport)
        .with_config(PaginationConfig::new().with_max_concurrency(2))
        .start()
        .await;
    assert_eq!(results.pages(), 3_000_000);

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Supervisor plus at most two page jobs.
    let alive = tokio::runtime::Handle::current()
        .metrics()
        .num_alive_tasks();
    assert!(alive <= 3, "{alive} tasks alive");
    assert!(transport.calls() <= 3, "{} requests issued", transport.calls());

    results.cancel();
}

#[tokio::test]
async fn test_cancel_stops_spawning_jobs() {
    let mut transport = StubTransport::uniform(20, 1);
    for page in 2..=20 {
        transport = transport.with_delay(page, Duration::from_millis(20));
    }
    let transport = Arc::new(transport);

    let results = paginator(&transport)
        .with_config(PaginationConfig::new().with_max_concurrency(2))
        .start()
        .await;
    results.cancel();
    let (mut objects, mut errors) = results.into_parts();

    while objects.recv().await.is_some() {}
    assert!(errors.recv().await.is_none());
    assert!(transport.calls() <= 3, "{} requests issued", transport.calls());
}

#[tokio::test]
async fn test_job_timeout() {
    let transport = Arc::new(
        StubTransport::uniform(3, 1).with_delay(3, Duration::from_millis(500)),
    );

    let err = paginator(&transport)
        .with_config(PaginationConfig::new().with_job_timeout(Duration::from_millis(50)))
        .collect()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 50 }), "got {err:?}");
}

#[tokio::test]
async fn test_invalid_config_is_reported() {
    let transport = Arc::new(StubTransport::uniform(1, 1));

    let err = paginator(&transport)
        .with_config(PaginationConfig::new().with_per_page(0))
        .collect()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidConfigValue { .. }));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_panicking_decoder_becomes_page_error() {
    let transport = Arc::new(StubTransport::uniform(3, 1));
    let decoder = |page: u32, body: &[u8]| -> Result<Vec<Value>> {
        if page == 2 {
            panic!("decoder bug on page {page}");
        }
        Ok(serde_json::from_slice(body)?)
    };

    let (mut objects, mut errors) = Paginator::new(transport.clone(), "folders", decoder)
        .start()
        .await
        .into_parts();

    let mut count = 0;
    while objects.recv().await.is_some() {
        count += 1;
    }
    let err = errors.recv().await.unwrap();

    assert_eq!(count, 2);
    match err {
        Error::JobFailed { page, message } => {
            assert_eq!(page, 2);
            assert!(message.contains("decoder bug"));
        }
        other => panic!("Expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_collect_after_error_does_not_leak_jobs() {
    // Tiny channels so producers block on sends once the collector stops reading.
    let transport = Arc::new(
        StubTransport::uniform(6, 20)
            .with_page(1, StubPage::Body(json!([])))
            .with_page(2, StubPage::Status(500)),
    );

    let err = paginator(&transport)
        .with_config(PaginationConfig::new().with_channel_capacity(1))
        .collect()
        .await
        .unwrap_err();
    assert!(err.is_transport());

    // Every job must unblock and release its reference to the transport.
    for _ in 0..50 {
        if Arc::strong_count(&transport) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(Arc::strong_count(&transport), 1);
}

// ============================================================================
// PageStream Tests
// ============================================================================

#[tokio::test]
async fn test_stream_delivers_everything() {
    let transport = Arc::new(StubTransport::uniform(3, 2));

    let stream = paginator(&transport).stream().await;
    assert_eq!(stream.pages(), 3);

    let objects: Vec<Value> = stream.collect().await;
    assert_eq!(objects.len(), 6);
}

#[tokio::test]
async fn test_stream_skip_errors_delivers_successes() {
    let transport = Arc::new(
        StubTransport::uniform(4, 3)
            .with_page(2, StubPage::Status(500))
            .with_page(3, StubPage::Raw("nope")),
    );

    let objects: Vec<Value> = paginator(&transport)
        .stream_with(SkipErrors)
        .await
        .collect()
        .await;

    assert_eq!(objects.len(), 6);
    assert_eq!(ids(&objects), vec![100, 101, 102, 400, 401, 402]);
}

#[tokio::test]
async fn test_raw_parts_drained_together_with_full_error_channel() {
    let mut transport = StubTransport::uniform(10, 2);
    for page in 2..=10 {
        transport = transport.with_page(page, StubPage::Status(500));
    }
    let transport = Arc::new(transport);

    let (mut objects, mut errors) = paginator(&transport)
        .with_config(PaginationConfig::new().with_channel_capacity(1))
        .start()
        .await
        .into_parts();

    let mut delivered = 0;
    let mut failures = 0;
    let (mut objects_open, mut errors_open) = (true, true);
    while objects_open || errors_open {
        tokio::select! {
            object = objects.recv(), if objects_open => match object {
                Some(_) => delivered += 1,
                None => objects_open = false,
            },
            error = errors.recv(), if errors_open => match error {
                Some(_) => failures += 1,
                None => errors_open = false,
            },
        }
    }

    assert_eq!(delivered, 2);
    assert_eq!(failures, 9);
}

#[tokio::test]
async fn test_stream_collect_errors_policy() {
    let transport = Arc::new(StubTransport::uniform(3, 2).with_page(3, StubPage::Status(502)));
    let policy = CollectErrors::new();

    let objects: Vec<Value> = paginator(&transport)
        .stream_with(policy.clone())
        .await
        .collect()
        .await;

    assert_eq!(objects.len(), 4);
    assert_eq!(policy.len(), 1);
    let errors = policy.take();
    assert!(matches!(errors[0], Error::HttpStatus { status: 502, .. }));
    assert!(policy.is_empty());
}

#[tokio::test]
async fn test_stream_cancel_on_error_stops_delivery() {
    let transport = Arc::new(
        StubTransport::uniform(6, 5)
            .with_page(2, StubPage::Status(500))
            .with_delay(3, Duration::from_millis(50))
            .with_delay(4, Duration::from_millis(50))
            .with_delay(5, Duration::from_millis(50))
            .with_delay(6, Duration::from_millis(50)),
    );
    let saw_error = Arc::new(AtomicUsize::new(0));
    let after_error = Arc::new(AtomicUsize::new(0));

    let flag = saw_error.clone();
    let policy = move |err: Error, cancel: &tokio_util::sync::CancellationToken| {
        assert!(err.is_transport());
        flag.fetch_add(1, Ordering::SeqCst);
        cancel.cancel();
    };

    let mut stream = paginator(&transport).stream_with(policy).await;
    let mut delivered = 0;
    while stream.next().await.is_some() {
        delivered += 1;
        if saw_error.load(Ordering::SeqCst) > 0 {
            after_error.fetch_add(1, Ordering::SeqCst);
        }
    }

    assert_eq!(saw_error.load(Ordering::SeqCst), 1);
    assert_eq!(after_error.load(Ordering::SeqCst), 0);
    assert!(delivered < 30);
    assert!(stream.is_done());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_stream_manual_cancel() {
    let transport = Arc::new(
        StubTransport::uniform(4, 5)
            .with_delay(2, Duration::from_millis(30))
            .with_delay(3, Duration::from_millis(30))
            .with_delay(4, Duration::from_millis(30)),
    );

    let mut stream = paginator(&transport).stream_with(CancelOnError).await;
    assert!(stream.next().await.is_some());

    stream.cancel();
    assert!(stream.next().await.is_none());
    assert!(stream.is_done());
}

#[tokio::test]
async fn test_stream_failed_discovery_reaches_policy() {
    let transport = Arc::new(StubTransport::uniform(2, 2).with_link(""));
    let policy = CollectErrors::new();

    let objects: Vec<Value> = paginator(&transport)
        .stream_with(policy.clone())
        .await
        .collect()
        .await;

    assert!(objects.is_empty());
    let errors = policy.take();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], Error::PageCountUnavailable { .. }));
}

#[tokio::test]
#[should_panic(expected = "pagination failed")]
async fn test_stream_fail_fast_panics() {
    let transport = Arc::new(StubTransport::uniform(3, 2).with_page(2, StubPage::Status(500)));

    let stream = paginator(&transport).stream().await;
    let _: Vec<Value> = stream.collect().await;
}

#[tokio::test]
async fn test_stream_is_typed() {
    #[derive(Debug, serde::Deserialize)]
    struct Folder {
        id: u64,
    }

    let transport = Arc::new(StubTransport::uniform(2, 2));
    let folders: Vec<Folder> = Paginator::new(transport, "folders", JsonDecoder::<Folder>::new())
        .stream()
        .await
        .collect()
        .await;

    let mut ids: Vec<u64> = folders.iter().map(|f| f.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![100, 101, 200, 201]);
}
