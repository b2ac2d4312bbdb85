use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use word_tally::config::{HttpConfig, InvalidUrlPolicy, SchedulerConfig, StatusPolicy};
use word_tally::input::feed_lines;
use word_tally::output::LineReporter;
use word_tally::pipeline::build_http_client;
use word_tally::{spawn_pipeline, FetchError, WordCountClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writer shared between the pipeline and the test
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn create_test_http_config() -> HttpConfig {
    HttpConfig {
        timeout_ms: 2000,
        connect_timeout_ms: Some(500),
        user_agent: "TestTally/1.0".to_string(),
        status_policy: StatusPolicy::Lenient,
    }
}

fn create_test_client(status_policy: StatusPolicy) -> Arc<WordCountClient> {
    let client = build_http_client(&create_test_http_config()).expect("Failed to build client");
    Arc::new(WordCountClient::new(client, "Go", status_policy))
}

fn create_scheduler_config(max_parallel: u32) -> SchedulerConfig {
    SchedulerConfig {
        max_parallel,
        queue_capacity: None,
        admission_backoff_ms: 10,
    }
}

/// Splits a `url<TAB>count[<TAB>error]` line
fn parse_result_line(line: &str) -> (String, usize, Option<String>) {
    let mut parts = line.splitn(3, '\t');
    let url = parts.next().unwrap().to_string();
    let count = parts.next().unwrap().parse().unwrap();
    let error = parts.next().map(str::to_string);
    (url, count, error)
}

#[tokio::test]
async fn test_every_url_reported_once() {
    let mock_server = MockServer::start().await;

    let mut expected = HashMap::new();
    for i in 1..=8 {
        let body = "Go ".repeat(i);
        Mock::given(method("GET"))
            .and(path(format!("/page{}", i)))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;
        expected.insert(format!("{}/page{}", mock_server.uri(), i), i);
    }

    let buffer = SharedBuffer::default();
    let pipeline = spawn_pipeline(
        &create_scheduler_config(5),
        create_test_client(StatusPolicy::Lenient),
        LineReporter::new(buffer.clone()),
    );

    for url in expected.keys() {
        pipeline
            .submit(Url::parse(url).unwrap())
            .await
            .expect("Submit failed");
    }

    let summary = pipeline.finish().await.expect("Pipeline failed");
    assert_eq!(summary.scheduler.admitted, 8);
    assert_eq!(summary.statistics.results, 8);
    assert_eq!(summary.statistics.succeeded, 8);
    assert_eq!(summary.statistics.total_occurrences, 36);

    let lines = buffer.lines();
    assert_eq!(lines.len(), 8);

    let mut seen = HashMap::new();
    for line in &lines {
        let (url, count, error) = parse_result_line(line);
        assert!(error.is_none(), "Unexpected error for {}: {:?}", url, error);
        assert_eq!(Some(&count), expected.get(&url), "Wrong count for {}", url);
        *seen.entry(url).or_insert(0) += 1;
    }
    assert_eq!(seen.len(), 8);
    assert!(seen.values().all(|&n| n == 1));
}

#[tokio::test]
async fn test_concurrent_fetches_bounded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Go, Go, Go!")
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&mock_server)
        .await;

    let pipeline = spawn_pipeline(
        &create_scheduler_config(3),
        create_test_client(StatusPolicy::Lenient),
        LineReporter::new(std::io::sink()),
    );

    let mut max_in_flight = 0;
    for i in 0..12 {
        let url = Url::parse(&format!("{}/page{}", mock_server.uri(), i)).unwrap();
        pipeline.submit(url).await.expect("Submit failed");
        max_in_flight = max_in_flight.max(pipeline.in_flight());
    }

    // Sample while the remaining fetches work through the slots
    for _ in 0..60 {
        max_in_flight = max_in_flight.max(pipeline.in_flight());
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let summary = pipeline.finish().await.expect("Pipeline failed");
    assert_eq!(summary.statistics.results, 12);
    assert_eq!(summary.statistics.total_occurrences, 36);
    assert!(max_in_flight > 0);
    assert!(max_in_flight <= 3, "Observed {} fetches in flight", max_in_flight);
}

#[tokio::test]
async fn test_failures_are_reported_not_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Go Go"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Go"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Go")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let buffer = SharedBuffer::default();
    let pipeline = spawn_pipeline(
        &create_scheduler_config(2),
        create_test_client(StatusPolicy::Lenient),
        LineReporter::new(buffer.clone()),
    );

    for p in ["/ok", "/missing", "/slow"] {
        let url = Url::parse(&format!("{}{}", mock_server.uri(), p)).unwrap();
        pipeline.submit(url).await.expect("Submit failed");
    }

    let summary = pipeline.finish().await.expect("Pipeline failed");
    let stats = summary.statistics;
    assert_eq!(stats.results, 3);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.non_success_statuses, 1);
    assert_eq!(stats.errors_by_kind.get("timeout"), Some(&1));

    let lines = buffer.lines();
    let missing = lines
        .iter()
        .map(|line| parse_result_line(line))
        .find(|(url, _, _)| url.ends_with("/missing"))
        .expect("No result for /missing");
    assert_eq!(missing.1, 0);
    assert!(missing.2.is_none());
}

#[tokio::test]
async fn test_strict_status_policy() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let buffer = SharedBuffer::default();
    let pipeline = spawn_pipeline(
        &create_scheduler_config(1),
        create_test_client(StatusPolicy::Strict),
        LineReporter::new(buffer.clone()),
    );

    let url = Url::parse(&format!("{}/down", mock_server.uri())).unwrap();
    pipeline.submit(url).await.expect("Submit failed");

    let summary = pipeline.finish().await.expect("Pipeline failed");
    assert_eq!(summary.statistics.failed, 1);
    assert_eq!(summary.statistics.errors_by_kind.get("status"), Some(&1));

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(&FetchError::Status(503).to_string()));
}

#[tokio::test]
async fn test_shutdown_aborts_in_flight_fetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Go")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let buffer = SharedBuffer::default();
    let pipeline = spawn_pipeline(
        &create_scheduler_config(2),
        create_test_client(StatusPolicy::Lenient),
        LineReporter::new(buffer.clone()),
    );

    for i in 0..2 {
        let url = Url::parse(&format!("{}/slow{}", mock_server.uri(), i)).unwrap();
        pipeline.submit(url).await.expect("Submit failed");
    }

    tokio::time::timeout(Duration::from_secs(2), async {
        while pipeline.in_flight() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Fetches never started");

    let sender = pipeline.sender();
    let summary = tokio::time::timeout(Duration::from_millis(500), pipeline.shutdown())
        .await
        .expect("Shutdown did not complete promptly")
        .expect("Pipeline failed");

    assert!(summary.scheduler.cancelled);
    assert_eq!(summary.scheduler.admitted, 2);
    assert_eq!(summary.statistics.results, 0);
    assert!(buffer.lines().is_empty());

    // Nothing more is accepted once the pipeline has stopped
    let url = Url::parse(&format!("{}/late", mock_server.uri())).unwrap();
    assert!(sender.send(url).await.is_err());
}

#[tokio::test]
async fn test_feed_lines_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("go Go asd13Goasd Go go"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("no match here"))
        .mount(&mock_server)
        .await;

    let buffer = SharedBuffer::default();
    let pipeline = spawn_pipeline(
        &create_scheduler_config(5),
        create_test_client(StatusPolicy::Lenient),
        LineReporter::new(buffer.clone()),
    );

    let input = format!(
        "{uri}/a\nnot a url\n{uri}/b\n\n{uri}/never\n",
        uri = mock_server.uri()
    );
    let summary = feed_lines(input.as_bytes(), &pipeline, InvalidUrlPolicy::Skip)
        .await
        .expect("Feeding input failed");
    assert_eq!(summary.submitted, 2);
    assert_eq!(summary.skipped, 1);

    let result = pipeline.finish().await.expect("Pipeline failed");
    assert_eq!(result.statistics.results, 2);
    assert_eq!(result.statistics.total_occurrences, 3);

    let mut lines = buffer.lines();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            format!("{}/a\t3", mock_server.uri()),
            format!("{}/b\t0", mock_server.uri()),
        ]
    );
}
