use std::fs;
use std::sync::{Mutex, Once};
use std::time::{Duration, Instant};

use blogport_engine::{
    normalize, AssetOutcome, AssetRelocator, AssetStats, DocumentAssets, FailureKind, FetchError,
    FetchMetadata, FetchOutput, FetchSettings, Fetcher, RelocateSettings, ReqwestFetcher,
    BROWSER_USER_AGENT,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(blogport_logging::initialize_for_tests);
}

fn no_delay() -> RelocateSettings {
    RelocateSettings {
        fetch_delay: Duration::ZERO,
        ..RelocateSettings::default()
    }
}

/// Serves fixed bytes for every URL except those containing "broken".
#[derive(Default)]
struct FakeFetcher {
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        if url.contains("broken") {
            return Err(FetchError::new(FailureKind::HttpStatus(404), "not found"));
        }
        let bytes = b"image-bytes".to_vec();
        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirect_count: 0,
                content_type: Some("image/png".to_string()),
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

#[test]
fn data_uri_is_returned_unchanged_without_fetching() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let fetcher = FakeFetcher::default();
    let relocator = AssetRelocator::new(&fetcher, no_delay());
    let uri = "data:image/gif;base64,R0lGODlhAQABAAAAACw=";

    let relocated = relocator.relocate(uri, temp.path(), "Post", 1).unwrap();

    assert_eq!(relocated.reference, uri);
    assert_eq!(relocated.outcome, AssetOutcome::Inline);
    assert!(fetcher.requests().is_empty());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn second_request_for_same_name_uses_existing_file() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let fetcher = FakeFetcher::default();
    let relocator = AssetRelocator::new(&fetcher, no_delay());
    let url = "https://img.test/photos/sunset.png?size=large";

    let first = relocator.relocate(url, temp.path(), "Summer, 2020!", 2).unwrap();
    let second = relocator.relocate(url, temp.path(), "Summer, 2020!", 2).unwrap();

    assert_eq!(first.reference, "/assets/images/summer-2020-2.png");
    assert_eq!(first.outcome, AssetOutcome::Fetched);
    assert_eq!(second.reference, first.reference);
    assert_eq!(second.outcome, AssetOutcome::Cached);
    assert_eq!(fetcher.requests(), vec![url.to_string()]);
    assert_eq!(
        fs::read(temp.path().join("summer-2020-2.png")).unwrap(),
        b"image-bytes"
    );
}

#[test]
fn failed_fetch_keeps_remote_url_and_writes_nothing() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let fetcher = FakeFetcher::default();
    let relocator = AssetRelocator::new(&fetcher, no_delay());
    let url = "https://img.test/broken.jpg";

    let relocated = relocator.relocate(url, temp.path(), "Post", 1).unwrap();

    assert_eq!(relocated.reference, url);
    assert_eq!(relocated.outcome, AssetOutcome::KeptRemote);
    assert!(!temp.path().join("post-1.jpg").exists());
}

#[test]
fn extension_falls_back_and_prefix_is_configurable() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let fetcher = FakeFetcher::default();
    let settings = RelocateSettings {
        public_prefix: "/media/".to_string(),
        ..no_delay()
    };
    let relocator = AssetRelocator::new(&fetcher, settings);

    let relocated = relocator
        .relocate("https://img.test/blogger/img/abc", temp.path(), "Hello World", 7)
        .unwrap();

    assert_eq!(relocated.reference, "/media/hello-world-7.jpg");
    assert!(temp.path().join("hello-world-7.jpg").exists());
}

#[test]
fn unwritable_destination_is_an_error() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let not_a_dir = temp.path().join("file");
    fs::write(&not_a_dir, "x").unwrap();
    let fetcher = FakeFetcher::default();
    let relocator = AssetRelocator::new(&fetcher, no_delay());

    let result = relocator.relocate("https://img.test/a.png", &not_a_dir, "Post", 1);

    assert!(result.is_err());
}

#[test]
fn only_network_fetches_wait_for_the_delay() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let fetcher = FakeFetcher::default();
    let delay = Duration::from_millis(250);
    let settings = RelocateSettings {
        fetch_delay: delay,
        ..RelocateSettings::default()
    };
    let relocator = AssetRelocator::new(&fetcher, settings);
    let url = "https://img.test/slow.png";

    let started = Instant::now();
    let fetched = relocator.relocate(url, temp.path(), "Paced", 1).unwrap();
    let fetch_time = started.elapsed();

    let started = Instant::now();
    let cached = relocator.relocate(url, temp.path(), "Paced", 1).unwrap();
    let cached_time = started.elapsed();

    let started = Instant::now();
    let inline = relocator
        .relocate("data:image/png;base64,AA==", temp.path(), "Paced", 2)
        .unwrap();
    let inline_time = started.elapsed();

    assert_eq!(fetched.outcome, AssetOutcome::Fetched);
    assert_eq!(cached.outcome, AssetOutcome::Cached);
    assert_eq!(inline.outcome, AssetOutcome::Inline);
    assert!(fetch_time >= delay, "fetch took {fetch_time:?}");
    assert!(cached_time < delay, "cache hit took {cached_time:?}");
    assert!(inline_time < delay, "data URI took {inline_time:?}");
}

#[test]
fn failed_fetch_does_not_wait_for_the_delay() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let fetcher = FakeFetcher::default();
    let delay = Duration::from_millis(250);
    let settings = RelocateSettings {
        fetch_delay: delay,
        ..RelocateSettings::default()
    };
    let relocator = AssetRelocator::new(&fetcher, settings);

    let started = Instant::now();
    let relocated = relocator
        .relocate("https://img.test/broken.png", temp.path(), "Paced", 1)
        .unwrap();

    assert_eq!(relocated.outcome, AssetOutcome::KeptRemote);
    assert!(started.elapsed() < delay);
}

#[test]
fn document_assets_number_images_and_tally_outcomes() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let fetcher = FakeFetcher::default();
    let relocator = AssetRelocator::new(&fetcher, no_delay());
    let html = r#"<img src="https://img.test/a.png"><img src="data:image/png;base64,AA=="><img src="https://img.test/broken.gif" alt="gone"><img src="https://img.test/c.webp">"#;

    let mut assets = DocumentAssets::new(&relocator, temp.path(), "My Trip", "42");
    let markdown = normalize(html, &mut assets).unwrap();

    assert_eq!(
        markdown,
        "![](/assets/images/my-trip-1.png)![](data:image/png;base64,AA==)\
         ![gone](https://img.test/broken.gif)![](/assets/images/my-trip-3.webp)"
    );
    assert_eq!(
        assets.stats(),
        AssetStats {
            fetched: 2,
            cached: 0,
            kept_remote: 1,
        }
    );
    assert_eq!(fetcher.requests().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn downloads_once_over_http_and_reuses_the_file() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pic.png"))
        .and(header("user-agent", BROWSER_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().to_path_buf();
    let url = format!("{}/pic.png", server.uri());

    let (first, second) = tokio::task::spawn_blocking(move || {
        let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
        let relocator = AssetRelocator::new(fetcher, no_delay());
        let first = relocator.relocate(&url, &dir, "Post Title", 1).unwrap();
        let second = relocator.relocate(&url, &dir, "Post Title", 1).unwrap();
        (first, second)
    })
    .await
    .unwrap();

    assert_eq!(first.outcome, AssetOutcome::Fetched);
    assert_eq!(second.outcome, AssetOutcome::Cached);
    assert_eq!(first.reference, "/assets/images/post-title-1.png");
    assert_eq!(
        fs::read(temp.path().join("post-title-1.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_image_stays_remote_and_conversion_succeeds() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().to_path_buf();
    let url = format!("{}/gone.jpg", server.uri());
    let html = format!(r#"<p>Look: <img src="{url}" alt="missing"></p>"#);

    let markdown = tokio::task::spawn_blocking(move || {
        let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
        let relocator = AssetRelocator::new(fetcher, no_delay());
        let mut assets = DocumentAssets::new(&relocator, &dir, "Post", "7");
        normalize(&html, &mut assets).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(
        markdown,
        format!("Look: ![missing]({}/gone.jpg)", server.uri())
    );
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}
