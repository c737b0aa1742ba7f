//! End-to-end tests over a real listener

mod common;

use common::{DIGEST, DOS_HTTP_DATE, ZipBuilder, noise};
use reqwest::StatusCode;
use reqwest::header::{ETAG, IF_NONE_MATCH, LAST_MODIFIED};
use rstest::rstest;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use zipstatic::{AssetServer, AssetService, ServeError};

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), ServeError>>,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        let _ = self.stop.send(());
        self.handle.await.unwrap().unwrap();
    }
}

async fn start(service: AssetService) -> Running {
    let listener = AssetServer::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let server = AssetServer::new(Arc::new(service)).with_shutdown_timeout(Duration::from_secs(5));
    let handle = tokio::spawn(server.serve(listener, async move {
        let _ = stopped.await;
    }));

    Running { addr, stop, handle }
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[rstest]
#[tokio::test]
async fn test_serves_and_revalidates() {
    let running = start(
        ZipBuilder::new()
            .with_digest("index.html", "<h1>home</h1>", DIGEST)
            .service()
            .await,
    )
    .await;
    let client = client();

    let first = client.get(running.url("/")).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()[ETAG], DIGEST);
    assert_eq!(first.headers()[LAST_MODIFIED], DOS_HTTP_DATE);
    assert_eq!(first.text().await.unwrap(), "<h1>home</h1>");

    let second = client
        .get(running.url("/index.html"))
        .header(IF_NONE_MATCH, DIGEST)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(second.headers()[ETAG], DIGEST);

    let missing = client.get(running.url("/nope")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    drop(client);
    running.stop().await;
}

#[rstest]
#[tokio::test]
async fn test_concurrent_clients() {
    let large = noise(512 * 1024);
    let running = start(
        ZipBuilder::new()
            .deflated("large.bin", &large)
            .stored("a.txt", "aaa")
            .stored("b.txt", "bbb")
            .service()
            .await,
    )
    .await;
    let large = Arc::new(large);

    let mut tasks = Vec::new();
    for i in 0..24 {
        let client = client();
        let url = running.url(match i % 3 {
            0 => "/large.bin",
            1 => "/a.txt",
            _ => "/b.txt",
        });
        let large = Arc::clone(&large);
        tasks.push(tokio::spawn(async move {
            let response = client.get(url).send().await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = response.bytes().await.unwrap();
            match i % 3 {
                0 => assert_eq!(&body[..], &large[..]),
                1 => assert_eq!(&body[..], b"aaa"),
                _ => assert_eq!(&body[..], b"bbb"),
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
    running.stop().await;
}

#[rstest]
#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let running = start(ZipBuilder::new().stored("a.txt", "a").service().await).await;

    let err = AssetServer::bind(running.addr).await.unwrap_err();

    assert!(matches!(err, ServeError::Bind { addr, .. } if addr == running.addr));
    running.stop().await;
}
