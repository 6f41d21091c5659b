use rust_portfolio_viewer::probe::{ExistenceProber, Prober};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const MP4_HEAD: &[u8] = b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom";

/// Minimal HTTP origin:
/// - `/videos/1.mp4` answers HEAD and GET,
/// - `/videos/nohead.mp4` drops HEAD connections but serves ranged GETs,
/// - `/videos/hang.mp4` never answers,
/// - everything else is 404.
async fn spawn_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(serve(stream));
        }
    });
    format!("http://{addr}")
}

async fn serve(mut stream: TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let request = String::from_utf8_lossy(&buf);
    let mut first = request.lines().next().unwrap_or_default().split_whitespace();
    let method = first.next().unwrap_or_default().to_string();
    let path = first.next().unwrap_or_default().to_string();

    match (method.as_str(), path.as_str()) {
        (_, "/videos/hang.mp4") => {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        ("HEAD", "/videos/nohead.mp4") => {}
        ("HEAD", "/videos/1.mp4") => {
            let _ = stream
                .write_all(
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        MP4_HEAD.len()
                    )
                    .as_bytes(),
                )
                .await;
        }
        ("GET", "/videos/1.mp4" | "/videos/nohead.mp4") => {
            let mut resp = format!(
                "HTTP/1.1 206 Partial Content\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                MP4_HEAD.len()
            )
            .into_bytes();
            resp.extend_from_slice(MP4_HEAD);
            let _ = stream.write_all(&resp).await;
        }
        _ => {
            let _ = stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        }
    }
    let _ = stream.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn head_probe_reports_existing_and_missing() {
    let origin = spawn_origin().await;
    let prober = ExistenceProber::new().unwrap();
    let timeout = Duration::from_secs(2);

    assert!(prober.probe(&format!("{origin}/videos/1.mp4"), timeout).await);
    assert!(!prober.probe(&format!("{origin}/videos/2.mp4"), timeout).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_head_falls_back_to_metadata_load() {
    let origin = spawn_origin().await;
    let prober = ExistenceProber::new().unwrap();
    assert!(
        prober
            .probe(&format!("{origin}/videos/nohead.mp4"), Duration::from_secs(2))
            .await
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unresponsive_origin_resolves_false_within_timeout() {
    let origin = spawn_origin().await;
    let prober = ExistenceProber::new().unwrap();
    let started = Instant::now();
    let found = prober
        .probe(&format!("{origin}/videos/hang.mp4"), Duration::from_millis(300))
        .await;
    assert!(!found);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_origin_resolves_false() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let prober = ExistenceProber::new().unwrap();
    assert!(
        !prober
            .probe(&format!("http://{addr}/videos/1.mp4"), Duration::from_secs(2))
            .await
    );
}
