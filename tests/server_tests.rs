use std::net::SocketAddr;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tempfile::TempDir;
use tokio::net::TcpListener;

use clipshare_lib::api::{AppState, router};
use clipshare_lib::auth::Credential;
use clipshare_lib::database::ClipboardStore;
use clipshare_lib::files::FileDirectory;

const PASSWORD: &str = "s3cret";

async fn spawn_server(temp: &TempDir) -> SocketAddr {
    let uploads = temp.path().join("uploads");
    let files = FileDirectory::new(&uploads, Credential::from_password(PASSWORD));
    files.create_root().await.unwrap();

    let state = AppState {
        clipboard: ClipboardStore::open(temp.path().join("clipboard.db")).unwrap(),
        files,
        web_root: temp.path().join("web"),
        max_upload_bytes: 8 * 1024 * 1024,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn multi_file_upload_download_and_delete() {
    let temp = TempDir::new().unwrap();
    let addr = spawn_server(&temp).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let payload: Vec<u8> = (0..=255u8).cycle().take(300_000).collect();
    let form = Form::new()
        .part("file", Part::bytes(payload.clone()).file_name("blob.bin"))
        .part("file", Part::text("plain notes").file_name("notes.txt"));

    let response = client
        .post(format!("{base}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listing: serde_json::Value = client
        .get(format!("{base}/file"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut names: Vec<_> = listing["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_str().unwrap().to_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["blob.bin", "notes.txt"]);

    let response = client
        .get(format!("{base}/download"))
        .query(&[("filename", "blob.bin")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_length(), Some(300_000));
    assert_eq!(response.bytes().await.unwrap(), payload);

    let response = client
        .post(format!("{base}/list/delete"))
        .json(&serde_json::json!({ "filename": "blob.bin", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post(format!("{base}/list/delete"))
        .json(&serde_json::json!({ "filename": "blob.bin", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{base}/download"))
        .query(&[("filename", "blob.bin")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clipboard_posts_get_unique_ids() {
    let temp = TempDir::new().unwrap();
    let addr = spawn_server(&temp).await;
    let client = reqwest::Client::new();

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let response = client
                    .post(format!("http://{addr}/clipboard"))
                    .form(&[("context", format!("note {i}"))])
                    .send()
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::CREATED);
                let body: serde_json::Value = response.json().await.unwrap();
                body["id"].as_i64().unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);

    let listing: serde_json::Value = client
        .get(format!("http://{addr}/clipboard/info"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed: Vec<i64> = listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed, ids);
}
