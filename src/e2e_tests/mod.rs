use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use hyper::{Body, Client, Method, Request, StatusCode};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::api::{Server, ServerConfig};
use crate::datastore::{MemoryTaskStore, SqliteTaskStore, TaskDataStore};
use crate::model::CorrelationId;

struct TestServer {
    addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
}

impl TestServer {
    fn start<D: TaskDataStore>(datastore: D) -> Self {
        let config = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        };
        let (stop, stopped) = oneshot::channel::<()>();
        let (addr, serving) = Server::new(config, Arc::new(datastore))
            .bind(async move {
                let _ = stopped.await;
            })
            .unwrap();
        tokio::spawn(serving);
        Self {
            addr,
            stop: Some(stop),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(self.url(path))
            .header(hyper::header::CONTENT_TYPE, "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = Client::new().request(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

fn random_title() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

async fn run_scenario(server: &TestServer) {
    let (status, body) = server
        .call(
            Method::POST,
            "/tasks",
            Some(json!({"title": "Buy milk", "completed": false})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, r#"{"id":1,"title":"Buy milk","completed":false}"#);

    let (status, body) = server
        .call(
            Method::PUT,
            "/tasks/1",
            Some(json!({"title": "Buy milk", "completed": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":1,"title":"Buy milk","completed":true}"#);

    let (status, body) = server.call(Method::DELETE, "/tasks/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = server.call(Method::DELETE, "/tasks/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_e2e_scenario_memory() {
    let server = TestServer::start(MemoryTaskStore::new());
    run_scenario(&server).await;
}

#[tokio::test]
async fn test_e2e_scenario_sqlite() {
    let server = TestServer::start(SqliteTaskStore::open_in_memory().unwrap());
    run_scenario(&server).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_e2e_concurrent_creates() {
    let server = Arc::new(TestServer::start(MemoryTaskStore::new()));

    let titles: Vec<String> = (0..50).map(|_| random_title()).collect();
    let mut handles = vec![];
    for title in titles.iter().cloned() {
        let server = server.clone();
        handles.push(tokio::spawn(async move {
            server
                .call(Method::POST, "/tasks", Some(json!({ "title": title })))
                .await
        }));
    }

    let mut ids = HashSet::new();
    for result in futures::future::join_all(handles).await {
        let (status, body) = result.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let task: Value = serde_json::from_str(&body).unwrap();
        assert!(ids.insert(task["id"].as_u64().unwrap()), "duplicate id");
    }

    let (status, body) = server.call(Method::GET, "/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    let list: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(list.len(), titles.len(), "no task was lost");

    let listed: HashSet<String> = list
        .iter()
        .map(|task| task["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(listed, titles.into_iter().collect::<HashSet<_>>());

    // list comes back in id order
    let listed_ids: Vec<u64> = list.iter().map(|task| task["id"].as_u64().unwrap()).collect();
    let mut sorted = listed_ids.clone();
    sorted.sort_unstable();
    assert_eq!(listed_ids, sorted);
}

#[tokio::test]
async fn test_e2e_correlation_id_echoed() {
    let server = TestServer::start(MemoryTaskStore::new());
    let cid = CorrelationId::new();

    let request = Request::builder()
        .method(Method::GET)
        .uri(server.url("/tasks"))
        .header(CorrelationId::HEADER_NAME, cid.to_string())
        .body(Body::empty())
        .unwrap();
    let response = Client::new().request(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        CorrelationId::from_header_map(response.headers()).unwrap(),
        cid
    );

    // a fresh one is handed out when the caller sends none
    let response = Client::new()
        .get(server.url("/tasks").parse().unwrap())
        .await
        .unwrap();
    assert!(CorrelationId::from_header_map(response.headers()).is_ok());
}

#[tokio::test]
async fn test_e2e_empty_title_rejected() {
    let server = TestServer::start(MemoryTaskStore::new());

    let (status, body) = server
        .call(Method::POST, "/tasks", Some(json!({"title": ""})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Task title cannot be empty"}"#);

    let (_, body) = server.call(Method::GET, "/tasks", None).await;
    assert_eq!(body, "[]");
}
