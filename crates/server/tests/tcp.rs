//! End-to-end tests over a real socket.

use std::net::SocketAddr;
use std::sync::Arc;

use functions::{ModelCatalog, ProviderSettings, Workspace, standard_registry};
use protocol::{Request, Response};
use serde_json::json;
use server::{Client, Dispatcher, Server};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const BOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bom xmlns="http://cyclonedx.org/schema/bom/1.5" version="1">
  <components>
    <component type="library"><name>gson</name></component>
    <component type="library"><name>junit</name></component>
  </components>
</bom>"#;

struct Harness {
    addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<server::Result<()>>,
    project: TempDir,
}

impl Harness {
    async fn start() -> Self {
        Self::start_with_max_frame(protocol::DEFAULT_MAX_FRAME_BYTES).await
    }

    async fn start_with_max_frame(max_frame: usize) -> Self {
        let project = tempfile::tempdir().unwrap();
        std::fs::create_dir(project.path().join(".license-tool")).unwrap();
        std::fs::write(Workspace::bom_path(project.path()), BOM).unwrap();

        let workspace = Arc::new(Workspace::new(project.path()));
        let registry =
            standard_registry(&workspace, ModelCatalog::default(), ProviderSettings::default())
                .unwrap();
        let server = Server::bind("127.0.0.1:0", Dispatcher::new(Arc::new(registry)))
            .await
            .unwrap()
            .max_frame_bytes(max_frame);
        let addr = server.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(server.run(shutdown.clone()));

        Self {
            addr,
            shutdown,
            task,
            project,
        }
    }

    async fn client(&self) -> Client {
        Client::connect(self.addr).await.unwrap()
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.task.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn add_returns_the_sum() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let response = client
        .call(&Request::new("add", vec![json!(2), json!(3)]))
        .await
        .unwrap();

    assert_eq!(response, Response::success(5));
    harness.stop().await;
}

#[tokio::test]
async fn unknown_function_is_an_error() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let response = client.call(&Request::new("format_disk", vec![])).await.unwrap();

    assert_eq!(response, Response::failure("Unknown function"));
    harness.stop().await;
}

#[tokio::test]
async fn coalesced_requests_are_answered_in_order() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client
        .send_raw(b"{\"function\":\"add\",\"args\":[1,1]}\n{\"function\":\"subtract\",\"args\":[5,2]}\n")
        .await
        .unwrap();

    assert_eq!(client.read_response().await.unwrap(), Response::success(2));
    assert_eq!(client.read_response().await.unwrap(), Response::success(3));
    harness.stop().await;
}

#[tokio::test]
async fn split_request_is_reassembled() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.send_raw(b"{\"function\":\"ad").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    client.send_raw(b"d\",\"args\":[4,4]}\r\n").await.unwrap();

    assert_eq!(client.read_response().await.unwrap(), Response::success(8));
    harness.stop().await;
}

#[tokio::test]
async fn malformed_line_does_not_close_the_connection() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.send_raw(b"not-json\n").await.unwrap();
    assert_eq!(
        client.read_response().await.unwrap(),
        Response::failure("Invalid JSON")
    );

    let response = client
        .call(&Request::new("add", vec![json!(2), json!(3)]))
        .await
        .unwrap();
    assert_eq!(response, Response::success(5));
    harness.stop().await;
}

#[tokio::test]
async fn blank_line_gets_a_reply() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.send_raw(b"\n  \r\n").await.unwrap();
    assert_eq!(
        client.read_response().await.unwrap(),
        Response::failure("Invalid JSON")
    );
    assert_eq!(
        client.read_response().await.unwrap(),
        Response::failure("Invalid JSON")
    );

    let response = client
        .call(&Request::new("subtract", vec![json!(9), json!(4)]))
        .await
        .unwrap();
    assert_eq!(response, Response::success(5));
    harness.stop().await;
}

#[tokio::test]
async fn well_formed_json_of_the_wrong_shape_is_not_a_framing_error() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client
        .send_raw(b"{\"function\":\"add\",\"args\":\"oops\"}\n{\"function\":5}\n[1,2]\n")
        .await
        .unwrap();
    assert_eq!(client.read_response().await.unwrap(), Response::degraded());
    assert_eq!(
        client.read_response().await.unwrap(),
        Response::unknown_function()
    );
    assert_eq!(client.read_response().await.unwrap(), Response::degraded());
    harness.stop().await;
}

#[tokio::test]
async fn oversized_line_is_rejected_and_skipped() {
    let harness = Harness::start_with_max_frame(64).await;
    let mut client = harness.client().await;

    let long = format!("{{\"function\":\"add\",\"args\":[1,1],\"pad\":\"{}\"}}\n", "x".repeat(4096));
    client.send_raw(long.as_bytes()).await.unwrap();
    assert_eq!(
        client.read_response().await.unwrap(),
        Response::failure("Invalid JSON")
    );

    let response = client
        .call(&Request::new("add", vec![json!(1), json!(2)]))
        .await
        .unwrap();
    assert_eq!(response, Response::success(3));
    harness.stop().await;
}

#[tokio::test]
async fn handler_failure_is_a_degraded_result() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let response = client
        .call(&Request::new("add", vec![json!("two"), json!(3)]))
        .await
        .unwrap();
    assert_eq!(response, Response::degraded());
    assert!(response.is_soft_failure());

    let response = client
        .call(&Request::new(
            "promptModel",
            vec![json!(""), json!("no-such-model"), json!("hi"), json!([])],
        ))
        .await
        .unwrap();
    assert_eq!(response, Response::degraded());
    harness.stop().await;
}

#[tokio::test]
async fn project_functions_follow_the_working_directory() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let response = client
        .call(&Request::new("get_dependency_list", vec![]))
        .await
        .unwrap();
    assert_eq!(response, Response::success("Dependencies used: gson, junit"));

    let elsewhere = tempfile::tempdir().unwrap();
    let response = client
        .call(&Request::new(
            "setWorkingDirectory",
            vec![json!(elsewhere.path().display().to_string())],
        ))
        .await
        .unwrap();
    assert_eq!(response, Response::Success(serde_json::Value::Null));

    let response = client
        .call(&Request::new("get_licensing_for_my_project", vec![]))
        .await
        .unwrap();
    assert_eq!(
        response,
        Response::success("I could not find any licensing information for this project.")
    );

    let response = client
        .call(&Request::new("getWorkingDirectory", vec![]))
        .await
        .unwrap();
    assert_eq!(
        response,
        Response::success(elsewhere.path().display().to_string())
    );
    assert!(harness.project.path().exists());
    harness.stop().await;
}

#[tokio::test]
async fn concurrent_clients_get_their_own_answers() {
    let harness = Harness::start().await;

    let mut tasks = Vec::new();
    for i in 0..16i64 {
        let addr = harness.addr;
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(addr).await.unwrap();
            let mut answers = Vec::new();
            for j in 0..4i64 {
                let response = client
                    .call(&Request::new("add", vec![json!(i), json!(j)]))
                    .await
                    .unwrap();
                answers.push(response);
            }
            (i, answers)
        }));
    }

    for task in tasks {
        let (i, answers) = task.await.unwrap();
        let expected: Vec<_> = (0..4i64).map(|j| Response::success(i + j)).collect();
        assert_eq!(answers, expected);
    }
    harness.stop().await;
}

#[tokio::test]
async fn shutdown_closes_idle_connections() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;
    let addr = harness.addr;

    harness.stop().await;

    assert!(matches!(
        client.read_response().await,
        Err(server::Error::Closed)
    ));
    assert!(Client::connect(addr).await.is_err());
}
