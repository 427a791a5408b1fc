//! Relay broker integration tests.
//!
//! Each test starts the real router on an ephemeral port and talks to it
//! over HTTP and WebSocket.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use quizcast_broker::ui::state::AppState;
use quizcast_shared::relay::RelayFrame;
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, signal) = oneshot::channel::<()>();
        tokio::spawn(quizcast_broker::serve(
            listener,
            Arc::new(AppState::in_memory()),
            async move {
                let _ = signal.await;
            },
        ));
        Self {
            addr,
            shutdown: Some(shutdown),
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    async fn client(&self) -> Client {
        connect_async(self.ws_url()).await.unwrap().0
    }

    async fn stats(&self) -> serde_json::Value {
        reqwest::get(format!("{}/api/stats", self.base_url()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Poll the stats endpoint until `subscriptions` reaches `expected`.
    async fn wait_for_subscriptions(&self, expected: u64) {
        for _ in 0..50 {
            if self.stats().await["subscriptions"] == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("subscriptions never reached {expected}");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn send(client: &mut Client, frame: RelayFrame) {
    client
        .send(Message::Text(frame.to_json().unwrap().into()))
        .await
        .unwrap();
}

async fn recv(client: &mut Client) -> RelayFrame {
    let next = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out waiting for frame");
    match next {
        Some(Ok(Message::Text(text))) => RelayFrame::from_json(text.as_str()).unwrap(),
        other => panic!("unexpected websocket message: {other:?}"),
    }
}

fn subscribe(topic: &str) -> RelayFrame {
    RelayFrame::Subscribe {
        topic: topic.to_string(),
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    // テスト項目: /api/health エンドポイントが正常に動作する
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = reqwest::get(format!("{}/api/health", server.base_url()))
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_publish_is_echoed_to_all_subscribers() {
    // テスト項目: publish は送信者を含む同一トピックの全購読者に届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.client().await;
    let mut bob = server.client().await;
    send(&mut alice, subscribe("mcq/classroom/chat")).await;
    send(&mut bob, subscribe("mcq/classroom/chat")).await;
    server.wait_for_subscriptions(2).await;

    // when (操作):
    send(
        &mut alice,
        RelayFrame::Publish {
            topic: "mcq/classroom/chat".to_string(),
            payload: r#"{"message":"hi"}"#.to_string(),
            qos: 1,
        },
    )
    .await;

    // then (期待する結果):
    let expected = RelayFrame::Message {
        topic: "mcq/classroom/chat".to_string(),
        payload: r#"{"message":"hi"}"#.to_string(),
    };
    assert_eq!(recv(&mut alice).await, expected);
    assert_eq!(recv(&mut bob).await, expected);
}

#[tokio::test]
async fn test_only_exact_topic_subscribers_receive() {
    // テスト項目: 別トピックの購読者には配送されない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut questions = server.client().await;
    let mut chat = server.client().await;
    send(&mut questions, subscribe("mcq/classroom/questions")).await;
    send(&mut chat, subscribe("mcq/classroom/chat")).await;
    server.wait_for_subscriptions(2).await;

    // when (操作):
    send(
        &mut chat,
        RelayFrame::Publish {
            topic: "mcq/classroom/chat".to_string(),
            payload: "x".to_string(),
            qos: 1,
        },
    )
    .await;
    send(
        &mut chat,
        RelayFrame::Publish {
            topic: "mcq/classroom/questions".to_string(),
            payload: "q".to_string(),
            qos: 1,
        },
    )
    .await;

    // then (期待する結果): questions 側には questions の publish だけが届く
    assert_eq!(
        recv(&mut questions).await,
        RelayFrame::Message {
            topic: "mcq/classroom/questions".to_string(),
            payload: "q".to_string(),
        }
    );
}

#[tokio::test]
async fn test_stats_track_connections_and_disconnects() {
    // テスト項目: 統計に接続・購読が反映され、切断で購読が消える
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.client().await;
    send(&mut alice, subscribe("a")).await;
    send(&mut alice, subscribe("b")).await;
    server.wait_for_subscriptions(2).await;

    let stats = server.stats().await;
    assert_eq!(stats["connections"], 1);
    assert_eq!(stats["topics"].as_array().unwrap().len(), 2);

    // when (操作):
    alice.close(None).await.unwrap();

    // then (期待する結果):
    server.wait_for_subscriptions(0).await;
    assert_eq!(server.stats().await["connections"], 0);
}

#[tokio::test]
async fn test_malformed_frames_do_not_close_connection() {
    // テスト項目: 不正なフレームは無視され、接続は維持される
    let server = TestServer::start().await;
    let mut alice = server.client().await;

    alice
        .send(Message::Text("not json".into()))
        .await
        .unwrap();
    send(&mut alice, subscribe("mcq/#")).await;
    send(&mut alice, subscribe("t")).await;
    server.wait_for_subscriptions(1).await;
    send(
        &mut alice,
        RelayFrame::Publish {
            topic: "t".to_string(),
            payload: "still here".to_string(),
            qos: 1,
        },
    )
    .await;

    assert_eq!(
        recv(&mut alice).await,
        RelayFrame::Message {
            topic: "t".to_string(),
            payload: "still here".to_string(),
        }
    );
}
