//! Session integration tests over the in-process broker.
//!
//! Every session runs its real runner task; only the broker is in memory.

use std::{
    collections::BTreeSet,
    future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use quizcast_client::{
    domain::{AnswerTally, QuestionId, RoleTag, TopicKind},
    infrastructure::{BrokerLink, ConnectionState, InboundFrame, MemoryBroker, QoS, TransportError},
    session::{Session, SessionConfig, SessionError, SessionEvent, SessionHandle, SyncState},
    usecase::SubmitAnswerError,
};
use tokio::{sync::mpsc::UnboundedReceiver, time::Instant};

type Events = UnboundedReceiver<SessionEvent>;

async fn wait_for(events: &mut Events, matches: impl Fn(&SessionEvent) -> bool) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let event = events.recv().await.expect("session closed");
            if matches(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for session event")
}

async fn wait_for_state(events: &mut Events, state: ConnectionState) {
    wait_for(events, |e| *e == SessionEvent::ConnectionStateChanged(state)).await;
}

/// Wait until a question is announced and return its id.
async fn wait_for_question(events: &mut Events) -> QuestionId {
    match wait_for(events, |e| {
        matches!(e, SessionEvent::HistoryChanged { current: Some(_), .. })
    })
    .await
    {
        SessionEvent::HistoryChanged {
            current: Some(id), ..
        } => id,
        other => panic!("unexpected event: {other:?}"),
    }
}

async fn start(broker: &MemoryBroker, config: SessionConfig) -> (SessionHandle, Events) {
    let (handle, mut events) = Session::spawn(config, broker.link()).expect("failed to spawn");
    wait_for_state(&mut events, ConnectionState::Connected).await;
    (handle, events)
}

fn options(options: &[&str]) -> Vec<String> {
    options.iter().map(|o| o.to_string()).collect()
}

#[tokio::test]
async fn test_question_answer_round_trip() {
    // テスト項目: 配信 → 受信 → 回答 → 集計までの一連の流れ（Scenario A）
    // given (前提条件):
    let broker = MemoryBroker::new();
    let (teacher, mut teacher_events) = start(&broker, SessionConfig::broadcaster()).await;
    let (student, mut student_events) = start(&broker, SessionConfig::participant()).await;

    // when (操作):
    let question = teacher
        .submit_broadcast("2+2?", options(&["3", "4", "5"]), BTreeSet::from([1]))
        .await
        .unwrap();
    let received = wait_for_question(&mut student_events).await;
    let outcome = student
        .submit_answer(received.clone(), RoleTag::Chat, BTreeSet::from([1]))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(&received, question.id());
    assert!(outcome.is_correct());
    assert!(outcome.is_published());

    let event = wait_for(&mut teacher_events, |e| {
        matches!(e, SessionEvent::AnswerReceived { .. })
    })
    .await;
    let SessionEvent::AnswerReceived { answer, tally } = event else {
        unreachable!()
    };
    assert_eq!(answer.question_id, received);
    assert_eq!(answer.role, RoleTag::Chat);
    assert_eq!(tally, AnswerTally { total: 1, correct: 1 });

    let snapshot = student.snapshot().await.unwrap();
    assert_eq!(snapshot.current.as_ref().map(|q| q.id()), Some(&received));
    assert!(snapshot.has_submitted(&received, RoleTag::Chat));
    assert!(!snapshot.has_submitted(&received, RoleTag::Mcq));

    teacher.shutdown().await.unwrap();
    student.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_second_submission_is_rejected() {
    // テスト項目: 同じ質問・同じ UI からの 2 回目の提出は拒否される（Scenario C）
    // given (前提条件):
    let broker = MemoryBroker::new();
    let (teacher, _teacher_events) = start(&broker, SessionConfig::broadcaster()).await;
    let (student, mut student_events) = start(&broker, SessionConfig::participant()).await;
    teacher
        .submit_broadcast("2+2?", options(&["3", "4"]), BTreeSet::from([1]))
        .await
        .unwrap();
    let qid = wait_for_question(&mut student_events).await;
    student
        .submit_answer(qid.clone(), RoleTag::Mcq, BTreeSet::from([0]))
        .await
        .unwrap();

    // when (操作):
    let second = student
        .submit_answer(qid.clone(), RoleTag::Mcq, BTreeSet::from([1]))
        .await;

    // then (期待する結果):
    assert_eq!(
        second,
        Err(SessionError::SubmitAnswer(SubmitAnswerError::AlreadySubmitted {
            question_id: qid.clone(),
            role: RoleTag::Mcq
        }))
    );
    let snapshot = student.snapshot().await.unwrap();
    let record = snapshot.submission(&qid, RoleTag::Mcq).unwrap();
    assert_eq!(record.selected_options, BTreeSet::from([0]));
    assert!(!record.is_correct);
}

#[tokio::test]
async fn test_late_joiner_receives_current_question() {
    // テスト項目: 後から参加したクライアントは再同期要求で現在の質問を受け取る
    // given (前提条件):
    let broker = MemoryBroker::new();
    let (teacher, _teacher_events) = start(&broker, SessionConfig::broadcaster()).await;
    teacher
        .submit_broadcast("first?", options(&["a", "b"]), BTreeSet::from([0]))
        .await
        .unwrap();
    let latest = teacher
        .submit_broadcast("second?", options(&["a", "b"]), BTreeSet::from([1]))
        .await
        .unwrap();

    // when (操作):
    let (student, mut student_events) = start(&broker, SessionConfig::participant()).await;
    let received = wait_for_question(&mut student_events).await;

    // then (期待する結果): 最新の質問のみが届く
    assert_eq!(&received, latest.id());
    let snapshot = student.snapshot().await.unwrap();
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.sync, SyncState::Synced);
}

#[tokio::test]
async fn test_duplicate_deliveries_are_idempotent() {
    // テスト項目: 重複配送されても履歴と集計は 1 件ずつ（P1）
    // given (前提条件):
    let broker = MemoryBroker::new();
    broker.set_duplicate_deliveries(true).await;
    let (teacher, mut teacher_events) = start(&broker, SessionConfig::broadcaster()).await;
    let (student, mut student_events) = start(&broker, SessionConfig::participant()).await;

    // when (操作):
    teacher
        .submit_broadcast("2+2?", options(&["3", "4"]), BTreeSet::from([1]))
        .await
        .unwrap();
    let qid = wait_for_question(&mut student_events).await;
    wait_for_question(&mut student_events).await;
    student
        .submit_answer(qid.clone(), RoleTag::Mcq, BTreeSet::from([1]))
        .await
        .unwrap();
    wait_for(&mut teacher_events, |e| {
        matches!(e, SessionEvent::AnswerReceived { .. })
    })
    .await;

    // then (期待する結果):
    let student_view = student.snapshot().await.unwrap();
    assert_eq!(student_view.history.len(), 1);
    let teacher_view = teacher.snapshot().await.unwrap();
    assert_eq!(teacher_view.history.len(), 1);
    assert_eq!(teacher_view.tally(&qid), AnswerTally { total: 1, correct: 1 });
}

#[tokio::test]
async fn test_malformed_payload_is_discarded() {
    // テスト項目: 不正なペイロードは破棄され、後続のメッセージは処理される
    // given (前提条件):
    let broker = MemoryBroker::new();
    let (student, mut student_events) = start(&broker, SessionConfig::participant()).await;

    // when (操作):
    broker
        .inject("mcq/classroom/questions", b"{\"id\":\"q_1\"")
        .await;
    broker
        .inject(
            "mcq/classroom/questions",
            br#"{"id":"q_2","timestamp":"2024-05-01T09:30:00.000Z","question":"?","options":["x"],"correctAnswers":[0]}"#,
        )
        .await;
    broker
        .inject(
            "mcq/classroom/questions",
            br#"{"id":"q_3","timestamp":"2024-05-01T09:30:00.000Z","question":"2+2?","options":["3","4"],"correctAnswers":[1]}"#,
        )
        .await;

    // then (期待する結果):
    let qid = wait_for_question(&mut student_events).await;
    assert_eq!(qid.as_str(), "q_3");
    let snapshot = student.snapshot().await.unwrap();
    assert_eq!(snapshot.history.len(), 1);
}

#[tokio::test]
async fn test_chat_arrives_through_broker_echo() {
    // テスト項目: 送信したチャットはブローカー経由で送信者自身にも届く
    // given (前提条件):
    let broker = MemoryBroker::new();
    let (teacher, mut teacher_events) = start(&broker, SessionConfig::broadcaster()).await;
    let (student, mut student_events) =
        start(&broker, SessionConfig::participant().with_username("alice")).await;

    // when (操作):
    student.submit_chat("  hello  ").await.unwrap();

    // then (期待する結果):
    for events in [&mut student_events, &mut teacher_events] {
        let event = wait_for(events, |e| matches!(e, SessionEvent::ChatAppended(_))).await;
        let SessionEvent::ChatAppended(message) = event else {
            unreachable!()
        };
        assert_eq!(message.username, "alice");
        assert_eq!(message.text.as_str(), "hello");
    }
    assert_eq!(teacher.snapshot().await.unwrap().chat.len(), 1);
}

#[tokio::test]
async fn test_participant_cannot_broadcast() {
    // テスト項目: participant からの配信は拒否され、何も publish されない
    let broker = MemoryBroker::new();
    let (student, _events) = start(&broker, SessionConfig::participant()).await;

    let result = student
        .submit_broadcast("2+2?", options(&["3", "4"]), BTreeSet::from([1]))
        .await;

    assert!(matches!(result, Err(SessionError::Broadcast(_))));
    assert!(student.snapshot().await.unwrap().history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_once_after_backoff() {
    // テスト項目: 接続断の 5 秒後に 1 回だけ再接続し、購読が復元される（Scenario D）
    // given (前提条件):
    let broker = MemoryBroker::new();
    let (student, mut events) = start(&broker, SessionConfig::participant()).await;
    assert_eq!(broker.open_attempts().await, 1);

    // when (操作):
    broker.drop_connections().await;
    wait_for_state(&mut events, ConnectionState::Lost).await;
    let lost_at = Instant::now();
    wait_for_state(&mut events, ConnectionState::Connected).await;

    // then (期待する結果):
    assert!(lost_at.elapsed() >= Duration::from_secs(5));
    assert_eq!(broker.open_attempts().await, 2);
    assert_eq!(broker.subscriber_count("mcq/classroom/questions").await, 1);
    assert_eq!(broker.subscriber_count("mcq/classroom/chat").await, 1);
    assert_eq!(broker.subscriber_count("mcq/classroom/answers").await, 1);

    // 再接続後も受信できる
    broker
        .inject(
            "mcq/classroom/questions",
            br#"{"id":"q_9","timestamp":"2024-05-01T09:30:00.000Z","question":"2+2?","options":["3","4"],"correctAnswers":[1]}"#,
        )
        .await;
    assert_eq!(wait_for_question(&mut events).await.as_str(), "q_9");
    student.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_retries_with_fixed_backoff_until_available() {
    // テスト項目: ブローカーが復帰するまで 5 秒間隔で再試行し続ける
    // given (前提条件):
    let broker = MemoryBroker::new();
    broker.set_available(false).await;
    let started = Instant::now();
    let (student, mut events) =
        Session::spawn(SessionConfig::participant(), broker.link()).unwrap();

    // when (操作):
    wait_for_state(&mut events, ConnectionState::Disconnected).await;
    wait_for_state(&mut events, ConnectionState::Disconnected).await;
    wait_for_state(&mut events, ConnectionState::Disconnected).await;
    broker.set_available(true).await;
    wait_for_state(&mut events, ConnectionState::Connected).await;

    // then (期待する結果):
    assert_eq!(broker.open_attempts().await, 4);
    assert!(started.elapsed() >= Duration::from_secs(15));
    assert!(started.elapsed() < Duration::from_secs(20));
    student.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_answer_while_disconnected_is_recorded_and_reported() {
    // テスト項目: 切断中の提出は記録され、publish 失敗が報告される
    // given (前提条件):
    let broker = MemoryBroker::new();
    let (student, mut events) = start(&broker, SessionConfig::participant()).await;
    broker
        .inject(
            "mcq/classroom/questions",
            br#"{"id":"q_1","timestamp":"2024-05-01T09:30:00.000Z","question":"2+2?","options":["3","4"],"correctAnswers":[1]}"#,
        )
        .await;
    let qid = wait_for_question(&mut events).await;
    broker.set_available(false).await;
    broker.drop_connections().await;
    wait_for_state(&mut events, ConnectionState::Lost).await;

    // when (操作):
    let outcome = student
        .submit_answer(qid.clone(), RoleTag::Mcq, BTreeSet::from([1]))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(outcome.publish_error, Some(TransportError::NotConnected));
    assert!(student.snapshot().await.unwrap().has_submitted(&qid, RoleTag::Mcq));
    wait_for(&mut events, |e| {
        matches!(
            e,
            SessionEvent::PublishFailed {
                kind: TopicKind::Answers,
                ..
            }
        )
    })
    .await;
}

#[tokio::test]
async fn test_shutdown_disconnects_and_closes_handle() {
    // テスト項目: shutdown で切断され、以降の操作は Closed になる
    // given (前提条件):
    let broker = MemoryBroker::new();
    let (student, mut events) = start(&broker, SessionConfig::participant()).await;
    assert_eq!(broker.connection_count().await, 1);

    // when (操作):
    student.shutdown().await.unwrap();

    // then (期待する結果):
    wait_for_state(&mut events, ConnectionState::Disconnected).await;
    assert_eq!(broker.connection_count().await, 0);
    assert_eq!(student.snapshot().await, Err(SessionError::Closed));
    assert_eq!(student.shutdown().await, Ok(()));
}

/// A link to a host that never answers: `open` stays pending.
#[derive(Clone, Default)]
struct StalledLink {
    open_attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl BrokerLink for StalledLink {
    async fn open(&mut self) -> Result<(), TransportError> {
        self.open_attempts.fetch_add(1, Ordering::SeqCst);
        future::pending().await
    }

    async fn close(&mut self) {}

    async fn subscribe(&mut self, _topic: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn publish(
        &mut self,
        _topic: &str,
        _payload: &[u8],
        _qos: QoS,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn recv(&mut self) -> Option<InboundFrame> {
        None
    }
}

#[tokio::test]
async fn test_commands_are_served_while_connect_is_stalled() {
    // テスト項目: 接続試行が応答しない間もコマンドは処理され、shutdown で試行が中断される
    // given (前提条件):
    let link = StalledLink::default();
    let (student, mut events) =
        Session::spawn(SessionConfig::participant(), link.clone()).expect("failed to spawn");
    let limit = Duration::from_secs(3);

    // when (操作):
    let snapshot = tokio::time::timeout(limit, student.snapshot())
        .await
        .expect("snapshot blocked by connect attempt")
        .unwrap();
    let submit = tokio::time::timeout(
        limit,
        student.submit_answer(
            QuestionId::new("q_1".to_string()).unwrap(),
            RoleTag::Mcq,
            BTreeSet::new(),
        ),
    )
    .await
    .expect("submit blocked by connect attempt");
    let shutdown = tokio::time::timeout(limit, student.shutdown())
        .await
        .expect("shutdown blocked by connect attempt");

    // then (期待する結果):
    assert_eq!(snapshot.connection, ConnectionState::Connecting);
    assert_eq!(snapshot.sync, SyncState::Uninitialized);
    assert_eq!(
        submit,
        Err(SessionError::SubmitAnswer(SubmitAnswerError::NoSelection))
    );
    assert_eq!(shutdown, Ok(()));
    assert_eq!(link.open_attempts.load(Ordering::SeqCst), 1);
    wait_for_state(&mut events, ConnectionState::Disconnected).await;
}

#[tokio::test(start_paused = true)]
async fn test_stalled_connect_times_out_and_retries() {
    // テスト項目: 応答しない接続試行はタイムアウト後、バックオフを経て再試行される
    // given (前提条件):
    let link = StalledLink::default();
    let config = SessionConfig::participant()
        .with_connect_timeout(Duration::from_secs(2))
        .with_reconnect_backoff(Duration::from_secs(5));
    let (student, mut events) = Session::spawn(config, link.clone()).expect("failed to spawn");

    // when (操作): 2 秒でタイムアウトし、7 秒の時点で 2 回目の試行が始まる
    wait_for_state(&mut events, ConnectionState::Disconnected).await;
    tokio::time::sleep(Duration::from_secs(6)).await;

    // then (期待する結果):
    assert_eq!(link.open_attempts.load(Ordering::SeqCst), 2);
    let snapshot = student.snapshot().await.unwrap();
    assert_eq!(snapshot.sync, SyncState::Uninitialized);
    student.shutdown().await.unwrap();
}
