//! Message Codec.
//!
//! Maps [`QuizMessage`] values to UTF-8 JSON payloads and back. The kind
//! of an inbound payload is decided by its topic suffix, and decoding fails
//! closed: missing, mistyped or unknown fields and domain invariant
//! violations all yield [`CodecError::MalformedPayload`].

use std::collections::BTreeSet;

use quizcast_shared::time::{millis_to_rfc3339, rfc3339_to_millis};
use thiserror::Error;

use crate::domain::{
    AnswerMessage, ChatMessage, ClientIdentity, MessageContent, Question, QuestionId,
    QuizMessage, RequestAction, ResyncRequest, RoleTag, Timestamp, TopicKind, TopicSet,
};

use super::dto::wire::{AnswerDto, ChatMessageDto, QuestionDto, RequestActionDto, RequestDto};

/// Codec errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Topic is not part of the session namespace
    #[error("topic '{0}' is outside the session namespace")]
    UnknownTopic(String),

    /// Payload does not have the shape required by its topic
    #[error("malformed {kind} payload: {reason}")]
    MalformedPayload { kind: TopicKind, reason: String },

    /// A value could not be put on the wire
    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// An encoded message ready to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Encoder/decoder bound to one topic namespace
#[derive(Debug, Clone, Default)]
pub struct MessageCodec {
    topics: TopicSet,
}

impl MessageCodec {
    pub fn new(topics: TopicSet) -> Self {
        Self { topics }
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    /// Encode a message together with the topic it belongs on.
    pub fn encode(&self, message: &QuizMessage) -> Result<EncodedMessage, CodecError> {
        let payload = match message {
            QuizMessage::Question(question) => to_json(&QuestionDto {
                id: question.id().as_str().to_string(),
                timestamp: encode_timestamp(question.timestamp())?,
                question: question.text().to_string(),
                options: question.options().to_vec(),
                correct_answers: question.correct_answers().iter().copied().collect(),
            })?,
            QuizMessage::Answer(answer) => to_json(&AnswerDto {
                question_id: answer.question_id.as_str().to_string(),
                user_id: answer.user_id.as_str().to_string(),
                selected_options: answer.selected_options.iter().copied().collect(),
                is_correct: answer.is_correct,
                section: answer.role.as_str().to_string(),
                timestamp: encode_timestamp(answer.timestamp)?,
            })?,
            QuizMessage::Chat(chat) => to_json(&ChatMessageDto {
                username: chat.username.clone(),
                user_id: chat.user_id.as_str().to_string(),
                message: chat.text.as_str().to_string(),
                timestamp: encode_timestamp(chat.timestamp)?,
            })?,
            QuizMessage::Request(request) => to_json(&RequestDto {
                action: match request.action {
                    RequestAction::GetCurrentQuestion => RequestActionDto::GetCurrentQuestion,
                },
            })?,
        };

        Ok(EncodedMessage {
            topic: self.topics.topic(message.kind()),
            payload,
        })
    }

    /// Decode a payload received on `topic`.
    pub fn decode(&self, topic: &str, payload: &[u8]) -> Result<QuizMessage, CodecError> {
        let kind = self
            .topics
            .classify(topic)
            .ok_or_else(|| CodecError::UnknownTopic(topic.to_string()))?;
        let malformed = |reason: String| CodecError::MalformedPayload { kind, reason };

        match kind {
            TopicKind::Questions => {
                let dto: QuestionDto = from_json(payload).map_err(malformed)?;
                let id = QuestionId::new(dto.id).map_err(|e| malformed(e.to_string()))?;
                let timestamp = decode_timestamp(&dto.timestamp).map_err(malformed)?;
                let question = Question::new(
                    id,
                    timestamp,
                    dto.question,
                    dto.options,
                    dto.correct_answers.into_iter().collect(),
                )
                .map_err(|e| malformed(e.to_string()))?;
                Ok(QuizMessage::Question(question))
            }
            TopicKind::Answers => {
                let dto: AnswerDto = from_json(payload).map_err(malformed)?;
                Ok(QuizMessage::Answer(AnswerMessage {
                    question_id: QuestionId::new(dto.question_id)
                        .map_err(|e| malformed(e.to_string()))?,
                    user_id: ClientIdentity::new(dto.user_id)
                        .map_err(|e| malformed(e.to_string()))?,
                    selected_options: dto.selected_options.into_iter().collect::<BTreeSet<_>>(),
                    is_correct: dto.is_correct,
                    role: dto
                        .section
                        .parse::<RoleTag>()
                        .map_err(|e| malformed(e.to_string()))?,
                    timestamp: decode_timestamp(&dto.timestamp).map_err(malformed)?,
                }))
            }
            TopicKind::Chat => {
                let dto: ChatMessageDto = from_json(payload).map_err(malformed)?;
                Ok(QuizMessage::Chat(ChatMessage::new(
                    dto.username,
                    ClientIdentity::new(dto.user_id).map_err(|e| malformed(e.to_string()))?,
                    MessageContent::new(dto.message).map_err(|e| malformed(e.to_string()))?,
                    decode_timestamp(&dto.timestamp).map_err(malformed)?,
                )))
            }
            TopicKind::Request => {
                let dto: RequestDto = from_json(payload).map_err(malformed)?;
                let action = match dto.action {
                    RequestActionDto::GetCurrentQuestion => RequestAction::GetCurrentQuestion,
                };
                Ok(QuizMessage::Request(ResyncRequest { action }))
            }
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

fn from_json<'a, T: serde::Deserialize<'a>>(payload: &'a [u8]) -> Result<T, String> {
    serde_json::from_slice(payload).map_err(|e| e.to_string())
}

fn encode_timestamp(timestamp: Timestamp) -> Result<String, CodecError> {
    millis_to_rfc3339(timestamp.value())
        .ok_or_else(|| CodecError::Encode(format!("timestamp {timestamp} is out of range")))
}

fn decode_timestamp(value: &str) -> Result<Timestamp, String> {
    rfc3339_to_millis(value)
        .map(Timestamp::new)
        .map_err(|e| format!("invalid timestamp '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> MessageCodec {
        MessageCodec::default()
    }

    fn sample_question() -> Question {
        Question::new(
            QuestionId::new("q_1714555800123".to_string()).unwrap(),
            Timestamp::new(1_714_555_800_123),
            "2+2?".to_string(),
            vec!["3".to_string(), "4".to_string(), "5".to_string()],
            BTreeSet::from([1]),
        )
        .unwrap()
    }

    fn round_trip(message: QuizMessage) {
        let encoded = codec().encode(&message).unwrap();
        let decoded = codec().decode(&encoded.topic, &encoded.payload).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_round_trip_every_kind() {
        // テスト項目: 4 種類すべてで decode(encode(m)) == m が成り立つ
        round_trip(QuizMessage::Question(sample_question()));
        round_trip(QuizMessage::Answer(AnswerMessage {
            question_id: QuestionId::new("q_1".to_string()).unwrap(),
            user_id: ClientIdentity::new("mcq_client_0badcafe".to_string()).unwrap(),
            selected_options: BTreeSet::from([0, 2]),
            is_correct: false,
            role: RoleTag::Chat,
            timestamp: Timestamp::new(1_714_555_801_000),
        }));
        round_trip(QuizMessage::Chat(ChatMessage::new(
            "User".to_string(),
            ClientIdentity::new("mcq_client_0badcafe".to_string()).unwrap(),
            MessageContent::new("こんにちは".to_string()).unwrap(),
            Timestamp::new(1_714_555_802_500),
        )));
        round_trip(QuizMessage::Request(ResyncRequest::current_question()));
    }

    #[test]
    fn test_encode_question_wire_shape() {
        // テスト項目: 質問はフロントエンドと同じキーで送信される
        // when (操作):
        let encoded = codec()
            .encode(&QuizMessage::Question(sample_question()))
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&encoded.payload).unwrap();

        // then (期待する結果):
        assert_eq!(encoded.topic, "mcq/classroom/questions");
        assert_eq!(json["id"], "q_1714555800123");
        assert_eq!(json["question"], "2+2?");
        assert_eq!(json["correctAnswers"], serde_json::json!([1]));
        assert_eq!(json["timestamp"], "2024-05-01T09:30:00.123Z");
    }

    #[test]
    fn test_decode_front_end_payloads() {
        // テスト項目: ブラウザ版クライアントが送るペイロードを解釈できる
        // given (前提条件):
        let answer = br#"{"questionId":"q_1","userId":"mcq_client_1a2b3c4d","selectedOptions":[1],"isCorrect":true,"section":"chat","timestamp":"2024-05-01T09:30:00.123Z"}"#;
        let chat = br#"{"username":"User","userId":"mcq_client_1a2b3c4d","message":"hi","timestamp":"2024-05-01T09:30:00.123Z"}"#;
        let request = br#"{"action":"get_current_question"}"#;

        // when (操作):
        let answer = codec().decode("mcq/classroom/answers", answer).unwrap();
        let chat = codec().decode("mcq/classroom/chat", chat).unwrap();
        let request = codec().decode("mcq/classroom/request", request).unwrap();

        // then (期待する結果):
        match answer {
            QuizMessage::Answer(a) => {
                assert_eq!(a.role, RoleTag::Chat);
                assert!(a.is_correct);
            }
            other => panic!("expected answer, got {other:?}"),
        }
        match chat {
            QuizMessage::Chat(c) => assert_eq!(c.text.as_str(), "hi"),
            other => panic!("expected chat, got {other:?}"),
        }
        assert_eq!(request, QuizMessage::Request(ResyncRequest::current_question()));
    }

    #[test]
    fn test_decode_duplicate_indices_collapse_into_set() {
        // テスト項目: 重複した正解インデックスは集合として扱われる
        let payload = br#"{"id":"q_1","timestamp":"2024-05-01T09:30:00.123Z","question":"?","options":["a","b"],"correctAnswers":[1,1,0]}"#;
        match codec().decode("mcq/classroom/questions", payload).unwrap() {
            QuizMessage::Question(q) => assert_eq!(q.correct_answers(), &BTreeSet::from([0, 1])),
            other => panic!("expected question, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_malformed_payloads() {
        // テスト項目: 形の不正なペイロードは MalformedPayload になる
        let cases: [(&str, &[u8]); 8] = [
            ("mcq/classroom/questions", b"not json"),
            // 必須フィールド欠落
            ("mcq/classroom/questions", br#"{"id":"q_1","question":"?","options":["a","b"],"correctAnswers":[0]}"#),
            // 選択肢が 1 つ
            ("mcq/classroom/questions", br#"{"id":"q_1","timestamp":"2024-05-01T09:30:00Z","question":"?","options":["a"],"correctAnswers":[0]}"#),
            // 範囲外の正解
            ("mcq/classroom/questions", br#"{"id":"q_1","timestamp":"2024-05-01T09:30:00Z","question":"?","options":["a","b"],"correctAnswers":[2]}"#),
            // 型違い
            ("mcq/classroom/answers", br#"{"questionId":"q_1","userId":"u","selectedOptions":"1","isCorrect":true,"section":"mcq","timestamp":"2024-05-01T09:30:00Z"}"#),
            // 未知のセクション
            ("mcq/classroom/answers", br#"{"questionId":"q_1","userId":"u","selectedOptions":[1],"isCorrect":true,"section":"exam","timestamp":"2024-05-01T09:30:00Z"}"#),
            // 空のチャット
            ("mcq/classroom/chat", br#"{"username":"User","userId":"u","message":"","timestamp":"2024-05-01T09:30:00Z"}"#),
            // 未知のアクション
            ("mcq/classroom/request", br#"{"action":"get_all_questions"}"#),
        ];

        for (topic, payload) in cases {
            let result = codec().decode(topic, payload);
            assert!(
                matches!(result, Err(CodecError::MalformedPayload { .. })),
                "{topic}: expected MalformedPayload, got {result:?}"
            );
        }
    }

    #[test]
    fn test_decode_rejects_unknown_fields() {
        // テスト項目: 未知のフィールドを含むペイロードは拒否される
        let payload = br#"{"action":"get_current_question","force":true}"#;
        let result = codec().decode("mcq/classroom/request", payload);
        assert!(matches!(result, Err(CodecError::MalformedPayload { kind: TopicKind::Request, .. })));
    }

    #[test]
    fn test_decode_unknown_topic() {
        // テスト項目: 名前空間外のトピックは UnknownTopic になる
        let result = codec().decode("other/room/questions", b"{}");
        assert_eq!(
            result,
            Err(CodecError::UnknownTopic("other/room/questions".to_string()))
        );
    }
}
