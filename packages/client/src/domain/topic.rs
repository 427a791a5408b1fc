//! Topic namespace.
//!
//! All traffic of one classroom lives under a base topic `T`:
//!
//! | Topic | Direction | Payload |
//! |-------|-----------|---------|
//! | `T/questions` | broadcaster -> all | Question |
//! | `T/chat` | any -> all | ChatMessage |
//! | `T/answers` | participant -> broadcaster | Answer |
//! | `T/request` | participant -> broadcaster | Request |

use std::fmt;

use super::error::ValueObjectError;

/// Default base topic
pub const DEFAULT_BASE_TOPIC: &str = "mcq/classroom";

/// Validated base topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseTopic(String);

impl BaseTopic {
    /// Create a new BaseTopic.
    ///
    /// Rejects empty topics, MQTT wildcards (`+`, `#`) and leading or
    /// trailing separators.
    pub fn new(topic: String) -> Result<Self, ValueObjectError> {
        if topic.is_empty() {
            return Err(ValueObjectError::BaseTopicEmpty);
        }
        if topic.contains(['+', '#']) {
            return Err(ValueObjectError::BaseTopicInvalid(format!(
                "'{topic}' contains a wildcard"
            )));
        }
        if topic.starts_with('/') || topic.ends_with('/') || topic.contains("//") {
            return Err(ValueObjectError::BaseTopicInvalid(format!(
                "'{topic}' has an empty level"
            )));
        }
        Ok(Self(topic))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BaseTopic {
    fn default() -> Self {
        Self(DEFAULT_BASE_TOPIC.to_string())
    }
}

impl fmt::Display for BaseTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four message channels under a base topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    Questions,
    Chat,
    Answers,
    Request,
}

impl TopicKind {
    /// Every kind, in subscription order.
    pub const ALL: [TopicKind; 4] = [
        TopicKind::Questions,
        TopicKind::Chat,
        TopicKind::Answers,
        TopicKind::Request,
    ];

    /// Topic suffix below the base topic.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Questions => "questions",
            Self::Chat => "chat",
            Self::Answers => "answers",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Builds and classifies full topic names for one base topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    base: BaseTopic,
}

impl TopicSet {
    pub fn new(base: BaseTopic) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BaseTopic {
        &self.base
    }

    /// Full topic name for a kind, e.g. `mcq/classroom/questions`.
    pub fn topic(&self, kind: TopicKind) -> String {
        format!("{}/{}", self.base.as_str(), kind.suffix())
    }

    /// Classify a full topic name. `None` when it is outside the namespace.
    pub fn classify(&self, topic: &str) -> Option<TopicKind> {
        let suffix = topic
            .strip_prefix(self.base.as_str())?
            .strip_prefix('/')?;
        TopicKind::ALL
            .into_iter()
            .find(|kind| kind.suffix() == suffix)
    }
}

impl Default for TopicSet {
    fn default() -> Self {
        Self::new(BaseTopic::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_topic_rejects_wildcards() {
        // テスト項目: ワイルドカードを含むベーストピックは作成できない
        assert!(BaseTopic::new("mcq/+".to_string()).is_err());
        assert!(BaseTopic::new("mcq/#".to_string()).is_err());
    }

    #[test]
    fn test_base_topic_rejects_empty_levels() {
        // テスト項目: 空のレベルを含むベーストピックは作成できない
        assert!(BaseTopic::new("/mcq".to_string()).is_err());
        assert!(BaseTopic::new("mcq/".to_string()).is_err());
        assert!(BaseTopic::new("mcq//room".to_string()).is_err());
        assert_eq!(
            BaseTopic::new(String::new()),
            Err(ValueObjectError::BaseTopicEmpty)
        );
    }

    #[test]
    fn test_topic_set_builds_and_classifies() {
        // テスト項目: トピック名の生成と分類が対応している
        // given (前提条件):
        let topics = TopicSet::default();

        // then (期待する結果):
        for kind in TopicKind::ALL {
            let topic = topics.topic(kind);
            assert_eq!(topics.classify(&topic), Some(kind));
        }
        assert_eq!(topics.topic(TopicKind::Request), "mcq/classroom/request");
    }

    #[test]
    fn test_topic_set_classify_outside_namespace() {
        // テスト項目: 名前空間外のトピックは分類されない
        // given (前提条件):
        let topics = TopicSet::default();

        // then (期待する結果):
        assert_eq!(topics.classify("mcq/other/questions"), None);
        assert_eq!(topics.classify("mcq/classroomquestions"), None);
        assert_eq!(topics.classify("mcq/classroom/questions/extra"), None);
        assert_eq!(topics.classify("mcq/classroom"), None);
    }
}
