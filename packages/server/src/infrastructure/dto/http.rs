//! HTTP API response DTOs for the relay broker.

use serde::{Deserialize, Serialize};

use crate::domain::BrokerStats;

/// Response of `GET /api/stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsDto {
    pub connections: usize,
    pub subscriptions: usize,
    pub topics: Vec<TopicStatsDto>,
}

/// Subscriber count of one topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicStatsDto {
    pub topic: String,
    pub subscribers: usize,
}

impl From<BrokerStats> for StatsDto {
    fn from(stats: BrokerStats) -> Self {
        Self {
            connections: stats.connections,
            subscriptions: stats.subscriptions,
            topics: stats
                .topics
                .into_iter()
                .map(|(topic, subscribers)| TopicStatsDto { topic, subscribers })
                .collect(),
        }
    }
}
