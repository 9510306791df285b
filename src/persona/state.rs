//! Persona data model: mood plus memory.
//!
//! The serialized shape is the durable state document:
//!
//! ```json
//! {
//!   "mood":   { "current", "lastChangeTime", "delusions", "intensity" },
//!   "memory": { "recentTopics", "recentPosts", "processedItems",
//!               "lastPostTime", "interactionCounters" }
//! }
//! ```
//!
//! Every field carries a serde default and unknown fields are ignored, so
//! older or newer documents still load.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of remembered posts.
pub const RECENT_POSTS_CAPACITY: usize = 50;

/// Number of processed feed item ids remembered; oldest are evicted first.
pub const PROCESSED_ITEMS_CAPACITY: usize = 1000;

/// Coarse emotional state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Neutral,
    Manic,
    Depressive,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Neutral => "neutral",
            Mood::Manic => "manic",
            Mood::Depressive => "depressive",
        }
    }

    pub fn is_neutral(self) -> bool {
        matches!(self, Mood::Neutral)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoodState {
    pub current: Mood,
    /// Always within [0, 1].
    pub intensity: f64,
    pub delusions: bool,
    pub last_change_time: DateTime<Utc>,
}

impl Default for MoodState {
    fn default() -> Self {
        Self {
            current: Mood::Neutral,
            intensity: 0.5,
            delusions: false,
            last_change_time: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionCounters {
    pub likes: u64,
    pub replies: u64,
    pub retweets: u64,
    pub last_interaction_time: DateTime<Utc>,
}

impl Default for InteractionCounters {
    fn default() -> Self {
        Self {
            likes: 0,
            replies: 0,
            retweets: 0,
            last_interaction_time: Utc::now(),
        }
    }
}

/// Kind of engagement taken on a feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Like,
    Reply,
    Retweet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryState {
    /// Reserved for topic-aware policies; not consulted yet.
    pub recent_topics: Vec<String>,
    /// Oldest first, at most [`RECENT_POSTS_CAPACITY`] entries.
    pub recent_posts: VecDeque<String>,
    /// Oldest first, at most [`PROCESSED_ITEMS_CAPACITY`] entries.
    pub processed_items: VecDeque<String>,
    pub last_post_time: DateTime<Utc>,
    pub interaction_counters: InteractionCounters,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            recent_topics: Vec::new(),
            recent_posts: VecDeque::new(),
            processed_items: VecDeque::new(),
            last_post_time: Utc::now(),
            interaction_counters: InteractionCounters::default(),
        }
    }
}

impl MemoryState {
    /// Whether `text` was already posted verbatim.
    pub fn has_posted(&self, text: &str) -> bool {
        self.recent_posts.iter().any(|p| p == text)
    }

    /// Append a post, evicting the oldest entries beyond capacity.
    pub fn remember_post(&mut self, text: impl Into<String>) {
        self.recent_posts.push_back(text.into());
        while self.recent_posts.len() > RECENT_POSTS_CAPACITY {
            self.recent_posts.pop_front();
        }
    }

    pub fn is_processed(&self, item_id: &str) -> bool {
        self.processed_items.iter().any(|id| id == item_id)
    }

    /// Remember a processed item id. Returns false if it was already known.
    pub fn mark_processed(&mut self, item_id: impl Into<String>) -> bool {
        let item_id = item_id.into();
        if self.is_processed(&item_id) {
            return false;
        }
        self.processed_items.push_back(item_id);
        while self.processed_items.len() > PROCESSED_ITEMS_CAPACITY {
            self.processed_items.pop_front();
        }
        true
    }

    pub fn record_engagement(&mut self, kind: Engagement, at: DateTime<Utc>) {
        let counters = &mut self.interaction_counters;
        match kind {
            Engagement::Like => counters.likes += 1,
            Engagement::Reply => counters.replies += 1,
            Engagement::Retweet => counters.retweets += 1,
        }
        counters.last_interaction_time = at;
    }
}

/// Mood and memory of the persona.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaState {
    pub mood: MoodState,
    pub memory: MemoryState,
}
