//! Weighted-random decisions: what a tick does, which items get engaged, how
//! long to wait in between.
//!
//! Every decision is a fresh, memoryless draw from the supplied RNG.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::BehaviorConfig;

/// Largest random scroll before sampling the feed, in pixels.
pub const MAX_SCROLL_PX: u32 = 1000;

/// What one tick does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Post,
    Interact,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Post => write!(f, "post"),
            Action::Interact => write!(f, "interact"),
        }
    }
}

/// Independent engagement choices for one feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngagementPlan {
    pub like: bool,
    pub reply: bool,
    pub retweet: bool,
}

impl EngagementPlan {
    pub fn is_empty(&self) -> bool {
        !(self.like || self.reply || self.retweet)
    }
}

#[derive(Debug, Clone)]
pub struct ActionSelector {
    behavior: BehaviorConfig,
}

impl ActionSelector {
    pub fn new(behavior: BehaviorConfig) -> Self {
        Self { behavior }
    }

    pub fn behavior(&self) -> &BehaviorConfig {
        &self.behavior
    }

    /// Draw the tick action.
    ///
    /// A post drawn within `post_interval` of the last post becomes an
    /// interaction instead.
    pub fn choose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        last_post: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Action {
        let roll: f64 = rng.r#gen();
        if roll >= self.behavior.post_probability {
            return Action::Interact;
        }

        if !self.behavior.post_interval.is_zero() {
            let since = (now - last_post).to_std().unwrap_or(Duration::ZERO);
            if since < self.behavior.post_interval {
                tracing::debug!(
                    "Last post was {:?} ago (interval {:?}), interacting instead",
                    since,
                    self.behavior.post_interval
                );
                return Action::Interact;
            }
        }
        Action::Post
    }

    /// Decide engagement for one feed item; `None` if the item is passed over.
    pub fn plan_engagement<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<EngagementPlan> {
        if rng.r#gen::<f64>() >= self.behavior.engagement_probability {
            return None;
        }
        Some(EngagementPlan {
            like: rng.r#gen::<f64>() < self.behavior.like_probability,
            reply: rng.r#gen::<f64>() < self.behavior.reply_probability,
            retweet: rng.r#gen::<f64>() < self.behavior.retweet_probability,
        })
    }

    /// Uniform delay in `[min_delay, max_delay]`.
    pub fn tick_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.behavior.min_delay.as_millis() as u64;
        let max = self.behavior.max_delay.as_millis() as u64;
        if max <= min {
            return self.behavior.min_delay;
        }
        Duration::from_millis(rng.gen_range(min..=max))
    }

    pub fn should_refresh<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.r#gen::<f64>() < self.behavior.refresh_probability
    }

    pub fn scroll_distance<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        (rng.r#gen::<f64>() * MAX_SCROLL_PX as f64) as u32
    }
}
