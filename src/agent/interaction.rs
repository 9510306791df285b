//! Feed interaction: sample the visible feed and engage with some of it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::agent::generator::ContentGenerator;
use crate::agent::selector::{ActionSelector, EngagementPlan};
use crate::browser::scripts::pause;
use crate::browser::{BrowserSession, ElementHandle, Visibility, WaitPolicy, selectors};
use crate::config::PacingConfig;
use crate::error::DriverError;
use crate::persona::{Engagement, Persona};

const CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// Stable identifier of a feed item, derived from its author and text.
pub fn item_id(author: &str, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(author.as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// What one interaction cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionSummary {
    pub sampled: usize,
    pub engaged: usize,
    pub already_seen: usize,
    pub likes: usize,
    pub retweets: usize,
    pub replies: usize,
    pub failed: usize,
}

enum ItemOutcome {
    Engaged,
    AlreadySeen,
}

/// A feed item being engaged, and whether anything was clicked on it yet.
struct ItemContext<'a> {
    handle: &'a ElementHandle,
    text: String,
    author: String,
    applied: bool,
}

pub struct InteractionEngine {
    selector: ActionSelector,
    generator: Arc<ContentGenerator>,
    pacing: PacingConfig,
    home_url: String,
}

impl InteractionEngine {
    pub fn new(
        selector: ActionSelector,
        generator: Arc<ContentGenerator>,
        pacing: PacingConfig,
        home_url: impl Into<String>,
    ) -> Self {
        Self {
            selector,
            generator,
            pacing,
            home_url: home_url.into(),
        }
    }

    /// Run one interaction cycle over the home feed.
    ///
    /// Item-level failures are logged and the cycle moves on. Only errors
    /// that mean the browser session itself is gone are returned.
    pub async fn run<R>(
        &self,
        session: &dyn BrowserSession,
        persona: &mut Persona,
        rng: &mut R,
    ) -> Result<InteractionSummary, DriverError>
    where
        R: Rng + Send + ?Sized,
    {
        tracing::info!("Starting tweet interaction process...");
        session.navigate(&self.home_url, WaitPolicy::Load).await?;
        pause(self.pacing.long).await;

        let distance = self.selector.scroll_distance(rng);
        session.scroll_by(distance).await?;
        pause(self.pacing.long).await;

        let sample_size = self.selector.behavior().feed_sample_size;
        let items = session.query_all(selectors::FEED_ITEM).await?;
        let mut summary = InteractionSummary {
            sampled: items.len().min(sample_size),
            ..InteractionSummary::default()
        };
        tracing::info!("Found {} tweets, considering {}", items.len(), summary.sampled);

        for item in items.iter().take(sample_size) {
            let Some(plan) = self.selector.plan_engagement(rng) else {
                continue;
            };
            if plan.is_empty() {
                continue;
            }

            match self
                .engage_item(session, persona, item, plan, rng, &mut summary)
                .await
            {
                Ok(ItemOutcome::Engaged) => summary.engaged += 1,
                Ok(ItemOutcome::AlreadySeen) => summary.already_seen += 1,
                Err(e) if e.is_session_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Error processing tweet: {}", e);
                    summary.failed += 1;
                }
            }
            pause(self.pacing.between_items).await;
        }

        tracing::info!(
            likes = summary.likes,
            retweets = summary.retweets,
            replies = summary.replies,
            "Interaction cycle complete"
        );
        Ok(summary)
    }

    async fn engage_item<R>(
        &self,
        session: &dyn BrowserSession,
        persona: &mut Persona,
        item: &ElementHandle,
        plan: EngagementPlan,
        rng: &mut R,
        summary: &mut InteractionSummary,
    ) -> Result<ItemOutcome, DriverError>
    where
        R: Rng + Send + ?Sized,
    {
        let text = session.extract_text(item, selectors::ITEM_TEXT).await?;
        let author = session.extract_text(item, selectors::ITEM_AUTHOR).await?;

        let id = item_id(&author, &text);
        if persona.is_processed(&id) {
            tracing::debug!("Skipping already processed tweet from {}", author);
            return Ok(ItemOutcome::AlreadySeen);
        }

        let mut ctx = ItemContext {
            handle: item,
            text,
            author,
            applied: false,
        };
        let result = self
            .apply_plan(session, persona, &mut ctx, plan, rng, summary)
            .await;

        // Once anything was clicked the item counts as processed, so a later
        // cycle never toggles a like back off.
        if result.is_ok() || ctx.applied {
            persona.mark_processed(id);
        }
        result.map(|()| ItemOutcome::Engaged)
    }

    async fn apply_plan<R>(
        &self,
        session: &dyn BrowserSession,
        persona: &mut Persona,
        ctx: &mut ItemContext<'_>,
        plan: EngagementPlan,
        rng: &mut R,
        summary: &mut InteractionSummary,
    ) -> Result<(), DriverError>
    where
        R: Rng + Send + ?Sized,
    {
        let item = ctx.handle;
        if plan.like {
            if let Some(button) = session.query_within(item, selectors::LIKE_BUTTON).await? {
                session.click(&button).await?;
                ctx.applied = true;
                persona.record_engagement(Engagement::Like, Utc::now());
                summary.likes += 1;
                tracing::info!("Liked tweet from {}", ctx.author);
                pause(self.pacing.short).await;
            }
        }

        if plan.retweet {
            if let Some(button) = session.query_within(item, selectors::RETWEET_BUTTON).await? {
                session.click(&button).await?;
                ctx.applied = true;
                pause(self.pacing.short).await;
                // The confirmation menu does not always appear.
                if let Some(confirm) = session.query(selectors::RETWEET_CONFIRM).await? {
                    session.click(&confirm).await?;
                }
                persona.record_engagement(Engagement::Retweet, Utc::now());
                summary.retweets += 1;
                tracing::info!("Retweeted tweet from {}", ctx.author);
                pause(self.pacing.short).await;
            }
        }

        if plan.reply {
            if let Some(reply) = self
                .generator
                .generate_reply(persona, &ctx.text, &ctx.author, rng)
                .await
            {
                self.submit_reply(session, ctx, &reply).await?;
                persona.record_engagement(Engagement::Reply, Utc::now());
                summary.replies += 1;
                tracing::info!("Replied to {}: {}", ctx.author, reply);
            }
        }
        Ok(())
    }

    async fn submit_reply(
        &self,
        session: &dyn BrowserSession,
        ctx: &mut ItemContext<'_>,
        reply: &str,
    ) -> Result<(), DriverError> {
        let button = session
            .query_within(ctx.handle, selectors::REPLY_BUTTON)
            .await?
            .ok_or_else(|| DriverError::ElementNotFound {
                selector: selectors::REPLY_BUTTON.to_string(),
            })?;
        session.click(&button).await?;
        ctx.applied = true;
        pause(self.pacing.short).await;

        let textbox = session
            .wait_for_element(selectors::COMPOSER_TEXTAREA, Visibility::Visible, CONTROL_TIMEOUT)
            .await?;
        session
            .type_text(&textbox, reply, self.pacing.content_keystroke)
            .await?;
        pause(self.pacing.short).await;

        let submit = session
            .wait_for_element(selectors::SUBMIT_BUTTON, Visibility::Visible, CONTROL_TIMEOUT)
            .await?;
        session.click(&submit).await?;
        pause(self.pacing.long).await;
        Ok(())
    }
}
