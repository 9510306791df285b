//! Content generation: mood-shaped prompts, completion cleanup, dedup.
//!
//! Every call first runs the mood engine (with the stimulus text for replies)
//! so the prompt always reflects the current mood. Failures never propagate:
//! the caller gets `None` and skips the action.

use std::sync::Arc;

use rand::Rng;

use crate::config::LlmConfig;
use crate::llm::{CompletionRequest, TextGenerator};
use crate::persona::{Mood, MoodState, Persona};

/// Hard cap on published text, in characters.
pub const MAX_CONTENT_CHARS: usize = 230;
const ELLIPSIS: &str = "...";

/// What the text is responding to, if anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus {
    pub text: String,
    pub author: String,
}

/// Tone instructions derived from the mood.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDirectives {
    pub tone: &'static str,
    pub paranoia: bool,
}

impl StyleDirectives {
    fn for_post(mood: &MoodState) -> Self {
        let tone = match mood.current {
            Mood::Manic => "Be more energetic and intense.",
            Mood::Depressive => "Be more melancholic and dark.",
            Mood::Neutral => "Be cryptic and mysterious.",
        };
        Self {
            tone,
            paranoia: mood.delusions,
        }
    }

    fn for_reply(mood: &MoodState) -> Self {
        let tone = match mood.current {
            Mood::Manic => "Reply with intense energy.",
            Mood::Depressive => "Reply with deep melancholy.",
            Mood::Neutral => "Reply with mysterious undertones.",
        };
        Self {
            tone,
            paranoia: mood.delusions,
        }
    }
}

/// Ephemeral description of one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub mood: MoodState,
    pub stimulus: Option<Stimulus>,
    pub directives: StyleDirectives,
}

impl GenerationRequest {
    pub fn post(mood: &MoodState) -> Self {
        Self {
            mood: mood.clone(),
            stimulus: None,
            directives: StyleDirectives::for_post(mood),
        }
    }

    pub fn reply(mood: &MoodState, stimulus: Stimulus) -> Self {
        Self {
            mood: mood.clone(),
            stimulus: Some(stimulus),
            directives: StyleDirectives::for_reply(mood),
        }
    }

    /// Render the natural-language prompt.
    pub fn prompt(&self) -> String {
        let framing = format!(
            "You are a tech-savvy individual with psychological disturbances \
             (mood: {}, intensity: {:.2}).",
            self.mood.current, self.mood.intensity
        );
        let task = match &self.stimulus {
            None => format!(
                "Share a thought that fits in a single tweet (max {} characters). \
                 Be introspective, dark, and nuanced.",
                MAX_CONTENT_CHARS
            ),
            Some(s) => format!(
                "Reply to this tweet by {}: \"{}\". Keep your response under {} characters. \
                 Be introspective, dark, and stay in character.",
                s.author, s.text, MAX_CONTENT_CHARS
            ),
        };

        let mut prompt = format!("{}\n{}\n{}", framing, task, self.directives.tone);
        if self.directives.paranoia {
            prompt.push_str("\nInclude subtle paranoid elements.");
        }
        prompt
    }
}

/// Clean raw completion text; `None` if nothing usable is left.
pub fn clean_completion(raw: &str) -> Option<String> {
    let text = strip_quotes(raw);
    let text = match text.strip_prefix("RT ") {
        Some(rest) => strip_quotes(rest),
        None => text,
    };
    let text: String = text.chars().filter(|c| *c != '#').collect();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(truncate(text))
}

fn strip_quotes(text: &str) -> &str {
    text.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’'))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CONTENT_CHARS {
        return text.to_string();
    }
    let keep = MAX_CONTENT_CHARS - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Produces post and reply text for the persona.
pub struct ContentGenerator {
    llm: Arc<dyn TextGenerator>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

impl ContentGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>, config: &LlmConfig) -> Self {
        Self {
            llm,
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        }
    }

    /// Generate an original post.
    ///
    /// Returns `None` on service failure or if the text duplicates a recent
    /// post; otherwise the text is remembered and persisted.
    pub async fn generate_post<R>(&self, persona: &mut Persona, rng: &mut R) -> Option<String>
    where
        R: Rng + Send + ?Sized,
    {
        persona.update_mood(None, rng);
        let request = GenerationRequest::post(persona.mood());

        let text = match self.complete(&request).await {
            Some(text) => text,
            None => {
                tracing::error!("Error generating tweet: no usable completion");
                return None;
            }
        };

        if !persona.remember_post(&text) {
            tracing::info!("Generated text duplicates a recent post, discarding");
            return None;
        }
        Some(text)
    }

    /// Generate a reply to `text` written by `author`.
    pub async fn generate_reply<R>(
        &self,
        persona: &mut Persona,
        text: &str,
        author: &str,
        rng: &mut R,
    ) -> Option<String>
    where
        R: Rng + Send + ?Sized,
    {
        persona.update_mood(Some(text), rng);
        let request = GenerationRequest::reply(
            persona.mood(),
            Stimulus {
                text: text.to_string(),
                author: author.to_string(),
            },
        );

        let reply = self.complete(&request).await;
        if reply.is_none() {
            tracing::error!("Error generating response to {}: no usable completion", author);
        }
        reply
    }

    async fn complete(&self, request: &GenerationRequest) -> Option<String> {
        let completion = CompletionRequest::new(request.prompt())
            .with_temperature(self.temperature)
            .with_top_p(self.top_p)
            .with_max_tokens(self.max_tokens);

        match self.llm.complete(completion).await {
            Ok(response) => clean_completion(&response.content),
            Err(e) => {
                tracing::error!("Text generation via {} failed: {}", self.llm.model_name(), e);
                None
            }
        }
    }
}
