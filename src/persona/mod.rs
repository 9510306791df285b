//! Persona state, its durable store, and mood dynamics.
//!
//! [`Persona`] owns the in-memory state together with its store. Every
//! mutating method persists immediately; a failed write is logged at error
//! level and the in-memory state stays authoritative.

pub mod mood;
pub mod state;
mod store;

pub use mood::{StimulusTriggers, change_probability, update_mood};
pub use state::{
    Engagement, InteractionCounters, MemoryState, Mood, MoodState, PersonaState,
    PROCESSED_ITEMS_CAPACITY, RECENT_POSTS_CAPACITY,
};
pub use store::StateStore;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::StateError;

/// The persona: exclusively owned state plus where it is persisted.
#[derive(Debug)]
pub struct Persona {
    state: PersonaState,
    store: StateStore,
}

impl Persona {
    /// Materialize the persona from its store (defaults if absent or corrupt).
    pub fn load(store: StateStore) -> Self {
        let state = store.load();
        Self { state, store }
    }

    pub fn with_state(state: PersonaState, store: StateStore) -> Self {
        Self { state, store }
    }

    pub fn state(&self) -> &PersonaState {
        &self.state
    }

    pub fn mood(&self) -> &MoodState {
        &self.state.mood
    }

    pub fn memory(&self) -> &MemoryState {
        &self.state.memory
    }

    /// Run the mood engine now; persists if the mood changed.
    pub fn update_mood<R: Rng + ?Sized>(&mut self, stimulus: Option<&str>, rng: &mut R) -> bool {
        self.update_mood_at(stimulus, Utc::now(), rng)
    }

    pub fn update_mood_at<R: Rng + ?Sized>(
        &mut self,
        stimulus: Option<&str>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> bool {
        let changed = update_mood(&mut self.state.mood, stimulus, now, rng);
        if changed {
            let mood = &self.state.mood;
            tracing::info!(
                mood = %mood.current,
                intensity = mood.intensity,
                delusions = mood.delusions,
                "Mood updated to {} (intensity: {:.2}){}",
                mood.current,
                mood.intensity,
                if mood.delusions { " with delusions" } else { "" }
            );
            self.commit();
        }
        changed
    }

    /// Remember a freshly generated post.
    ///
    /// Returns false (and changes nothing) if the exact text is already in
    /// recent memory.
    pub fn remember_post(&mut self, text: &str) -> bool {
        if self.state.memory.has_posted(text) {
            return false;
        }
        self.state.memory.remember_post(text);
        self.commit();
        true
    }

    /// Mark a successful post.
    pub fn record_post(&mut self, at: DateTime<Utc>) {
        self.state.memory.last_post_time = at;
        self.commit();
    }

    pub fn record_engagement(&mut self, kind: Engagement, at: DateTime<Utc>) {
        self.state.memory.record_engagement(kind, at);
        self.commit();
    }

    pub fn is_processed(&self, item_id: &str) -> bool {
        self.state.memory.is_processed(item_id)
    }

    pub fn mark_processed(&mut self, item_id: impl Into<String>) {
        if self.state.memory.mark_processed(item_id) {
            self.commit();
        }
    }

    /// Flush the current state to the store.
    pub fn persist(&self) -> Result<(), StateError> {
        self.store.save(&self.state)
    }

    fn commit(&self) {
        if let Err(e) = self.persist() {
            tracing::error!(
                "Failed to persist persona state to {}: {} (continuing with in-memory state)",
                self.store.path().display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::testing::ScriptedRng;

    #[test]
    fn test_mood_change_is_persisted_immediately() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let mut persona = Persona::load(store.clone());

        let mut rng = ScriptedRng::new(&[0.9, 0.1, 0.9, 0.5]);
        assert!(persona.update_mood(Some("a reply"), &mut rng));

        let on_disk = store.load();
        assert_eq!(on_disk.mood.current, Mood::Manic);
        assert_eq!(on_disk.mood.delusions, persona.mood().delusions);
        assert_eq!(on_disk.mood.last_change_time, persona.mood().last_change_time);
        assert!((on_disk.mood.intensity - persona.mood().intensity).abs() < 1e-12);
    }

    #[test]
    fn test_unchanged_mood_does_no_io() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut persona = Persona::load(StateStore::new(&path));

        let now = persona.mood().last_change_time;
        let mut rng = ScriptedRng::new(&[0.5]);
        assert!(!persona.update_mood_at(None, now, &mut rng));
        assert!(!path.exists());
    }

    #[test]
    fn test_remember_post_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let mut persona = Persona::load(StateStore::new(dir.path().join("state.json")));

        assert!(persona.remember_post("echoes in the wire"));
        assert!(!persona.remember_post("echoes in the wire"));
        assert_eq!(persona.memory().recent_posts.len(), 1);
    }

    #[test]
    fn test_processed_items() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let mut persona = Persona::load(store.clone());

        assert!(!persona.is_processed("abc"));
        persona.mark_processed("abc");
        assert!(persona.is_processed("abc"));
        assert!(store.load().memory.is_processed("abc"));
    }

    #[test]
    fn test_persisted_processed_items_stay_bounded() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let mut persona = Persona::load(store.clone());

        for i in 0..PROCESSED_ITEMS_CAPACITY + 50 {
            persona.mark_processed(format!("{:064x}", i));
        }

        let on_disk = store.load();
        assert_eq!(on_disk.memory.processed_items.len(), PROCESSED_ITEMS_CAPACITY);
        assert!(!on_disk.memory.is_processed(&format!("{:064x}", 0)));
        assert!(on_disk.memory.is_processed(&format!("{:064x}", PROCESSED_ITEMS_CAPACITY + 49)));
    }
}
