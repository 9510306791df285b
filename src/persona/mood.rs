//! Mood transitions.
//!
//! Mood drifts with wall-clock time (the chance of a change grows linearly to
//! certainty over four hours) and is shocked by any stimulus text. Stimulus
//! vocabulary can force delusions or swing the mood toward the extremes.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::persona::state::{Mood, MoodState};

/// Hours after which a mood change becomes certain.
const DRIFT_HOURS: f64 = 4.0;

/// Words that force delusions and heighten intensity.
const DELUSION_TRIGGERS: [&str; 3] = ["conspiracy", "hidden", "truth"];

/// Words that swing the mood to an extreme.
const EXTREME_TRIGGERS: [&str; 3] = ["ai", "technology", "future"];

/// Intensity added by a delusion trigger.
const DELUSION_BOOST: f64 = 0.2;

/// Probability that the mood changes given the time since the last change.
pub fn change_probability(last_change: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = (now - last_change).num_milliseconds() as f64 / 3_600_000.0;
    (hours / DRIFT_HOURS).clamp(0.0, 1.0)
}

/// Which trigger families a stimulus text contains (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StimulusTriggers {
    pub delusion: bool,
    pub extreme: bool,
}

impl StimulusTriggers {
    pub fn scan(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self {
            delusion: DELUSION_TRIGGERS.iter().any(|w| lower.contains(w)),
            extreme: EXTREME_TRIGGERS.iter().any(|w| lower.contains(w)),
        }
    }
}

/// Possibly transition `mood`. Returns true if it changed.
///
/// Draws, in order: the change roll, the mood roll, the delusion roll, the
/// intensity roll, and (only for extreme triggers) the manic/depressive roll.
pub fn update_mood<R: Rng + ?Sized>(
    mood: &mut MoodState,
    stimulus: Option<&str>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> bool {
    let drift_roll: f64 = rng.r#gen();
    let should_change =
        drift_roll < change_probability(mood.last_change_time, now) || stimulus.is_some();
    if !should_change {
        return false;
    }

    let mood_roll: f64 = rng.r#gen();
    mood.current = if mood_roll < 0.33 {
        Mood::Manic
    } else if mood_roll < 0.66 {
        Mood::Depressive
    } else {
        Mood::Neutral
    };

    let delusion_chance = if mood.current.is_neutral() { 0.2 } else { 0.4 };
    mood.delusions = rng.r#gen::<f64>() < delusion_chance;

    let intensity_roll: f64 = rng.r#gen();
    mood.intensity = if mood.current.is_neutral() {
        0.3 + intensity_roll * 0.4
    } else {
        (0.7 + intensity_roll * 0.3).min(1.0)
    };

    if let Some(text) = stimulus {
        let triggers = StimulusTriggers::scan(text);
        if triggers.delusion {
            mood.delusions = true;
            mood.intensity = (mood.intensity + DELUSION_BOOST).min(1.0);
        }
        if triggers.extreme {
            mood.current = if rng.r#gen::<f64>() < 0.7 {
                Mood::Manic
            } else {
                Mood::Depressive
            };
        }
    }

    mood.intensity = mood.intensity.clamp(0.0, 1.0);
    mood.last_change_time = now;
    true
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::testing::ScriptedRng;

    fn mood_at(now: DateTime<Utc>) -> MoodState {
        MoodState {
            current: Mood::Neutral,
            intensity: 0.5,
            delusions: false,
            last_change_time: now,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_change_probability_ramps_over_four_hours() {
        let now = Utc::now();
        assert_eq!(change_probability(now, now), 0.0);
        assert!(approx(change_probability(now - TimeDelta::hours(1), now), 0.25));
        assert!(approx(change_probability(now - TimeDelta::hours(2), now), 0.5));
        assert_eq!(change_probability(now - TimeDelta::hours(9), now), 1.0);
        // Clock skew never yields a negative chance.
        assert_eq!(change_probability(now + TimeDelta::hours(1), now), 0.0);
    }

    #[test]
    fn test_no_elapsed_time_and_no_stimulus_keeps_mood() {
        let now = Utc::now();
        let mut mood = mood_at(now);
        let before = mood.clone();
        let mut rng = ScriptedRng::new(&[0.01, 0.0, 0.0, 0.0]);

        assert!(!update_mood(&mut mood, None, now, &mut rng));
        assert_eq!(mood, before);
    }

    #[test]
    fn test_mood_thresholds() {
        let now = Utc::now();
        let cases = [
            (0.0, Mood::Manic),
            (0.329, Mood::Manic),
            (0.33, Mood::Depressive),
            (0.659, Mood::Depressive),
            (0.66, Mood::Neutral),
            (0.99, Mood::Neutral),
        ];
        for (roll, expected) in cases {
            let mut mood = mood_at(now);
            let mut rng = ScriptedRng::new(&[0.99, roll, 0.99, 0.5]);
            assert!(update_mood(&mut mood, Some("some words"), now, &mut rng));
            assert_eq!(mood.current, expected, "mood roll {}", roll);
        }
    }

    #[test]
    fn test_delusion_thresholds_depend_on_mood() {
        let now = Utc::now();

        // Non-neutral: delusions below 0.4.
        let mut mood = mood_at(now);
        update_mood(&mut mood, Some("x"), now, &mut ScriptedRng::new(&[0.9, 0.1, 0.39, 0.0]));
        assert!(mood.delusions);
        let mut mood = mood_at(now);
        update_mood(&mut mood, Some("x"), now, &mut ScriptedRng::new(&[0.9, 0.1, 0.4, 0.0]));
        assert!(!mood.delusions);

        // Neutral: delusions below 0.2.
        let mut mood = mood_at(now);
        update_mood(&mut mood, Some("x"), now, &mut ScriptedRng::new(&[0.9, 0.8, 0.19, 0.0]));
        assert!(mood.delusions);
        let mut mood = mood_at(now);
        update_mood(&mut mood, Some("x"), now, &mut ScriptedRng::new(&[0.9, 0.8, 0.2, 0.0]));
        assert!(!mood.delusions);
    }

    #[test]
    fn test_intensity_ranges() {
        let now = Utc::now();

        let mut mood = mood_at(now);
        update_mood(&mut mood, Some("x"), now, &mut ScriptedRng::new(&[0.9, 0.1, 0.9, 0.0]));
        assert!(approx(mood.intensity, 0.7));

        let mut mood = mood_at(now);
        update_mood(&mut mood, Some("x"), now, &mut ScriptedRng::new(&[0.9, 0.5, 0.9, 0.5]));
        assert!(approx(mood.intensity, 0.85));

        let mut mood = mood_at(now);
        update_mood(&mut mood, Some("x"), now, &mut ScriptedRng::new(&[0.9, 0.8, 0.9, 0.0]));
        assert!(approx(mood.intensity, 0.3));

        let mut mood = mood_at(now);
        update_mood(&mut mood, Some("x"), now, &mut ScriptedRng::new(&[0.9, 0.8, 0.9, 0.5]));
        assert!(approx(mood.intensity, 0.5));
    }

    #[test]
    fn test_drift_fires_after_elapsed_time() {
        let now = Utc::now();
        let mut mood = mood_at(now - TimeDelta::hours(2));
        // Change roll 0.49 < 0.5 chance.
        let mut rng = ScriptedRng::new(&[0.49, 0.1, 0.9, 0.0]);
        assert!(update_mood(&mut mood, None, now, &mut rng));
        assert_eq!(mood.current, Mood::Manic);
        assert_eq!(mood.last_change_time, now);

        let mut mood = mood_at(now - TimeDelta::hours(2));
        let mut rng = ScriptedRng::new(&[0.51]);
        assert!(!update_mood(&mut mood, None, now, &mut rng));
    }

    #[test]
    fn test_conspiracy_stimulus_forces_delusions_and_boosts_intensity() {
        let now = Utc::now();

        // Neutral draw: 0.3 + 0.25 * 0.4 = 0.4, boosted to 0.6.
        let mut mood = mood_at(now);
        let mut rng = ScriptedRng::new(&[0.9, 0.8, 0.99, 0.25]);
        update_mood(&mut mood, Some("there is a hidden conspiracy"), now, &mut rng);
        assert!(mood.delusions);
        assert_eq!(mood.current, Mood::Neutral);
        assert!(approx(mood.intensity, 0.6));

        // Manic draw at 0.7 + 0.5 * 0.3 = 0.85 is clamped at 1.0.
        let mut mood = mood_at(now);
        let mut rng = ScriptedRng::new(&[0.9, 0.1, 0.99, 0.5]);
        update_mood(&mut mood, Some("THE TRUTH"), now, &mut rng);
        assert!(mood.delusions);
        assert_eq!(mood.intensity, 1.0);
    }

    #[test]
    fn test_extreme_stimulus_overrides_mood() {
        let now = Utc::now();

        let mut mood = mood_at(now);
        let mut rng = ScriptedRng::new(&[0.9, 0.8, 0.9, 0.5, 0.69]);
        update_mood(&mut mood, Some("the future is now"), now, &mut rng);
        assert_eq!(mood.current, Mood::Manic);

        let mut mood = mood_at(now);
        let mut rng = ScriptedRng::new(&[0.9, 0.8, 0.9, 0.5, 0.7]);
        update_mood(&mut mood, Some("Technology ate my weekend"), now, &mut rng);
        assert_eq!(mood.current, Mood::Depressive);
    }

    #[test]
    fn test_trigger_scan_is_case_insensitive() {
        let t = StimulusTriggers::scan("Hidden AI");
        assert!(t.delusion);
        assert!(t.extreme);
        assert_eq!(StimulusTriggers::scan("cats"), StimulusTriggers::default());
    }

    #[test]
    fn test_invariants_hold_for_random_sources() {
        let mut rng = StdRng::seed_from_u64(7);
        let start = Utc::now();
        let mut mood = mood_at(start);
        let stimuli = [None, Some("truth about ai"), Some("hello"), Some("hidden future")];
        for i in 0..5_000 {
            let now = start + TimeDelta::minutes(i * 7);
            update_mood(&mut mood, stimuli[(i % 4) as usize], now, &mut rng);
            assert!((0.0..=1.0).contains(&mood.intensity));
            assert!(matches!(
                mood.current,
                Mood::Neutral | Mood::Manic | Mood::Depressive
            ));
        }
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let now = Utc::now();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut mood = mood_at(now);
            update_mood(&mut mood, Some("a reply"), now, &mut rng);
            mood
        };
        assert_eq!(run(11), run(11));
    }
}
