//! Weather episodes and the transitions between them.

use super::biome::BiomeKind;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Seconds a transition takes from start to finish.
pub const TRANSITION_SECONDS: f32 = 30.0;
/// Episode length bounds, in seconds.
pub const EPISODE_SECONDS: (f32, f32) = (180.0, 600.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    Clear,
    Rain,
    Fog,
    Snow,
    Storm,
    Sandstorm,
}

impl WeatherKind {
    pub const ALL: [WeatherKind; 6] = [
        WeatherKind::Clear,
        WeatherKind::Rain,
        WeatherKind::Fog,
        WeatherKind::Snow,
        WeatherKind::Storm,
        WeatherKind::Sandstorm,
    ];

    pub fn profile(self) -> WeatherProfile {
        let (intensity, visibility, wind, movement, fog) = match self {
            WeatherKind::Clear => (0.0, 1.0, 1.0, 1.0, 0.0),
            WeatherKind::Rain => (0.5, 0.7, 1.3, 0.9, 0.15),
            WeatherKind::Fog => (0.3, 0.35, 0.5, 0.95, 0.6),
            WeatherKind::Snow => (0.6, 0.6, 1.2, 0.75, 0.25),
            WeatherKind::Storm => (1.0, 0.45, 2.2, 0.7, 0.3),
            WeatherKind::Sandstorm => (0.9, 0.25, 2.5, 0.65, 0.45),
        };
        WeatherProfile {
            intensity,
            visibility,
            wind,
            movement,
            fog_density: fog,
        }
    }
}

/// Static look-and-feel of one weather kind, or a blend of two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherProfile {
    /// In `[0, 1]`.
    pub intensity: f32,
    /// Visibility modifier in `[0, 1]`.
    pub visibility: f32,
    pub wind: f32,
    /// Movement-speed multiplier, never above 1.
    pub movement: f32,
    pub fog_density: f32,
}

impl WeatherProfile {
    /// Linear blend, with the bounded fields clamped.
    pub fn lerp(&self, other: &WeatherProfile, t: f32) -> WeatherProfile {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let mix = |a: f32, b: f32| a + (b - a) * t;
        WeatherProfile {
            intensity: mix(self.intensity, other.intensity).clamp(0.0, 1.0),
            visibility: mix(self.visibility, other.visibility).clamp(0.0, 1.0),
            wind: mix(self.wind, other.wind).max(0.0),
            movement: mix(self.movement, other.movement).clamp(0.0, 1.0),
            fog_density: mix(self.fog_density, other.fog_density).clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    pub current: WeatherKind,
    /// Set while a transition is running.
    pub next: Option<WeatherKind>,
    /// Transition progress in `[0, 1)`.
    pub progress: f32,
    /// Seconds left in the current episode.
    pub remaining: f32,
    /// Blended profile presented to consumers.
    pub profile: WeatherProfile,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self::new(WeatherKind::Clear, EPISODE_SECONDS.0)
    }
}

impl WeatherState {
    pub fn new(current: WeatherKind, duration: f32) -> Self {
        Self {
            current,
            next: None,
            progress: 0.0,
            remaining: duration.max(0.0),
            profile: current.profile(),
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.next.is_some()
    }

    /// Start blending toward `next`. A transition to the current weather,
    /// or one already underway, is ignored.
    pub fn begin_transition(&mut self, next: WeatherKind) -> bool {
        if self.next.is_some() || next == self.current {
            return false;
        }
        self.next = Some(next);
        self.progress = 0.0;
        true
    }

    /// Advance by `dt` seconds. Returns `(from, to)` when a transition
    /// completes this call.
    pub fn update(&mut self, dt: f32, biome: BiomeKind, rng: &mut SmallRng) -> Option<(WeatherKind, WeatherKind)> {
        if !dt.is_finite() || dt <= 0.0 {
            return None;
        }
        let Some(next) = self.next else {
            self.remaining -= dt;
            if self.remaining <= 0.0 {
                let candidate = draw_next(self.current, biome, rng);
                self.begin_transition(candidate);
            }
            return None;
        };

        self.progress += dt / TRANSITION_SECONDS;
        if self.progress >= 1.0 {
            let from = self.current;
            self.current = next;
            self.next = None;
            self.progress = 0.0;
            self.remaining = rng.gen_range(EPISODE_SECONDS.0..=EPISODE_SECONDS.1);
            self.profile = self.current.profile();
            return Some((from, next));
        }
        self.profile = self.current.profile().lerp(&next.profile(), self.progress);
        None
    }
}

/// Relative chance of each weather kind in a biome.
pub fn biome_weights(biome: BiomeKind) -> &'static [(WeatherKind, u32)] {
    use WeatherKind::*;
    match biome {
        BiomeKind::Meadow => &[(Clear, 6), (Rain, 3), (Fog, 2), (Storm, 1)],
        BiomeKind::Forest => &[(Clear, 4), (Rain, 4), (Fog, 3), (Storm, 1)],
        BiomeKind::Desert => &[(Clear, 6), (Sandstorm, 3), (Storm, 1)],
        BiomeKind::Tundra => &[(Clear, 3), (Snow, 5), (Fog, 1), (Storm, 1)],
        BiomeKind::Swamp => &[(Clear, 2), (Rain, 4), (Fog, 5), (Storm, 1)],
    }
}

/// Weighted draw excluding the current kind. Falls back to the first
/// eligible entry if the draw cannot be made.
pub fn draw_next(current: WeatherKind, biome: BiomeKind, rng: &mut SmallRng) -> WeatherKind {
    let options: Vec<(WeatherKind, u32)> = biome_weights(biome)
        .iter()
        .copied()
        .filter(|(kind, _)| *kind != current)
        .collect();
    let fallback = options
        .first()
        .map(|(kind, _)| *kind)
        .unwrap_or(WeatherKind::Clear);
    match WeightedIndex::new(options.iter().map(|(_, w)| *w)) {
        Ok(dist) => options[dist.sample(rng)].0,
        Err(_) => fallback,
    }
}
