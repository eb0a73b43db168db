//! Time-of-day clock.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Coarse phase of the day, from fixed hour windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    Dawn,
    Day,
    Dusk,
    Night,
}

impl DayPhase {
    /// dawn [5,7), day [7,18), dusk [18,20), night otherwise.
    pub fn from_hour(hour: f32) -> Self {
        if (5.0..7.0).contains(&hour) {
            DayPhase::Dawn
        } else if (7.0..18.0).contains(&hour) {
            DayPhase::Day
        } else if (18.0..20.0).contains(&hour) {
            DayPhase::Dusk
        } else {
            DayPhase::Night
        }
    }
}

/// Clock plus the lighting values derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeOfDay {
    /// Hour in `[0, 24)`.
    pub hour: f32,
    pub day_count: u32,
    /// Game seconds per real second.
    pub time_scale: f32,
    pub phase: DayPhase,
    /// 0 at sunrise (06:00), PI at sunset (18:00).
    pub sun_angle: f32,
    pub sun_intensity: f32,
    pub ambient_light: f32,
    pub fog_density: f32,
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self::new(8.0, 60.0)
    }
}

impl TimeOfDay {
    pub fn new(start_hour: f32, time_scale: f32) -> Self {
        let hour = if start_hour.is_finite() { start_hour.rem_euclid(24.0) } else { 8.0 };
        let mut time = Self {
            hour,
            day_count: 0,
            time_scale: if time_scale.is_finite() { time_scale.max(0.0) } else { 1.0 },
            phase: DayPhase::Day,
            sun_angle: 0.0,
            sun_intensity: 0.0,
            ambient_light: 0.0,
            fog_density: 0.0,
        };
        time.refresh();
        time
    }

    /// Advance by `delta` real seconds. Returns `true` if midnight passed.
    pub fn advance(&mut self, delta: f32) -> bool {
        if !delta.is_finite() || delta <= 0.0 {
            return false;
        }
        let advanced = self.hour + delta * self.time_scale / 3600.0;
        let wraps = (advanced / 24.0).floor();
        self.hour = advanced.rem_euclid(24.0);
        // rem_euclid can round up to exactly 24.0 for tiny negative inputs.
        if self.hour >= 24.0 {
            self.hour = 0.0;
        }
        if wraps >= 1.0 {
            self.day_count = self.day_count.saturating_add(wraps as u32);
        }
        self.refresh();
        wraps >= 1.0
    }

    pub fn set_hour(&mut self, hour: f32) {
        if hour.is_finite() {
            self.hour = hour.rem_euclid(24.0);
            self.refresh();
        }
    }

    fn refresh(&mut self) {
        self.phase = DayPhase::from_hour(self.hour);
        self.sun_angle = (self.hour - 6.0) / 12.0 * PI;
        self.sun_intensity = self.sun_angle.sin().max(0.0);
        self.ambient_light = 0.15 + 0.85 * self.sun_intensity;
        self.fog_density = 0.05 + 0.25 * (1.0 - self.sun_intensity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_wraps_and_counts_day() {
        let mut time = TimeOfDay::new(23.5, 1.0);
        assert!(time.advance(3600.0));
        assert!((time.hour - 0.5).abs() < 1e-4);
        assert_eq!(time.day_count, 1);
        assert_eq!(time.phase, DayPhase::Night);
    }

    #[test]
    fn test_multi_day_jump() {
        let mut time = TimeOfDay::new(12.0, 3600.0);
        time.advance(50.0);
        assert_eq!(time.day_count, 2);
        assert!((time.hour - 14.0).abs() < 1e-3);
    }

    #[test]
    fn test_phase_windows() {
        assert_eq!(DayPhase::from_hour(4.99), DayPhase::Night);
        assert_eq!(DayPhase::from_hour(5.0), DayPhase::Dawn);
        assert_eq!(DayPhase::from_hour(7.0), DayPhase::Day);
        assert_eq!(DayPhase::from_hour(17.99), DayPhase::Day);
        assert_eq!(DayPhase::from_hour(18.0), DayPhase::Dusk);
        assert_eq!(DayPhase::from_hour(20.0), DayPhase::Night);
        assert_eq!(DayPhase::from_hour(0.0), DayPhase::Night);
    }

    #[test]
    fn test_lighting_follows_sun() {
        let noon = TimeOfDay::new(12.0, 1.0);
        let midnight = TimeOfDay::new(0.0, 1.0);
        assert!((noon.sun_intensity - 1.0).abs() < 1e-4);
        assert_eq!(midnight.sun_intensity, 0.0);
        assert!(noon.ambient_light > midnight.ambient_light);
        assert!(noon.fog_density < midnight.fog_density);
    }

    #[test]
    fn test_invalid_delta_is_ignored() {
        let mut time = TimeOfDay::new(10.0, 60.0);
        assert!(!time.advance(f32::NAN));
        assert!(!time.advance(-5.0));
        assert_eq!(time.hour, 10.0);
    }
}
