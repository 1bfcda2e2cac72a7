use std::f32::consts::PI;

use loam_geom::Rgb;

use crate::NIGHT_SUN_FLOOR;

/// Fraction of the day at which the sun rises. Midnight is 0.0, noon 0.5.
pub const DAY_START: f32 = 0.25;
/// Fraction of the day at which the sun sets.
pub const DAY_END: f32 = 0.75;

/// Sun state for one instant of the day cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunSample {
    pub day_fraction: f32,
    /// Scalar strength of the sky contribution, never below [`NIGHT_SUN_FLOOR`].
    pub sun_intensity: f32,
    /// Tint applied to sunlit tiles; cool at night, warm near dawn and dusk.
    pub sun_color: Rgb,
}

/// Wall-clock driven day/night cycle.
pub struct DayCycle {
    time: f32,
    day_length: f32,
}

impl DayCycle {
    pub fn new(day_length: f32) -> Self {
        Self {
            time: 0.0,
            day_length: day_length.max(1.0),
        }
    }

    /// Advances the cycle by `dt` seconds and returns the new sun state.
    pub fn advance(&mut self, dt: f32) -> SunSample {
        self.time = (self.time + dt).rem_euclid(self.day_length);
        self.sample()
    }

    pub fn day_fraction(&self) -> f32 {
        (self.time / self.day_length).rem_euclid(1.0)
    }

    pub fn sample(&self) -> SunSample {
        Self::sample_at(self.day_fraction())
    }

    /// Sun state for an arbitrary fraction of the day.
    ///
    /// The sun follows a half-sine arc between [`DAY_START`] and [`DAY_END`]
    /// and is down the rest of the time. Intensity is shaped with a 1.5 power
    /// so dawn and dusk stay dim longer than a plain sine would.
    pub fn sample_at(day_fraction: f32) -> SunSample {
        let t = day_fraction.rem_euclid(1.0);
        let window = if t > DAY_START && t < DAY_END {
            (((t - DAY_START) / (DAY_END - DAY_START)) * PI).sin().max(0.0)
        } else {
            0.0
        };
        let sun_intensity = window.powf(1.5).max(NIGHT_SUN_FLOOR);

        let day = Rgb::new(1.0, 0.98, 0.92);
        let night = Rgb::new(0.55, 0.62, 0.80);
        let warm = Rgb::new(1.0, 0.63, 0.32);
        let base = night.lerp(day, window);
        // Warm cast peaks just after sunrise and before sunset, when the
        // sun is up but the window is still near zero.
        let twilight = if window > 0.0 {
            (1.0 - window).powf(3.0)
        } else {
            0.0
        };
        let warm_strength = (0.45 * twilight).clamp(0.0, 0.5);
        let sun_color = base.lerp(warm, warm_strength);

        SunSample {
            day_fraction: t,
            sun_intensity,
            sun_color,
        }
    }
}
