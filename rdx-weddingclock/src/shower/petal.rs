//! What a petal looks like and how it falls.

use crate::error::ConfigError;
use crate::viewport::Viewport;
use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use serde::Deserialize;
use std::f32::consts::TAU;
use std::time::Duration;

/// A named family of colours, e.g. "pink", drawn with a fixed weight.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColorCategory {
    pub name: String,
    pub weight: u32,
    pub colors: Vec<String>,
}

impl ColorCategory {
    pub fn new(name: &str, weight: u32, colors: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            weight,
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Weighted colour categories.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    categories: Vec<ColorCategory>,
    total_weight: u32,
}

impl Palette {
    pub fn new(categories: Vec<ColorCategory>) -> Result<Self, ConfigError> {
        if let Some(empty) = categories.iter().find(|c| c.colors.is_empty()) {
            return Err(ConfigError::invalid(
                "shower.palette",
                format!("category '{}' has no colors", empty.name),
            ));
        }
        let total_weight: u32 = categories.iter().map(|c| c.weight).sum();
        if total_weight == 0 {
            return Err(ConfigError::invalid(
                "shower.palette",
                "at least one category needs a positive weight",
            ));
        }
        Ok(Self {
            categories,
            total_weight,
        })
    }

    pub fn categories(&self) -> &[ColorCategory] {
        &self.categories
    }

    /// Picks a category by weight, then a colour within it uniformly.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> (&str, &str) {
        let mut roll = rng.gen_range(0..self.total_weight);
        let mut chosen = &self.categories[0];
        for category in &self.categories {
            if roll < category.weight {
                chosen = category;
                break;
            }
            roll -= category.weight;
        }
        let color = &chosen.colors[rng.gen_range(0..chosen.colors.len())];
        (chosen.name.as_str(), color.as_str())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            categories: vec![
                ColorCategory::new("white", 40, &["#ffffff", "#fdf8f2", "#f8f4ec"]),
                ColorCategory::new("pink", 30, &["#f9c5d1", "#f4a6b8", "#fbd3dc"]),
                ColorCategory::new("red", 30, &["#c81d25", "#a4161a", "#e5383b"]),
            ],
            total_weight: 100,
        }
    }
}

impl<'de> Deserialize<'de> for Palette {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let categories = Vec::<ColorCategory>::deserialize(deserializer)?;
        Palette::new(categories).map_err(serde::de::Error::custom)
    }
}

/// An inclusive `[min, max]` range read from config.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy + SampleUniform> Span<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    /// Uniform draw from the range; a collapsed or inverted range yields `min`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> T {
        if self.min < self.max {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// Tunables for how petals are drawn.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PetalStyle {
    /// Chance of a petal being the small size class.
    pub small_probability: f64,
    pub small_scale: f32,
    pub normal_scale: f32,
    /// Horizontal sway, in pixels.
    pub sway_amplitude: Span<f32>,
    /// Full sway oscillations over one fall.
    pub sway_cycles: f32,
    /// Degrees turned over one fall.
    pub spin: f32,
    pub fall_duration_ms: Span<u64>,
    /// Distance above the top / below the bottom where petals start and end.
    pub margin: f32,
}

impl Default for PetalStyle {
    fn default() -> Self {
        Self {
            small_probability: 0.3,
            small_scale: 0.6,
            normal_scale: 1.0,
            sway_amplitude: Span::new(20.0, 60.0),
            sway_cycles: 2.0,
            spin: 360.0,
            fall_duration_ms: Span::new(4_000, 7_000),
            margin: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetalSize {
    Small,
    Normal,
}

/// One falling petal. Everything about its path is decided at spawn time,
/// so a viewport resize mid-fall doesn't move it.
#[derive(Debug, Clone, PartialEq)]
pub struct Petal {
    pub origin_x: f32,
    pub origin_y: f32,
    pub destination_y: f32,
    pub rotation_start: f32,
    pub category: String,
    pub color: String,
    pub size: PetalSize,
    pub scale: f32,
    pub sway_amplitude: f32,
    /// `1` or `-1`.
    pub sway_direction: i8,
    pub sway_cycles: f32,
    pub spin: f32,
    pub fall_duration: Duration,
}

/// Where a petal is drawn at some point during its fall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PetalFrame {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub opacity: f32,
}

impl Petal {
    /// Fraction of the fall completed, clamped to `[0, 1]`.
    pub fn progress(&self, elapsed: Duration) -> f32 {
        if self.fall_duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f32() / self.fall_duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.fall_duration
    }

    pub fn frame_at(&self, elapsed: Duration) -> PetalFrame {
        let p = self.progress(elapsed);
        let direction = f32::from(self.sway_direction);
        // Fade in over the first 10%, out over the last 20%.
        let opacity = if p < 0.1 {
            p / 0.1
        } else if p > 0.8 {
            (1.0 - p) / 0.2
        } else {
            1.0
        };
        PetalFrame {
            x: self.origin_x + direction * self.sway_amplitude * (p * TAU * self.sway_cycles).sin(),
            y: self.origin_y + (self.destination_y - self.origin_y) * p,
            rotation: self.rotation_start + direction * self.spin * p,
            opacity,
        }
    }
}

/// Draws randomized petals from a palette and style.
pub struct PetalFactory<R: Rng> {
    palette: Palette,
    style: PetalStyle,
    rng: R,
}

impl<R: Rng> PetalFactory<R> {
    pub fn new(palette: Palette, style: PetalStyle, rng: R) -> Self {
        Self { palette, style, rng }
    }

    pub fn spawn(&mut self, viewport: Viewport) -> Petal {
        let rng = &mut self.rng;
        let style = &self.style;
        let (category, color) = self.palette.sample(rng);
        let size = if rng.gen_bool(style.small_probability.clamp(0.0, 1.0)) {
            PetalSize::Small
        } else {
            PetalSize::Normal
        };
        Petal {
            origin_x: rng.gen_range(0.0..viewport.width),
            origin_y: -style.margin,
            destination_y: viewport.height + style.margin,
            rotation_start: rng.gen_range(0.0..360.0),
            category: category.to_string(),
            color: color.to_string(),
            size,
            scale: match size {
                PetalSize::Small => style.small_scale,
                PetalSize::Normal => style.normal_scale,
            },
            sway_amplitude: style.sway_amplitude.sample(rng),
            sway_direction: if rng.gen_bool(0.5) { 1 } else { -1 },
            sway_cycles: style.sway_cycles,
            spin: style.spin,
            fall_duration: Duration::from_millis(style.fall_duration_ms.sample(rng)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn factory(seed: u64) -> PetalFactory<StdRng> {
        PetalFactory::new(Palette::default(), PetalStyle::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn spawned_petals_respect_bounds() {
        let mut factory = factory(7);
        let viewport = Viewport::new(800.0, 600.0);
        for _ in 0..500 {
            let petal = factory.spawn(viewport);
            assert!((0.0..800.0).contains(&petal.origin_x));
            assert!(petal.origin_y < 0.0);
            assert!(petal.destination_y > 600.0);
            assert!((20.0..=60.0).contains(&petal.sway_amplitude));
            assert!(petal.sway_direction == 1 || petal.sway_direction == -1);
            assert!((4_000..=7_000).contains(&(petal.fall_duration.as_millis() as u64)));
            let category = Palette::default()
                .categories()
                .iter()
                .find(|c| c.name == petal.category)
                .cloned()
                .unwrap();
            assert!(category.colors.contains(&petal.color));
        }
    }

    #[test]
    fn category_and_size_distribution_follow_weights() {
        let mut factory = factory(42);
        let viewport = Viewport::new(1024.0, 768.0);
        let mut categories: HashMap<String, usize> = HashMap::new();
        let mut small = 0;
        let draws = 10_000;
        for _ in 0..draws {
            let petal = factory.spawn(viewport);
            *categories.entry(petal.category).or_default() += 1;
            if petal.size == PetalSize::Small {
                small += 1;
            }
        }
        let share = |name: &str| categories[name] as f64 / draws as f64;
        assert!((share("white") - 0.4).abs() < 0.03);
        assert!((share("pink") - 0.3).abs() < 0.03);
        assert!((share("red") - 0.3).abs() < 0.03);
        assert!((small as f64 / draws as f64 - 0.3).abs() < 0.03);
    }

    #[test]
    fn same_seed_same_petals() {
        let viewport = Viewport::new(400.0, 300.0);
        let (mut a, mut b) = (factory(3), factory(3));
        for _ in 0..20 {
            assert_eq!(a.spawn(viewport), b.spawn(viewport));
        }
    }

    #[test]
    fn frame_moves_from_origin_to_destination_with_fade_envelope() {
        let mut factory = factory(1);
        let petal = factory.spawn(Viewport::new(800.0, 600.0));
        let start = petal.frame_at(Duration::ZERO);
        assert_eq!(start.y, petal.origin_y);
        assert_eq!(start.opacity, 0.0);
        assert!((start.x - petal.origin_x).abs() < 1e-3);

        let middle = petal.frame_at(petal.fall_duration / 2);
        assert_eq!(middle.opacity, 1.0);

        let end = petal.frame_at(petal.fall_duration);
        assert_eq!(end.y, petal.destination_y);
        assert!(end.opacity.abs() < 1e-6);
        assert!(petal.is_finished(petal.fall_duration));
        assert!(!petal.is_finished(petal.fall_duration / 2));
    }

    #[test]
    fn palette_rejects_all_zero_weights_and_empty_categories() {
        assert!(Palette::new(vec![ColorCategory::new("white", 0, &["#fff"])]).is_err());
        assert!(Palette::new(vec![ColorCategory::new("pink", 10, &[])]).is_err());
        assert!(Palette::new(vec![]).is_err());
    }
}
