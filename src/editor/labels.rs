use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geometry::Color;

/// A label name with the color its annotations are drawn in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSwatch {
    pub name: String,
    pub color: Color,
}

impl LabelSwatch {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

pub fn default_palette() -> Vec<LabelSwatch> {
    vec![
        LabelSwatch::new("person", Color::new(0x3B, 0x82, 0xF6)),
        LabelSwatch::new("car", Color::new(0x0D, 0x94, 0x88)),
        LabelSwatch::new("dog", Color::new(0xF5, 0x9E, 0x0B)),
        LabelSwatch::new("cat", Color::new(0xEF, 0x44, 0x44)),
        LabelSwatch::new("bicycle", Color::new(0x8B, 0x5C, 0xF6)),
        LabelSwatch::new("tree", Color::new(0x22, 0xC5, 0x5E)),
    ]
}

/// Color registered for `label` in `palette`.
pub fn color_for_label(palette: &[LabelSwatch], label: &str) -> Option<Color> {
    palette
        .iter()
        .find(|swatch| swatch.name == label)
        .map(|swatch| swatch.color)
}

/// Decides the label of each newly committed annotation.
pub trait LabelPolicy: Send {
    fn next_label(&mut self) -> LabelSwatch;
}

/// Picks a palette entry uniformly at random; label and color always agree.
#[derive(Debug)]
pub struct RandomLabelPolicy {
    palette: Vec<LabelSwatch>,
    rng: StdRng,
}

impl RandomLabelPolicy {
    pub fn new(palette: Vec<LabelSwatch>) -> Self {
        Self::with_rng(palette, StdRng::from_os_rng())
    }

    pub fn seeded(palette: Vec<LabelSwatch>, seed: u64) -> Self {
        Self::with_rng(palette, StdRng::seed_from_u64(seed))
    }

    fn with_rng(palette: Vec<LabelSwatch>, rng: StdRng) -> Self {
        let palette = if palette.is_empty() {
            tracing::warn!("empty label palette; falling back to defaults");
            default_palette()
        } else {
            palette
        };
        Self { palette, rng }
    }

    pub fn palette(&self) -> &[LabelSwatch] {
        &self.palette
    }
}

impl LabelPolicy for RandomLabelPolicy {
    fn next_label(&mut self) -> LabelSwatch {
        let index = self.rng.random_range(0..self.palette.len());
        self.palette[index].clone()
    }
}

/// Always assigns the same label, e.g. the one picked in a label selector.
#[derive(Debug, Clone)]
pub struct FixedLabelPolicy {
    swatch: LabelSwatch,
}

impl FixedLabelPolicy {
    pub fn new(swatch: LabelSwatch) -> Self {
        Self { swatch }
    }

    pub fn set(&mut self, swatch: LabelSwatch) {
        self.swatch = swatch;
    }
}

impl LabelPolicy for FixedLabelPolicy {
    fn next_label(&mut self) -> LabelSwatch {
        self.swatch.clone()
    }
}
