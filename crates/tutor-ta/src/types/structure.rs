//! Chart structure types - extrema and three-point Head-and-Shoulders shapes.

use serde::{Deserialize, Serialize};

/// A local high (or low) in a candle sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    /// Index into the candle sequence.
    pub index: usize,
    pub price: f64,
}

/// Orientation of a Head-and-Shoulders structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    /// Peaks with the head on top; bearish reversal.
    Normal,
    /// Troughs with the head at the bottom; bullish reversal.
    Inverse,
}

/// Role of a point within the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointRole {
    Left,
    Head,
    Right,
}

impl PointRole {
    pub fn label(&self) -> &'static str {
        match self {
            PointRole::Left => "Left shoulder",
            PointRole::Head => "Head",
            PointRole::Right => "Right shoulder",
        }
    }
}

/// One of the three defining points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPoint {
    #[serde(rename = "id")]
    pub role: PointRole,
    /// Index into the candle sequence.
    pub index: usize,
    pub price: f64,
    pub label: String,
}

impl PatternPoint {
    pub fn new(role: PointRole, extremum: Extremum) -> Self {
        Self {
            role,
            index: extremum.index,
            price: extremum.price,
            label: role.label().to_string(),
        }
    }
}

/// Anchor of the neckline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NecklinePoint {
    pub index: usize,
    pub price: f64,
}

/// A detected Head-and-Shoulders structure.
///
/// `points` is ordered left, head, right by ascending candle index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructurePattern {
    #[serde(rename = "type")]
    pub kind: StructureKind,
    pub points: [PatternPoint; 3],
    pub neckline: [NecklinePoint; 2],
}

impl StructurePattern {
    pub fn left(&self) -> &PatternPoint {
        &self.points[0]
    }

    pub fn head(&self) -> &PatternPoint {
        &self.points[1]
    }

    pub fn right(&self) -> &PatternPoint {
        &self.points[2]
    }

    /// Neckline price at a candle index, extrapolated along the line through both anchors.
    pub fn neckline_price_at(&self, index: usize) -> f64 {
        let [a, b] = self.neckline;
        if a.index == b.index {
            return a.price;
        }
        let slope = (b.price - a.price) / (b.index as f64 - a.index as f64);
        a.price + slope * (index as f64 - a.index as f64)
    }
}
