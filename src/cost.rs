use crate::classifier::FloodLabel;
use crate::types::SegmentInfo;

pub const DEFAULT_FLOOD_MULTIPLIER: f64 = 10.0;

/// Turns the flood label into per-edge routing costs.
///
/// The same multiplier applies to every edge; the base graph is never written to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostModel {
    pub flood_multiplier: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel { flood_multiplier: DEFAULT_FLOOD_MULTIPLIER }
    }
}

impl CostModel {
    pub fn new(flood_multiplier: f64) -> Self {
        CostModel { flood_multiplier }
    }

    pub fn multiplier(&self, label: FloodLabel) -> f64 {
        match label {
            FloodLabel::Clear => 1.0,
            FloodLabel::Flooded => self.flood_multiplier,
        }
    }

    pub fn weight_fn(&self, label: FloodLabel) -> impl Fn(&SegmentInfo) -> f64 {
        let multiplier = self.multiplier(label);
        move |segment: &SegmentInfo| segment.length_m * multiplier
    }
}
