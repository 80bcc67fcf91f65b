//! Trackpoints and merged track sets.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// One recorded position, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Trackpoints gathered from one or more activity files.
///
/// Duplicate points are kept: repeated visits increase density.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSet {
    pub points: Vec<TrackPoint>,
    /// Number of activity files the source matched.
    pub activity_count: usize,
}

impl TrackSet {
    pub fn new(points: Vec<TrackPoint>, activity_count: usize) -> Self {
        Self {
            points,
            activity_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Append another set, summing the activity counts.
    pub fn merge(&mut self, other: TrackSet) {
        self.points.extend(other.points);
        self.activity_count += other.activity_count;
    }

    /// Keep only points for which `keep` returns true.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&TrackPoint) -> bool,
    {
        self.points.retain(keep);
    }

    /// Bounding box of all points.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(self.points.iter().map(|p| (p.lat, p.lon)))
    }

    /// Arithmetic mean latitude.
    pub fn mean_latitude(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().map(|p| p.lat).sum::<f64>() / self.points.len() as f64)
    }
}

impl FromIterator<TrackPoint> for TrackSet {
    fn from_iter<I: IntoIterator<Item = TrackPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
            activity_count: 1,
        }
    }
}
