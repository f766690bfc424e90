//! Feature extraction: reduces a facial landmark set to scalar tracking signals.
//!
//! Each feature is the unweighted centroid of one or two configured landmark
//! index groups. A [`Signal`] selects one axis of one feature, e.g. the
//! vertical position of the iris center.

use crate::config::FeatureConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Normalized 2D landmark position, both axes in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (0 = left edge)
    pub x: f64,
    /// Vertical position (0 = top edge)
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One frame's landmarks, keyed by model landmark index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    points: HashMap<u32, Point>,
}

impl LandmarkSet {
    /// Create an empty landmark set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a dense list where the position in the list is the index
    #[must_use]
    pub fn from_dense(points: Vec<Point>) -> Self {
        let points = points
            .into_iter()
            .enumerate()
            .filter_map(|(i, p)| u32::try_from(i).ok().map(|i| (i, p)))
            .collect();
        Self { points }
    }

    /// Insert or replace one landmark
    pub fn insert(&mut self, index: u32, point: Point) {
        self.points.insert(index, point);
    }

    /// Look up one landmark
    #[must_use]
    pub fn get(&self, index: u32) -> Option<Point> {
        self.points.get(&index).copied()
    }

    /// Number of landmarks in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set holds no landmarks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Unweighted centroid of an index group, `None` if any index is missing
    #[must_use]
    pub fn centroid(&self, indices: &[u32]) -> Option<Point> {
        if indices.is_empty() {
            return None;
        }
        let (mut sum_x, mut sum_y) = (0.0, 0.0);
        for &index in indices {
            let p = self.get(index)?;
            sum_x += p.x;
            sum_y += p.y;
        }
        let n = indices.len() as f64;
        Some(Point::new(sum_x / n, sum_y / n))
    }
}

impl FromIterator<(u32, Point)> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = (u32, Point)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Facial features the extractor can compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Midpoint of the left and right eye-contour centroids
    EyeCenter,
    /// Midpoint of the left and right iris centroids
    IrisCenter,
    /// Nose tip landmark
    NoseTip,
}

/// Coordinate axis of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

/// A scalar tracking signal: one axis of one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Signal {
    pub feature: Feature,
    pub axis: Axis,
}

impl Signal {
    pub const EYE_CENTER_Y: Self = Self::new(Feature::EyeCenter, Axis::Y);
    pub const IRIS_CENTER_Y: Self = Self::new(Feature::IrisCenter, Axis::Y);
    pub const NOSE_TIP_X: Self = Self::new(Feature::NoseTip, Axis::X);
    pub const NOSE_TIP_Y: Self = Self::new(Feature::NoseTip, Axis::Y);

    #[must_use]
    pub const fn new(feature: Feature, axis: Axis) -> Self {
        Self { feature, axis }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let feature = match self.feature {
            Feature::EyeCenter => "eye_center",
            Feature::IrisCenter => "iris_center",
            Feature::NoseTip => "nose_tip",
        };
        let axis = match self.axis {
            Axis::X => "x",
            Axis::Y => "y",
        };
        write!(f, "{feature}.{axis}")
    }
}

/// Features extracted from one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    pub eye_center: Point,
    pub iris_center: Point,
    pub nose_tip: Point,
}

impl Features {
    /// Read one signal value
    #[must_use]
    pub fn signal(&self, signal: Signal) -> f64 {
        let point = match signal.feature {
            Feature::EyeCenter => self.eye_center,
            Feature::IrisCenter => self.iris_center,
            Feature::NoseTip => self.nose_tip,
        };
        match signal.axis {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }
}

/// Computes [`Features`] from landmark sets using configured index groups
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    groups: FeatureConfig,
}

impl FeatureExtractor {
    /// Create an extractor for the given index groups
    #[must_use]
    pub fn new(groups: FeatureConfig) -> Self {
        Self { groups }
    }

    /// Extract all features, or `None` when there is no face or a required
    /// landmark is missing or not finite
    #[must_use]
    pub fn extract(&self, landmarks: Option<&LandmarkSet>) -> Option<Features> {
        let landmarks = landmarks?;
        let g = &self.groups;

        let eye_center = landmarks
            .centroid(&g.left_eye)?
            .midpoint(landmarks.centroid(&g.right_eye)?);
        let iris_center = landmarks
            .centroid(&g.left_iris)?
            .midpoint(landmarks.centroid(&g.right_iris)?);
        let nose_tip = landmarks.centroid(&g.nose_tip)?;

        if ![eye_center, iris_center, nose_tip].iter().all(|p| p.is_finite()) {
            return None;
        }

        Some(Features {
            eye_center,
            iris_center,
            nose_tip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_groups() -> FeatureConfig {
        FeatureConfig {
            left_eye: vec![0, 1],
            right_eye: vec![2, 3],
            left_iris: vec![4],
            right_iris: vec![5],
            nose_tip: vec![6],
        }
    }

    #[test]
    fn test_centroid() {
        let set = LandmarkSet::from_dense(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.5)]);
        let c = set.centroid(&[0, 1]).unwrap();
        assert_eq!(c, Point::new(0.5, 0.25));
        assert!(set.centroid(&[0, 9]).is_none());
        assert!(set.centroid(&[]).is_none());
    }

    #[test]
    fn test_extract_features() {
        let set = LandmarkSet::from_dense(vec![
            Point::new(0.2, 0.4),
            Point::new(0.4, 0.4),
            Point::new(0.6, 0.6),
            Point::new(0.8, 0.6),
            Point::new(0.3, 0.45),
            Point::new(0.7, 0.55),
            Point::new(0.5, 0.7),
        ]);
        let features = FeatureExtractor::new(small_groups()).extract(Some(&set)).unwrap();

        assert!((features.eye_center.x - 0.5).abs() < 1e-12);
        assert!((features.eye_center.y - 0.5).abs() < 1e-12);
        assert!((features.signal(Signal::IRIS_CENTER_Y) - 0.5).abs() < 1e-12);
        assert_eq!(features.signal(Signal::NOSE_TIP_X), 0.5);
    }

    #[test]
    fn test_missing_landmarks_is_no_signal() {
        let extractor = FeatureExtractor::new(small_groups());
        assert!(extractor.extract(None).is_none());

        let partial = LandmarkSet::from_dense(vec![Point::new(0.1, 0.1); 5]);
        assert!(extractor.extract(Some(&partial)).is_none());
    }

    #[test]
    fn test_non_finite_landmark_is_no_signal() {
        let extractor = FeatureExtractor::new(small_groups());
        let mut points = vec![Point::new(0.5, 0.5); 7];
        points[6] = Point::new(f64::INFINITY, 0.5);
        assert!(extractor.extract(Some(&LandmarkSet::from_dense(points))).is_none());
    }

    #[test]
    fn test_signal_display() {
        assert_eq!(Signal::IRIS_CENTER_Y.to_string(), "iris_center.y");
        assert_eq!(Signal::NOSE_TIP_X.to_string(), "nose_tip.x");
    }
}
