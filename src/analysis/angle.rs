use serde::{Deserialize, Serialize};

use crate::pose::{LandmarkIndex, LandmarkSet, Point};

/// これより短い辺は長さ0とみなす (正規化座標)
const MIN_SEGMENT: f32 = 1e-6;

/// 仮想点のオフセット量 (フレーム高さに対する比)
pub const VIRTUAL_OFFSET: f32 = 0.1;

/// 角度計算に使う座標空間
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    /// x, y のみ
    #[default]
    Planar,
    /// x, y, z
    Depth,
}

fn distance(a: Point, b: Point, space: Space) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = match space {
        Space::Planar => 0.0,
        Space::Depth => a.z - b.z,
    };
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// 頂点 b における a-b-c の内角 (度, 0〜180)
///
/// 余弦定理で計算する。a か c が b と重なる場合は角度が定義できないので None。
pub fn angle_between(a: Point, b: Point, c: Point, space: Space) -> Option<f32> {
    let ab = distance(a, b, space);
    let bc = distance(b, c, space);
    let ac = distance(a, c, space);

    if !(ab > MIN_SEGMENT && bc > MIN_SEGMENT) || !ac.is_finite() {
        return None;
    }

    let cos = ((ab * ab + bc * bc - ac * ac) / (2.0 * ab * bc)).clamp(-1.0, 1.0);
    let degrees = cos.acos().to_degrees();
    degrees.is_finite().then_some(degrees)
}

/// 角度の端点。ランドマークそのものか、ランドマークから上下にずらした仮想点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    At(LandmarkIndex),
    /// ランドマークの真上 (鉛直基準)
    Above(LandmarkIndex),
    /// ランドマークの真下 (鉛直基準)
    Below(LandmarkIndex),
}

impl Anchor {
    pub fn landmark(self) -> LandmarkIndex {
        match self {
            Anchor::At(i) | Anchor::Above(i) | Anchor::Below(i) => i,
        }
    }

    fn resolve(self, landmarks: &LandmarkSet, threshold: f32) -> Option<Point> {
        let point = landmarks.known(self.landmark(), threshold)?.point();
        Some(match self {
            Anchor::At(_) => point,
            Anchor::Above(_) => point.offset_y(-VIRTUAL_OFFSET),
            Anchor::Below(_) => point.offset_y(VIRTUAL_OFFSET),
        })
    }
}

/// 3点で定義される関節角
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointTriple {
    /// 近位
    pub proximal: Anchor,
    /// 頂点
    pub vertex: Anchor,
    /// 遠位
    pub distal: Anchor,
}

impl JointTriple {
    pub const fn new(proximal: LandmarkIndex, vertex: LandmarkIndex, distal: LandmarkIndex) -> Self {
        Self {
            proximal: Anchor::At(proximal),
            vertex: Anchor::At(vertex),
            distal: Anchor::At(distal),
        }
    }

    pub const fn with_anchors(proximal: Anchor, vertex: Anchor, distal: Anchor) -> Self {
        Self { proximal, vertex, distal }
    }

    /// いずれかの点が不明なら None
    pub fn measure(&self, landmarks: &LandmarkSet, threshold: f32, space: Space) -> Option<f32> {
        let a = self.proximal.resolve(landmarks, threshold)?;
        let b = self.vertex.resolve(landmarks, threshold)?;
        let c = self.distal.resolve(landmarks, threshold)?;
        angle_between(a, b, c, space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Landmark;
    use approx::assert_abs_diff_eq;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y, 0.0)
    }

    // atan2(|cross|, dot) による別解。余弦定理版と一致するか確認用
    fn vector_angle(a: Point, b: Point, c: Point) -> f32 {
        let (ux, uy) = (a.x - b.x, a.y - b.y);
        let (vx, vy) = (c.x - b.x, c.y - b.y);
        let cross = ux * vy - uy * vx;
        let dot = ux * vx + uy * vy;
        cross.abs().atan2(dot).to_degrees()
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_between(p(0.0, 0.0), p(0.5, 0.0), p(0.5, 0.5), Space::Planar).unwrap();
        assert_abs_diff_eq!(angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_straight_line_is_180() {
        let angle = angle_between(p(0.5, 0.2), p(0.5, 0.5), p(0.5, 0.8), Space::Planar).unwrap();
        assert_abs_diff_eq!(angle, 180.0, epsilon = 0.05);
    }

    #[test]
    fn test_folded_back_is_zero() {
        let angle = angle_between(p(0.5, 0.2), p(0.5, 0.5), p(0.5, 0.3), Space::Planar).unwrap();
        assert_abs_diff_eq!(angle, 0.0, epsilon = 0.05);
    }

    #[test]
    fn test_coincident_points_undefined() {
        let b = p(0.4, 0.4);
        assert!(angle_between(b, b, p(0.1, 0.9), Space::Planar).is_none());
        assert!(angle_between(p(0.1, 0.9), b, b, Space::Planar).is_none());
        assert!(angle_between(b, b, b, Space::Planar).is_none());
    }

    #[test]
    fn test_endpoints_coincident_is_zero() {
        let angle = angle_between(p(0.2, 0.2), p(0.6, 0.6), p(0.2, 0.2), Space::Planar).unwrap();
        assert_abs_diff_eq!(angle, 0.0, epsilon = 0.05);
    }

    #[test]
    fn test_bounds_over_grid() {
        let coords = [0.0, 0.13, 0.5, 0.77, 1.0];
        for &ax in &coords {
            for &ay in &coords {
                for &cx in &coords {
                    for &cy in &coords {
                        let a = p(ax, ay);
                        let c = p(cx, cy);
                        if let Some(angle) = angle_between(a, p(0.5, 0.5), c, Space::Planar) {
                            assert!(!angle.is_nan());
                            assert!((0.0..=180.0).contains(&angle), "angle={}", angle);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_matches_vector_formulation() {
        let triples = [
            (p(0.1, 0.2), p(0.4, 0.6), p(0.9, 0.3)),
            (p(0.5, 0.1), p(0.5, 0.5), p(0.8, 0.9)),
            (p(0.3, 0.3), p(0.6, 0.35), p(0.31, 0.36)),
        ];
        for (a, b, c) in triples {
            let cosine = angle_between(a, b, c, Space::Planar).unwrap();
            assert_abs_diff_eq!(cosine, vector_angle(a, b, c), epsilon = 0.5);
        }
    }

    #[test]
    fn test_depth_space_uses_z() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(0.5, 0.0, 0.0);
        let c = Point::new(0.5, 0.0, 0.5);
        // 平面では c が b に重なる
        assert!(angle_between(a, b, c, Space::Planar).is_none());
        let angle = angle_between(a, b, c, Space::Depth).unwrap();
        assert_abs_diff_eq!(angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_triple_unknown_landmark() {
        let mut set = LandmarkSet::default();
        set.set(LandmarkIndex::LeftHip, Landmark::new(0.5, 0.4, 0.9));
        set.set(LandmarkIndex::LeftKnee, Landmark::new(0.5, 0.6, 0.1));
        set.set(LandmarkIndex::LeftAnkle, Landmark::new(0.5, 0.8, 0.9));
        let knee = JointTriple::new(LandmarkIndex::LeftHip, LandmarkIndex::LeftKnee, LandmarkIndex::LeftAnkle);
        assert!(knee.measure(&set, 0.5, Space::Planar).is_none());
        assert!(knee.measure(&set, 0.05, Space::Planar).is_some());
    }

    #[test]
    fn test_virtual_anchor_vertical_reference() {
        let mut set = LandmarkSet::default();
        set.set(LandmarkIndex::LeftShoulder, Landmark::new(0.5, 0.3, 0.9));
        set.set(LandmarkIndex::LeftHip, Landmark::new(0.5, 0.6, 0.9));
        let torso = JointTriple::with_anchors(
            Anchor::At(LandmarkIndex::LeftShoulder),
            Anchor::At(LandmarkIndex::LeftHip),
            Anchor::Below(LandmarkIndex::LeftHip),
        );
        let angle = torso.measure(&set, 0.5, Space::Planar).unwrap();
        assert_abs_diff_eq!(angle, 180.0, epsilon = 0.05);
    }
}
