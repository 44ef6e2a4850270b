use serde::{Deserialize, Serialize};

use super::exercise::ExerciseProfile;
use crate::session::ExerciseSession;

/// 満点
pub const MAX_SCORE: f32 = 100.0;

/// 背中スコアがこれ未満なら減点
pub const BACK_SCORE_MIN: f32 = 70.0;

/// 修正指示コード。列挙順がチェック順 (表示優先度)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Correction {
    TooShallow,
    Shallow,
    TooDeep,
    Uneven,
    BackNotStraight,
    Posture,
}

/// ルールごとの減点量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deductions {
    pub too_shallow: f32,
    pub shallow: f32,
    pub too_deep: f32,
    pub uneven: f32,
    pub back: f32,
    pub posture: f32,
}

impl Default for Deductions {
    fn default() -> Self {
        Self {
            too_shallow: 40.0,
            shallow: 20.0,
            too_deep: 30.0,
            uneven: 25.0,
            back: 15.0,
            posture: 10.0,
        }
    }
}

impl Deductions {
    pub fn amount(&self, correction: Correction) -> f32 {
        match correction {
            Correction::TooShallow => self.too_shallow,
            Correction::Shallow => self.shallow,
            Correction::TooDeep => self.too_deep,
            Correction::Uneven => self.uneven,
            Correction::BackNotStraight => self.back,
            Correction::Posture => self.posture,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> {
        [
            ("too_shallow", self.too_shallow),
            ("shallow", self.shallow),
            ("too_deep", self.too_deep),
            ("uneven", self.uneven),
            ("back", self.back),
            ("posture", self.posture),
        ]
        .into_iter()
    }
}

/// 1フレームで測れた角度。None は不明
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameAngles {
    pub left: Option<f32>,
    pub right: Option<f32>,
    pub primary: Option<f32>,
    pub secondary: Option<f32>,
    /// 体幹と鉛直のなす角 (直立で180°)
    pub back: Option<f32>,
}

/// 体幹角からの背中スコア (0〜100)
pub fn back_score(angle: f32) -> f32 {
    (MAX_SCORE - (angle - 180.0).abs() * 2.0).max(0.0)
}

/// 採点結果
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub score: f32,
    /// チェック順に並んだ違反
    pub corrections: Vec<Correction>,
}

/// ルール表を上から順に評価して採点する
///
/// 減点はすべて独立に適用され、表示用には先頭の違反を使う。
/// 不明な角度に依存するチェックはスキップ (減点なし)。
pub fn score_frame(profile: &ExerciseProfile, angles: &FrameAngles, deductions: &Deductions) -> Scored {
    let mut corrections = Vec::new();

    if let Some(primary) = angles.primary {
        let depth = &profile.depth;
        if primary > depth.too_shallow_above {
            corrections.push(Correction::TooShallow);
        } else if primary > depth.shallow_above {
            corrections.push(Correction::Shallow);
        } else if primary < depth.too_deep_below {
            corrections.push(Correction::TooDeep);
        }
    }

    if let (Some(tolerance), Some(left), Some(right)) =
        (profile.symmetry_tolerance, angles.left, angles.right)
    {
        if (left - right).abs() > tolerance {
            corrections.push(Correction::Uneven);
        }
    }

    if let Some(back) = angles.back {
        if back_score(back) < BACK_SCORE_MIN {
            corrections.push(Correction::BackNotStraight);
        }
    }

    if let (Some(rule), Some(secondary)) = (profile.posture.as_ref(), angles.secondary) {
        if rule.violated(secondary) {
            corrections.push(Correction::Posture);
        }
    }

    let total: f32 = corrections.iter().map(|c| deductions.amount(*c)).sum();
    let score = (MAX_SCORE - total).clamp(0.0, MAX_SCORE);

    Scored { score, corrections }
}

/// レップ完了情報
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepCompleted {
    /// 完了後の累計レップ数
    pub rep: u32,
    pub score: f32,
}

/// 伸展/収縮の2相遷移
///
/// deep 未満で収縮、収縮中に recovered 超えで伸展に戻りレップ完了。
/// 2つの閾値の間 (ヒステリシス帯) では状態は変わらない。
pub fn advance_phase(
    session: &mut ExerciseSession,
    primary: f32,
    deep_threshold: f32,
    recovered_threshold: f32,
    score: f32,
) -> Option<RepCompleted> {
    if !session.contracted && primary < deep_threshold {
        session.contracted = true;
        tracing::trace!(primary, "entered contracted position");
        None
    } else if session.contracted && primary > recovered_threshold {
        session.contracted = false;
        let rep = session.record_rep(score);
        tracing::debug!(rep, score, "rep completed");
        Some(RepCompleted { rep, score })
    } else {
        None
    }
}
