//! 種目ごとの解析プロファイル
//!
//! どの関節を主角度・副角度に使うか、閾値、減点バンド、表示文言を種目ごとに定義する。
//! スコアラー本体は種目に依存しない。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::angle::{Anchor, JointTriple};
use super::scorer::Correction;
use crate::pose::LandmarkIndex::*;

/// 種目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    Squat,
    Lunge,
    ArmRaise,
    ShoulderPress,
    BicepCurl,
    LegRaise,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 6] = [
        ExerciseKind::Squat,
        ExerciseKind::Lunge,
        ExerciseKind::ArmRaise,
        ExerciseKind::ShoulderPress,
        ExerciseKind::BicepCurl,
        ExerciseKind::LegRaise,
    ];

    /// 設定ファイルで使う識別子
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::Lunge => "lunge",
            ExerciseKind::ArmRaise => "arm-raise",
            ExerciseKind::ShoulderPress => "shoulder-press",
            ExerciseKind::BicepCurl => "bicep-curl",
            ExerciseKind::LegRaise => "leg-raise",
        }
    }

    /// 表示名
    pub fn display_name(self) -> &'static str {
        match self {
            ExerciseKind::Squat => "Squats",
            ExerciseKind::Lunge => "Lunges",
            ExerciseKind::ArmRaise => "Arm Raises",
            ExerciseKind::ShoulderPress => "Shoulder Press",
            ExerciseKind::BicepCurl => "Bicep Curls",
            ExerciseKind::LegRaise => "Leg Raises",
        }
    }

    /// 解析が未実装の種目は None
    pub fn profile(self) -> Option<ExerciseProfile> {
        match self {
            ExerciseKind::Squat => Some(ExerciseProfile::squat()),
            ExerciseKind::Lunge => Some(ExerciseProfile::lunge()),
            ExerciseKind::ArmRaise => Some(ExerciseProfile::arm_raise()),
            ExerciseKind::ShoulderPress => Some(ExerciseProfile::shoulder_press()),
            ExerciseKind::BicepCurl | ExerciseKind::LegRaise => None,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    /// "squats" や "bicep_curls" のような旧表記も受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        ExerciseKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized || k.as_str() == singular)
            .ok_or_else(|| s.to_string())
    }
}

/// 左右の角度から主角度を作る方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    Average,
    /// 小さい方 (ランジの前脚など)
    Minimum,
}

impl Combine {
    pub fn apply(self, left: f32, right: f32) -> f32 {
        match self {
            Combine::Average => (left + right) / 2.0,
            Combine::Minimum => left.min(right),
        }
    }
}

/// 深さ判定のバンド境界 (度)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBands {
    /// これより大きいと「浅すぎ」
    pub too_shallow_above: f32,
    /// これより大きいと「浅い」
    pub shallow_above: f32,
    /// これより小さいと「深すぎ」
    pub too_deep_below: f32,
}

/// 副角度の許容方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// 上限を超えたら違反
    Max,
    /// 下限を下回ったら違反
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureRule {
    pub joint: JointTriple,
    pub limit: Limit,
    pub degrees: f32,
}

impl PostureRule {
    pub fn violated(&self, angle: f32) -> bool {
        match self.limit {
            Limit::Max => angle > self.degrees,
            Limit::Min => angle < self.degrees,
        }
    }
}

/// 画面表示・音声用の文言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cues {
    pub too_shallow: &'static str,
    pub shallow: &'static str,
    pub too_deep: &'static str,
    pub uneven: &'static str,
    pub back: &'static str,
    pub posture: &'static str,
}

impl Cues {
    pub fn text(&self, correction: Correction) -> &'static str {
        match correction {
            Correction::TooShallow => self.too_shallow,
            Correction::Shallow => self.shallow,
            Correction::TooDeep => self.too_deep,
            Correction::Uneven => self.uneven,
            Correction::BackNotStraight => self.back,
            Correction::Posture => self.posture,
        }
    }
}

/// レポートに載せる関節角の名前
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleNames {
    pub left: &'static str,
    pub right: &'static str,
    /// 左右を合成した主角度
    pub primary: &'static str,
    pub secondary: &'static str,
}

/// 背中の鉛直角の名前 (全種目共通)
pub const BACK_ANGLE_NAME: &str = "back";

/// 種目の解析設定
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseProfile {
    pub kind: ExerciseKind,
    pub names: AngleNames,
    pub left: JointTriple,
    pub right: JointTriple,
    pub combine: Combine,
    /// 収縮姿勢に入る閾値
    pub deep_threshold: f32,
    /// 伸展姿勢に戻る閾値 (レップ完了)
    pub recovered_threshold: f32,
    pub depth: DepthBands,
    /// 左右差の許容量。None なら左右差チェックなし
    pub symmetry_tolerance: Option<f32>,
    /// 背中の鉛直判定に使う関節 (vertex が股関節、distal が真下の仮想点)
    pub back: Option<JointTriple>,
    pub posture: Option<PostureRule>,
    pub cues: Cues,
}

impl ExerciseProfile {
    pub fn squat() -> Self {
        Self {
            kind: ExerciseKind::Squat,
            names: AngleNames {
                left: "left_knee",
                right: "right_knee",
                primary: "knee",
                secondary: "hip",
            },
            left: JointTriple::new(LeftHip, LeftKnee, LeftAnkle),
            right: JointTriple::new(RightHip, RightKnee, RightAnkle),
            combine: Combine::Average,
            deep_threshold: 120.0,
            recovered_threshold: 150.0,
            depth: DepthBands {
                too_shallow_above: 160.0,
                shallow_above: 140.0,
                too_deep_below: 80.0,
            },
            symmetry_tolerance: Some(15.0),
            back: Some(torso_vertical()),
            posture: Some(PostureRule {
                joint: JointTriple::new(LeftShoulder, LeftHip, LeftKnee),
                limit: Limit::Max,
                degrees: 170.0,
            }),
            cues: Cues {
                too_shallow: "BEND YOUR KNEES",
                shallow: "GO DEEPER",
                too_deep: "TOO DEEP - RAISE UP",
                uneven: "KEEP KNEES EVEN",
                back: "STRAIGHTEN BACK",
                posture: "LEAN FORWARD SLIGHTLY",
            },
        }
    }

    pub fn lunge() -> Self {
        Self {
            kind: ExerciseKind::Lunge,
            names: AngleNames {
                left: "left_knee",
                right: "right_knee",
                primary: "front_knee",
                secondary: "torso",
            },
            left: JointTriple::new(LeftHip, LeftKnee, LeftAnkle),
            right: JointTriple::new(RightHip, RightKnee, RightAnkle),
            combine: Combine::Minimum,
            deep_threshold: 110.0,
            recovered_threshold: 150.0,
            depth: DepthBands {
                too_shallow_above: 160.0,
                shallow_above: 140.0,
                too_deep_below: 70.0,
            },
            // 前後の脚で角度が違うのが正常
            symmetry_tolerance: None,
            back: Some(torso_vertical()),
            posture: Some(PostureRule {
                joint: torso_vertical(),
                limit: Limit::Min,
                degrees: 160.0,
            }),
            cues: Cues {
                too_shallow: "STEP AND BEND YOUR FRONT KNEE",
                shallow: "LOWER YOUR HIPS",
                too_deep: "TOO DEEP - KNEE OFF THE FLOOR",
                uneven: "KEEP LEGS EVEN",
                back: "STRAIGHTEN BACK",
                posture: "KEEP TORSO UPRIGHT",
            },
        }
    }

    /// 主角度は肩を頂点とした「肘」と「肩の真上」のなす角。
    /// 腕を下ろすと約180°、頭上に上げると0°に近づく。
    pub fn arm_raise() -> Self {
        Self {
            kind: ExerciseKind::ArmRaise,
            names: AngleNames {
                left: "left_shoulder",
                right: "right_shoulder",
                primary: "shoulder",
                secondary: "elbow",
            },
            left: JointTriple::with_anchors(
                Anchor::At(LeftElbow),
                Anchor::At(LeftShoulder),
                Anchor::Above(LeftShoulder),
            ),
            right: JointTriple::with_anchors(
                Anchor::At(RightElbow),
                Anchor::At(RightShoulder),
                Anchor::Above(RightShoulder),
            ),
            combine: Combine::Average,
            deep_threshold: 100.0,
            recovered_threshold: 150.0,
            depth: DepthBands {
                too_shallow_above: 160.0,
                shallow_above: 140.0,
                too_deep_below: 30.0,
            },
            symmetry_tolerance: Some(15.0),
            back: None,
            posture: Some(PostureRule {
                joint: JointTriple::new(LeftShoulder, LeftElbow, LeftWrist),
                limit: Limit::Min,
                degrees: 150.0,
            }),
            cues: Cues {
                too_shallow: "RAISE YOUR ARMS",
                shallow: "RAISE HIGHER",
                too_deep: "TOO HIGH - LOWER SLIGHTLY",
                uneven: "KEEP ARMS LEVEL",
                back: "STRAIGHTEN BACK",
                posture: "KEEP ARMS STRAIGHT",
            },
        }
    }

    pub fn shoulder_press() -> Self {
        Self {
            kind: ExerciseKind::ShoulderPress,
            names: AngleNames {
                left: "left_elbow",
                right: "right_elbow",
                primary: "elbow",
                secondary: "torso",
            },
            left: JointTriple::new(LeftShoulder, LeftElbow, LeftWrist),
            right: JointTriple::new(RightShoulder, RightElbow, RightWrist),
            combine: Combine::Average,
            deep_threshold: 100.0,
            recovered_threshold: 150.0,
            depth: DepthBands {
                too_shallow_above: 160.0,
                shallow_above: 140.0,
                too_deep_below: 60.0,
            },
            symmetry_tolerance: Some(15.0),
            back: Some(torso_vertical()),
            posture: Some(PostureRule {
                joint: torso_vertical(),
                limit: Limit::Min,
                degrees: 160.0,
            }),
            cues: Cues {
                too_shallow: "LOWER TO SHOULDER HEIGHT",
                shallow: "LOWER A LITTLE MORE",
                too_deep: "TOO LOW - PRESS UP",
                uneven: "PRESS BOTH ARMS EVENLY",
                back: "STRAIGHTEN BACK",
                posture: "DON'T ARCH YOUR BACK",
            },
        }
    }
}

/// 左肩-左股関節-股関節の真下。直立で180°
fn torso_vertical() -> JointTriple {
    JointTriple::with_anchors(
        Anchor::At(LeftShoulder),
        Anchor::At(LeftHip),
        Anchor::Below(LeftHip),
    )
}
