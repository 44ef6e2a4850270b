use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use super::angle::{JointTriple, Space};
use super::exercise::{ExerciseKind, ExerciseProfile, BACK_ANGLE_NAME};
use super::scorer::{self, Correction, Deductions, FrameAngles, RepCompleted};
use crate::config::{check_angle, AnalysisConfig};
use crate::error::ConfigError;
use crate::feedback::{self, FeedbackCode, FeedbackEvent, PERFECT_FORM_SCORE};
use crate::pose::LandmarkSet;
use crate::session::ExerciseSession;

/// 1フレーム分の採点結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormAssessment {
    /// 測れた関節角のみ。関節名 → 度
    pub angles: BTreeMap<&'static str, f32>,
    pub primary_angle: Option<f32>,
    pub secondary_angle: Option<f32>,
    pub score: f32,
    /// チェック順。先頭が表示用
    pub corrections: Vec<Correction>,
}

impl FormAssessment {
    pub fn display_correction(&self) -> Option<Correction> {
        self.corrections.first().copied()
    }
}

/// 未対応種目のプレースホルダ
///
/// スコアは持たず、情報コードは常に `AnalysisUnavailable`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotImplementedAssessment {
    pub exercise: ExerciseKind,
    #[serde(flatten)]
    pub code: FeedbackCode,
}

impl NotImplementedAssessment {
    pub fn new(exercise: ExerciseKind) -> Self {
        Self {
            exercise,
            code: FeedbackCode::AnalysisUnavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Assessment {
    Scored(FormAssessment),
    NotImplemented(NotImplementedAssessment),
}

impl Assessment {
    /// 未対応種目では None
    pub fn score(&self) -> Option<f32> {
        match self {
            Assessment::Scored(a) => Some(a.score),
            Assessment::NotImplemented(_) => None,
        }
    }

    pub fn as_scored(&self) -> Option<&FormAssessment> {
        match self {
            Assessment::Scored(a) => Some(a),
            Assessment::NotImplemented(_) => None,
        }
    }
}

/// `FormEngine::analyze` の出力
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub assessment: Assessment,
    pub rep_completed: Option<RepCompleted>,
    /// レップ完了時はレップのフィードバック、それ以外は間引かれた修正指示
    pub feedback: Option<FeedbackEvent>,
}

/// フォーム解析エンジン
///
/// 構築後は不変。セッションごとの可変状態は `ExerciseSession` 側に持つ。
#[derive(Debug, Clone)]
pub struct FormEngine {
    kind: ExerciseKind,
    profile: Option<ExerciseProfile>,
    visibility_threshold: f32,
    space: Space,
    back_check: bool,
    cooldown: Duration,
    deductions: Deductions,
}

impl FormEngine {
    /// 設定を検証して作成
    pub fn new(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let kind = config.exercise_kind()?;

        let profile = match kind.profile() {
            Some(mut profile) => {
                if let Some(deep) = config.deep_threshold {
                    profile.deep_threshold = deep;
                }
                if let Some(recovered) = config.recovered_threshold {
                    profile.recovered_threshold = recovered;
                }
                Self::check_profile(&profile)?;
                Some(profile)
            }
            None => {
                tracing::warn!(exercise = %kind, "form analysis not implemented for exercise");
                None
            }
        };

        Ok(Self {
            kind,
            profile,
            visibility_threshold: config.visibility_threshold,
            space: config.space,
            back_check: config.back_check,
            cooldown: config.feedback_cooldown(),
            deductions: config.deductions,
        })
    }

    /// 独自プロファイルで作成 (設定の種目・閾値は無視)
    pub fn with_profile(profile: ExerciseProfile, config: &AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::check_profile(&profile)?;
        Ok(Self {
            kind: profile.kind,
            profile: Some(profile),
            visibility_threshold: config.visibility_threshold,
            space: config.space,
            back_check: config.back_check,
            cooldown: config.feedback_cooldown(),
            deductions: config.deductions,
        })
    }

    fn check_profile(profile: &ExerciseProfile) -> Result<(), ConfigError> {
        check_angle("deep_threshold", profile.deep_threshold)?;
        check_angle("recovered_threshold", profile.recovered_threshold)?;
        if profile.deep_threshold >= profile.recovered_threshold {
            return Err(ConfigError::ThresholdOrder {
                deep: profile.deep_threshold,
                recovered: profile.recovered_threshold,
            });
        }
        Ok(())
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn profile(&self) -> Option<&ExerciseProfile> {
        self.profile.as_ref()
    }

    /// この設定用の新しいセッション
    pub fn start_session(&self) -> ExerciseSession {
        ExerciseSession::new(self.kind)
    }

    fn measure(&self, joint: &JointTriple, landmarks: &LandmarkSet) -> Option<f32> {
        joint.measure(landmarks, self.visibility_threshold, self.space)
    }

    fn frame_angles(&self, profile: &ExerciseProfile, landmarks: &LandmarkSet) -> FrameAngles {
        let left = self.measure(&profile.left, landmarks);
        let right = self.measure(&profile.right, landmarks);
        let primary = match (left, right) {
            (Some(l), Some(r)) => Some(profile.combine.apply(l, r)),
            _ => None,
        };
        let secondary = profile
            .posture
            .as_ref()
            .and_then(|rule| self.measure(&rule.joint, landmarks));
        let back = if self.back_check {
            profile.back.as_ref().and_then(|joint| self.measure(joint, landmarks))
        } else {
            None
        };
        FrameAngles { left, right, primary, secondary, back }
    }

    /// 1フレームを解析してセッションを更新する
    ///
    /// `at` はセッション開始からの時刻。欠損ランドマークはエラーにせず、
    /// その角度に依存するチェックを飛ばす。
    pub fn analyze(&self, session: &mut ExerciseSession, landmarks: &LandmarkSet, at: Duration) -> FrameReport {
        session.observe_frame(at);

        let Some(profile) = self.profile.as_ref() else {
            let feedback = self.throttled(session, at, || Some(FeedbackEvent::analysis_unavailable(at)));
            return FrameReport {
                assessment: Assessment::NotImplemented(NotImplementedAssessment::new(self.kind)),
                rep_completed: None,
                feedback,
            };
        };

        let angles = self.frame_angles(profile, landmarks);
        let scored = scorer::score_frame(profile, &angles, &self.deductions);
        tracing::trace!(
            primary = ?angles.primary,
            secondary = ?angles.secondary,
            score = scored.score,
            "frame scored"
        );

        // 主角度・副角度のどちらかが不明なフレームではレップ状態を動かさない
        let secondary_known = profile.posture.is_none() || angles.secondary.is_some();
        let rep_completed = angles.primary.filter(|_| secondary_known).and_then(|primary| {
            scorer::advance_phase(
                session,
                primary,
                profile.deep_threshold,
                profile.recovered_threshold,
                scored.score,
            )
        });

        let feedback = match rep_completed {
            // レップ完了フレームはレップのフィードバックのみ。間引き対象外
            Some(done) => Some(FeedbackEvent::rep(done.score, at)),
            None => self.throttled(session, at, || match scored.corrections.first() {
                Some(&first) => Some(FeedbackEvent::correction(first, profile.cues.text(first), at)),
                None if angles.primary.is_some() && scored.score > PERFECT_FORM_SCORE => {
                    Some(FeedbackEvent::perfect_form(at))
                }
                None => None,
            }),
        };

        let mut named = BTreeMap::new();
        for (name, value) in [
            (profile.names.left, angles.left),
            (profile.names.right, angles.right),
            (profile.names.primary, angles.primary),
            (profile.names.secondary, angles.secondary),
            (BACK_ANGLE_NAME, angles.back),
        ] {
            if let Some(v) = value {
                named.insert(name, v);
            }
        }

        FrameReport {
            assessment: Assessment::Scored(FormAssessment {
                angles: named,
                primary_angle: angles.primary,
                secondary_angle: angles.secondary,
                score: scored.score,
                corrections: scored.corrections,
            }),
            rep_completed,
            feedback,
        }
    }

    fn throttled<F>(&self, session: &mut ExerciseSession, at: Duration, make: F) -> Option<FeedbackEvent>
    where
        F: FnOnce() -> Option<FeedbackEvent>,
    {
        if !feedback::cooldown_elapsed(session.last_feedback, at, self.cooldown) {
            return None;
        }
        let event = make()?;
        session.last_feedback = Some(at);
        Some(event)
    }
}
