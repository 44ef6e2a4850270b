use std::time::Duration;

use serde::Serialize;

use crate::analysis::scorer::Correction;

/// レップ完了時に rep-success とみなすスコア下限 (超過)
pub const REP_SUCCESS_SCORE: f32 = 70.0;

/// 違反なしでこのスコアを超えたら perfect-form
pub const PERFECT_FORM_SCORE: f32 = 85.0;

/// フィードバックの種類 (表示色・読み上げの判断用)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackCategory {
    RepSuccess,
    RepWarning,
    Correction,
    Perfect,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case", tag = "code", content = "correction")]
pub enum FeedbackCode {
    GreatRep,
    RepNeedsWork,
    Correction(Correction),
    PerfectForm,
    AnalysisUnavailable,
}

/// 提示側に渡すフィードバック
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackEvent {
    #[serde(flatten)]
    pub code: FeedbackCode,
    pub category: FeedbackCategory,
    pub message: &'static str,
    /// セッション時刻
    #[serde(rename = "at_ms", serialize_with = "serialize_millis")]
    pub at: Duration,
}

fn serialize_millis<S: serde::Serializer>(at: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(at.as_millis() as u64)
}

impl FeedbackEvent {
    pub fn rep(score: f32, at: Duration) -> Self {
        if score > REP_SUCCESS_SCORE {
            Self {
                code: FeedbackCode::GreatRep,
                category: FeedbackCategory::RepSuccess,
                message: "GREAT REP! Keep going!",
                at,
            }
        } else {
            Self {
                code: FeedbackCode::RepNeedsWork,
                category: FeedbackCategory::RepWarning,
                message: "Rep completed. Try to improve form.",
                at,
            }
        }
    }

    pub fn correction(correction: Correction, message: &'static str, at: Duration) -> Self {
        Self {
            code: FeedbackCode::Correction(correction),
            category: FeedbackCategory::Correction,
            message,
            at,
        }
    }

    pub fn perfect_form(at: Duration) -> Self {
        Self {
            code: FeedbackCode::PerfectForm,
            category: FeedbackCategory::Perfect,
            message: "PERFECT FORM!",
            at,
        }
    }

    pub fn analysis_unavailable(at: Duration) -> Self {
        Self {
            code: FeedbackCode::AnalysisUnavailable,
            category: FeedbackCategory::Info,
            message: "Analysis not available for this exercise yet.",
            at,
        }
    }

    /// レップ完了イベントか
    pub fn is_rep(&self) -> bool {
        matches!(self.category, FeedbackCategory::RepSuccess | FeedbackCategory::RepWarning)
    }
}

/// 前回の発行から cooldown を超えて経過していれば true
///
/// 時刻が巻き戻った場合は経過0とみなす。
pub fn cooldown_elapsed(last: Option<Duration>, now: Duration, cooldown: Duration) -> bool {
    match last {
        Some(last) => now.saturating_sub(last) > cooldown,
        None => true,
    }
}
