use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::exercise::ExerciseKind;

/// 1レップあたりの推定消費カロリー (kcal)
pub const CALORIES_PER_REP: f32 = 0.5;

/// 1回の運動セッションの集計
///
/// エンジンは状態を持たず、フレームごとにこのセッションを更新する。
/// 同時に複数のセッションを扱う場合はセッションを別々に持てばよい。
#[derive(Debug, Clone)]
pub struct ExerciseSession {
    kind: ExerciseKind,
    reps: u32,
    rep_scores: Vec<f32>,
    /// 収縮姿勢にいるか
    pub(crate) contracted: bool,
    /// 最後にレップ以外のフィードバックを出した時刻
    pub(crate) last_feedback: Option<Duration>,
    first_frame: Option<Duration>,
    last_frame: Option<Duration>,
    frames: u64,
}

impl ExerciseSession {
    pub fn new(kind: ExerciseKind) -> Self {
        Self {
            kind,
            reps: 0,
            rep_scores: Vec::new(),
            contracted: false,
            last_feedback: None,
            first_frame: None,
            last_frame: None,
            frames: 0,
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    /// レップごとのスコア (完了順)
    pub fn rep_scores(&self) -> &[f32] {
        &self.rep_scores
    }

    pub fn is_contracted(&self) -> bool {
        self.contracted
    }

    pub fn last_feedback(&self) -> Option<Duration> {
        self.last_feedback
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 最初のフレームから最後のフレームまで
    pub fn duration(&self) -> Duration {
        match (self.first_frame, self.last_frame) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => Duration::ZERO,
        }
    }

    pub(crate) fn observe_frame(&mut self, at: Duration) {
        self.first_frame.get_or_insert(at);
        self.last_frame = Some(self.last_frame.map_or(at, |last| last.max(at)));
        self.frames += 1;
    }

    pub(crate) fn record_rep(&mut self, score: f32) -> u32 {
        self.reps += 1;
        self.rep_scores.push(score);
        self.reps
    }

    /// 全リセット (新しいセッションと同じ状態)
    pub fn reset(&mut self) {
        *self = Self::new(self.kind);
    }

    /// レップ数と姿勢フラグのみリセット。スコア履歴と経過時間は残す
    pub fn reset_reps(&mut self) {
        self.reps = 0;
        self.contracted = false;
    }

    pub fn summary(&self) -> SessionSummary {
        let average_score = if self.rep_scores.is_empty() {
            None
        } else {
            Some(self.rep_scores.iter().sum::<f32>() / self.rep_scores.len() as f32)
        };
        let best_score = self.rep_scores.iter().copied().reduce(f32::max);

        SessionSummary {
            exercise: self.kind,
            total_reps: self.reps,
            average_score,
            best_score,
            duration_secs: self.duration().as_secs_f32(),
            calories: self.reps as f32 * CALORIES_PER_REP,
            verdict: average_score.map(Verdict::from_average),
        }
    }
}

/// 平均スコアによる総評
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Excellent,
    Good,
    KeepPracticing,
}

impl Verdict {
    pub fn from_average(average: f32) -> Self {
        if average > 85.0 {
            Verdict::Excellent
        } else if average > 70.0 {
            Verdict::Good
        } else {
            Verdict::KeepPracticing
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Verdict::Excellent => "Session Complete! Excellent form!",
            Verdict::Good => "Session Complete! Good work!",
            Verdict::KeepPracticing => "Session Complete! Keep practicing!",
        }
    }
}

/// 保存用のセッション要約
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub exercise: ExerciseKind,
    pub total_reps: u32,
    pub average_score: Option<f32>,
    pub best_score: Option<f32>,
    pub duration_secs: f32,
    pub calories: f32,
    pub verdict: Option<Verdict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = ExerciseSession::new(ExerciseKind::Squat);
        assert_eq!(session.reps(), 0);
        assert!(session.rep_scores().is_empty());
        assert!(!session.is_contracted());
        assert_eq!(session.duration(), Duration::ZERO);
    }

    #[test]
    fn test_summary_without_reps() {
        let summary = ExerciseSession::new(ExerciseKind::Lunge).summary();
        assert_eq!(summary.total_reps, 0);
        assert_eq!(summary.average_score, None);
        assert_eq!(summary.best_score, None);
        assert_eq!(summary.verdict, None);
        assert_eq!(summary.calories, 0.0);
    }

    #[test]
    fn test_summary_aggregates() {
        let mut session = ExerciseSession::new(ExerciseKind::Squat);
        session.observe_frame(Duration::from_millis(500));
        session.record_rep(90.0);
        session.record_rep(70.0);
        session.record_rep(80.0);
        session.observe_frame(Duration::from_millis(10_500));

        let summary = session.summary();
        assert_eq!(summary.total_reps, 3);
        assert_eq!(summary.average_score, Some(80.0));
        assert_eq!(summary.best_score, Some(90.0));
        assert_eq!(summary.verdict, Some(Verdict::Good));
        assert!((summary.duration_secs - 10.0).abs() < 1e-4);
        assert!((summary.calories - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_verdict_boundaries() {
        assert_eq!(Verdict::from_average(85.1), Verdict::Excellent);
        assert_eq!(Verdict::from_average(85.0), Verdict::Good);
        assert_eq!(Verdict::from_average(70.0), Verdict::KeepPracticing);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = ExerciseSession::new(ExerciseKind::ArmRaise);
        session.observe_frame(Duration::from_secs(1));
        session.record_rep(50.0);
        session.contracted = true;
        session.last_feedback = Some(Duration::from_secs(1));
        session.reset();
        assert_eq!(session.kind(), ExerciseKind::ArmRaise);
        assert_eq!(session.reps(), 0);
        assert!(session.rep_scores().is_empty());
        assert!(!session.is_contracted());
        assert_eq!(session.last_feedback(), None);
        assert_eq!(session.frames(), 0);
    }

    #[test]
    fn test_reset_reps_keeps_scores() {
        let mut session = ExerciseSession::new(ExerciseKind::Squat);
        session.record_rep(60.0);
        session.contracted = true;
        session.reset_reps();
        assert_eq!(session.reps(), 0);
        assert!(!session.is_contracted());
        assert_eq!(session.rep_scores(), &[60.0]);
    }

    #[test]
    fn test_duration_ignores_out_of_order_frames() {
        let mut session = ExerciseSession::new(ExerciseKind::Squat);
        session.observe_frame(Duration::from_secs(1));
        session.observe_frame(Duration::from_secs(5));
        session.observe_frame(Duration::from_secs(3));
        assert_eq!(session.duration(), Duration::from_secs(4));
    }
}
