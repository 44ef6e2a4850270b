use thiserror::Error;

/// 設定値の検証エラー
///
/// フレームを処理する前 (エンジン構築時) にのみ発生する。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown exercise type: {0:?}")]
    UnknownExercise(String),

    #[error("deep threshold ({deep}°) must be below recovered threshold ({recovered}°)")]
    ThresholdOrder { deep: f32, recovered: f32 },

    #[error("{name} must be a finite angle in [0, 180], got {value}")]
    InvalidAngle { name: &'static str, value: f32 },

    #[error("visibility threshold must be within [0, 1], got {0}")]
    InvalidVisibility(f32),

    #[error("feedback cooldown must not be negative, got {0} ms")]
    NegativeCooldown(i64),

    #[error("deduction {name} must be a non-negative finite number, got {value}")]
    InvalidDeduction { name: &'static str, value: f32 },
}
