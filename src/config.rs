use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::analysis::angle::Space;
use crate::analysis::exercise::ExerciseKind;
use crate::analysis::scorer::Deductions;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// 種目 ("squat", "lunge", "arm-raise", "shoulder-press", "bicep-curl", "leg-raise")
    #[serde(default = "default_exercise")]
    pub exercise: String,
    /// これ未満の可視性のランドマークは不明扱い
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,
    /// 収縮姿勢の閾値（度）。未指定なら種目の既定値
    #[serde(default)]
    pub deep_threshold: Option<f32>,
    /// 伸展姿勢に戻る閾値（度）。未指定なら種目の既定値
    #[serde(default)]
    pub recovered_threshold: Option<f32>,
    /// レップ以外のフィードバックの最小間隔（ミリ秒）
    #[serde(default = "default_feedback_cooldown_ms")]
    pub feedback_cooldown_ms: i64,
    /// 角度計算に z を使うか
    #[serde(default)]
    pub space: Space,
    /// 背中のまっすぐさチェックを有効にする
    #[serde(default)]
    pub back_check: bool,
    #[serde(default)]
    pub deductions: Deductions,
}

fn default_exercise() -> String { "squat".to_string() }
fn default_visibility_threshold() -> f32 { 0.5 }
fn default_feedback_cooldown_ms() -> i64 { 2500 }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exercise: default_exercise(),
            visibility_threshold: default_visibility_threshold(),
            deep_threshold: None,
            recovered_threshold: None,
            feedback_cooldown_ms: default_feedback_cooldown_ms(),
            space: Space::default(),
            back_check: false,
            deductions: Deductions::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn for_exercise(kind: ExerciseKind) -> Self {
        Self {
            exercise: kind.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn exercise_kind(&self) -> Result<ExerciseKind, ConfigError> {
        self.exercise
            .parse()
            .map_err(ConfigError::UnknownExercise)
    }

    pub fn feedback_cooldown(&self) -> Duration {
        Duration::from_millis(self.feedback_cooldown_ms.max(0) as u64)
    }

    /// 範囲と、両方指定された閾値の順序の検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exercise_kind()?;

        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(ConfigError::InvalidVisibility(self.visibility_threshold));
        }
        if self.feedback_cooldown_ms < 0 {
            return Err(ConfigError::NegativeCooldown(self.feedback_cooldown_ms));
        }
        for (name, value) in [
            ("deep_threshold", self.deep_threshold),
            ("recovered_threshold", self.recovered_threshold),
        ] {
            if let Some(value) = value {
                check_angle(name, value)?;
            }
        }
        // 片方だけの指定は種目の既定値と合わせて FormEngine::new で検証する
        if let (Some(deep), Some(recovered)) = (self.deep_threshold, self.recovered_threshold) {
            if deep >= recovered {
                return Err(ConfigError::ThresholdOrder { deep, recovered });
            }
        }
        for (name, value) in self.deductions.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDeduction { name, value });
            }
        }
        Ok(())
    }
}

pub(crate) fn check_angle(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidAngle { name, value })
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.analysis.validate()?;
        Ok(config)
    }

    /// ファイルがなければ既定値。あるのに不正な場合はエラー
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "config not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.exercise_kind(), Ok(ExerciseKind::Squat));
        assert_eq!(config.visibility_threshold, 0.5);
        assert_eq!(config.feedback_cooldown(), Duration::from_millis(2500));
        assert_eq!(config.deductions, Deductions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            exercise = "lunge"
            deep_threshold = 100.0
            feedback_cooldown_ms = 1000

            [analysis.deductions]
            uneven = 5.0
            "#,
        )
        .unwrap();
        let analysis = config.analysis;
        assert_eq!(analysis.exercise_kind(), Ok(ExerciseKind::Lunge));
        assert_eq!(analysis.deep_threshold, Some(100.0));
        assert_eq!(analysis.recovered_threshold, None);
        assert_eq!(analysis.visibility_threshold, 0.5);
        assert_eq!(analysis.deductions.uneven, 5.0);
        assert_eq!(analysis.deductions.too_shallow, 40.0);
        assert_eq!(analysis.space, Space::Planar);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analysis.exercise, "squat");
    }

    #[test]
    fn test_depth_space_from_toml() {
        let config: Config = toml::from_str("[analysis]\nspace = \"depth\"\n").unwrap();
        assert_eq!(config.analysis.space, Space::Depth);
    }

    #[test]
    fn test_unknown_exercise_rejected() {
        let config = AnalysisConfig {
            exercise: "burpees".to_string(),
            ..AnalysisConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::UnknownExercise("burpees".to_string())));
    }

    #[test]
    fn test_negative_cooldown_rejected() {
        let config = AnalysisConfig {
            feedback_cooldown_ms: -1,
            ..AnalysisConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NegativeCooldown(-1)));
    }

    #[test]
    fn test_visibility_out_of_range_rejected() {
        let config = AnalysisConfig {
            visibility_threshold: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidVisibility(_))));
    }

    #[test]
    fn test_negative_deduction_rejected() {
        let mut config = AnalysisConfig::default();
        config.deductions.posture = -10.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDeduction { name: "posture", value: -10.0 })
        );
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let config = AnalysisConfig {
            recovered_threshold: Some(f32::NAN),
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAngle { name: "recovered_threshold", .. })
        ));
    }

    #[test]
    fn test_threshold_order_rejected() {
        let config = AnalysisConfig {
            exercise: "leg-raise".to_string(),
            deep_threshold: Some(160.0),
            recovered_threshold: Some(150.0),
            ..AnalysisConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdOrder { deep: 160.0, recovered: 150.0 })
        );
    }

    #[test]
    fn test_load_rejects_threshold_order() {
        let path = std::env::temp_dir().join(format!("rehab_coach_order_{}.toml", std::process::id()));
        fs::write(
            &path,
            "[analysis]\nexercise = \"bicep-curl\"\ndeep_threshold = 160.0\nrecovered_threshold = 150.0\n",
        )
        .unwrap();
        let result = Config::load(&path);
        let _ = fs::remove_file(&path);
        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ThresholdOrder { deep: 160.0, recovered: 150.0 })
        );
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist/config.toml").unwrap();
        assert_eq!(config.analysis.exercise, "squat");
    }

    #[test]
    fn test_load_invalid_file_is_error() {
        let path = std::env::temp_dir().join(format!("rehab_coach_cfg_{}.toml", std::process::id()));
        fs::write(&path, "[analysis]\nvisibility_threshold = 2.0\n").unwrap();
        let result = Config::load_or_default(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }
}
