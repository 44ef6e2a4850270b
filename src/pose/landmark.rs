use serde::{Deserialize, Serialize};

/// 姿勢推定モデル (33点ボディモデル) のランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;
}

/// 正規化フレーム座標上の点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// 画像座標は下向きが正。dy > 0 で下方向にずらす
    pub fn offset_y(self, dy: f32) -> Self {
        Self { y: self.y + dy, ..self }
    }
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 奥行き。2Dのみのモデルでは0.0
    #[serde(default)]
    pub z: f32,
    /// 可視性スコア (0.0〜1.0)
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    /// 検出されなかった点。座標が NaN なので閾値によらず不明扱い
    pub const MISSING: Landmark = Landmark {
        x: f32::NAN,
        y: f32::NAN,
        z: f32::NAN,
        visibility: 0.0,
    };

    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, z: 0.0, visibility }
    }

    pub fn with_z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    /// 可視性が閾値以上かつ座標が有限か
    pub fn is_known(&self, threshold: f32) -> bool {
        self.visibility >= threshold
            && self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y, self.z)
    }
}

/// 1フレーム分のランドマーク (33点)
#[derive(Debug, Clone)]
pub struct LandmarkSet {
    pub landmarks: [Landmark; LandmarkIndex::COUNT],
}

impl LandmarkSet {
    pub fn new(landmarks: [Landmark; LandmarkIndex::COUNT]) -> Self {
        Self { landmarks }
    }

    /// 検出器の出力スライスから作成
    ///
    /// 足りない点は `Landmark::MISSING` で埋め、余分な点は無視する。
    pub fn from_slice(landmarks: &[Landmark]) -> Self {
        if landmarks.len() != LandmarkIndex::COUNT {
            tracing::debug!(
                got = landmarks.len(),
                expected = LandmarkIndex::COUNT,
                "landmark count mismatch"
            );
        }
        let mut set = Self::default();
        for (slot, lm) in set.landmarks.iter_mut().zip(landmarks) {
            *slot = *lm;
        }
        set
    }

    /// インデックスでランドマークを取得
    pub fn get(&self, index: LandmarkIndex) -> &Landmark {
        &self.landmarks[index as usize]
    }

    pub fn set(&mut self, index: LandmarkIndex, landmark: Landmark) {
        self.landmarks[index as usize] = landmark;
    }

    /// 閾値以上のランドマークのみ返す
    pub fn known(&self, index: LandmarkIndex, threshold: f32) -> Option<&Landmark> {
        let lm = self.get(index);
        lm.is_known(threshold).then_some(lm)
    }

    /// 全ランドマークの平均可視性
    pub fn average_visibility(&self) -> f32 {
        let sum: f32 = self.landmarks.iter().map(|l| l.visibility).sum();
        sum / LandmarkIndex::COUNT as f32
    }
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self {
            landmarks: [Landmark::MISSING; LandmarkIndex::COUNT],
        }
    }
}
