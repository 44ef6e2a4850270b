pub mod angle;
pub mod engine;
pub mod exercise;
pub mod scorer;

pub use angle::{angle_between, Anchor, JointTriple, Space};
pub use engine::{Assessment, FormAssessment, FormEngine, FrameReport, NotImplementedAssessment};
pub use exercise::{AngleNames, Combine, ExerciseKind, ExerciseProfile, Limit, PostureRule};
pub use scorer::{Correction, Deductions, RepCompleted};
