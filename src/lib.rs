pub mod analysis;
pub mod config;
pub mod error;
pub mod feedback;
pub mod pose;
pub mod recording;
pub mod session;
