//! # Data Module
//!
//! Tracking dataset model and the file loaders that build it.

pub mod loader;
pub mod trajectory;

pub use loader::{
    load_events, load_game_data, load_metadata, parse_events_json, parse_metadata_json,
    read_tracking,
};
pub use trajectory::{BallState, FrameRecord, TeamSlice, TrajectoryBuilder, TrajectoryDataset};
