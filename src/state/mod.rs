pub mod checkpoint;

pub use checkpoint::{Category, Checkpoint, CheckpointStore};
