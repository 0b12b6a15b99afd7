pub mod change;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod image;
pub mod index;
mod patch;
mod props;
pub mod tweaks;

pub use change::{ChangeEntry, ConstraintsField, Operation, ViewConfig};
pub use config::{EngineConfig, EngineMode};
pub use diagnostics::{ApplyReport, Diagnostic, Severity, TweakError};
pub use engine::LayoutEngine;
pub use image::{ImageLoader, ImageSlot, MemoryImages, NoImages, PendingImage};
pub use index::NodeRegistry;
pub use tweaks::TweakStore;
