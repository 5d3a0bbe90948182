//! The engine, its collaborator seams and the host-facing command handlers.

pub mod clipboard;
pub mod commands;
pub mod engine;
pub mod events;
pub mod proxy;
pub mod refresh;
pub mod render;
pub mod storage;

pub use engine::{ExportTreeEngine, SharedEngine};
pub use events::TreeEvent;
pub use proxy::{EventProxy, LoggingProxy};
pub use storage::{JsonFileStore, MemoryStore, StateStore};
