//! Handler implementations

pub mod batch;
pub mod console;
pub mod level;
pub mod multi;
pub mod structured;
pub mod transform;

pub use batch::{BatchConfig, BatchHandler};
pub use console::{maybe_console_handler, ConsoleHandler};
pub use level::LevelHandler;
pub use multi::MultiHandler;
pub use structured::StructuredHandler;
pub use transform::LevelTransformHandler;

pub use crate::core::Handler;
