#![doc = include_str!("../README.md")]

pub mod dsn;
pub mod engine;
pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod protocol;
pub mod registry;
pub mod session;

mod logging;

// Re-export core public API at crate root.
pub use dsn::AccountDsn;
pub use engine::Engine;
pub use error::{Error, Result};
#[cfg(feature = "memory")]
pub use memory::{MemoryAccount, MemoryBuddy, MemoryEngine, MemoryGroup};
pub use protocol::{ProtocolInfo, find_protocol_id, format_protocol_list, parse_protocol_list};
pub use registry::{HandleRegistry, Index};
pub use session::{Session, SessionBuilder};

// Re-export standalone functions.
pub use logging::init_logger;
