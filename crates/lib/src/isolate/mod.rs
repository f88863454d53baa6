//! Isolated execution of typed payloads.
//!
//! The outer process describes the work as an [`IsolateRequest`] and hands it
//! to the [`IsolateExecutor`], which spawns a worker process (`conduit
//! worker`), sends it a versioned [`WorkerRequest`] and waits for a single
//! [`WorkerResponse`]. The worker shares no memory with the caller: it loads
//! exactly the imports named in the request into a fresh Lua runtime.
//!
//! # Submodules
//!
//! - [`executable`] - The [`Executable`] trait and the request union
//! - [`entry`] - Synthesis of the worker entry script
//! - [`executor`] - Spawning, timeouts and response decoding
//! - [`worker`] - Request handling inside the worker process

mod context;
pub mod entry;
pub mod executable;
pub mod executor;
mod types;
pub mod worker;

pub use context::WorkerContext;
pub use executable::{Executable, ExecutableRequest};
pub use executor::{IsolateExecutor, LogHandler};
pub use types::*;
