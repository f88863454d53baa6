//! Project builds.
//!
//! A build stages the entry script without its `main` function and runs the
//! project's `conduit.on_build` hooks in a worker, recording the live schema
//! under the build directory.
//!
//! # Submodules
//!
//! - [`context`] - Paths of one invocation and their flat-map form
//! - [`manager`] - `prepare`, `build` and `clean`
//! - [`executable`] - The worker-side build step

pub mod context;
pub mod executable;
pub mod manager;

pub use context::{BuildContext, ContextError};
pub use executable::{BuildExecutable, BuildReport};
pub use manager::{BuildError, BuildManager, StagedScript};
