//! Shared constants.

pub const APP_NAME: &str = "conduit";

/// Directory (relative to the project root) that holds staged build artifacts.
pub const BUILD_DIR_NAME: &str = "build";

/// Directory (relative to the project root) that holds migration files.
pub const MIGRATIONS_DIR_NAME: &str = "migrations";

/// Package manifest file name, relative to the project root.
pub const PACKAGE_CONFIG_FILE: &str = "packages.json";

/// Default entry script, relative to the project root.
pub const DEFAULT_ENTRY_FILE: &str = "bin/main.lua";

/// Live schema snapshot written by a build, relative to the build directory.
pub const SCHEMA_SNAPSHOT_FILE: &str = "schema.json";

/// Name of the runtime support module every worker entry imports first.
pub const RUNTIME_MODULE: &str = "conduit";

/// Version of the worker request/response envelopes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Prefix marking the single response line a worker writes to stdout.
pub const RESPONSE_PREFIX: &str = "@@conduit-response ";

/// Argument that switches the `conduit` binary into worker mode.
pub const WORKER_SUBCOMMAND: &str = "worker";

/// Default bound on a single worker run.
pub const DEFAULT_WORKER_TIMEOUT_SECS: u64 = 120;

pub const ENV_WORKER_PROGRAM: &str = "CONDUIT_WORKER_PROGRAM";
pub const ENV_WORKER_TIMEOUT: &str = "CONDUIT_WORKER_TIMEOUT";
pub const ENV_LOG: &str = "CONDUIT_LOG";
