//! Core library for the routeforge developer tool.
//!
//! routeforge builds, packages, and deploys EdgeRoute router software onto
//! remote machines over SSH, using Docker for cross-compilation and
//! rsync/scp for file transfer. The crate exposes the machine registry,
//! which resolves logical machine names into fully parameterised
//! connections and renders ssh/scp/rsync/docker command lines, and the
//! command runner, which executes rendered commands while draining both
//! output streams concurrently. Workflow glue lives in the binary.

pub mod config;
pub mod exec;
pub mod registry;
pub mod report;

pub use config::{ConfigError, GlobalSettings, build_registry, expand_tilde, load};
pub use exec::{CommandSpec, ExecError, ExecutionResult, LOGIN_BANNER, MASK, Mode, Runner};
pub use registry::{
    BUILD_IMAGE, MachineRecord, MachineRegistry, RegistryError, Role, escape_dollars,
    quote_if_spaced, short_circuits,
};
pub use report::Reporter;
