//! Disposable execution environments for identified database engines.
//!
//! One run owns exactly one container: the identified engine image is
//! acquired if absent, a leftover container under the deterministic name is
//! reconciled away, a fresh container is created with the empty-credential
//! bootstrap contract and the data directory bind-mounted in, started,
//! polled until the engine services requests, used for the dump, then
//! stopped and (on confirmation) removed. Every call against the engine API
//! carries its own deadline; a pull and an existence check have very
//! different natural latencies and never share one.

pub mod config;
pub mod environment;
pub mod readiness;
pub mod socket;
pub mod surface;

pub use config::RuntimeTimeouts;
pub use environment::{EnvironmentSpec, ExecutionEnvironment, MOUNT_TARGET};
pub use readiness::ReadinessProbe;
pub use socket::resolve_socket;
pub use surface::{ExecOutput, ExecSurface};
