//! Wind sweep driver for an external rocket flight simulator.
//!
//! The driver loads one design document, registers the exported channels,
//! then runs the simulator once per sweep iteration and writes each run's
//! first flight data branch to `<root>/<YYYY-MM-DD>/<HH-MM>/<i>.csv`.
//! Supporting crates are re-exported so front-ends only need this one.

pub mod layout;
pub mod sweep;

pub use sweep_config as config;
pub use sweep_core as model;
pub use sweep_engine as engine;
pub use sweep_export as export;

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
