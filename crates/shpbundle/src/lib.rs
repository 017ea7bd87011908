pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

pub use app::bundle::{bundle_shapefiles, to_bundle};
pub use app::group::group_by_nameroot;

/// Initialise logging from the loaded configuration.
pub fn init(config: &infra::config::Config) {
    infra::logging::init(config.logging.filter());
}
