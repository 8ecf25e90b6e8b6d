//! Sahayak CLI - command line tools for site verification.
//!
//! This crate provides the CLI binaries:
//! - author_route: pick start/end points and create a project route
//! - verify_site: prove presence at a project checkpoint and upload a photo

pub mod config;
pub mod draft;
pub mod location;

pub use config::Config;
pub use draft::RouteDraft;
pub use location::{parse_point, FixedLocation};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log levels used when `RUST_LOG` names nothing more specific.
pub const DEFAULT_LOG_DIRECTIVES: &str = "sahayak_core=info,sahayak_osrm=info,sahayak_sdk=info";

/// `RUST_LOG` filter extended with comma-separated default directives.
pub fn env_filter(default_directives: &str) -> anyhow::Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for directive in default_directives.split(',').filter(|d| !d.trim().is_empty()) {
        filter = filter.add_directive(directive.trim().parse()?);
    }
    Ok(filter)
}

/// Install the fmt subscriber, honouring `RUST_LOG`.
pub fn init_tracing(default_directives: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter(default_directives)?)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_cover_every_library_crate() {
        for target in ["sahayak_core", "sahayak_osrm", "sahayak_sdk"] {
            assert!(DEFAULT_LOG_DIRECTIVES.contains(&format!("{}=info", target)));
        }
        let filter = env_filter(DEFAULT_LOG_DIRECTIVES).unwrap().to_string();
        assert!(filter.contains("sahayak_osrm=info"));
        assert!(filter.contains("sahayak_sdk=info"));
    }

    #[test]
    fn rejects_malformed_directive() {
        assert!(env_filter("sahayak_core=loud").is_err());
    }
}
