//! Shared User-Agent string for locator and fetch HTTP clients.
//!
//! Single source for the UA format so discovery and data traffic identify
//! the same plugin version to server operators.

/// Default User-Agent for all outbound requests (identifies the plugin).
#[must_use]
pub(crate) fn plugin_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("gwdata-plugin/{version} (htcondor-file-transfer)")
}
