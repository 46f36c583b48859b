/// Re-export `Config` from `searchdeck-core` for use within this crate.
///
/// All environment-variable parsing lives in `searchdeck-core` so it can be
/// shared with integration tests without depending on the full server.
pub use searchdeck_core::config::Config;
