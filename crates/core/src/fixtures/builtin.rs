//! Fixtures compiled into the binary.
//!
//! Every file under `crates/core/assets/fixtures/` is embedded at
//! build time. With the `debug-embed` feature the files are still embedded
//! in debug builds, so tests see exactly what a release binary ships.

use ap_protocol::fixture_models::Fixture;
use rust_embed::RustEmbed;
use tracing::debug;

use super::error::{FixtureError, FixtureResult};

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/assets/fixtures"]
struct FixtureAssets;

/// Names of the embedded fixture files.
pub fn builtin_files() -> Vec<String> {
    let mut files: Vec<String> = FixtureAssets::iter().map(|path| path.to_string()).collect();
    files.sort();
    files
}

/// Parse every embedded fixture, in file name order.
///
/// # Errors
///
/// Returns `FixtureError::Parse` for the first file that is not a valid fixture.
pub fn load_builtin() -> FixtureResult<Vec<Fixture>> {
    builtin_files()
        .into_iter()
        .filter_map(|file| FixtureAssets::get(&file).map(|asset| (file, asset)))
        .map(|(file, asset)| {
            debug!(file = %file, "parsing built-in fixture");
            serde_yaml::from_slice::<Fixture>(asset.data.as_ref())
                .map_err(|source| FixtureError::Parse { file, source })
        })
        .collect()
}
