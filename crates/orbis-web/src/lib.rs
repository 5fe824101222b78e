//! Orbis Web - browser entry point
//!
//! Starts the Orbis scene on the `#orbis-canvas` element using the embedded
//! `orbis.toml`, adjusted by `?seed=` and `?twinkle=` URL parameters.

mod overrides;

use orbis_core::SceneConfig;
use wasm_bindgen::prelude::*;

/// Configuration compiled into the module
const EMBEDDED_CONFIG: &str = include_str!("../orbis.toml");

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce wgpu noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::WARN)
            .build(),
    );

    let mut config = match SceneConfig::from_toml_str(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Embedded configuration rejected, using defaults: {}", e);
            SceneConfig::default()
        }
    };

    let (seed, twinkle) = overrides::read_query();
    overrides::apply_query_overrides(&mut config, seed.as_deref(), twinkle.as_deref());

    orbis_scene::run(config);
}
