//! Scene overrides taken from the page URL

use orbis_core::SceneConfig;

/// Read `seed` and `twinkle` from the page's query string
#[cfg(target_arch = "wasm32")]
pub fn read_query() -> (Option<String>, Option<String>) {
    let Some(window) = web_sys::window() else {
        return (None, None);
    };
    let Ok(href) = window.location().href() else {
        return (None, None);
    };
    let Ok(url) = web_sys::Url::new(&href) else {
        return (None, None);
    };
    let params = url.search_params();
    (params.get("seed"), params.get("twinkle"))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn read_query() -> (Option<String>, Option<String>) {
    (None, None)
}

/// Apply URL parameters to the configuration, ignoring values that do not parse
pub fn apply_query_overrides(config: &mut SceneConfig, seed: Option<&str>, twinkle: Option<&str>) {
    if let Some(seed) = seed {
        match seed.trim().parse::<u64>() {
            Ok(seed) => {
                tracing::info!("Starfield seed from URL parameter: {}", seed);
                config.starfield.seed = Some(seed);
            }
            Err(_) => tracing::warn!("Ignoring invalid seed parameter: {:?}", seed),
        }
    }

    if let Some(twinkle) = twinkle {
        match twinkle.trim().to_lowercase().as_str() {
            "" | "1" | "true" | "on" | "yes" => config.starfield.twinkle = true,
            "0" | "false" | "off" | "no" => config.starfield.twinkle = false,
            other => tracing::warn!("Ignoring invalid twinkle parameter: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_parameters_leave_config_unchanged() {
        let mut config = SceneConfig::default();
        apply_query_overrides(&mut config, None, None);
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn test_seed_parameter() {
        let mut config = SceneConfig::default();
        apply_query_overrides(&mut config, Some("42"), None);
        assert_eq!(config.starfield.seed, Some(42));

        apply_query_overrides(&mut config, Some("not-a-number"), None);
        assert_eq!(config.starfield.seed, Some(42));
    }

    #[test]
    fn test_twinkle_parameter() {
        let mut config = SceneConfig::default();
        apply_query_overrides(&mut config, None, Some(""));
        assert!(config.starfield.twinkle);

        apply_query_overrides(&mut config, None, Some("off"));
        assert!(!config.starfield.twinkle);

        apply_query_overrides(&mut config, None, Some("sometimes"));
        assert!(!config.starfield.twinkle);
    }

    #[test]
    fn test_embedded_config_is_valid() {
        let config = SceneConfig::from_toml_str(crate::EMBEDDED_CONFIG).unwrap();
        assert_eq!(config.starfield.count, 4000);
        assert!(config.earth.is_some());
        assert!(config.moon.is_some());
    }
}
