#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tempfile::TempDir;

    use crate::config::{CliOverrides, Config};
    use crate::output::OutputFormat;

    fn output_format() -> impl Strategy<Value = OutputFormat> {
        prop_oneof![
            Just(OutputFormat::Table),
            Just(OutputFormat::Json),
            Just(OutputFormat::Quiet),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        // Any case variant of a format name parses
        #[test]
        fn test_output_format_case_insensitive(format in output_format(), upper in any::<bool>()) {
            let name = format.to_string();
            let name = if upper { name.to_uppercase() } else { name };
            prop_assert_eq!(name.parse::<OutputFormat>().unwrap(), format);
        }

        // Rendered config loads back with the same key settings
        #[test]
        fn test_config_toml_load_round_trip(
            ttl in 1u64..=86_400 * 365,
            indent in "[ \t]{0,8}",
            key_name in "[a-z][a-z0-9_-]{0,15}\\.key",
        ) {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("config.toml");

            let mut config = Config::default();
            config.keys.session_ttl_seconds = ttl;
            config.keys.indent = indent.clone();
            config.keys.key_path = key_name.clone().into();
            std::fs::write(&path, config.to_toml().unwrap()).unwrap();

            let loaded = Config::load(&path).unwrap();
            prop_assert_eq!(loaded.keys.session_ttl_seconds, ttl);
            prop_assert_eq!(loaded.keys.indent, indent);
            prop_assert_eq!(loaded.keys.key_path, std::path::PathBuf::from(key_name));
        }

        // Overrides always produce a config that still validates
        #[test]
        fn test_overrides_keep_config_valid(
            format in output_format(),
            verbose in any::<bool>(),
            debug in any::<bool>(),
        ) {
            let overrides = CliOverrides {
                output_format: Some(format.to_string()),
                verbose: Some(verbose),
                debug: Some(debug),
            };
            let config = Config::default().with_overrides(&overrides);
            prop_assert!(config.validate().is_ok());
            prop_assert_eq!(config.output.format, format.to_string());
            if debug {
                prop_assert_eq!(config.logging.level.as_str(), "debug");
            }
        }
    }
}
