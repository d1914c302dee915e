use crate::{AppConfig, ExtractionFailureMode};
use figment::Jail;

#[test]
fn test_defaults_without_files() {
    Jail::expect_with(|_jail| {
        let config = AppConfig::load("config").map_err(|e| e.to_string())?;
        assert_eq!(config.app_name, "route-guide");
        assert_eq!(config.server.port, 20202);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(
            config.interceptor.extraction_failure,
            ExtractionFailureMode::Abort
        );
        assert!(!config.interceptor.pretty_json);
        Ok(())
    });
}

#[test]
fn test_file_and_env_layering() {
    Jail::expect_with(|jail| {
        jail.create_dir("config")?;
        jail.create_file(
            "config/default.toml",
            r#"
            app_name = "route-guide-server"

            [server]
            host = "127.0.0.1"
            port = 30303

            [telemetry]
            log_level = "debug"

            [interceptor]
            extraction_failure = "mark"
            pretty_json = true
            "#,
        )?;
        jail.set_env("APP_SERVER__PORT", "40404");

        let config = AppConfig::load("config").map_err(|e| e.to_string())?;
        assert_eq!(config.app_name, "route-guide-server");
        assert_eq!(config.server_addr(), "127.0.0.1:40404");
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(
            config.interceptor.extraction_failure,
            ExtractionFailureMode::Mark
        );
        assert!(config.interceptor.pretty_json);
        Ok(())
    });
}

#[test]
fn test_environment_file_overrides_default() {
    Jail::expect_with(|jail| {
        jail.create_dir("config")?;
        jail.create_file("config/default.toml", "[telemetry]\nlog_level = \"info\"\n")?;
        jail.create_file("config/production.toml", "[telemetry]\nlog_level = \"warn\"\n")?;
        jail.set_env("APP_ENV", "production");

        let config = AppConfig::load("config").map_err(|e| e.to_string())?;
        assert!(config.is_production());
        assert_eq!(config.telemetry.log_level, "warn");
        Ok(())
    });
}

#[test]
fn test_reload_log_level_reads_current_file() {
    Jail::expect_with(|jail| {
        jail.create_dir("config")?;
        jail.create_file("config/default.toml", "[telemetry]\nlog_level = \"info\"\n")?;
        assert_eq!(
            AppConfig::reload_log_level("config").map_err(|e| e.to_string())?,
            "info"
        );

        jail.create_file("config/default.toml", "[telemetry]\nlog_level = \"trace\"\n")?;
        assert_eq!(
            AppConfig::reload_log_level("config").map_err(|e| e.to_string())?,
            "trace"
        );
        Ok(())
    });
}

#[test]
fn test_reload_log_level_falls_back_to_default() {
    Jail::expect_with(|_jail| {
        assert_eq!(
            AppConfig::reload_log_level("config").map_err(|e| e.to_string())?,
            "info"
        );
        Ok(())
    });
}
