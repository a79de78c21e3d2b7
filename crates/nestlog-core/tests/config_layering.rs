use figment::Jail;
use nestlog_core::{DateOrder, NestlogConfig};

#[test]
fn project_file_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "nestlog.toml",
            r#"
            [parse]
            date_order = "month_first"

            [store]
            data_dir = "/var/lib/nestlog"
            "#,
        )?;

        let config = NestlogConfig::load().expect("config loads");
        assert_eq!(config.parse.date_order, DateOrder::MonthFirst);
        assert_eq!(config.store.data_dir.to_str(), Some("/var/lib/nestlog"));
        assert_eq!(config.log.filter, "info");
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_file("nestlog.toml", "[parse]\ndate_order = \"month_first\"\n")?;
        jail.set_env("NESTLOG_PARSE__DATE_ORDER", "day_first");
        jail.set_env("NESTLOG_LOG__FILTER", "debug");

        let config = NestlogConfig::load().expect("config loads");
        assert_eq!(config.parse.date_order, DateOrder::DayFirst);
        assert_eq!(config.log.filter, "debug");
        Ok(())
    });
}

#[test]
fn explicit_file_sits_above_project_file() {
    Jail::expect_with(|jail| {
        jail.create_file("nestlog.toml", "[parse]\nmin_transcript_chars = 5\n")?;
        jail.create_file("other.toml", "[parse]\nmin_transcript_chars = 20\n")?;

        let config = NestlogConfig::load_with(Some(std::path::Path::new("other.toml")))
            .expect("config loads");
        assert_eq!(config.parse.min_transcript_chars, 20);
        Ok(())
    });
}

#[test]
fn invalid_value_is_reported() {
    Jail::expect_with(|jail| {
        jail.set_env("NESTLOG_PARSE__MIN_TRANSCRIPT_CHARS", "0");
        assert!(NestlogConfig::load().is_err());
        Ok(())
    });
}
