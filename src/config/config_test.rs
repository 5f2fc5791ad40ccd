use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_filters_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("FILTERS__") {
            std::env::remove_var(&key);
        }
    }
}

#[test]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = FiltersConfig::default();

    assert!(config.initial_filters.is_empty());
    assert!(config.keep_other_query_params);
    assert_eq!(config.storage_name, "__DEFAULT_LS_FILTERS_KEY__");
    assert_eq!(config.persist_debounce_ms, 300);
    assert_eq!(config.persist_debounce(), Duration::from_millis(300));
}

#[test]
#[serial]
fn load_should_merge_environment_overrides() {
    cleanup_all_filters_env_vars();
    with_vars(
        vec![
            ("FILTERS__PERSIST_DEBOUNCE_MS", Some("50")),
            ("FILTERS__KEEP_OTHER_QUERY_PARAMS", Some("false")),
        ],
        || {
            let config = FiltersConfig::load(None).unwrap();

            assert_eq!(config.persist_debounce_ms, 50);
            assert!(!config.keep_other_query_params);
            assert_eq!(config.storage_name, "__DEFAULT_LS_FILTERS_KEY__");
        },
    );
}

#[test]
#[serial]
fn load_should_read_filters_and_policies_from_file() {
    cleanup_all_filters_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("filters.toml");

    std::fs::write(
        &config_path,
        r#"
        storage_name = "products"

        [initial_filters]
        search = ""
        category = "bear"
        tags = ["a", "b"]

        [filters_options.category]
        write_to_query = false
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let config = FiltersConfig::load(config_path.to_str()).unwrap();

        assert_eq!(config.storage_name, "products");
        assert_eq!(config.initial_filters.get("search"), Some(&FilterValue::from("")));
        assert_eq!(config.initial_filters.get("category"), Some(&FilterValue::from("bear")));
        assert_eq!(
            config.initial_filters.get("tags"),
            Some(&FilterValue::from(vec!["a", "b"]))
        );

        let category = config.policy("category");
        assert!(!category.write_to_query);
        assert!(category.write_to_storage);
        assert_eq!(config.policy("search"), FilterPolicy::default());
    });
}

#[test]
#[serial]
fn environment_variables_should_have_highest_priority() {
    cleanup_all_filters_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("filters.toml");
    std::fs::write(&config_path, "persist_debounce_ms = 1000\n").unwrap();

    with_vars(vec![("FILTERS__PERSIST_DEBOUNCE_MS", Some("10"))], || {
        let config = FiltersConfig::load(config_path.to_str()).unwrap();
        assert_eq!(config.persist_debounce_ms, 10);
    });
}

#[test]
#[serial]
fn load_should_fail_on_missing_file() {
    cleanup_all_filters_env_vars();
    let result = FiltersConfig::load(Some("/definitely/not/here/filters"));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn validation_should_reject_empty_storage_name() {
    let config = FiltersConfig::default().with_storage_name("  ");
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn validation_should_reject_policy_for_unknown_key() {
    let config = FiltersConfig::default()
        .with_filter("search", "")
        .with_policy("bogus", FilterPolicy::default().write_to_query(false));

    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn builder_methods_compose() {
    let config = FiltersConfig::default()
        .with_filter("search", "")
        .with_policy("search", FilterPolicy::default().read_from_storage(false))
        .with_keep_other_query_params(false)
        .with_storage_name("catalog")
        .with_persist_debounce_ms(25);

    assert!(config.validate().is_ok());
    assert!(!config.policy("search").read_from_storage);
    assert!(!config.keep_other_query_params);
    assert_eq!(config.storage_name, "catalog");
    assert_eq!(config.persist_debounce(), Duration::from_millis(25));
}
