// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证导入配置读取与默认值回退
// ==========================================


use enquiry_tracker::config::{
    config_keys, ConfigManager, ImportConfigReader, DEFAULT_HEADER_ROW_INDEX,
    DEFAULT_MAX_FIELD_NAME_LENGTH, DEFAULT_SALES_REP,
};
use test_helpers::{create_test_db, insert_test_config};

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_defaults_on_empty_database() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(
        config.max_field_name_length().unwrap(),
        DEFAULT_MAX_FIELD_NAME_LENGTH
    );
    assert_eq!(config.default_sales_rep().unwrap(), DEFAULT_SALES_REP);
    assert_eq!(config.header_row_index().unwrap(), DEFAULT_HEADER_ROW_INDEX);
    assert!(config.get_config_snapshot().unwrap().is_empty());
}

#[test]
fn test_values_persist_across_instances() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    insert_test_config(&db_path, config_keys::IMPORT_MAX_FIELD_NAME_LENGTH, "20").unwrap();
    insert_test_config(&db_path, config_keys::IMPORT_HEADER_ROW_INDEX, "2").unwrap();
    insert_test_config(&db_path, config_keys::IMPORT_DEFAULT_SALES_REP, "Sales Desk").unwrap();

    // 新实例读取同一数据库
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    assert_eq!(config.max_field_name_length().unwrap(), 20);
    assert_eq!(config.header_row_index().unwrap(), 2);
    assert_eq!(config.default_sales_rep().unwrap(), "Sales Desk");

    let snapshot = config.get_config_snapshot().unwrap();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(
        snapshot.get(config_keys::IMPORT_HEADER_ROW_INDEX).map(String::as_str),
        Some("2")
    );
}

#[test]
fn test_invalid_values_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config
        .set_global_config_value(config_keys::IMPORT_MAX_FIELD_NAME_LENGTH, "0")
        .unwrap();
    config
        .set_global_config_value(config_keys::IMPORT_HEADER_ROW_INDEX, "second")
        .unwrap();
    config
        .set_global_config_value(config_keys::IMPORT_DEFAULT_SALES_REP, "   ")
        .unwrap();

    assert_eq!(
        config.max_field_name_length().unwrap(),
        DEFAULT_MAX_FIELD_NAME_LENGTH
    );
    assert_eq!(config.header_row_index().unwrap(), DEFAULT_HEADER_ROW_INDEX);
    assert_eq!(config.default_sales_rep().unwrap(), DEFAULT_SALES_REP);

    // 覆盖写入
    config
        .set_global_config_value(config_keys::IMPORT_HEADER_ROW_INDEX, "1")
        .unwrap();
    assert_eq!(config.header_row_index().unwrap(), 1);
}
