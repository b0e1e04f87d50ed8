// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 验证导入 → 持久化 → 重新打开后的读取
// ==========================================


use enquiry_tracker::domain::{FieldType, FieldValue, ImportOptions, NewFieldDefinition};
use enquiry_tracker::importer::EnquiryImporter;
use enquiry_tracker::logging;
use enquiry_tracker::repository::{
    EnquiryRepository, FieldDefinitionRepository, FieldDefinitionStore, RecordStore,
};
use std::ops::ControlFlow;
use test_helpers::{create_test_context, create_test_db, enquiry_row};

#[tokio::test]
async fn test_records_survive_reopen() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    {
        let ctx = create_test_context(&db_path);
        let rows = vec![
            enquiry_row("R-2", &[("Customer Region", "South")]),
            enquiry_row("R-1", &[("Customer Region", "North")]),
        ];
        let result = ctx
            .importer
            .import_batch(rows, ImportOptions::default())
            .await
            .expect("import should succeed");
        assert_eq!(result.created, 2);
    }

    let repo = EnquiryRepository::new(&db_path).expect("Failed to reopen repository");
    assert_eq!(repo.count().unwrap(), 2);

    let record = repo.find_one("R-1").unwrap().expect("R-1 should exist");
    assert_eq!(
        record.dynamic_fields.get("customer_region"),
        Some(&FieldValue::text("North"))
    );
    assert_eq!(repo.dynamic_field_keys().unwrap(), vec!["customer_region"]);
}

#[tokio::test]
async fn test_scan_visits_in_key_order_and_stops_early() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let ctx = create_test_context(&db_path);
    let rows = ["S-3", "S-1", "S-2"]
        .iter()
        .map(|number| enquiry_row(number, &[("Grade", number)]))
        .collect();
    ctx.importer
        .import_batch(rows, ImportOptions::default())
        .await
        .unwrap();

    let mut seen = Vec::new();
    let visited = ctx
        .records
        .scan_field_values("grade", &mut |value: FieldValue| {
            seen.push(value.to_string());
            if seen.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();

    assert_eq!(visited, 2);
    assert_eq!(seen, vec!["S-1", "S-2"]);
}

#[test]
fn test_field_definitions_survive_reopen() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    {
        let ctx = create_test_context(&db_path);
        ctx.registry
            .create(NewFieldDefinition {
                name: "priority".to_string(),
                label: "Priority".to_string(),
                field_type: Some(FieldType::Select),
                options: vec!["High".to_string(), "Low".to_string()],
                created_by: Some("admin".to_string()),
                ..Default::default()
            })
            .unwrap();
        ctx.registry.update_active("priority", false).unwrap();
    }

    let repo = FieldDefinitionRepository::new(&db_path).expect("Failed to reopen repository");
    let definition = repo.find_by_name("priority").unwrap().expect("definition should exist");
    assert_eq!(definition.field_type, FieldType::Select);
    assert_eq!(definition.options, vec!["High", "Low"]);
    assert_eq!(definition.created_by.as_deref(), Some("admin"));
    assert!(!definition.active);

    assert!(repo.list(false).unwrap().is_empty());
    assert_eq!(repo.list(true).unwrap().len(), 1);
}
