//! Integration tests for schema introspection on SQLite.

mod common;

use common::{seed, seed_accounts, setup_sqlite};
use steampipe_mcp_server::db::SchemaInspector;
use steampipe_mcp_server::error::ErrorKind;

#[tokio::test]
async fn test_list_schemas_includes_main() {
    let (_file, _manager, executor) = setup_sqlite().await;
    let inspector = SchemaInspector::new(executor);

    let schemas = inspector.list_schemas(None).await.unwrap();
    assert!(schemas.iter().any(|s| s.schema == "main"));

    let filtered = inspector.list_schemas(Some("nomatch")).await.unwrap();
    assert!(filtered.is_empty());
}

#[tokio::test]
async fn test_list_tables_with_filter() {
    let (_file, _manager, executor) = setup_sqlite().await;
    seed_accounts(&executor).await;
    seed(
        &executor,
        &["CREATE TABLE aws_s3_bucket (name TEXT NOT NULL, region TEXT)"],
    )
    .await;
    let inspector = SchemaInspector::new(executor);

    let tables = inspector.list_tables("main", None).await.unwrap();
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["aws_account", "aws_s3_bucket"]);

    let tables = inspector.list_tables("main", Some("s3")).await.unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name, "aws_s3_bucket");
}

#[tokio::test]
async fn test_empty_schema_lists_no_tables() {
    let (_file, _manager, executor) = setup_sqlite().await;
    let inspector = SchemaInspector::new(executor);

    let tables = inspector.list_tables("main", None).await.unwrap();
    assert!(tables.is_empty());
}

#[tokio::test]
async fn test_missing_schema() {
    let (_file, _manager, executor) = setup_sqlite().await;
    let inspector = SchemaInspector::new(executor);

    let err = inspector.list_tables("gcp", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaNotFound);

    let err = inspector
        .show_table("aws_account", Some("gcp"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaNotFound);
}

#[tokio::test]
async fn test_show_table_columns_in_ordinal_order() {
    let (_file, _manager, executor) = setup_sqlite().await;
    seed_accounts(&executor).await;
    let inspector = SchemaInspector::new(executor);

    let table = inspector.show_table("aws_account", None).await.unwrap();
    assert_eq!(table.schema, "main");
    assert_eq!(table.name, "aws_account");

    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["account_id", "title", "region_count", "organization_id"]
    );
    assert!(!table.columns[0].nullable);
    assert!(table.columns[1].nullable);
    assert_eq!(table.columns[2].data_type, "INTEGER");
    assert_eq!(table.columns[2].default.as_deref(), Some("0"));
}

#[tokio::test]
async fn test_show_table_qualified_name() {
    let (_file, _manager, executor) = setup_sqlite().await;
    seed_accounts(&executor).await;
    let inspector = SchemaInspector::new(executor);

    let table = inspector.show_table("main.aws_account", None).await.unwrap();
    assert_eq!(table.schema, "main");
    assert_eq!(table.columns.len(), 4);
}

#[tokio::test]
async fn test_missing_table() {
    let (_file, _manager, executor) = setup_sqlite().await;
    seed_accounts(&executor).await;
    let inspector = SchemaInspector::new(executor);

    let err = inspector.show_table("aws_vpc", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TableNotFound);

    let err = inspector
        .show_table("aws_vpc", Some("main"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TableNotFound);
    assert!(err.to_string().contains("aws_vpc"));
}

#[tokio::test]
async fn test_plugins_and_cache_on_sqlite() {
    let (_file, _manager, executor) = setup_sqlite().await;
    let inspector = SchemaInspector::new(executor);

    assert!(inspector.list_plugins().await.unwrap().is_empty());
    assert!(inspector.clear_cache().await.is_err());
}
