//! CLI command tests

use std::io::Write;

use crate::commands;

/// Temp dir holding a database path and a statement file
fn setup() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("fluxo.db");
    (dir, db_path)
}

fn write_statement(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("extrato.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        "Data,Valor,Descrição\n\
         05/03/2025,\"-45,90\",Compra no débito - POSTO SHELL RIO DE JANEIRO RJ\n\
         10/03/2025,\"2.500,00\",Transferência recebida pelo Pix - ACME LTDA\n"
    )
    .unwrap();
    path
}

#[test]
fn test_cmd_init_creates_database() {
    let (_dir, db_path) = setup();
    commands::cmd_init(&db_path).unwrap();
    assert!(db_path.exists());
}

#[test]
fn test_cmd_status_on_empty_database() {
    let (_dir, db_path) = setup();
    commands::cmd_init(&db_path).unwrap();
    commands::cmd_status(&db_path).unwrap();
}

#[tokio::test]
async fn test_cmd_import_then_status() {
    let (dir, db_path) = setup();
    let statement = write_statement(&dir);

    commands::cmd_import(&db_path, &statement, true).await.unwrap();
    commands::cmd_status(&db_path).unwrap();

    let db = fluxo_core::db::Database::new(&db_path.to_string_lossy()).unwrap();
    assert_eq!(db.count_transactions().unwrap(), 2);
}

#[tokio::test]
async fn test_cmd_import_missing_file_fails() {
    let (dir, db_path) = setup();
    let missing = dir.path().join("nope.csv");
    assert!(commands::cmd_import(&db_path, &missing, true).await.is_err());
}
