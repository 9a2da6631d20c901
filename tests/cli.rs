use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn conta(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("conta-certa").unwrap();
    cmd.env("CONTA_CERTA_DATA_DIR", data_dir.path())
        .env_remove("CONTA_CERTA_LOG");
    cmd
}

/// Run a command expected to succeed and return its envelope's `data`
fn ok(data_dir: &TempDir, args: &[&str]) -> Value {
    let output = conta(data_dir).args(args).assert().success().get_output().clone();
    let envelope: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["success"], true, "{:?}", args);
    envelope["data"].clone()
}

/// Run a command expected to fail and return its envelope's `error`
fn fails(data_dir: &TempDir, args: &[&str]) -> Value {
    let output = conta(data_dir).args(args).assert().failure().get_output().clone();
    let envelope: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["success"], false, "{:?}", args);
    envelope["error"].clone()
}

fn add_client(data_dir: &TempDir, name: &str) -> Value {
    ok(
        data_dir,
        &[
            "client", "save", "--name", name, "--cpf", "12345678901", "--phone",
            "11999998888", "--fee", "150.00", "--due-day", "10",
        ],
    )
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    conta(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("JSON envelope"));
}

#[test]
fn test_client_save_show_and_list() {
    let dir = TempDir::new().unwrap();
    let client = add_client(&dir, "Ana Souza");
    assert_eq!(client["id"], 1);
    assert_eq!(client["fee"], 15000);
    assert_eq!(client["feeDueDay"], 10);

    let shown = ok(&dir, &["client", "show", "1"]);
    assert_eq!(shown["name"], "Ana Souza");

    let listed = ok(&dir, &["client", "list", "--filter", "ana"]);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    assert_eq!(ok(&dir, &["client", "count"]), 1);
}

#[test]
fn test_client_update_keeps_other_fields() {
    let dir = TempDir::new().unwrap();
    add_client(&dir, "Ana Souza");

    let updated = ok(&dir, &["client", "save", "--id", "1", "--fee", "180.00"]);
    assert_eq!(updated["fee"], 18000);
    assert_eq!(updated["name"], "Ana Souza");
    assert_eq!(updated["cpf"], "12345678901");
}

#[test]
fn test_invalid_phone_is_rejected() {
    let dir = TempDir::new().unwrap();
    let error = fails(
        &dir,
        &["client", "save", "--name", "Ana", "--cpf", "12345678901", "--phone", "123"],
    );
    assert_eq!(error["code"], "CLIENT.INVALID_PHONE");
    assert_eq!(error["status"], 400);
    assert_eq!(error["params"]["field"], "phone");
}

#[test]
fn test_missing_client_is_not_found() {
    let dir = TempDir::new().unwrap();
    let error = fails(&dir, &["client", "show", "99"]);
    assert_eq!(error["code"], "CLIENT.CLIENT_NOT_FOUND");
    assert_eq!(error["status"], 404);
}

#[test]
fn test_billing_total_and_delete_conflict() {
    let dir = TempDir::new().unwrap();
    add_client(&dir, "Ana Souza");
    ok(&dir, &["service", "save", "--name", "Consultoria", "--value", "50.00"]);

    let saved = ok(
        &dir,
        &["billing", "save", "--client", "1", "--due-date", "2025-03-10", "--item", "1:2"],
    );
    assert_eq!(saved["fee"], 15000);
    assert_eq!(saved["yearMonth"], "2025-3");

    let shown = ok(&dir, &["billing", "show", "1"]);
    assert_eq!(shown["totalFee"], 25000);
    assert_eq!(shown["client"]["name"], "Ana Souza");
    assert_eq!(shown["serviceBillings"][0]["quantity"], 2);

    let error = fails(&dir, &["client", "delete", "1"]);
    assert_eq!(error["code"], "CLIENT.HAS_BILLINGS");
    assert_eq!(error["status"], 409);
}

#[test]
fn test_paid_billing_needs_payment_date() {
    let dir = TempDir::new().unwrap();
    add_client(&dir, "Ana Souza");

    let error = fails(
        &dir,
        &["billing", "save", "--client", "1", "--due-date", "2025-03-10", "--status", "paid"],
    );
    assert_eq!(error["code"], "BILLING.INVALID_PAID_AT");
}

#[test]
fn test_auto_billing_is_idempotent() {
    let dir = TempDir::new().unwrap();
    add_client(&dir, "Ana Souza");

    let first = ok(&dir, &["auto-billing"]);
    assert_eq!(first["created"], 1);

    let second = ok(&dir, &["auto-billing"]);
    assert_eq!(second["created"], 0);
    assert_eq!(second["skipped"], 1);
}

#[test]
fn test_backup_create_list_restore() {
    let dir = TempDir::new().unwrap();
    add_client(&dir, "Ana Souza");

    let backup = ok(&dir, &["backup", "create"]);
    let file_name = backup["fileName"].as_str().unwrap().to_string();
    assert!(file_name.starts_with("backup-") && file_name.ends_with(".json.gz"));
    assert_eq!(backup["version"], "1.0");
    assert_eq!(backup["hash"].as_str().map(str::len), Some(64));

    add_client(&dir, "Bruno Lima");
    assert_eq!(ok(&dir, &["client", "count"]), 2);

    let listed = ok(&dir, &["backup", "list"]);
    assert_eq!(listed[0]["fileName"], file_name.as_str());

    ok(&dir, &["backup", "restore", &file_name]);
    assert_eq!(ok(&dir, &["client", "count"]), 1);

    let error = fails(&dir, &["backup", "restore", "../settings.json"]);
    assert_eq!(error["code"], "BACKUP.INVALID_FILE_NAME");
}

#[test]
fn test_import_streams_json_lines() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("clientes.csv");
    std::fs::write(
        &csv,
        "Nome;CPF;Telefone;Mensalidade\n\
         Ana Souza;123.456.789-01;(11) 99999-8888;150,00\n\
         Sem Documento;;11988887777;10,00\n",
    )
    .unwrap();

    let output = conta(&dir)
        .arg("import")
        .arg(&csv)
        .assert()
        .success()
        .get_output()
        .clone();

    let events: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["data"]["outcome"], "imported");
    assert_eq!(events[1]["data"]["code"], "CLIENT.NO_DOCUMENT_PROVIDED");
    assert_eq!(events[2]["event"], "finished");
    assert_eq!(events[2]["data"]["imported"], 1);
}

#[test]
fn test_import_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let error = fails(&dir, &["import", "/definitely/not/here.csv"]);
    assert_eq!(error["status"], 500);
}

#[test]
fn test_settings_set_and_show() {
    let dir = TempDir::new().unwrap();
    let defaults = ok(&dir, &["settings", "show"]);
    assert_eq!(defaults["theme"], "dark");
    assert_eq!(defaults["language"], "pt-BR");

    let updated = ok(
        &dir,
        &["settings", "set", "--theme", "light", "--auto-backup", "false"],
    );
    assert_eq!(updated["theme"], "light");
    assert_eq!(updated["autoBackup"], false);
    assert_eq!(updated["autoBilling"], true);

    assert_eq!(ok(&dir, &["settings", "show"])["theme"], "light");
}

#[test]
fn test_startup_writes_billing_and_backup() {
    let dir = TempDir::new().unwrap();
    add_client(&dir, "Ana Souza");

    let report = ok(&dir, &["startup"]);
    assert_eq!(report["autoBilling"]["created"], 1);
    assert!(report["backup"]["fileName"].is_string());
    assert!(dir.path().join("backups").read_dir().unwrap().next().is_some());
}

#[test]
fn test_config_shows_paths() {
    let dir = TempDir::new().unwrap();
    let paths = ok(&dir, &["config"]);
    assert!(paths["dataDir"].as_str().unwrap().ends_with("data"));
}
