use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

fn dw_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_dw"))
}

/// openFDA stand-in that honors the `decision_date:[from+TO+to]` clause
/// of the search expression plus `limit` / `skip`.
async fn pma(
    State(records): State<Arc<Vec<Value>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let search = params.get("search").cloned().unwrap_or_default();
    let window = search
        .split("decision_date:[")
        .nth(1)
        .and_then(|rest| rest.split(']').next())
        .and_then(|range| range.split_once("+TO+"))
        .map(|(from, to)| (from.to_string(), to.to_string()));
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(1);
    let skip: usize = params.get("skip").and_then(|v| v.parse().ok()).unwrap_or(0);

    let results: Vec<Value> = records
        .iter()
        .filter(|r| match &window {
            Some((from, to)) => {
                let date = r["decision_date"].as_str().unwrap_or_default();
                date >= from.as_str() && date <= to.as_str()
            }
            None => true,
        })
        .skip(skip)
        .take(limit)
        .cloned()
        .collect();

    Json(json!({ "results": results }))
}

fn spawn_mock(records: Vec<Value>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    let records = Arc::new(records);

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            let app = Router::new()
                .route("/device/pma.json", get(pma))
                .with_state(records);
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{}/device/pma.json", addr)
}

fn approval(pma: &str, supp: &str, date: &str, trade: &str) -> Value {
    json!({
        "pma_number": pma,
        "supplement_number": supp,
        "supplement_type": if supp.is_empty() { "" } else { "Real-Time Process" },
        "applicant": "Medtronic, Inc.",
        "trade_name": trade,
        "generic_name": "Implantable Pacemaker Pulse-Generator",
        "product_code": "PNJ",
        "decision_code": "APPR",
        "decision_date": date,
    })
}

/// Six results over three years; the last two share an identity.
fn fixture() -> Vec<Value> {
    vec![
        approval("P150033", "", "2021-03-04", "Micra"),
        approval("P150033", "S001", "2021-07-08", "Micra"),
        approval("P150033", "S002", "2022-02-03", "Micra"),
        approval("P200001", "", "2022-09-10", "Azure"),
        approval("P200001", "S001", "2023-01-15", "Azure"),
        approval("P200001", "S001", "2023-01-15", "Azure XT"),
    ]
}

fn setup_test_env(endpoint: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/dw.sqlite"

[openfda]
endpoint = "{}"
page_size = 2
max_records = 100
page_delay_ms = 0
timeout_secs = 5

[watchlist]
brands = ["Micra", "Azure"]

[log]
level = "warn"
"#,
        root.display(),
        endpoint
    );

    let config_path = config_dir.join("dw.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_dw(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = dw_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("OPENFDA_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run dw binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn sync_all(config_path: &Path) -> (String, String, bool) {
    run_dw(
        config_path,
        &["sync", "--from", "2021-01-01", "--to", "2023-12-31"],
    )
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9/device/pma.json");

    let (stdout, stderr, success) = run_dw(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/dw.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/device/pma.json");

    let (_, _, success1) = run_dw(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_dw(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_sync_populates_cache() {
    let endpoint = spawn_mock(fixture());
    let (_tmp, config_path) = setup_test_env(&endpoint);

    run_dw(&config_path, &["init"]);
    let (stdout, stderr, success) = sync_all(&config_path);
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("chunk 2021-01-01..2021-12-31: fetched 2, added 2"));
    assert!(stdout.contains("chunk 2022-01-01..2022-12-31: fetched 2, added 2"));
    assert!(stdout.contains("chunk 2023-01-01..2023-12-31: fetched 2, added 1"));
    assert!(stdout.contains("added: 5 rows"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_sync_twice_adds_nothing() {
    let endpoint = spawn_mock(fixture());
    let (_tmp, config_path) = setup_test_env(&endpoint);

    let (stdout1, _, _) = sync_all(&config_path);
    assert!(stdout1.contains("added: 5 rows"), "got: {}", stdout1);

    let (stdout2, _, success) = sync_all(&config_path);
    assert!(success);
    assert!(stdout2.contains("fetched: 6 records"));
    assert!(stdout2.contains("added: 0 rows"), "got: {}", stdout2);
}

#[test]
fn test_sync_dry_run_does_not_fetch() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/device/pma.json");

    let (stdout, stderr, success) = run_dw(
        &config_path,
        &[
            "sync",
            "--from",
            "2022-06-01",
            "--to",
            "2023-03-31",
            "--product-code",
            "pnj",
            "--dry-run",
        ],
    );
    assert!(success, "dry-run failed: {}", stderr);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains(
        "chunk 2022-06-01..2022-12-31: decision_code:APPR AND decision_date:[2022-06-01+TO+2022-12-31] \
         AND (trade_name:\"Micra\" OR trade_name:\"Azure\") AND (product_code:PNJ)"
    ));
    assert!(stdout.contains("chunk 2023-01-01..2023-03-31"));
}

#[test]
fn test_sync_rejects_inverted_range() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/device/pma.json");

    let (_, stderr, success) = run_dw(
        &config_path,
        &["sync", "--from", "2024-01-01", "--to", "2023-01-01"],
    );
    assert!(!success);
    assert!(stderr.contains("after end"), "stderr: {}", stderr);
}

#[test]
fn test_stats_reports_years() {
    let endpoint = spawn_mock(fixture());
    let (_tmp, config_path) = setup_test_env(&endpoint);

    sync_all(&config_path);
    let (stdout, stderr, success) = run_dw(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Rows:         5"), "got: {}", stdout);
    assert!(stdout.contains("Supplements:  3"));
    assert!(stdout.contains("2021"));
    assert!(stdout.contains("2023"));
}

#[test]
fn test_export_filters_view() {
    let endpoint = spawn_mock(fixture());
    let (tmp, config_path) = setup_test_env(&endpoint);

    sync_all(&config_path);

    let (stdout, stderr, success) = run_dw(&config_path, &["export", "--from-year", "2022"]);
    assert!(success, "export failed: {}", stderr);
    let data: Value = serde_json::from_str(&stdout).unwrap();
    let rows = data["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["pma_number"], "P200001");
    assert_eq!(rows[0]["year"], 2022);
    assert_eq!(rows[0]["is_supplement"], false);

    let out = tmp.path().join("out/approvals.json");
    let (_, stderr, success) = run_dw(
        &config_path,
        &[
            "export",
            "--include-supplements",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(success, "export to file failed: {}", stderr);
    let data: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(data["rows"].as_array().unwrap().len(), 5);
    assert_eq!(data["by_year"].as_array().unwrap().len(), 3);
}

#[test]
fn test_export_empty_cache() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9/device/pma.json");

    let (stdout, _, success) = run_dw(&config_path, &["export"]);
    assert!(success);
    let data: Value = serde_json::from_str(&stdout).unwrap();
    assert!(data["rows"].as_array().unwrap().is_empty());
}
