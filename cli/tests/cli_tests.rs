use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Unreachable endpoints: nothing listens on the discard port
const OFFLINE: &str = "http://127.0.0.1:9";

/// `ngsic` with a clean, offline environment
fn ngsic(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ngsic").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("NGSI_SETTINGS")
        .env_remove("NGSI_LOG_DIR")
        .env_remove("BAE_ASSET_IDM_PASSWORD")
        .env_remove("BAE_ASSET_UMBRELLA_KEY")
        .env_remove("BAE_ASSET_UMBRELLA_TOKEN")
        .env("BAE_ASSET_IDM_URL", OFFLINE)
        .env("BAE_ASSET_UMBRELLA_URL", OFFLINE)
        .env("RUST_LOG", "warn");
    cmd
}

fn write_json(dir: &TempDir, name: &str, value: serde_json::Value) -> String {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path.display().to_string()
}

fn write_asset(dir: &TempDir) -> String {
    write_json(
        dir,
        "asset.json",
        json!({
            "id": "asset-1",
            "url": "https://host/a/b/c",
            "provider": "alice",
            "meta_info": {"role": "consumer", "media_type": "application/json"}
        }),
    )
}

fn offering(unit: &str) -> serde_json::Value {
    json!({
        "id": "off-1",
        "productOfferingPrice": [{"priceType": "usage", "unitOfMeasure": unit}]
    })
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    ngsic(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("NGSI asset CLI"))
        .stdout(predicate::str::contains("checkpoint"));
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    ngsic(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ngsic"));
}

#[test]
fn test_config_list_masks_secrets() {
    let dir = TempDir::new().unwrap();
    ngsic(&dir)
        .env("BAE_ASSET_IDM_PASSWORD", "hunter2")
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NGSI Asset Settings"))
        .stdout(predicate::str::contains("Api call"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_config_list_json() {
    let dir = TempDir::new().unwrap();
    let output = ngsic(&dir)
        .args(["config", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["identity"]["url"], OFFLINE);
    assert_eq!(settings["catalog"]["site_url"], "http://localhost:8004");
}

#[test]
fn test_settings_file_is_layered_under_env() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.yaml");
    fs::write(
        &settings,
        "identity:\n  url: http://idm.from-file:5000\n  user: bae\ncatalog:\n  site_url: https://market.example.org\n",
    )
    .unwrap();

    ngsic(&dir)
        .arg("--settings")
        .arg(&settings)
        .args(["config", "get", "catalog.site_url", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://market.example.org"));

    // The environment still wins over the file
    ngsic(&dir)
        .arg("--settings")
        .arg(&settings)
        .args(["config", "get", "identity.url", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(OFFLINE));
}

#[test]
fn test_invalid_settings_file() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.yaml");
    fs::write(&settings, "units: []\n").unwrap();

    ngsic(&dir)
        .arg("--settings")
        .arg(&settings)
        .args(["config", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage unit"));
}

#[test]
fn test_config_get_unknown_key() {
    let dir = TempDir::new().unwrap();
    ngsic(&dir)
        .args(["config", "get", "identity.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("identity.nope"));
}

#[test]
fn test_health_reports_offline_authorities() {
    let dir = TempDir::new().unwrap();
    ngsic(&dir)
        .args(["health", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"degraded\""))
        .stdout(predicate::str::contains("\"offline\""));
}

#[test]
fn test_resolve_root_url_is_unsupported() {
    let dir = TempDir::new().unwrap();
    ngsic(&dir)
        .args(["resolve", "https://host/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_resolve_with_unreachable_gateway() {
    let dir = TempDir::new().unwrap();
    ngsic(&dir)
        .args(["resolve", "https://host/a/b/c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not responding"));
}

#[test]
fn test_offering_validation_accepts_supported_unit() {
    let dir = TempDir::new().unwrap();
    let asset = write_asset(&dir);
    let offering = write_json(&dir, "offering.json", offering("API CALL"));

    ngsic(&dir)
        .args(["checkpoint", "offering-validation", "--asset", asset.as_str()])
        .args(["--offering", offering.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("offering-validation passed"));
}

#[test]
fn test_offering_validation_rejects_unsupported_unit() {
    let dir = TempDir::new().unwrap();
    let asset = write_asset(&dir);
    let offering = write_json(&dir, "offering.json", offering("megabyte"));

    ngsic(&dir)
        .args(["checkpoint", "offering-validation", "--asset", asset.as_str()])
        .args(["--offering", offering.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported accounting unit megabyte"))
        .stderr(predicate::str::contains("api call"));
}

#[test]
fn test_checkpoint_requires_its_record() {
    let dir = TempDir::new().unwrap();
    let asset = write_asset(&dir);

    ngsic(&dir)
        .args(["checkpoint", "acquisition", "--asset", asset.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--order is required"));
}

#[test]
fn test_spec_attachment_without_catalog_leaves_asset_untouched() {
    let dir = TempDir::new().unwrap();
    let asset = write_asset(&dir);
    let before = fs::read_to_string(&asset).unwrap();
    let product = write_json(&dir, "product.json", json!({"id": "prod-1", "name": "Parking"}));

    ngsic(&dir)
        .args(["checkpoint", "spec-attachment", "--asset", asset.as_str()])
        .args(["--product", product.as_str()])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&asset).unwrap(), before);
}

#[test]
fn test_suspension_of_unbound_asset() {
    let dir = TempDir::new().unwrap();
    let asset = write_asset(&dir);
    let order = write_json(&dir, "order.json", json!({"id": "order-1", "customer": "cust1"}));

    ngsic(&dir)
        .args(["checkpoint", "suspension", "--asset", asset.as_str()])
        .args(["--order", order.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("suspension passed"));
}

#[test]
fn test_unknown_checkpoint() {
    let dir = TempDir::new().unwrap();
    ngsic(&dir)
        .args(["checkpoint", "publication", "--asset", "asset.json"])
        .assert()
        .failure();
}
