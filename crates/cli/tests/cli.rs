use assert_cmd::Command;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("atlas-cli").unwrap();
    cmd.env("ATLAS_ENV", "local")
        .env("ATLAS_CONFIG_DIR", concat!(env!("CARGO_MANIFEST_DIR"), "/../../config"));
    cmd
}

#[test]
fn openapi_lists_every_route() {
    let output = cli().arg("openapi").assert().success().get_output().stdout.clone();
    let doc: serde_json::Value = serde_json::from_slice(&output).unwrap();

    for path in [
        "/register",
        "/login",
        "/books",
        "/books/{book_id}",
        "/books/{book_id}/review",
        "/books/{book_id}/review/{review_id}",
        "/healthz",
    ] {
        assert!(doc["paths"][path].is_object(), "missing {path}");
    }
}

#[test]
fn config_redacts_secret() {
    let output = cli().arg("config").assert().success().get_output().stdout.clone();
    let config: serde_json::Value = serde_json::from_slice(&output).unwrap();

    assert_eq!(config["auth"]["jwt_secret"], "<redacted>");
    assert_eq!(config["environment"], "local");
}

#[test]
fn unknown_subcommand_fails() {
    cli().arg("migrate").assert().failure();
}
