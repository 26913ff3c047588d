use std::fs;
use tempfile::tempdir;

#[test]
fn status_reports_missing_sources_as_issues() {
    let tmp = tempdir().expect("tempdir");
    let src = tmp.path().join("src");
    fs::create_dir_all(src.join("Photos_NoBG")).expect("mkdir originals");

    assert_cmd::cargo::cargo_bin_cmd!("atlas-import")
        .current_dir(tmp.path())
        .env("ATLAS_HOME", tmp.path().join("home"))
        .env("ATLAS_CONFIG_PATH", tmp.path().join("home/atlas.toml"))
        .env("ATLAS_SOURCE_ROOT", &src)
        .arg("status")
        .assert()
        .code(2)
        .stdout(predicates::str::contains("E003_SPREADSHEET_MISSING"))
        .stdout(predicates::str::contains("env_overrides="))
        .stdout(predicates::str::contains("ATLAS_SOURCE_ROOT"));
}
