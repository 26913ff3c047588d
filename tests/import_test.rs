use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn put(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, bytes).expect("write");
}

fn seed_sources(src: &Path) {
    put(&src.join("Photos_NoBG/Africa/Vase 1.png"), b"vase-one");
    put(&src.join("Photos_NoBG/Africa/zz_dupe.png"), b"vase-one");
    put(&src.join("Photos_NoBG/Americas/jar.jpg"), b"jar");
    put(&src.join("Photos_NoBG/Europe/orphan.png"), b"orphan");
    put(&src.join("Depth/train/vase 1.png"), b"depth-1");
    put(&src.join("Depth/test/jar.png"), b"depth-jar");
    put(&src.join("Parts/neck/vase 1.png"), b"neck-1");
    put(
        &src.join("web_database.csv"),
        b"filename,region,x,y\nVase 1.png,Europe,12.5,-4\n",
    );
}

fn atlas_cmd(tmp: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("atlas-import");
    cmd.current_dir(tmp)
        .env("ATLAS_HOME", tmp.join("home"))
        .env("ATLAS_CONFIG_PATH", tmp.join("home/atlas.toml"))
        .env("ATLAS_SOURCE_ROOT", tmp.join("src"))
        .env("ATLAS_PROJECT_ROOT", tmp.join("site"));
    cmd
}

#[test]
fn import_builds_manifest_and_destination_tree() {
    let tmp = tempdir().expect("tempdir");
    seed_sources(&tmp.path().join("src"));

    atlas_cmd(tmp.path())
        .arg("import")
        .assert()
        .success()
        .stdout(predicates::str::contains("scanned=4"))
        .stdout(predicates::str::contains("accepted=2"))
        .stdout(predicates::str::contains("rejected_duplicate=1"))
        .stdout(predicates::str::contains("rejected_no_depth=1"));

    let site = tmp.path().join("site");
    let raw = fs::read_to_string(site.join("frontend_master_db.json")).expect("manifest");
    let manifest: Value = serde_json::from_str(&raw).expect("json");
    let entries = manifest.as_array().expect("array");
    assert_eq!(entries.len(), 2);

    let vase = &entries[0];
    assert_eq!(vase["id"], "Europe_Africa_Vase_1");
    assert_eq!(vase["region"], "Europe");
    assert_eq!(vase["period"], "Unknown");
    assert_eq!(vase["globe_coordinates"]["x"], 12.5);
    assert_eq!(
        vase["assets"]["parts"]["neck"],
        "/assets/images/parts/neck/Europe_Africa_Vase_1.png"
    );
    assert_eq!(vase["assets"]["parts"]["body"], "");

    let jar = &entries[1];
    assert_eq!(jar["id"], "Americas_Americas_jar");
    assert_eq!(jar["region"], "Americas");
    assert_eq!(jar["assets"]["image_url"], "/assets/images/original/Americas_Americas_jar.jpg");
    assert_eq!(jar["assets"]["depth_url"], "/assets/images/depth/Americas_Americas_jar.png");
    assert_eq!(jar["assets"]["parts"]["base"], "");

    let images = site.join("public/assets/images");
    assert!(images.join("original/Europe_Africa_Vase_1.png").is_file());
    assert!(images.join("depth/Americas_Americas_jar.png").is_file());
    assert!(images.join("parts/neck/Europe_Africa_Vase_1.png").is_file());
    assert!(images.join("parts/base").is_dir());

    let audit = fs::read_to_string(site.join(".atlas/logs/audit.log")).expect("audit");
    assert!(audit.contains("accepted=2"));
}

#[test]
fn repeated_import_is_byte_identical() {
    let tmp = tempdir().expect("tempdir");
    seed_sources(&tmp.path().join("src"));
    let manifest = tmp.path().join("site/frontend_master_db.json");

    atlas_cmd(tmp.path()).arg("import").assert().success();
    let first = fs::read(&manifest).expect("first");
    atlas_cmd(tmp.path()).arg("import").assert().success();
    assert_eq!(fs::read(&manifest).expect("second"), first);

    atlas_cmd(tmp.path()).arg("verify").assert().success();
}

#[test]
fn missing_spreadsheet_fails_without_touching_destination() {
    let tmp = tempdir().expect("tempdir");
    let src = tmp.path().join("src");
    seed_sources(&src);
    fs::remove_file(src.join("web_database.csv")).expect("remove csv");
    let stale = tmp.path().join("site/public/assets/images/original/stale.png");
    put(&stale, b"old");

    atlas_cmd(tmp.path())
        .arg("import")
        .assert()
        .code(1)
        .stderr(predicates::str::contains("metadata spreadsheet not found"));

    assert!(stale.is_file());
    assert!(!tmp.path().join("site/frontend_master_db.json").exists());
}

#[test]
fn dry_run_reports_without_writing() {
    let tmp = tempdir().expect("tempdir");
    seed_sources(&tmp.path().join("src"));

    atlas_cmd(tmp.path())
        .args(["import", "--dry-run", "--json"])
        .assert()
        .success()
        .stdout(predicates::str::contains("\"accepted=2\""));

    assert!(!tmp.path().join("site/frontend_master_db.json").exists());
    assert!(!tmp.path().join("site/public").exists());
}

#[test]
fn strict_rows_rejects_bad_coordinates() {
    let tmp = tempdir().expect("tempdir");
    let src = tmp.path().join("src");
    seed_sources(&src);
    put(
        &src.join("web_database.csv"),
        b"filename,region,x,y\nVase 1.png,Europe,north,-4\n",
    );

    atlas_cmd(tmp.path())
        .args(["import", "--strict-rows"])
        .assert()
        .code(1)
        .stderr(predicates::str::contains("invalid spreadsheet row 2"));

    // Lenient default keeps the row at the origin.
    atlas_cmd(tmp.path()).arg("import").assert().success();
    let raw = fs::read_to_string(tmp.path().join("site/frontend_master_db.json"))
        .expect("manifest");
    let manifest: Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(manifest[0]["region"], "Europe");
    assert_eq!(manifest[0]["globe_coordinates"]["x"], 0.0);
}
