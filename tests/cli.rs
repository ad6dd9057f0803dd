use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg version="1.1" id="Earth" xmlns="http://www.w3.org/2000/svg" width="1000" height="507.209" viewBox="0 0 1000 507.209" xml:space="preserve">
<defs><style type="text/css"><![CDATA[ text { cursor: default; } ]]></style></defs>
<rect class="framexx" id="frame" x="0" y="0" width="1000" height="507.209"/>
<path class="oceanxx" id="ocean" d="M0,0h1000v507.209H0z"/>
<g id="de">
<path class="landxx europe de" id="de-main" d="M10,10h5v5z"/>
</g>
<g id="us">
<path class="landxx north_america us" id="us-main" d="M20,20h5v5z"/>
</g>
</svg>"#;

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("choromap").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("choromap"));
}

#[test]
fn cli_compiles_a_map_from_csv() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("World.svg");
    let data = dir.path().join("data.csv");
    let out = dir.path().join("out.svg");
    fs::write(&template, TEMPLATE).unwrap();
    fs::write(&data, "de,1.5k\nus,200\n").unwrap();

    let mut cmd = Command::cargo_bin("choromap").unwrap();
    cmd.arg(&data)
        .arg("--template")
        .arg(&template)
        .arg("-z")
        .arg(&out)
        .args(["--task", "b:2"]);
    cmd.assert().success();

    let doc = fs::read_to_string(&out).unwrap();
    assert!(doc.starts_with("<?xml"));
    assert!(doc.contains("<g id=\"legend\""));
    assert!(doc.ends_with("</svg>"));
}

#[test]
fn cli_rejects_a_bad_task() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("World.svg");
    let data = dir.path().join("data.csv");
    fs::write(&template, TEMPLATE).unwrap();
    fs::write(&data, "de,1\n").unwrap();

    let mut cmd = Command::cargo_bin("choromap").unwrap();
    cmd.arg(&data)
        .arg("--template")
        .arg(&template)
        .args(["--task", "quartiles"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("task"));
}

#[test]
fn cli_switches_accept_the_usual_truth_words() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("World.svg");
    let data = dir.path().join("data.csv");
    let out = dir.path().join("out.svg");
    fs::write(&template, TEMPLATE).unwrap();
    fs::write(&data, "de,1\nus,2\n").unwrap();

    let mut cmd = Command::cargo_bin("choromap").unwrap();
    cmd.arg(&data)
        .arg("--template")
        .arg(&template)
        .arg("-z")
        .arg(&out)
        .args(["--task", "b:2", "-s", "off", "-y", "YES"]);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("choromap").unwrap();
    cmd.arg(&data)
        .arg("--template")
        .arg(&template)
        .args(["-s", "maybe"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid truth value"));
}

#[test]
fn cli_reports_palette_substitutions() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("World.svg");
    let data = dir.path().join("data.csv");
    let out = dir.path().join("out.svg");
    fs::write(&template, TEMPLATE).unwrap();
    fs::write(&data, "de,1\nus,2\n").unwrap();

    let mut cmd = Command::cargo_bin("choromap").unwrap();
    cmd.arg(&data)
        .arg("--template")
        .arg(&template)
        .arg("-z")
        .arg(&out)
        .args(["--palette", "NoSuchPalette", "--task", "b:2"]);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("warning"));
}
