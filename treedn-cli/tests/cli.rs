use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const LINE_TOPOLOGY: &str = r#"{
    "hosts": { "h1": {}, "h2": {} },
    "switches": {
        "s1": { "p4rt_port": 50001 },
        "s2": { "p4rt_port": 50002 },
        "s3": { "p4rt_port": 50003 }
    },
    "links": [["h2", "s1-p4"], ["s1", "s2"], ["s2", "s3"], ["h1", "s3"]]
}"#;

const INTEREST_A: &str = "ffffffffffff02000000000112341140000141";

fn topology_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(LINE_TOPOLOGY.as_bytes()).unwrap();
    file
}

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("treedn-cli").unwrap();
    cmd.env_remove("TREEDN_TOPOLOGY").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_path_lists_every_hop() {
    let topology = topology_file();
    cli()
        .arg("--topology")
        .arg(topology.path())
        .args(["path", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Path from s1 to content source h1"))
        .stdout(predicate::str::contains("-> s2"))
        .stdout(predicate::str::contains("-> h1 (source)"));
}

#[test]
fn test_path_from_unknown_switch_fails() {
    let topology = topology_file();
    cli()
        .arg("--topology")
        .arg(topology.path())
        .args(["path", "s9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown switch: s9"));
}

#[test]
fn test_topology_summary() {
    let topology = topology_file();
    cli()
        .arg("--topology")
        .arg(topology.path())
        .arg("topology")
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:50002"))
        .stdout(predicate::str::contains("s1:1 <-> s2:1"))
        .stdout(predicate::str::contains("on s1:4"));
}

#[test]
fn test_missing_topology() {
    cli()
        .arg("topology")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No topology given"));
}

#[test]
fn test_frame_interest() {
    cli()
        .args(["frame", "interest", "A"])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", INTEREST_A)));
}

#[test]
fn test_decode_interest() {
    cli()
        .args(["decode", INTEREST_A])
        .assert()
        .success()
        .stdout(predicate::str::contains("Interest"))
        .stdout(predicate::str::contains("'A' (1 bytes)"));
}

#[test]
fn test_decode_data_with_separators() {
    // Data "A" carrying "hi"
    cli()
        .args(["decode", "ff:ff:ff:ff:ff:ff 02:00:00:00:00:01 12:34 12:40:00:01 41 68:69"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Data"))
        .stdout(predicate::str::contains("2 bytes: hi"));
}

#[test]
fn test_decode_foreign_frame() {
    cli()
        .args(["decode", "ffffffffffff0200000000010800450000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ethertype 0x0800"));
}

#[test]
fn test_decode_rejects_bad_hex() {
    cli().args(["decode", "xyz"]).assert().failure();
}
