use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn line_topology() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "hosts": {{ "h1": {{}} }},
            "switches": {{ "s1": {{}}, "s2": {{}}, "s3": {{}}, "s4": {{}} }},
            "links": [["s1", "s2"], ["s2", "s3"], ["h1", "s3"]]
        }}"#
    )
    .unwrap();
    file
}

fn daemon() -> Command {
    let mut cmd = Command::cargo_bin("treedn").unwrap();
    cmd.env_remove("TREEDN_TOPOLOGY")
        .env_remove("TREEDN_SOURCE_HOST")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_injected_interests_build_trees() {
    let topology = line_topology();
    daemon()
        .arg("--topology")
        .arg(topology.path())
        .write_stdin("s1 4 A\n# comment\ns1 7 A\ns2 3 B\ns4 1 C\nbogus line\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("'A'"))
        .stdout(predicate::str::contains("s1 -> [4, 7]"))
        .stdout(predicate::str::contains("'B'"))
        .stdout(predicate::str::contains("s2 -> [3]"))
        .stdout(predicate::str::contains("3 handled, 1 dropped"))
        .stdout(predicate::str::contains("'C'").not());
}

#[test]
fn test_unknown_source_host_drops_interests() {
    let topology = line_topology();
    daemon()
        .arg("--topology")
        .arg(topology.path())
        .args(["--source", "h9"])
        .env("RUST_LOG", "warn")
        .write_stdin("s1 4 A\ns2 3 A\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 received, 0 handled, 2 dropped"))
        .stdout(predicate::str::contains("'A'").not())
        .stderr(predicate::str::contains("unknown host: h9"));
}

#[test]
fn test_requires_a_topology() {
    daemon()
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No topology given"));
}
