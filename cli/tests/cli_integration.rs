use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn dsp_validate_bin() -> PathBuf {
    let p = PathBuf::from(env!("CARGO_BIN_EXE_dsp-validate"));
    assert!(p.exists(), "dsp-validate binary not found at {:?}", p);
    p
}

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("lib")
        .join("fixtures")
        .join(path)
}

fn tmp_dir(name: &str) -> PathBuf {
    let mut base = std::env::temp_dir();
    base.push(format!("dsp-validate-cli-{}-{}", name, std::process::id()));
    if base.exists() {
        let _ = fs::remove_dir_all(&base);
    }
    fs::create_dir_all(&base).unwrap();
    base
}

fn run(args: &[&str]) -> Output {
    Command::new(dsp_validate_bin())
        .args(args)
        .env_remove("DSP_VALIDATE_LOG")
        .output()
        .expect("run dsp-validate")
}

#[test]
fn version_is_printed() {
    let out = run(&["version"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("dsp-validate "), "unexpected output: {stdout}");
}

#[test]
fn valid_project_prints_creation_order() {
    let project = fixture("projects/hierarchy.json");
    let out = run(&["check-project", project.to_str().unwrap()]);
    assert!(
        out.status.success(),
        "check-project failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    let book = stdout.find("onto:Book").expect("Book is listed");
    let novel = stdout.find("onto:Novel").expect("Novel is listed");
    let short_novel = stdout.find("onto:ShortNovel").expect("ShortNovel is listed");
    assert!(book < novel && novel < short_novel, "wrong order: {stdout}");
}

#[test]
fn circular_project_fails() {
    let project = fixture("projects/circular.json");
    let out = run(&["check-project", project.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("onto:A -- onto:hasLinkToB --> onto:B"), "{stdout}");
}

#[test]
fn link_graph_is_written_to_file() {
    let dir = tmp_dir("linkgraph");
    let output = dir.join("links.dot");
    let project = fixture("projects/self_loop.json");
    let out = run(&[
        "link-graph",
        project.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    let dot = fs::read_to_string(&output).unwrap();
    assert!(dot.starts_with("digraph"), "not a dot file: {dot}");
    assert!(dot.contains("onto:hasParent"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_xml_file_is_fatal() {
    let out = run(&["validate-data", "does-not-exist.xml"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("does-not-exist.xml"), "{stderr}");
}

#[test]
fn unknown_severity_is_rejected() {
    let xml = fixture("data/valid.xml");
    let out = run(&["validate-data", xml.to_str().unwrap(), "--severity", "loud"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("loud"), "{stderr}");
}

#[test]
fn unreachable_server_is_fatal() {
    let xml = fixture("data/valid.xml");
    let out = run(&[
        "validate-data",
        xml.to_str().unwrap(),
        "--server",
        "http://127.0.0.1:9",
    ]);
    assert_eq!(out.status.code(), Some(1));
}
