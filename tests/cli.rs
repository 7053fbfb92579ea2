use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TRAIN_DOC: &str = "data/english/annotations/nw/wsj/00/wsj_0001";
const UNNAMED_DOC: &str = "data/english/annotations/nw/wsj/00/wsj_0002";
const DEV_DOC: &str = "data/english/annotations/nw/wsj/01/wsj_0101";
const TEST_DOC: &str = "data/english/annotations/nw/wsj/02/wsj_0201";

fn temp_workspace() -> TempDir {
    tempfile::tempdir().expect("create tempdir")
}

fn row(doc: &str, word: &str, tag: &str) -> String {
    format!("{doc}   0   0   {word}   NNP   (TOP*)   -   -   -   Speaker#1   {tag}   *   -\n")
}

fn write_document(root: &Path, split: &str, id: &str, body: &str) {
    let short = id.trim_start_matches("data/english/annotations/");
    let path = root
        .join("conll-2012/v4/data")
        .join(split)
        .join(format!("{id}.gold_conll"));
    fs::create_dir_all(path.parent().unwrap()).expect("create corpus dirs");
    let text = format!("#begin document ({short}); part 000\n{body}\n#end document\n");
    fs::write(path, text).expect("write document");
}

fn build_corpus(workspace: &Path) {
    let root = workspace.join("corpus");
    let train_body = [
        row("nw/wsj/00/wsj_0001", "Japan", "(GPE)"),
        "\n".to_string(),
        row("nw/wsj/00/wsj_0001", "Paris", "(GPE*"),
        row("nw/wsj/00/wsj_0001", "is", "*"),
        row("nw/wsj/00/wsj_0001", "beautiful", "*)"),
    ]
    .concat();
    write_document(&root, "train", TRAIN_DOC, &train_body);
    write_document(
        &root,
        "train",
        UNNAMED_DOC,
        &row("nw/wsj/00/wsj_0002", "ignored", "*"),
    );
    let dev_body = [
        row("nw/wsj/01/wsj_0101", "/said", "*"),
        row("nw/wsj/01/wsj_0101", "stray", "*)"),
    ]
    .concat();
    write_document(&root, "development", DEV_DOC, &dev_body);
    write_document(
        &root,
        "conll-2012-test",
        TEST_DOC,
        &row("nw/wsj/02/wsj_0201", "%uh", "*"),
    );
    write_document(
        &root,
        "test",
        TEST_DOC,
        &row("nw/wsj/02/wsj_0201", "excluded", "*"),
    );

    let stray = root.join("conll-2012/v4/data/train/english/stray.gold_conll");
    fs::create_dir_all(stray.parent().unwrap()).expect("create stray dir");
    fs::write(&stray, row("stray", "stray", "*")).expect("write stray file");

    let lists = workspace.join("lists");
    fs::create_dir_all(&lists).expect("create lists dir");
    fs::write(
        lists.join("names.list"),
        format!("{TRAIN_DOC}\n{DEV_DOC}\n{TEST_DOC}\n"),
    )
    .expect("names");
    fs::write(
        lists.join("english-ontonotes-5.0-train-document-ids.txt"),
        format!("{TRAIN_DOC}\n{UNNAMED_DOC}\n"),
    )
    .expect("train ids");
    fs::write(
        lists.join("english-ontonotes-5.0-development-document-ids.txt"),
        format!("{DEV_DOC}\n"),
    )
    .expect("dev ids");
    fs::write(
        lists.join("english-ontonotes-5.0-conll-2012-test-document-ids.txt"),
        format!("\n{TEST_DOC}\n\n"),
    )
    .expect("test ids");
}

fn ontonotes(workspace: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nerconv").expect("binary exists");
    cmd.current_dir(workspace).args([
        "--quiet",
        "ontonotes",
        "corpus",
        "--output",
        "iob2",
        "--lists-dir",
        "lists",
        "--no-progress",
    ]);
    cmd
}

#[test]
fn ontonotes_conversion_routes_partitions() {
    let workspace = temp_workspace();
    build_corpus(workspace.path());

    let output = ontonotes(workspace.path())
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let summary: Value = serde_json::from_slice(&output).expect("summary is valid JSON");
    assert_eq!(summary["files_converted"], 3);
    assert_eq!(summary["not_named"], 1);
    assert_eq!(summary["span_anomalies"], 1);
    assert_eq!(summary["path_anomalies"], 1);
    assert_eq!(summary["train"]["tokens"], 4);

    let out = workspace.path().join("iob2");
    let train = fs::read_to_string(out.join("eng.train")).expect("read eng.train");
    assert_eq!(
        train,
        "#begin document (nw/wsj/00/wsj_0001); part 000\n\n\
         Japan\tB-GPE\n\nParis\tB-GPE\nis\tI-GPE\nbeautiful\tI-GPE\n\n"
    );
    let dev = fs::read_to_string(out.join("eng.dev")).expect("read eng.dev");
    assert_eq!(
        dev,
        "#begin document (nw/wsj/01/wsj_0101); part 000\n\nsaid\tO\nstray\tO\n\n"
    );
    let test = fs::read_to_string(out.join("eng.test")).expect("read eng.test");
    assert_eq!(
        test,
        "#begin document (nw/wsj/02/wsj_0201); part 000\n\nuh\tO\n\n"
    );
    assert!(!train.contains("ignored"));
    assert!(!test.contains("excluded"));
}

#[test]
fn ontonotes_rerun_truncates_by_default() {
    let workspace = temp_workspace();
    build_corpus(workspace.path());
    ontonotes(workspace.path())
        .assert()
        .success()
        .stdout(contains("anomalies: 1 path"));
    ontonotes(workspace.path()).assert().success();
    let test = fs::read_to_string(workspace.path().join("iob2/eng.test")).expect("read eng.test");
    assert_eq!(test.matches("#begin document").count(), 1);

    ontonotes(workspace.path()).arg("--append").assert().success();
    let test = fs::read_to_string(workspace.path().join("iob2/eng.test")).expect("read eng.test");
    assert_eq!(test.matches("#begin document").count(), 2);
}

#[test]
fn ontonotes_strict_fails_on_stray_close() {
    let workspace = temp_workspace();
    build_corpus(workspace.path());
    ontonotes(workspace.path())
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("none was open"));
}

#[test]
fn ontonotes_rejects_identical_paths() {
    let workspace = temp_workspace();
    build_corpus(workspace.path());
    let mut cmd = Command::cargo_bin("nerconv").expect("binary exists");
    cmd.current_dir(workspace.path())
        .args([
            "--quiet",
            "ontonotes",
            "corpus",
            "-o",
            "corpus",
            "--lists-dir",
            "lists",
        ])
        .assert()
        .failure()
        .stderr(contains("must be different"));
}

#[test]
fn ontonotes_fails_on_missing_list() {
    let workspace = temp_workspace();
    build_corpus(workspace.path());
    fs::remove_file(workspace.path().join("lists/names.list")).expect("remove names.list");
    ontonotes(workspace.path())
        .assert()
        .failure()
        .stderr(contains("names.list"));
    assert!(!workspace.path().join("iob2").exists());
}

#[test]
fn conll2003_repairs_iob1_tags() {
    let workspace = temp_workspace();
    let input = workspace.path().join("eng.train");
    fs::write(
        &input,
        "-DOCSTART- -X- O O\n\nEU NNP I-NP I-ORG\nrejects VBZ I-VP O\nGerman JJ I-NP I-MISC\n\
         Peter NNP I-NP I-PER\nBlackburn NNP I-NP I-PER\n",
    )
    .expect("write input");

    let mut cmd = Command::cargo_bin("nerconv").expect("binary exists");
    cmd.current_dir(workspace.path())
        .args(["--quiet", "conll2003", "eng.train", "-o", "iob2/eng.train"])
        .assert()
        .success()
        .stdout(contains("5 tokens"));

    let converted =
        fs::read_to_string(workspace.path().join("iob2/eng.train")).expect("read output");
    assert_eq!(
        converted,
        "-DOCSTART- -X- O O\n\nEU\tB-ORG\nrejects\tO\nGerman\tB-MISC\nPeter\tB-PER\nBlackburn\tI-PER\n"
    );
}

#[test]
fn names_lists_annotated_documents() {
    let workspace = temp_workspace();
    let annotations = workspace
        .path()
        .join("ontonotes-release-5.0/data/files/data/english/annotations/nw/wsj/00");
    fs::create_dir_all(&annotations).expect("create annotations");
    fs::write(annotations.join("wsj_0001.name"), "").expect("write name");
    fs::write(annotations.join("wsj_0001.parse"), "").expect("write parse");
    fs::write(annotations.join("wsj_0002.name"), "").expect("write name");

    let mut cmd = Command::cargo_bin("nerconv").expect("binary exists");
    cmd.current_dir(workspace.path())
        .args(["--quiet", "names", "ontonotes-release-5.0", "-o", "lists"])
        .assert()
        .success()
        .stdout(contains("2 document ids"));

    let listed = fs::read_to_string(workspace.path().join("lists/names.list")).expect("read list");
    assert_eq!(
        listed,
        "data/english/annotations/nw/wsj/00/wsj_0001\ndata/english/annotations/nw/wsj/00/wsj_0002\n"
    );
}
