//! Integration tests for the label reclassifier.

use std::fs;
use std::path::Path;

use yoloprep::config::ReclassifyConfig;
use yoloprep::reclassify::{reclassify_labels, Reclassifier};

mod common;
use common::{snapshot, write_label};

fn modified(path: &Path) -> std::time::SystemTime {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .expect("read mtime")
}

#[test]
fn matching_file_gets_source_class_rewritten() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let label = temp.path().join("lata_praia_01.txt");
    write_label(&label, "0 0.5 0.5 0.2 0.2\n2 0.1 0.1 0.05 0.05\n");

    let report = reclassify_labels(temp.path(), &ReclassifyConfig::default(), false)
        .expect("reclassify");

    assert_eq!(report.matched, 1);
    assert_eq!(report.corrected, 1);
    assert_eq!(report.lines_rewritten, 1);
    assert_eq!(
        fs::read_to_string(&label).expect("read label"),
        "1 0.5 0.5 0.2 0.2\n2 0.1 0.1 0.05 0.05\n"
    );
}

#[test]
fn second_run_corrects_nothing() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_label(&temp.path().join("Coca_01.txt"), "0 0.5 0.5 0.2 0.2\n0 0.3 0.3 0.1 0.1\n");
    write_label(&temp.path().join("pepsi_02.txt"), "0 0.4 0.4 0.2 0.2\n");

    let config = ReclassifyConfig::default();
    let first = reclassify_labels(temp.path(), &config, false).expect("first run");
    assert_eq!(first.corrected, 2);
    assert_eq!(first.lines_rewritten, 3);
    let after_first = snapshot(temp.path());

    let second = reclassify_labels(temp.path(), &config, false).expect("second run");
    assert_eq!(second.matched, 2);
    assert_eq!(second.corrected, 0);
    assert_eq!(second.already_correct, 2);
    assert_eq!(snapshot(temp.path()), after_first);
}

#[test]
fn non_matching_file_is_never_written() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let bottle = temp.path().join("garrafa_01.txt");
    write_label(&bottle, "0 0.5 0.5 0.2 0.2  \r\n");
    let before = modified(&bottle);

    let report = reclassify_labels(temp.path(), &ReclassifyConfig::default(), false)
        .expect("reclassify");

    assert_eq!(report.scanned, 1);
    assert_eq!(report.matched, 0);
    assert_eq!(modified(&bottle), before);
    assert_eq!(
        fs::read_to_string(&bottle).expect("read label"),
        "0 0.5 0.5 0.2 0.2  \r\n"
    );
}

#[test]
fn already_correct_file_is_not_rewritten() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let label = temp.path().join("soda_can.txt");
    write_label(&label, "1 0.5 0.5 0.2 0.2   \n");
    let before = modified(&label);

    let report = reclassify_labels(temp.path(), &ReclassifyConfig::default(), false)
        .expect("reclassify");

    assert_eq!(report.matched, 1);
    assert_eq!(report.corrected, 0);
    assert_eq!(report.already_correct, 1);
    assert_eq!(modified(&label), before);
    assert_eq!(
        fs::read_to_string(&label).expect("read label"),
        "1 0.5 0.5 0.2 0.2   \n"
    );
}

#[test]
fn nested_label_dirs_are_scanned() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_label(&temp.path().join("a/b/crushed_can.txt"), "0 0.1 0.2 0.3 0.4\n");

    let report = reclassify_labels(temp.path(), &ReclassifyConfig::default(), false)
        .expect("reclassify");

    assert_eq!(report.corrected_files, vec!["a/b/crushed_can.txt"]);
}

#[test]
fn unreadable_file_is_counted_and_scan_continues() {
    let temp = tempfile::tempdir().expect("create temp dir");
    fs::write(temp.path().join("lata_bad.txt"), [0xff, 0xfe, 0x00, 0x30]).expect("write bad");
    write_label(&temp.path().join("lata_good.txt"), "0 0.5 0.5 0.5 0.5\n");

    let report = reclassify_labels(temp.path(), &ReclassifyConfig::default(), false)
        .expect("reclassify");

    assert_eq!(report.matched, 2);
    assert_eq!(report.errors, 1);
    assert_eq!(report.corrected, 1);
    assert_eq!(report.already_correct, 0);
    assert_eq!(report.issues[0].path, Path::new("lata_bad.txt"));
}

#[cfg(unix)]
#[test]
fn dangling_label_symlink_is_counted_and_scan_continues() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let label = temp.path().join("lata_01.txt");
    write_label(&label, "0 0.5 0.5 0.5 0.5\n");
    std::os::unix::fs::symlink(temp.path().join("gone.txt"), temp.path().join("lata_02.txt"))
        .expect("create dangling symlink");

    let report = reclassify_labels(temp.path(), &ReclassifyConfig::default(), false)
        .expect("reclassify");

    assert_eq!(report.scanned, 2);
    assert_eq!(report.errors, 1);
    assert_eq!(report.corrected, 1);
    assert_eq!(report.issues[0].path, Path::new("lata_02.txt"));
    assert_eq!(
        fs::read_to_string(&label).expect("read label"),
        "1 0.5 0.5 0.5 0.5\n"
    );
}

#[test]
fn custom_predicate_and_classes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let label = temp.path().join("img_0001.txt");
    write_label(&label, "3 0.5 0.5 0.2 0.2\n0 0.5 0.5 0.2 0.2\n");
    write_label(&temp.path().join("img_0002.txt"), "3 0.5 0.5 0.2 0.2\n");

    let report = Reclassifier::new(|name: &str| name.ends_with("0001.txt"), 3, 7)
        .run(temp.path())
        .expect("reclassify");

    assert_eq!(report.matched, 1);
    assert_eq!(report.corrected, 1);
    assert_eq!(
        fs::read_to_string(&label).expect("read label"),
        "7 0.5 0.5 0.2 0.2\n0 0.5 0.5 0.2 0.2\n"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("img_0002.txt")).expect("read label"),
        "3 0.5 0.5 0.2 0.2\n"
    );
}

#[test]
fn yaml_config_drives_the_pass() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config_path = temp.path().join("bottles.yaml");
    fs::write(&config_path, "keywords: [garrafa]\nsource_class: 1\ntarget_class: 0\n")
        .expect("write config");
    let labels = temp.path().join("labels");
    write_label(&labels.join("garrafa_9.txt"), "1 0.5 0.5 0.2 0.2\n");
    write_label(&labels.join("lata_9.txt"), "1 0.5 0.5 0.2 0.2\n");

    let config = ReclassifyConfig::from_yaml_file(&config_path).expect("load config");
    let report = reclassify_labels(&labels, &config, false).expect("reclassify");

    assert_eq!(report.corrected_files, vec!["garrafa_9.txt"]);
    assert_eq!(
        fs::read_to_string(labels.join("lata_9.txt")).expect("read label"),
        "1 0.5 0.5 0.2 0.2\n"
    );
}
