mod common;

use camino::Utf8PathBuf;

use bi_data::app::App;
use bi_data::dataset::Dataset;
use bi_data::domain::{DatasetKind, Selection, SubjectId};
use bi_data::output::JsonOutput;
use bi_data::store::Store;

use common::{MockZenodo, manifest, run_file};

fn app(temp: &tempfile::TempDir) -> App<MockZenodo> {
    let client = MockZenodo::default().with_archive(
        "https://zenodo.org/record/2644077/files/subject1.zip",
        &[
            (
                "subject1/meta.yml",
                manifest(&[
                    ("Subject1_Session1_1.gdf", "nonadaptive", "training"),
                    ("Subject1_Session1_2.gdf", "nonadaptive", "online"),
                ]),
            ),
            ("subject1/Session1/Subject1_Session1_1.mat", run_file(128)),
            ("subject1/Session1/Subject1_Session1_2.mat", run_file(128)),
        ],
    );
    let root = Utf8PathBuf::from_path_buf(temp.path().join("cache")).unwrap();
    let dataset = Dataset::new(
        DatasetKind::BrainInvaders,
        Selection::default(),
        Store::new_with_root(root),
    );
    App::new(dataset, client)
}

fn subjects(numbers: &[u32]) -> Vec<SubjectId> {
    numbers.iter().map(|n| SubjectId::new(*n).unwrap()).collect()
}

#[test]
fn fetch_keeps_going_after_a_failing_subject() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(&temp);

    let result = app.fetch(&subjects(&[1, 2]), &JsonOutput);
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].action, "extracted");
    assert!(result.items[0].directory.as_ref().unwrap().ends_with("subject_01"));
    assert_eq!(result.items[1].action, "error");
    assert!(result.items[1].error.as_ref().unwrap().contains("404"));
    assert_eq!(result.failures(), 1);

    let again = app.fetch(&subjects(&[1]), &JsonOutput);
    assert_eq!(again.items[0].action, "cache");
}

#[test]
fn runs_serialize_with_session_keys() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(&temp);

    let result = app.runs(1, &JsonOutput).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["dataset"], "braininvaders");
    assert_eq!(json["subject"], 1);
    let files = json["sessions"]["session_1"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].as_str().unwrap().ends_with("Subject1_Session1_1.mat"));
}

#[test]
fn info_summarizes_loaded_runs() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(&temp);

    let info = app.info(1, &JsonOutput).unwrap();
    assert_eq!(info.sessions.len(), 1);
    let run = &info.sessions[0].runs[0];
    assert_eq!(run.run.to_string(), "run_1");
    assert_eq!(run.samples, 128);
    assert_eq!(run.channels, 17);
    assert_eq!(run.duration_secs, 0.25);
    assert_eq!(run.events.target, 1);
    assert_eq!(run.events.non_target, 1);
}

#[test]
fn list_and_clear_cached_archives() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(&temp);
    app.fetch(&subjects(&[1]), &JsonOutput);

    let listed = app.list(&JsonOutput).unwrap();
    assert_eq!(listed.archives.len(), 1);
    assert_eq!(listed.archives[0].archive, "subject1.zip");
    assert_eq!(listed.archives[0].namespace, "BRAININVADERS");

    let cleared = app.clear(&JsonOutput).unwrap();
    assert!(cleared.cleared);
    assert!(app.list(&JsonOutput).unwrap().archives.is_empty());
    assert!(!app.dataset().subject_dir(SubjectId::new(1).unwrap()).as_std_path().exists());
}
