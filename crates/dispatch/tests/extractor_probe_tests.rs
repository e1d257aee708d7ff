//! Dispatcher wired to the real `extractor` backend.

use extract_dispatch::{
    ArchiveProbe, DispatchConfig, Dispatcher, ExtractListener, ExtractorProbe, FileEntry, Outcome,
};
use extractor::ExtractOptions;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(String, Outcome)>>,
}

impl ExtractListener for Recorder {
    fn extract_completed(&self, name: &str, _is_dir: bool) {
        self.events.lock().push((name.to_string(), Outcome::Completed));
    }

    fn extract_failed(&self, name: &str, _is_dir: bool) {
        self.events.lock().push((name.to_string(), Outcome::Failed));
    }
}

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

fn wait_for_events(recorder: &Recorder, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while recorder.events.lock().len() < count {
        assert!(Instant::now() < deadline, "timed out waiting for extraction");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn extractor_probe_recognises_archives_by_name() {
    let probe = ExtractorProbe::default();
    assert!(probe.is_archive(Path::new("a.zip")));
    assert!(probe.is_archive(Path::new("a.TAR.GZ")));
    assert!(probe.is_archive(Path::new("a.r00")));
    assert!(!probe.is_archive(Path::new("a.txt")));
}

#[test]
fn directory_submission_extracts_real_archives() {
    let local = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_zip(
        &local.path().join("show/top.zip"),
        &[("readme.txt", &b"top level"[..])],
    );
    write_zip(
        &local.path().join("show/s1/e1.zip"),
        &[("episode/e1.txt", &b"episode one"[..])],
    );
    fs::write(local.path().join("show/notes.txt"), b"not an archive").unwrap();

    let mut config = DispatchConfig::new(local.path(), output.path());
    config.poll_interval_ms = 20;
    let dispatcher = Dispatcher::with_extractor(config, ExtractOptions::default()).unwrap();
    assert_eq!(dispatcher.config().output_dir, output.path());
    let recorder = Arc::new(Recorder::default());
    dispatcher.add_listener(recorder.clone());
    dispatcher.start().unwrap();

    let tree = FileEntry::scan(local.path(), Path::new("show")).unwrap();
    dispatcher.submit(&tree).unwrap();
    wait_for_events(&recorder, 1);
    dispatcher.stop();

    assert_eq!(
        *recorder.events.lock(),
        vec![("show".to_string(), Outcome::Completed)]
    );
    assert_eq!(
        fs::read_to_string(output.path().join("show/readme.txt")).unwrap(),
        "top level"
    );
    assert_eq!(
        fs::read_to_string(output.path().join("show/s1/episode/e1.txt")).unwrap(),
        "episode one"
    );
    assert!(!output.path().join("show/notes.txt").exists());
}

#[test]
fn corrupted_archive_is_reported_as_failed() {
    let local = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    fs::write(local.path().join("broken.zip"), b"definitely not a zip file".repeat(4)).unwrap();

    let mut config = DispatchConfig::new(local.path(), output.path());
    config.poll_interval_ms = 20;
    let dispatcher = Dispatcher::with_extractor(config, ExtractOptions::default()).unwrap();
    let recorder = Arc::new(Recorder::default());
    dispatcher.add_listener(recorder.clone());
    dispatcher.start().unwrap();

    let file = FileEntry::scan(local.path(), Path::new("broken.zip")).unwrap();
    dispatcher.submit(&file).unwrap();
    wait_for_events(&recorder, 1);
    dispatcher.stop();

    assert_eq!(
        *recorder.events.lock(),
        vec![("broken.zip".to_string(), Outcome::Failed)]
    );
    assert!(dispatcher.status().is_empty());
}
