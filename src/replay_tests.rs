use super::*;

#[test]
fn paths_are_derived_from_root_and_session_id() {
    let paths = ReplayPaths::new(Path::new("/cloud/data/sessions"), "42");
    assert_eq!(paths.data_path, PathBuf::from("/cloud/data/sessions/42"));
    assert_eq!(paths.typescript_file, PathBuf::from("/cloud/data/sessions/42/typescript"));
    assert_eq!(paths.timing_file, PathBuf::from("/cloud/data/sessions/42/timing.txt"));
}

#[test]
fn record_writes_transcript_and_timing_lines() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ReplayPaths::new(dir.path(), "1");
    let mut recorder = ReplayRecorder::create(&paths).unwrap();

    recorder.record(b"hello\n").unwrap();
    recorder.record(b"world\n").unwrap();
    recorder.close().unwrap();

    let transcript = std::fs::read_to_string(&paths.typescript_file).unwrap();
    assert!(transcript.starts_with("Script started on "));
    assert!(transcript.contains("hello\nworld\n"));
    assert!(transcript.trim_end().ends_with("Script done on") || transcript.contains("Script done on"));

    let timing = std::fs::read_to_string(&paths.timing_file).unwrap();
    let lines: Vec<&str> = timing.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        let mut parts = line.split(' ');
        let delay: f64 = parts.next().unwrap().parse().unwrap();
        let len: usize = parts.next().unwrap().parse().unwrap();
        assert!(delay >= 0.0);
        assert_eq!(len, 6);
    }
}

#[test]
fn create_makes_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested_root = dir.path().join("a").join("b");
    let paths = ReplayPaths::new(&nested_root, "99");
    let recorder = ReplayRecorder::create(&paths).unwrap();
    recorder.close().unwrap();
    assert!(paths.typescript_file.exists());
}
