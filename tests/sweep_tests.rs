use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};

use sdrclean::{
    CoLocatedChecker, Disposition, Error, HashBucketChecker, MirroredChecker,
    ReconciliationEngine, StorageTopology, SweepConfig, TopologyRegistry,
};

fn write_record(sidecar: &Path, doc_path: Option<&Path>) {
    fs::create_dir_all(sidecar).unwrap();
    let body = match doc_path {
        Some(p) => format!(
            "return {{\n    [\"doc_path\"] = {:?},\n    [\"percent_finished\"] = 0.3,\n}}\n",
            p.to_string_lossy()
        ),
        None => "return {\n    [\"percent_finished\"] = 0.3,\n}\n".to_string(),
    };
    fs::write(sidecar.join("metadata.epub.lua"), body).unwrap();
}

fn sweep_config(topology: &str, root: &Path) -> SweepConfig {
    let mut config = SweepConfig {
        topology: topology.to_string(),
        ..SweepConfig::default()
    };
    match topology {
        "co-located" => config.library_root = Some(root.to_path_buf()),
        "mirrored" => config.mirror_root = Some(root.to_path_buf()),
        _ => config.hash_root = Some(root.to_path_buf()),
    }
    config
}

#[test]
fn co_located_scenario() {
    let library = tempfile::tempdir().unwrap();
    let root = library.path();
    fs::write(root.join("novel.epub"), b"book").unwrap();
    fs::create_dir(root.join("novel.epub.sdr")).unwrap();
    fs::write(root.join("novel.epub.sdr/metadata.epub.lua"), b"return {}").unwrap();
    fs::create_dir_all(root.join("ghost.pdf.sdr/covers")).unwrap();
    fs::write(root.join("ghost.pdf.sdr/covers/c.png"), b"png").unwrap();

    let strategy = CoLocatedChecker::new([".epub", ".pdf", ".fb2.zip"]);
    let report = ReconciliationEngine::default()
        .run(StorageTopology::CoLocated, root, &strategy)
        .unwrap();

    assert_eq!(report.sidecars_found, 2);
    assert_eq!(report.sidecars_removed, 1);
    assert_eq!(report.sidecars_kept, 1);
    assert_eq!(report.bytes_freed, 3);
    assert!(root.join("novel.epub.sdr").exists());
    assert!(!root.join("ghost.pdf.sdr").exists());
    assert!(root.join("novel.epub").exists());
}

#[test]
fn mirrored_scenario() {
    let mirror = tempfile::tempdir().unwrap();
    let content = tempfile::tempdir().unwrap();
    fs::create_dir_all(mirror.path().join("fiction/book.pdf.sdr")).unwrap();
    fs::create_dir_all(mirror.path().join("fiction/kept.pdf.sdr")).unwrap();
    fs::create_dir_all(content.path().join("fiction")).unwrap();
    fs::write(content.path().join("fiction/kept.pdf"), b"%PDF").unwrap();

    let strategy = MirroredChecker::new(content.path());
    let report = ReconciliationEngine::default()
        .run(StorageTopology::Mirrored, mirror.path(), &strategy)
        .unwrap();

    assert_eq!(report.sidecars_removed, 1);
    assert_eq!(report.sidecars_kept, 1);
    assert!(!mirror.path().join("fiction/book.pdf.sdr").exists());
    assert!(mirror.path().join("fiction/kept.pdf.sdr").exists());
}

#[test]
fn hash_bucketed_scenario() {
    let store = tempfile::tempdir().unwrap();
    let library = tempfile::tempdir().unwrap();
    let live = library.path().join("live.epub");
    fs::write(&live, b"x").unwrap();
    let deleted = library.path().join("deleted.epub");

    write_record(&store.path().join("aa/aa01.sdr"), Some(&live));
    write_record(&store.path().join("bb/bb02.sdr"), Some(&deleted));
    write_record(&store.path().join("cc/cc03.sdr"), None);
    fs::create_dir_all(store.path().join("dd/dd04.sdr")).unwrap();

    let strategy = HashBucketChecker::new("metadata.lua", "doc_path");
    let report = ReconciliationEngine::default()
        .run(StorageTopology::HashBucketed, store.path(), &strategy)
        .unwrap();

    assert_eq!(report.sidecars_found, 4);
    assert_eq!(report.sidecars_kept, 1);
    assert_eq!(report.sidecars_removed, 1);
    assert_eq!(report.sidecars_skipped, 2);
    assert_eq!(report.sidecars_failed, 0);
    assert!(store.path().join("aa/aa01.sdr").exists());
    assert!(!store.path().join("bb/bb02.sdr").exists());
    assert!(store.path().join("cc/cc03.sdr").exists());
    assert!(store.path().join("dd/dd04.sdr").exists());

    let skipped: Vec<PathBuf> = report
        .entries
        .iter()
        .filter(|e| matches!(e.disposition, Disposition::Skipped { .. }))
        .map(|e| e.path.clone())
        .collect();
    assert_eq!(
        skipped,
        vec![store.path().join("cc/cc03.sdr"), store.path().join("dd/dd04.sdr")]
    );
}

#[rstest]
#[case("co-located")]
#[case("mirrored")]
#[case("hash-bucketed")]
fn second_run_removes_nothing(#[case] topology: &str) {
    let root = tempfile::tempdir().unwrap();
    let content = tempfile::tempdir().unwrap();
    let orphan = root.path().join("shelf/gone.epub.sdr");
    write_record(&orphan, Some(&content.path().join("shelf/gone.epub")));

    let mut config = sweep_config(topology, root.path());
    config.content_root = content.path().to_path_buf();
    let registry = TopologyRegistry::with_defaults();

    let first = ReconciliationEngine::run_configured(&registry, topology, &config).unwrap();
    assert_eq!(first.sidecars_removed, 1);
    assert!(!orphan.exists());

    let second = ReconciliationEngine::run_configured(&registry, topology, &config).unwrap();
    assert_eq!(second.sidecars_found, 0);
    assert_eq!(second.sidecars_removed, 0);
}

#[rstest]
#[case("co-located")]
#[case("mirrored")]
#[case("hash-bucketed")]
fn live_content_is_never_deleted(#[case] topology: &str) {
    let root = tempfile::tempdir().unwrap();
    let content = tempfile::tempdir().unwrap();

    // Content for co-located sits beside the sidecar; the others use the
    // content tree and the recorded path.
    let book = if topology == "co-located" {
        root.path().join("shelf/live.epub")
    } else {
        content.path().join("shelf/live.epub")
    };
    fs::create_dir_all(book.parent().unwrap()).unwrap();
    fs::write(&book, b"x").unwrap();
    let sidecar = root.path().join("shelf/live.epub.sdr");
    write_record(&sidecar, Some(&book));

    let mut config = sweep_config(topology, root.path());
    config.content_root = content.path().to_path_buf();
    let report =
        ReconciliationEngine::run_configured(&TopologyRegistry::default(), topology, &config)
            .unwrap();

    assert_eq!(report.sidecars_kept, 1);
    assert_eq!(report.sidecars_removed, 0);
    assert!(sidecar.join("metadata.epub.lua").exists());
}

#[test]
fn dry_run_reports_but_keeps_orphans() {
    let library = tempfile::tempdir().unwrap();
    fs::create_dir_all(library.path().join("ghost.pdf.sdr")).unwrap();
    fs::write(library.path().join("ghost.pdf.sdr/notes.txt"), b"1234").unwrap();

    let mut config = sweep_config("co-located", library.path());
    config.dry_run = true;
    let report =
        ReconciliationEngine::run_configured(&TopologyRegistry::default(), "doc", &config)
            .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.sidecars_removed, 1);
    assert_eq!(report.bytes_freed, 4);
    assert!(library.path().join("ghost.pdf.sdr/notes.txt").exists());
}

#[test]
fn unknown_topology_touches_nothing() {
    let library = tempfile::tempdir().unwrap();
    fs::create_dir_all(library.path().join("ghost.pdf.sdr")).unwrap();

    let config = sweep_config("co-located", library.path());
    let err = ReconciliationEngine::run_configured(&TopologyRegistry::default(), "cloud", &config)
        .unwrap_err();

    assert!(matches!(err, Error::UnknownTopology { .. }));
    assert!(library.path().join("ghost.pdf.sdr").exists());
}

#[test]
fn unconfigured_root_is_a_configuration_error() {
    let config = SweepConfig::default();
    let err =
        ReconciliationEngine::run_configured(&TopologyRegistry::default(), "mirrored", &config)
            .unwrap_err();
    assert!(matches!(err, Error::MissingRoot { topology: "mirrored" }));
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let library = tempfile::tempdir().unwrap();
    let locked = library.path().join("locked");
    fs::create_dir_all(locked.join("hidden.pdf.sdr")).unwrap();
    fs::create_dir_all(library.path().join("open/ghost.pdf.sdr")).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let privileged = fs::read_dir(&locked).is_ok();
    let strategy = CoLocatedChecker::new([".pdf"]);
    let report = ReconciliationEngine::default()
        .run(StorageTopology::CoLocated, library.path(), &strategy)
        .unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if !privileged {
        assert_eq!(report.unreadable_dirs, 1);
        assert_eq!(report.sidecars_removed, 1);
        assert!(locked.join("hidden.pdf.sdr").exists());
    }
    assert!(!library.path().join("open/ghost.pdf.sdr").exists());
}

#[test]
fn truncated_record_is_kept() {
    let store = tempfile::tempdir().unwrap();
    let library = tempfile::tempdir().unwrap();
    let gone = library.path().join("gone.epub");
    let sidecar = store.path().join("ab/ab12.sdr");
    fs::create_dir_all(&sidecar).unwrap();
    // Interrupted write: the path survived, the rest of the table did not.
    fs::write(
        sidecar.join("metadata.epub.lua"),
        format!(
            "return {{\n    [\"doc_path\"] = {:?},\n    [\"percent_fin",
            gone.to_string_lossy()
        ),
    )
    .unwrap();

    let config = sweep_config("hash-bucketed", store.path());
    let report =
        ReconciliationEngine::run_configured(&TopologyRegistry::default(), "hash", &config)
            .unwrap();

    assert_eq!(report.sidecars_skipped, 1);
    assert_eq!(report.sidecars_removed, 0);
    assert!(sidecar.join("metadata.epub.lua").exists());
}

#[test]
fn nested_hash_store_is_left_to_its_own_topology() {
    let library = tempfile::tempdir().unwrap();
    let root = library.path();
    let book = root.join("novel.epub");
    fs::write(&book, b"x").unwrap();
    let hash_root = root.join(".adds/koreader/hashdocsettings");
    let hashed = hash_root.join("3f/3f2a.sdr");
    write_record(&hashed, Some(&book));
    fs::create_dir_all(root.join("ghost.pdf.sdr")).unwrap();

    let mut config = sweep_config("co-located", root);
    config.hash_root = Some(hash_root);
    let report =
        ReconciliationEngine::run_configured(&TopologyRegistry::default(), "co-located", &config)
            .unwrap();

    assert_eq!(report.sidecars_found, 1);
    assert_eq!(report.sidecars_removed, 1);
    assert!(hashed.join("metadata.epub.lua").exists());
    assert!(!root.join("ghost.pdf.sdr").exists());
}
