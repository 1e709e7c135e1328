// jstage-core/tests/orchestrator.rs
mod common;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use common::{deb_bytes, zip_bytes, Entry, Payload};
use jstage_common::config::Config;
use jstage_common::download::{DownloadRequest, Downloader};
use jstage_common::error::{JstageError, Result};
use jstage_common::model::{
    ArchiveKind, ArtifactSet, ArtifactSource, Catalog, Layout, SentinelTable, UnpackTarget,
};
use jstage_core::Orchestrator;

/// Serves archives from memory and remembers what it was asked for.
struct LocalDownloader {
    files: HashMap<String, Vec<u8>>,
    requested: RefCell<Vec<String>>,
}

impl LocalDownloader {
    fn new(files: Vec<(&str, Vec<u8>)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(name, bytes)| (name.to_string(), bytes))
                .collect(),
            requested: RefCell::new(Vec::new()),
        }
    }

    fn requested(&self) -> Vec<String> {
        let mut names = self.requested.borrow().clone();
        names.sort();
        names
    }
}

impl Downloader for LocalDownloader {
    fn download_all(&self, requests: &[DownloadRequest], dest_dir: &Path) -> Result<()> {
        fs::create_dir_all(dest_dir)?;
        for request in requests {
            self.requested.borrow_mut().push(request.file_name.clone());
            let bytes = self.files.get(&request.file_name).ok_or_else(|| {
                JstageError::DownloadError(
                    request.file_name.clone(),
                    request.url.clone(),
                    "not served".to_string(),
                )
            })?;
            fs::write(request.destination(dest_dir), bytes)?;
        }
        Ok(())
    }
}

fn test_catalog() -> Catalog {
    let pool = "https://packages.example.invalid/pool/";
    Catalog {
        release: "test-jdk".to_string(),
        sources: vec![
            ArtifactSource::deb(
                pool,
                "test-jre_1.0_all.deb",
                ArtifactSet::CLASS_LIBRARY | ArtifactSet::RUNTIME_HOME,
            ),
            ArtifactSource::deb(pool, "test-tzdata_1.0_all.deb", ArtifactSet::RUNTIME_HOME),
            ArtifactSource::new(
                "compiler",
                "https://tools.example.invalid/compiler.jar",
                ArchiveKind::Zip,
                ArtifactSet::COMPILER,
            )
            .with_unpack(UnpackTarget::Classes),
            ArtifactSource::new(
                "shim",
                "https://tools.example.invalid/shim.zip",
                ArchiveKind::Zip,
                ArtifactSet::COMPRESSION_SHIM,
            )
            .with_unpack(UnpackTarget::ScratchSubdir(PathBuf::from("shim"))),
        ],
        layout: Layout {
            jre_subdir: PathBuf::from("usr/lib/jvm/test/jre"),
            class_library_jars: vec!["rt.jar".to_string()],
            shim_source_dir: PathBuf::from("shim/java/util/zip"),
            shim_dest_dir: PathBuf::from("java/util/zip"),
        },
        sentinels: SentinelTable::default(),
    }
}

fn served_files() -> Vec<(&'static str, Vec<u8>)> {
    let rt_jar = zip_bytes(&[
        ("java/lang/Object.class", "object"),
        ("java/lang/String.class", "string"),
    ]);
    let jre = deb_bytes(
        &[
            Entry::File("./usr/share/java/rt.jar", &rt_jar),
            Entry::Symlink(
                "./usr/lib/jvm/test/jre/lib/rt.jar",
                "../../../../../share/java/rt.jar",
            ),
            Entry::Symlink("./usr/lib/jvm/test/jre/lib/zi", "/usr/share/javazi"),
            Entry::Symlink("./usr/lib/jvm/test/jre/lib/missing.jar", "nowhere.jar"),
        ],
        Payload::Xz,
    );
    let tzdata = deb_bytes(
        &[Entry::File(
            "./usr/share/javazi/ZoneInfoMappings",
            b"mappings",
        )],
        Payload::Gzip,
    );
    vec![
        ("test-jre_1.0_all.deb", jre),
        ("test-tzdata_1.0_all.deb", tzdata),
        (
            "compiler.jar",
            zip_bytes(&[(
                "org/eclipse/jdt/internal/compiler/batch/Main.class",
                "main",
            )]),
        ),
        (
            "shim.zip",
            zip_bytes(&[
                ("java/util/zip/DeflaterEngine.class", "engine"),
                ("java/util/zip/README", "docs"),
            ]),
        ),
    ]
}

/// Replaces the named package with one that has no data member.
fn strip_payload(files: &mut [(&'static str, Vec<u8>)], package: &str) {
    for (name, bytes) in files.iter_mut() {
        if *name == package {
            let mut builder = ar::Builder::new(Vec::new());
            let header = ar::Header::new(b"debian-binary".to_vec(), 4);
            builder.append(&header, &b"2.0\n"[..]).unwrap();
            *bytes = builder.into_inner().unwrap();
        }
    }
}

fn config_in(root: &Path) -> Config {
    let mut config = Config::for_java_home(root.join("java_home"));
    config.scratch_parent = root.join("scratch-parent");
    config
}

#[test]
fn stages_everything_from_an_empty_java_home() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let catalog = test_catalog();
    let downloader = LocalDownloader::new(served_files());

    let summary = Orchestrator::new(&config, &catalog, &downloader)
        .run()
        .unwrap();

    assert_eq!(summary.missing, ArtifactSet::all());
    assert_eq!(summary.still_missing, ArtifactSet::empty());
    assert_eq!(summary.repair.repaired, 2);
    assert_eq!(summary.repair.broken.len(), 1);
    // scratch, download, 2 packages, repair, rt.jar, 2 zips, shim copy, jre copy
    assert_eq!(summary.tasks_run, 10);

    let scratch = summary.scratch.unwrap();
    assert!(scratch.starts_with(tmp.path().join("scratch-parent")));
    assert!(scratch
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("jdk-download"));

    let home = config.java_home();
    assert_eq!(
        fs::read_to_string(home.join("classes/java/lang/String.class")).unwrap(),
        "string"
    );
    assert_eq!(
        fs::read_to_string(home.join("classes/java/util/zip/DeflaterEngine.class")).unwrap(),
        "engine"
    );
    assert!(!home.join("classes/java/util/zip/README").exists());
    assert_eq!(
        fs::read_to_string(home.join("lib/zi/ZoneInfoMappings")).unwrap(),
        "mappings"
    );
    assert!(home.join("lib/rt.jar").is_file());
    assert_eq!(downloader.requested().len(), 4);
}

#[test]
fn complete_java_home_needs_no_scratch_or_downloads() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let catalog = test_catalog();
    for (_, rel) in catalog.sentinels.entries() {
        let path = config.java_home().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }
    let downloader = LocalDownloader::new(Vec::new());

    let summary = Orchestrator::new(&config, &catalog, &downloader)
        .run()
        .unwrap();
    assert_eq!(summary.tasks_run, 0);
    assert!(summary.scratch.is_none());
    assert!(downloader.requested().is_empty());
    assert!(!tmp.path().join("scratch-parent").exists());
}

#[test]
fn only_sources_for_missing_artifacts_are_fetched() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let catalog = test_catalog();
    let sentinels = &catalog.sentinels;
    for rel in [
        &sentinels.class_library,
        &sentinels.runtime_home,
        &sentinels.compression_shim,
    ] {
        let path = config.java_home().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }
    let downloader = LocalDownloader::new(served_files());

    let summary = Orchestrator::new(&config, &catalog, &downloader)
        .run()
        .unwrap();
    assert_eq!(summary.missing, ArtifactSet::COMPILER);
    assert_eq!(summary.still_missing, ArtifactSet::empty());
    assert_eq!(downloader.requested(), vec!["compiler.jar".to_string()]);
    assert!(config
        .java_home()
        .join("classes/org/eclipse/jdt/internal/compiler/batch/Main.class")
        .is_file());
}

#[test]
fn reused_scratch_dir_skips_extracted_packages() {
    let tmp = tempfile::tempdir().unwrap();
    let scratch = tmp.path().join("kept-scratch");
    let config = config_in(tmp.path()).with_scratch_dir(&scratch);
    let catalog = test_catalog();
    let downloader = LocalDownloader::new(served_files());

    Orchestrator::new(&config, &catalog, &downloader)
        .run()
        .unwrap();
    assert!(scratch.join("test-jre_1.0_all.deb.tar").exists());
    assert!(scratch.join("test-tzdata_1.0_all.deb.tar").exists());

    fs::remove_dir_all(config.java_home()).unwrap();
    let summary = Orchestrator::new(&config, &catalog, &downloader)
        .run()
        .unwrap();
    assert_eq!(summary.scratch.as_deref(), Some(scratch.as_path()));
    assert_eq!(summary.still_missing, ArtifactSet::empty());
    // Saved links are replayed; the first run already materialized them.
    assert_eq!(summary.repair.repaired, 0);
    assert_eq!(summary.repair.already_present, 2);
    assert_eq!(summary.repair.broken.len(), 1);
}

#[test]
fn resumes_after_a_failed_run_in_the_same_scratch_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let scratch = tmp.path().join("kept-scratch");
    let config = config_in(tmp.path()).with_scratch_dir(&scratch);
    let catalog = test_catalog();

    let mut broken = served_files();
    strip_payload(&mut broken, "test-tzdata_1.0_all.deb");
    let err = Orchestrator::new(&config, &catalog, &LocalDownloader::new(broken))
        .run()
        .unwrap_err();
    assert!(matches!(err, JstageError::MissingPayload { .. }));
    assert!(scratch.join("test-jre_1.0_all.deb.tar").exists());
    assert!(scratch.join("test-jre_1.0_all.deb.links").exists());
    assert!(!scratch.join("usr/lib/jvm/test/jre").exists());

    let summary = Orchestrator::new(&config, &catalog, &LocalDownloader::new(served_files()))
        .run()
        .unwrap();
    assert_eq!(summary.still_missing, ArtifactSet::empty());
    assert_eq!(summary.repair.repaired, 2);
    assert_eq!(summary.repair.broken.len(), 1);

    let home = config.java_home();
    assert_eq!(
        fs::read_to_string(home.join("lib/zi/ZoneInfoMappings")).unwrap(),
        "mappings"
    );
    assert!(home.join("lib/rt.jar").is_file());
}

#[test]
fn fatal_extraction_error_stops_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let catalog = test_catalog();
    let mut files = served_files();
    strip_payload(&mut files, "test-tzdata_1.0_all.deb");
    let downloader = LocalDownloader::new(files);

    let err = Orchestrator::new(&config, &catalog, &downloader)
        .run()
        .unwrap_err();
    match err {
        JstageError::MissingPayload { archive } => {
            assert!(archive.ends_with("test-tzdata_1.0_all.deb"))
        }
        other => panic!("unexpected error {other:?}"),
    }
    // Nothing after the failing extraction ran.
    assert!(!config.classes_dir().exists());
}

#[test]
fn download_failure_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let catalog = test_catalog();
    let downloader = LocalDownloader::new(Vec::new());

    let err = Orchestrator::new(&config, &catalog, &downloader)
        .run()
        .unwrap_err();
    assert!(matches!(err, JstageError::DownloadError(..)));
    assert!(!config.java_home().exists());
}
