use std::path::{Path, PathBuf};

use launchpad::errors::LaunchpadError;
use launchpad::fingerprint::{compute_tree_hash, list_tree};
use launchpad::fs::FileSystem;
use launchpad::fs::mock::MockFileSystem;
use launchpad::pipeline::steps::{build_globset, materialize_tree};

fn globs(patterns: &[&str]) -> globset::GlobSet {
    let owned: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
    build_globset(&owned).unwrap()
}

#[test]
fn copies_tree_and_skips_excluded_and_output_paths() {
    let fs = MockFileSystem::new();
    let src = Path::new("/src");
    fs.add_file(src.join("manage.py"), "x");
    fs.add_file(src.join("app/models.py"), "y");
    fs.add_file(src.join("node_modules/pkg/index.js"), "z");
    fs.add_file(src.join("out/app/old.txt"), "old");

    let dest = PathBuf::from("/src/out/app");
    let copied = materialize_tree(
        &fs,
        src,
        &dest,
        &globs(&["node_modules/**"]),
        &[dest.clone()],
    )
    .unwrap();

    assert_eq!(copied, 2);
    let files: Vec<String> = list_tree(&fs, &dest)
        .unwrap()
        .into_iter()
        .map(|(rel, _)| rel)
        .collect();
    assert_eq!(files, vec!["app/models.py", "manage.py"]);
    assert!(fs.is_file(&src.join("node_modules/pkg/index.js")));
}

#[test]
fn output_parent_is_not_recreated_empty_in_the_copy() {
    let fs = MockFileSystem::new();
    let src = Path::new("/src");
    fs.add_file(src.join("manage.py"), "x");
    fs.add_file(src.join("build/app/stale.py"), "old");

    let dest = PathBuf::from("/src/build/app");
    let copied = materialize_tree(&fs, src, &dest, &globs(&[]), &[dest.clone()]).unwrap();

    assert_eq!(copied, 1);
    assert!(fs.is_file(&dest.join("manage.py")));
    assert!(!fs.is_dir(&dest.join("build")));
    assert_eq!(fs.read_dir(&dest).unwrap(), vec![dest.join("manage.py")]);
}

#[test]
fn output_parent_is_copied_when_it_holds_files() {
    let fs = MockFileSystem::new();
    let src = Path::new("/src");
    fs.add_file(src.join("build/notes.txt"), "keep");

    let dest = PathBuf::from("/src/build/app");
    let copied = materialize_tree(&fs, src, &dest, &globs(&[]), &[dest.clone()]).unwrap();

    assert_eq!(copied, 1);
    assert!(fs.is_file(&dest.join("build/notes.txt")));
    assert!(!fs.is_dir(&dest.join("build/app")));
}

#[test]
fn missing_source_is_a_step_failure() {
    let fs = MockFileSystem::new();
    let err = materialize_tree(
        &fs,
        Path::new("/nowhere"),
        Path::new("/out"),
        &globs(&[]),
        &[],
    )
    .unwrap_err();
    assert!(matches!(err, LaunchpadError::StepFailed { exit_code: None, .. }), "{err:?}");
}

#[test]
fn tree_hash_tracks_paths_and_contents() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/x.txt", "one");
    fs.add_file("/b/x.txt", "one");
    fs.add_file("/c/y.txt", "one");
    fs.add_file("/d/x.txt", "two");

    let hash = |p: &str| compute_tree_hash(&fs, Path::new(p)).unwrap();
    assert_eq!(hash("/a"), hash("/b"));
    assert_ne!(hash("/a"), hash("/c"));
    assert_ne!(hash("/a"), hash("/d"));
    assert_eq!(hash("/missing"), hash("/empty-too"));
}

#[test]
fn invalid_exclude_pattern_is_rejected() {
    assert!(build_globset(&["a[".to_string()]).is_err());
}
