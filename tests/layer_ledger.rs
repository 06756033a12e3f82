mod common;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use common::{TestResult, relative_files, write_file};
use launchpad::errors::LaunchpadError;
use launchpad::exec::CommandOutcome;
use launchpad::fs::RealFileSystem;
use launchpad::pipeline::layers::LAYER_FILE_NAME;
use launchpad::pipeline::{
    BuildContext, BuildState, FileLayerStore, LayerRecord, LayerStore, Pipeline,
};
use launchpad::plan::{BuildPlan, STEP_COLLECT_STATIC, STEP_INSTALL};
use launchpad::run_server;
use launchpad_test_utils::builders::{ConfigFileBuilder, DEFAULT_REQUIREMENTS};
use launchpad_test_utils::fake_backend::FakeBackend;
use launchpad_test_utils::{init_tracing, with_timeout};
use tempfile::tempdir;

fn write_project(root: &Path) {
    write_file(root, "requirements.txt", DEFAULT_REQUIREMENTS);
    write_file(root, "manage.py", "#!/usr/bin/env python\n");
    write_file(root, "locations_data_apis/__init__.py", "");
    write_file(root, "locations_data_apis/wsgi.py", "application = None\n");
    write_file(root, "locations/views.py", "# views\n");
    write_file(root, ".git/HEAD", "ref: refs/heads/main\n");
}

#[test]
fn file_store_appends_and_clears() -> TestResult {
    let dir = tempdir()?;
    let mut store = FileLayerStore::new(dir.path().join("state"));

    assert!(store.load()?.is_empty());
    assert!(!store.is_complete()?);

    for (i, state) in BuildState::BUILD_LAYERS.iter().enumerate() {
        store.record(LayerRecord {
            state: *state,
            digest: format!("digest-{i}"),
        })?;
    }

    let on_disk = fs::read_to_string(dir.path().join("state").join(LAYER_FILE_NAME))?;
    assert_eq!(
        on_disk,
        "provisioned digest-0\n\
         dependencies_installed digest-1\n\
         source_materialized digest-2\n\
         assets_collected digest-3\n"
    );
    assert!(store.is_complete()?);

    store.clear()?;
    assert!(store.load()?.is_empty());
    Ok(())
}

#[test]
fn malformed_ledger_is_an_error() -> TestResult {
    let dir = tempdir()?;
    fs::write(dir.path().join(LAYER_FILE_NAME), "provisioned\n")?;
    assert!(FileLayerStore::new(dir.path().to_path_buf()).load().is_err());

    fs::write(dir.path().join(LAYER_FILE_NAME), "half_built abc\n")?;
    assert!(FileLayerStore::new(dir.path().to_path_buf()).load().is_err());
    Ok(())
}

#[tokio::test]
async fn build_on_disk_materializes_the_tree_and_records_layers() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let root = dir.path();
    write_project(root);
    write_file(root, "build/app/stale.py", "# from an older build\n");

    let cfg = ConfigFileBuilder::new().build();
    let plan = BuildPlan::resolve(&cfg, root)?;

    let static_root = plan.static_root.clone();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut backend = FakeBackend::new(calls).with_effect(STEP_COLLECT_STATIC, move |_| {
        write_file(&static_root, "locations/site.css", "body {}\n");
    });
    let mut layers = FileLayerStore::new(plan.state_dir.clone());

    let fs = RealFileSystem;
    let mut ctx = BuildContext {
        plan: &plan,
        fs: &fs,
        backend: &mut backend,
    };
    let report = with_timeout(Pipeline::standard().run(&mut ctx, &mut layers)).await?;

    assert_eq!(report.state, BuildState::AssetsCollected);
    assert_eq!(layers.load()?, report.layers);
    assert!(layers.is_complete()?);

    assert_eq!(
        relative_files(&plan.workdir),
        vec![
            "locations/views.py",
            "locations_data_apis/__init__.py",
            "locations_data_apis/wsgi.py",
            "manage.py",
            "requirements.txt",
            "staticfiles/locations/site.css",
        ]
    );
    // The source keeps its own files.
    assert!(root.join(".git/HEAD").is_file());
    Ok(())
}

#[tokio::test]
async fn failed_build_leaves_only_the_layers_below_the_failure() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let root = dir.path();
    write_project(root);
    let cfg = ConfigFileBuilder::new().build();
    let plan = BuildPlan::resolve(&cfg, root)?;

    // A previous complete build.
    let mut layers = FileLayerStore::new(plan.state_dir.clone());
    for state in BuildState::BUILD_LAYERS {
        layers.record(LayerRecord {
            state,
            digest: "old".to_string(),
        })?;
    }

    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut backend =
        FakeBackend::new(calls).with_outcome(STEP_INSTALL, CommandOutcome::Failed(1));
    let fs = RealFileSystem;
    let mut ctx = BuildContext {
        plan: &plan,
        fs: &fs,
        backend: &mut backend,
    };
    let result = with_timeout(Pipeline::standard().run(&mut ctx, &mut layers)).await;
    assert!(result.is_err());

    let states: Vec<BuildState> = layers.load()?.into_iter().map(|l| l.state).collect();
    assert_eq!(states, vec![BuildState::Provisioned]);
    assert!(!plan.workdir.exists());

    // Launching from an incomplete ledger is refused.
    match run_server(&plan).await {
        Err(LaunchpadError::IncompleteBuild(_)) => {}
        other => panic!("Expected IncompleteBuild, got: {:?}", other),
    }
    Ok(())
}
