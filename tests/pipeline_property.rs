use std::path::Path;
use std::sync::{Arc, Mutex};

use launchpad::exec::CommandOutcome;
use launchpad::fs::mock::MockFileSystem;
use launchpad::pipeline::{BuildContext, BuildState, LayerStore, MemoryLayerStore, Pipeline};
use launchpad::plan::{BuildPlan, STEP_COLLECT_STATIC, STEP_INSTALL};
use launchpad_test_utils::builders::{ConfigFileBuilder, DEFAULT_REQUIREMENTS, mock_project};
use launchpad_test_utils::fake_backend::FakeBackend;
use proptest::prelude::*;

fn outcome_strategy() -> impl Strategy<Value = CommandOutcome> {
    prop_oneof![
        3 => Just(CommandOutcome::Success),
        1 => (1..=255i32).prop_map(CommandOutcome::Failed),
        1 => Just(CommandOutcome::TimedOut),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // The build succeeds iff every command succeeds, and a failure leaves
    // no layer beyond the last successful step.
    #[test]
    fn build_succeeds_iff_every_command_succeeds(
        install in outcome_strategy(),
        collect in outcome_strategy(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let fs = MockFileSystem::new();
        mock_project(&fs, Path::new("/project"), DEFAULT_REQUIREMENTS);
        let cfg = ConfigFileBuilder::new().build();
        let plan = BuildPlan::resolve(&cfg, Path::new("/project")).unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut backend = FakeBackend::new(calls)
            .with_outcome(STEP_INSTALL, install)
            .with_outcome(STEP_COLLECT_STATIC, collect);
        let mut layers = MemoryLayerStore::new();

        let result = rt.block_on(async {
            let mut ctx = BuildContext { plan: &plan, fs: &fs, backend: &mut backend };
            Pipeline::standard().run(&mut ctx, &mut layers).await
        });

        let recorded = layers.load().unwrap().len();
        let all_ok = install.is_success() && collect.is_success();
        prop_assert_eq!(result.is_ok(), all_ok);

        match result {
            Ok(report) => {
                prop_assert_eq!(report.state, BuildState::AssetsCollected);
                prop_assert_eq!(recorded, 4);
            }
            Err(err) => {
                prop_assert_ne!(err.exit_code(), 0);
                let expected_layers = if install.is_success() { 3 } else { 1 };
                prop_assert_eq!(recorded, expected_layers);
                if let CommandOutcome::Failed(code) = if install.is_success() { collect } else { install } {
                    prop_assert_eq!(err.exit_code(), code);
                }
            }
        }
    }
}
