use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use launchpad::errors::Result;
use launchpad::exec::{CommandBackend, CommandOutcome, CommandSpec};

type Effect = Box<dyn Fn(&CommandSpec) + Send + Sync>;

/// A fake backend that:
/// - records every command it was asked to run
/// - replies with a scripted outcome per step (default: success)
/// - optionally runs a side effect first, e.g. writing collected assets
///   into a mock filesystem.
#[derive(Default)]
pub struct FakeBackend {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    outcomes: HashMap<String, CommandOutcome>,
    effects: HashMap<String, Effect>,
}

impl FakeBackend {
    pub fn new(calls: Arc<Mutex<Vec<CommandSpec>>>) -> Self {
        Self {
            calls,
            outcomes: HashMap::new(),
            effects: HashMap::new(),
        }
    }

    pub fn with_outcome(mut self, step: &str, outcome: CommandOutcome) -> Self {
        self.outcomes.insert(step.to_string(), outcome);
        self
    }

    pub fn with_effect<F>(mut self, step: &str, effect: F) -> Self
    where
        F: Fn(&CommandSpec) + Send + Sync + 'static,
    {
        self.effects.insert(step.to_string(), Box::new(effect));
        self
    }
}

impl CommandBackend for FakeBackend {
    fn run(
        &mut self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + '_>> {
        Box::pin(async move {
            {
                let mut guard = self.calls.lock().unwrap();
                guard.push(spec.clone());
            }

            let outcome = self
                .outcomes
                .get(&spec.step)
                .copied()
                .unwrap_or(CommandOutcome::Success);

            if outcome.is_success() {
                if let Some(effect) = self.effects.get(&spec.step) {
                    effect(&spec);
                }
            }

            Ok(outcome)
        })
    }
}

/// Steps recorded by a fake backend, in call order.
pub fn recorded_steps(calls: &Arc<Mutex<Vec<CommandSpec>>>) -> Vec<String> {
    calls.lock().unwrap().iter().map(|c| c.step.clone()).collect()
}
