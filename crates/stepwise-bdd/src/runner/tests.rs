//! Unit tests for feature runners and the runner repository.

use std::sync::{Arc, Mutex};

use futures::channel::oneshot;
use futures::executor::block_on;
use futures::future::join;
use rstest::{fixture, rstest};
use stepwise_bdd_harness::{HarnessAdapter, ScenarioRunRequest};

use super::*;
use crate::descriptor::{StepDescriptor, StepOutcome};
use crate::execution::{ScenarioError, StepError};
use crate::notify::ProgressNotifier;
use crate::status::ExecutionStatus;
use crate::types::FeatureInfo;

struct OrdersFeature;
struct BillingFeature;

#[derive(Default)]
struct FeatureEvents {
    events: Mutex<Vec<String>>,
}

impl FeatureEvents {
    fn events(&self) -> Vec<String> {
        lock(&self.events).clone()
    }
}

impl ProgressNotifier for FeatureEvents {
    fn notify_feature_start(&self, feature: &FeatureInfo) {
        lock(&self.events).push(format!("start {}", feature.name()));
    }

    fn notify_feature_finished(&self, feature: &FeatureResult) {
        lock(&self.events).push(format!(
            "finished {} {}",
            feature.info().name(),
            feature.scenarios().len()
        ));
    }
}

#[fixture]
fn events() -> Arc<FeatureEvents> {
    Arc::new(FeatureEvents::default())
}

fn repository(events: &Arc<FeatureEvents>) -> FeatureRunnerRepository {
    FeatureRunnerRepository::new(
        Configuration::default().with_notifier(Arc::clone(events) as Arc<dyn ProgressNotifier>),
    )
}

fn passing(raw: &str) -> StepDescriptor {
    let Ok(step) = StepDescriptor::from_fn(raw, |_, _| Ok(())) else {
        panic!("step should build");
    };
    step
}

#[rstest]
fn one_runner_per_feature_type(events: Arc<FeatureEvents>) {
    let repository = repository(&events);
    let orders = repository.get_runner_for::<OrdersFeature>();
    let again = repository.get_runner_for::<OrdersFeature>();
    let billing = repository.get_runner_for::<BillingFeature>();

    assert!(Arc::ptr_eq(&orders, &again));
    assert!(!Arc::ptr_eq(&orders, &billing));
    assert_eq!(repository.len(), 2);
    assert_eq!(events.events(), ["start OrdersFeature", "start BillingFeature"]);
}

#[rstest]
fn scenarios_accumulate_in_feature_result(events: Arc<FeatureEvents>) {
    let repository = repository(&events);
    let runner = repository.get_runner_for::<OrdersFeature>();
    for name in ["Placing_an_order", "Cancelling_an_order"] {
        let Ok(builder) = runner.new_scenario() else {
            panic!("active runner should create scenarios");
        };
        let outcome = builder
            .with_name(name)
            .with_steps(vec![passing("Given_an_order")])
            .run_sync();
        assert!(outcome.is_ok(), "scenario {name} should pass");
    }

    let Ok(result) = runner.feature_result() else {
        panic!("active runner should expose its result");
    };
    let names: Vec<_> = result
        .scenarios()
        .iter()
        .map(|scenario| scenario.info().name().to_owned())
        .collect();
    assert_eq!(names, ["Placing an order", "Cancelling an order"]);
    assert_eq!(result.status(), ExecutionStatus::Passed);
}

#[rstest]
fn dispose_is_idempotent_and_blocks_further_use(events: Arc<FeatureEvents>) {
    let repository = repository(&events);
    let runner = repository.get_runner_for::<OrdersFeature>();
    runner.dispose();
    runner.dispose();

    assert_eq!(events.events(), ["start OrdersFeature", "finished OrdersFeature 0"]);
    assert!(matches!(
        runner.new_scenario(),
        Err(RunnerError::Disposed { .. })
    ));
    assert!(matches!(
        runner.feature_result(),
        Err(RunnerError::Disposed { .. })
    ));

    let results = repository.dispose();
    assert_eq!(results.len(), 1);
    assert_eq!(events.events().len(), 2);
}

#[rstest]
fn builder_created_before_disposal_fails_to_run(events: Arc<FeatureEvents>) {
    let repository = repository(&events);
    let runner = repository.get_runner_for::<OrdersFeature>();
    let Ok(builder) = runner.new_scenario() else {
        panic!("active runner should create scenarios");
    };
    runner.dispose();

    let outcome = builder.with_name("Late").run_sync();
    assert!(matches!(
        outcome,
        Err(ScenarioError::Runner(RunnerError::Disposed { .. }))
    ));
}

#[rstest]
fn fixture_type_is_checked(events: Arc<FeatureEvents>) {
    let repository = repository(&events);
    let runner = repository.get_runner(&OrdersFeature);

    assert!(runner.new_scenario_for(&OrdersFeature).is_ok());
    let Err(err) = runner.new_scenario_for(&BillingFeature) else {
        panic!("foreign fixture should be rejected");
    };
    assert!(matches!(err, RunnerError::FixtureTypeMismatch { .. }));
    assert!(err.to_string().contains("BillingFeature"), "{err}");
}

#[rstest]
#[case::missing(None)]
#[case::blank(Some("   "))]
fn scenarios_need_a_name(events: Arc<FeatureEvents>, #[case] name: Option<&str>) {
    let repository = repository(&events);
    let runner = repository.get_runner_for::<OrdersFeature>();
    let Ok(mut builder) = runner.new_scenario() else {
        panic!("active runner should create scenarios");
    };
    if let Some(name) = name {
        builder = builder.with_name(name);
    }

    let outcome = builder.run_sync();
    assert!(matches!(
        outcome,
        Err(ScenarioError::Runner(RunnerError::MissingScenarioName))
    ));
    let Ok(result) = runner.feature_result() else {
        panic!("runner should still be active");
    };
    assert!(result.scenarios().is_empty());
}

/// Looks up the repository from inside the feature start notification.
#[derive(Default)]
struct ReentrantEvents {
    repository: Mutex<Option<Arc<FeatureRunnerRepository>>>,
    runners_seen: Mutex<Vec<usize>>,
}

impl ProgressNotifier for ReentrantEvents {
    fn notify_feature_start(&self, _feature: &FeatureInfo) {
        let repository = lock(&self.repository).clone();
        if let Some(repository) = repository {
            lock(&self.runners_seen).push(repository.len());
        }
    }
}

#[test]
fn feature_start_notifier_may_use_the_repository() {
    let events = Arc::new(ReentrantEvents::default());
    let repository = Arc::new(FeatureRunnerRepository::new(
        Configuration::default().with_notifier(Arc::clone(&events) as Arc<dyn ProgressNotifier>),
    ));
    *lock(&events.repository) = Some(Arc::clone(&repository));

    let _orders = repository.get_runner_for::<OrdersFeature>();
    let _billing = repository.get_runner_for::<BillingFeature>();

    assert_eq!(*lock(&events.runners_seen), [1, 2]);
    *lock(&events.repository) = None;
}

/// Records the scenario metadata handed to the harness.
#[derive(Default)]
struct RecordingHarness {
    seen: Mutex<Vec<(String, String)>>,
}

impl HarnessAdapter for RecordingHarness {
    fn run<T>(&self, request: ScenarioRunRequest<'_, T>) -> T {
        let metadata = request.metadata();
        lock(&self.seen).push((
            metadata.feature_name().to_owned(),
            metadata.scenario_name().to_owned(),
        ));
        block_on(request.run())
    }
}

#[rstest]
fn harness_sees_the_formatted_scenario_name(events: Arc<FeatureEvents>) {
    let repository = repository(&events);
    let runner = repository.get_runner_for::<OrdersFeature>();
    let harness = RecordingHarness::default();
    let Ok(builder) = runner.new_scenario() else {
        panic!("active runner should create scenarios");
    };

    let Ok(result) = builder
        .with_name("Placing_an_order")
        .with_steps(vec![passing("Given_an_order")])
        .run_with(&harness)
    else {
        panic!("scenario should pass");
    };

    assert_eq!(
        *lock(&harness.seen),
        [("OrdersFeature".to_owned(), "Placing an order".to_owned())]
    );
    assert_eq!(result.info().name(), "Placing an order");
}

#[rstest]
fn dispose_waits_for_running_scenarios(events: Arc<FeatureEvents>) {
    let repository = repository(&events);
    let runner = repository.get_runner_for::<OrdersFeature>();
    let (release, released) = oneshot::channel::<()>();
    let released = Mutex::new(Some(released));
    let Ok(waiting) = StepDescriptor::new("When_the_payment_settles", move |_, _| {
        let released = lock(&released).take();
        async move {
            if let Some(released) = released {
                released.await.map_err(StepError::failed)?;
            }
            Ok::<_, StepError>(StepOutcome::Completed)
        }
    }) else {
        panic!("step should build");
    };
    let Ok(builder) = runner.new_scenario() else {
        panic!("active runner should create scenarios");
    };
    let scenario = builder.with_name("Slow_payment").with_steps(vec![waiting]).run();

    let control = async {
        runner.dispose();
        assert!(runner.is_disposed());
        assert_eq!(events.events(), ["start OrdersFeature"]);
        assert!(release.send(()).is_ok());
    };
    let (outcome, ()) = block_on(join(scenario, control));

    assert!(outcome.is_ok());
    assert_eq!(
        events.events(),
        ["start OrdersFeature", "finished OrdersFeature 1"]
    );
    assert!(matches!(
        runner.new_scenario(),
        Err(RunnerError::Disposed { .. })
    ));
}
