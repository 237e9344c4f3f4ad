//! End-to-end scenario runs through the feature runner and harness adapters.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rstest::{fixture, rstest};
use stepwise_bdd::{
    CompositeStep, Configuration, ExecutionStatus, FeatureRunnerRepository, ParameterDescriptor,
    ParameterInfo, ProgressNotifier, ScenarioContext, ScenarioError, ScenarioInfo, ScenarioResult,
    StepDescriptor, StepError, StepInfo, StepOutcome, StepResult, bypass, comment, current_step,
    ignore,
};
use stepwise_bdd_harness_tokio::TokioHarness;

struct OrderFeature;

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    fn push(&self, event: String) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressNotifier for EventLog {
    fn notify_feature_start(&self, feature: &stepwise_bdd::FeatureInfo) {
        self.push(format!("feature start {}", feature.name()));
    }

    fn notify_feature_finished(&self, feature: &stepwise_bdd::FeatureResult) {
        self.push(format!("feature finished {}", feature.scenarios().len()));
    }

    fn notify_scenario_start(&self, scenario: &ScenarioInfo) {
        self.push(format!("scenario start {}", scenario.name()));
    }

    fn notify_scenario_finished(&self, scenario: &ScenarioResult) {
        self.push(format!("scenario finished {}", scenario.status()));
    }

    fn notify_step_start(&self, step: &StepInfo) {
        self.push(format!("step start {step}"));
    }

    fn notify_step_finished(&self, step: &StepResult) {
        self.push(format!("step finished {} {}", step.info().number(), step.status()));
    }

    fn notify_step_comment(&self, step: &StepInfo, comment: &str) {
        self.push(format!("comment {} {comment}", step.number()));
    }
}

#[fixture]
fn log() -> Arc<EventLog> {
    Arc::new(EventLog::default())
}

fn repository(log: &Arc<EventLog>) -> FeatureRunnerRepository {
    FeatureRunnerRepository::new(
        Configuration::default().with_notifier(Arc::clone(log) as Arc<dyn ProgressNotifier>),
    )
}

fn passing(name: &str) -> StepDescriptor {
    let Ok(step) = StepDescriptor::from_fn(name, |_, _| Ok(())) else {
        panic!("step name must be valid");
    };
    step
}

fn parameter(name: &str) -> ParameterInfo {
    let Ok(info) = ParameterInfo::new(name) else {
        panic!("parameter name must be valid");
    };
    info
}

#[rstest]
fn tokio_harness_runs_async_steps_with_comments(log: Arc<EventLog>) {
    let repository = repository(&log);
    let runner = repository.get_runner_for::<OrderFeature>();
    let Ok(wait) = StepDescriptor::new("When_the_warehouse_confirms", |_, _| async {
        comment("waiting for warehouse")?;
        tokio::time::sleep(Duration::from_millis(5)).await;
        comment("warehouse confirmed")?;
        Ok::<_, StepError>(StepOutcome::Completed)
    }) else {
        panic!("step name must be valid");
    };

    let Ok(builder) = runner.new_scenario() else {
        panic!("runner must be active");
    };
    let Ok(result) = builder
        .with_name("Placing_an_order")
        .with_steps(vec![passing("Given_an_open_basket"), wait])
        .run_with(&TokioHarness::new())
    else {
        panic!("scenario must pass");
    };

    assert_eq!(result.status(), ExecutionStatus::Passed);
    let Some(step) = result.steps().get(1) else {
        panic!("second step must be recorded");
    };
    assert_eq!(step.comments(), ["waiting for warehouse", "warehouse confirmed"]);
    assert_eq!(
        log.events(),
        [
            "feature start OrderFeature",
            "scenario start Placing an order",
            "step start 1. GIVEN an open basket",
            "step finished 1 passed",
            "step start 2. WHEN the warehouse confirms",
            "comment 2 waiting for warehouse",
            "comment 2 warehouse confirmed",
            "step finished 2 passed",
            "scenario finished passed",
        ]
    );
}

#[rstest]
fn bypass_and_ignore_macros_record_statuses(log: Arc<EventLog>) {
    let repository = repository(&log);
    let runner = repository.get_runner_for::<OrderFeature>();
    let Ok(pending) = StepDescriptor::from_fn("Given_a_pending_payment_gateway", |_, _| {
        bypass!("gateway not wired up yet")
    }) else {
        panic!("step name must be valid");
    };
    let Ok(unsupported) = StepDescriptor::from_fn("When_paying_in_cash", |_, _| {
        ignore!("cash payments are not supported on {}", "this platform")
    }) else {
        panic!("step name must be valid");
    };

    let Ok(builder) = runner.new_scenario() else {
        panic!("runner must be active");
    };
    let Err(ScenarioError::Step { source, result }) = builder
        .with_name("Unsupported_payment")
        .with_steps(vec![pending, unsupported, passing("Then_nothing_is_charged")])
        .run_sync()
    else {
        panic!("ignored step must stop the scenario");
    };

    assert!(source.is_ignore());
    let statuses: Vec<_> = result.steps().iter().map(StepResult::status).collect();
    assert_eq!(
        statuses,
        [
            ExecutionStatus::Bypassed,
            ExecutionStatus::Ignored,
            ExecutionStatus::NotRun
        ]
    );
    assert_eq!(result.status(), ExecutionStatus::Ignored);
    assert_eq!(
        result.status_details(),
        Some(
            "Step 1: gateway not wired up yet\n\
             Step 2: cash payments are not supported on this platform"
        )
    );
    let Some(second) = result.steps().get(1) else {
        panic!("second step must be recorded");
    };
    assert_eq!(second.info().to_string(), "2. WHEN paying in cash");
}

#[rstest]
fn composite_steps_report_nested_results(log: Arc<EventLog>) {
    let repository = repository(&log);
    let runner = repository.get_runner_for::<OrderFeature>();
    let Ok(setup) = StepDescriptor::new("Given_a_registered_customer", |_, _| async {
        Ok::<_, StepError>(StepOutcome::Composite(CompositeStep::new([
            passing("Given_an_account"),
            passing("Given_a_delivery_address"),
        ])))
    }) else {
        panic!("step name must be valid");
    };

    let Ok(builder) = runner.new_scenario() else {
        panic!("runner must be active");
    };
    let Ok(result) = builder
        .with_name("Returning_customer")
        .with_steps(vec![setup])
        .run_sync()
    else {
        panic!("scenario must pass");
    };

    let Some(parent) = result.steps().first() else {
        panic!("composite step must be recorded");
    };
    let names: Vec<_> = parent
        .sub_steps()
        .iter()
        .map(|step| step.info().to_string())
        .collect();
    assert_eq!(names, ["1.1. GIVEN an account", "1.2. AND a delivery address"]);
    assert_eq!(parent.status(), ExecutionStatus::Passed);
    assert!(
        log.events()
            .iter()
            .any(|event| event == "step finished 1.2 passed")
    );
}

#[rstest]
fn parameters_evaluate_against_scenario_context(log: Arc<EventLog>) {
    let repository = repository(&log);
    let runner = repository.get_runner_for::<OrderFeature>();
    let Ok(step) = StepDescriptor::from_fn("Then_the_charge_is_AMOUNT", |_, args| {
        let amount = args.cloned::<u32>(0)?;
        if amount == 42 {
            Ok(())
        } else {
            Err(StepError::failed(format!("unexpected charge {amount}")))
        }
    }) else {
        panic!("step name must be valid");
    };
    let step = step.with_parameter(ParameterDescriptor::from_invocation(
        parameter("amount"),
        |ctx: &ScenarioContext| {
            ctx.get::<u32>()
                .map(|basket| basket * 2)
                .ok_or_else(|| "basket missing".into())
        },
    ));

    let Ok(builder) = runner.new_scenario() else {
        panic!("runner must be active");
    };
    let Ok(result) = builder
        .with_name("Doubling")
        .with_context(21_u32)
        .with_steps(vec![step])
        .run_sync()
    else {
        panic!("scenario must pass");
    };

    let Some(step) = result.steps().first() else {
        panic!("step must be recorded");
    };
    assert_eq!(step.info().to_string(), "1. THEN the charge is \"42\"");
}

#[rstest]
fn current_step_is_visible_inside_the_body(log: Arc<EventLog>) {
    let repository = repository(&log);
    let runner = repository.get_runner_for::<OrderFeature>();
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let Ok(step) = StepDescriptor::from_fn("When_inspecting_itself", move |_, _| {
        *sink.lock().unwrap_or_else(PoisonError::into_inner) =
            current_step().map(|info| info.to_string());
        Ok(())
    }) else {
        panic!("step name must be valid");
    };

    let Ok(builder) = runner.new_scenario() else {
        panic!("runner must be active");
    };
    let Ok(_) = builder
        .with_name("Introspection")
        .with_steps(vec![step])
        .run_sync()
    else {
        panic!("scenario must pass");
    };

    assert_eq!(
        seen.lock().unwrap_or_else(PoisonError::into_inner).as_deref(),
        Some("1. WHEN inspecting itself")
    );
    assert!(current_step().is_none());
}

#[rstest]
fn disposal_reports_every_feature(log: Arc<EventLog>) {
    struct ReturnsFeature;

    let repository = repository(&log);
    for feature in [
        repository.get_runner_for::<OrderFeature>(),
        repository.get_runner_for::<ReturnsFeature>(),
    ] {
        let Ok(builder) = feature.new_scenario() else {
            panic!("runner must be active");
        };
        let Ok(_) = builder
            .with_name("Smoke")
            .with_steps(vec![passing("Given_a_running_shop")])
            .run_sync()
        else {
            panic!("scenario must pass");
        };
    }

    let results = repository.dispose();
    let names: Vec<_> = results.iter().map(|result| result.info().name().to_owned()).collect();
    assert_eq!(names, ["OrderFeature", "ReturnsFeature"]);
    assert!(results.iter().all(|result| result.status() == ExecutionStatus::Passed));
    let finished = log
        .events()
        .into_iter()
        .filter(|event| event.starts_with("feature finished"))
        .count();
    assert_eq!(finished, 2);
}
