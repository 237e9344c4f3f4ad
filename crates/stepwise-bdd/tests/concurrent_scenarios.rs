//! Scenarios of one feature running concurrently on a multi-threaded runtime.

use std::sync::Arc;
use std::time::Duration;

use stepwise_bdd::{
    ExecutionStatus, FeatureRunnerRepository, ScenarioResult, StepDescriptor, StepError,
    StepOutcome, comment,
};

struct InventoryFeature;

const SCENARIOS: usize = 24;

fn counting_step(scenario: usize) -> StepDescriptor {
    let Ok(step) = StepDescriptor::new("When_counting_stock", move |_, _| async move {
        for round in 0..3 {
            comment(format!("scenario {scenario} round {round}"))?;
            tokio::task::yield_now().await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        Ok::<_, StepError>(StepOutcome::Completed)
    }) else {
        panic!("step name must be valid");
    };
    step
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_scenarios_keep_comments_and_results_apart() {
    let repository = FeatureRunnerRepository::default();
    let runner = repository.get_runner_for::<InventoryFeature>();

    let handles: Vec<_> = (0..SCENARIOS)
        .map(|scenario| {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move {
                let Ok(builder) = runner.new_scenario() else {
                    panic!("runner must be active");
                };
                builder
                    .with_name(format!("Stock_take_{scenario}"))
                    .with_steps(vec![counting_step(scenario)])
                    .run()
                    .await
            })
        })
        .collect();

    for (scenario, handle) in handles.into_iter().enumerate() {
        let Ok(Ok(result)) = handle.await else {
            panic!("scenario {scenario} must pass");
        };
        let Some(step) = result.steps().first() else {
            panic!("scenario {scenario} must record its step");
        };
        let expected: Vec<String> = (0..3)
            .map(|round| format!("scenario {scenario} round {round}"))
            .collect();
        assert_eq!(step.comments(), expected.as_slice());
    }

    let Ok(feature) = runner.feature_result() else {
        panic!("runner must still be active");
    };
    assert_eq!(feature.scenarios().len(), SCENARIOS);
    assert!(
        feature
            .scenarios()
            .iter()
            .map(ScenarioResult::status)
            .all(|status| status == ExecutionStatus::Passed)
    );
    repository.dispose();
    assert!(runner.is_disposed());
}
