//! End-to-end cycle controller tests over real child processes and on-disk
//! artifacts.

mod common;

use std::sync::Arc;

use tempfile::tempdir;

use common::{
    failing_step, marker_lines, marker_step, noop_step, test_config, test_plan, write_artifact,
    RecordingAlert,
};
use dw_core::cycle::CycleController;

const FRAUD_OUTPUT: &str = "modules/fraud_cases_for_llm.csv";
const TOTAL_OUTPUT: &str = "modules/non_fraud_transactions.csv";

#[tokio::test]
async fn test_drifted_cycle_alerts_once_then_retrains_once() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    // 40 / 100 = 0.40 > 0.30.
    write_artifact(root, FRAUD_OUTPUT, 40);
    write_artifact(root, TOTAL_OUTPUT, 100);

    let retrain_marker = root.join("retrain.marker");
    let plan = test_plan(
        vec![noop_step("merge"), noop_step("score")],
        marker_step("retrain", &retrain_marker),
    );
    let alerter = Arc::new(RecordingAlert::new());
    let mut controller = CycleController::new(test_config(root), plan, alerter.clone());

    let outcome = controller.run_cycle().await;
    controller.shutdown().await;

    assert!(outcome.succeeded, "failure: {:?}", outcome.failure);
    assert_eq!(alerter.sent_count(), 1, "alert dispatched exactly once");
    assert_eq!(alerter.last_ratio(), Some(0.40));
    assert_eq!(marker_lines(&retrain_marker), 1, "retrain ran exactly once");
}

#[tokio::test]
async fn test_ratio_at_threshold_triggers_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    // 30 / 100 = 0.30 exactly; strict `>` means no reaction.
    write_artifact(root, FRAUD_OUTPUT, 30);
    write_artifact(root, TOTAL_OUTPUT, 100);

    let retrain_marker = root.join("retrain.marker");
    let plan = test_plan(vec![noop_step("merge")], marker_step("retrain", &retrain_marker));
    let alerter = Arc::new(RecordingAlert::new());
    let mut controller = CycleController::new(test_config(root), plan, alerter.clone());

    let outcome = controller.run_cycle().await;
    controller.shutdown().await;

    assert!(outcome.succeeded);
    assert_eq!(alerter.sent_count(), 0);
    assert_eq!(marker_lines(&retrain_marker), 0);
}

#[tokio::test]
async fn test_missing_fraud_output_ends_cycle_quietly() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    let retrain_marker = root.join("retrain.marker");
    let plan = test_plan(vec![noop_step("merge")], marker_step("retrain", &retrain_marker));
    let alerter = Arc::new(RecordingAlert::new());
    let mut controller = CycleController::new(test_config(root), plan, alerter.clone());

    let outcome = controller.run_cycle().await;
    controller.shutdown().await;

    assert!(outcome.succeeded, "NoOutput is benign, not a failure");
    assert_eq!(alerter.sent_count(), 0);
    assert_eq!(marker_lines(&retrain_marker), 0);
}

#[tokio::test]
async fn test_empty_fraud_output_ends_cycle_quietly() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    write_artifact(root, FRAUD_OUTPUT, 0);
    write_artifact(root, TOTAL_OUTPUT, 100);

    let retrain_marker = root.join("retrain.marker");
    let plan = test_plan(vec![noop_step("merge")], marker_step("retrain", &retrain_marker));
    let alerter = Arc::new(RecordingAlert::new());
    let mut controller = CycleController::new(test_config(root), plan, alerter.clone());

    let outcome = controller.run_cycle().await;
    controller.shutdown().await;

    assert!(outcome.succeeded, "Empty is benign, not a failure");
    assert_eq!(alerter.sent_count(), 0);
    assert_eq!(marker_lines(&retrain_marker), 0);
}

#[tokio::test]
async fn test_step_failure_aborts_remaining_steps_and_evaluation() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    // Drifted artifacts are in place, but the failing step must prevent
    // evaluation from ever happening.
    write_artifact(root, FRAUD_OUTPUT, 40);
    write_artifact(root, TOTAL_OUTPUT, 100);

    let later_marker = root.join("later.marker");
    let retrain_marker = root.join("retrain.marker");
    let plan = test_plan(
        vec![
            noop_step("merge"),
            failing_step("enrich"),
            marker_step("score", &later_marker),
        ],
        marker_step("retrain", &retrain_marker),
    );
    let alerter = Arc::new(RecordingAlert::new());
    let mut controller = CycleController::new(test_config(root), plan, alerter.clone());

    let outcome = controller.run_cycle().await;
    controller.shutdown().await;

    assert!(!outcome.succeeded);
    let reason = outcome.failure.expect("failed cycle carries a reason");
    assert!(reason.contains("enrich"), "reason names the step: {reason}");
    assert_eq!(marker_lines(&later_marker), 0, "steps after the failure never ran");
    assert_eq!(alerter.sent_count(), 0, "evaluator never consulted");
    assert_eq!(marker_lines(&retrain_marker), 0);
}

#[tokio::test]
async fn test_alert_failure_does_not_block_retrain() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    write_artifact(root, FRAUD_OUTPUT, 40);
    write_artifact(root, TOTAL_OUTPUT, 100);

    let retrain_marker = root.join("retrain.marker");
    let plan = test_plan(vec![noop_step("merge")], marker_step("retrain", &retrain_marker));
    let alerter = Arc::new(RecordingAlert::failing());
    let mut controller = CycleController::new(test_config(root), plan, alerter.clone());

    let outcome = controller.run_cycle().await;
    controller.shutdown().await;

    assert!(outcome.succeeded, "alert failure is swallowed");
    assert_eq!(alerter.sent_count(), 1, "delivery was attempted");
    assert_eq!(marker_lines(&retrain_marker), 1, "retrain still ran");
}

#[tokio::test]
async fn test_retrain_failure_is_caught_at_cycle_boundary() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    write_artifact(root, FRAUD_OUTPUT, 40);
    write_artifact(root, TOTAL_OUTPUT, 100);

    let plan = test_plan(vec![noop_step("merge")], failing_step("retrain"));
    let alerter = Arc::new(RecordingAlert::new());
    let mut controller = CycleController::new(test_config(root), plan, alerter.clone());

    let outcome = controller.run_cycle().await;
    controller.shutdown().await;

    assert!(!outcome.succeeded);
    assert_eq!(alerter.sent_count(), 1, "alert went out before retrain failed");
}

#[tokio::test]
async fn test_consumer_survives_cycle_and_stops_on_shutdown() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    let plan = test_plan(vec![noop_step("merge")], noop_step("retrain"));
    let alerter = Arc::new(RecordingAlert::new());
    let mut controller = CycleController::new(test_config(root), plan, alerter);

    let outcome = controller.run_cycle().await;
    assert!(outcome.succeeded);
    assert!(
        controller.consumer_running(),
        "consumer keeps running between cycles"
    );

    controller.shutdown().await;
    assert!(!controller.consumer_running());
}

#[tokio::test]
async fn test_generate_failure_leaves_consumer_stopped() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    let mut plan = test_plan(vec![noop_step("merge")], noop_step("retrain"));
    plan.generate = failing_step("generate");
    let alerter = Arc::new(RecordingAlert::new());
    let mut controller = CycleController::new(test_config(root), plan, alerter);

    let outcome = controller.run_cycle().await;

    assert!(!outcome.succeeded);
    assert!(
        !controller.consumer_running(),
        "consumer is only started after a successful generate step"
    );
    controller.shutdown().await;
}

#[tokio::test]
async fn test_back_to_back_cycles_replace_the_consumer() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    let plan = test_plan(vec![noop_step("merge")], noop_step("retrain"));
    let alerter = Arc::new(RecordingAlert::new());
    let mut controller = CycleController::new(test_config(root), plan, alerter);

    assert!(controller.run_cycle().await.succeeded);
    assert!(controller.consumer_running());

    // The next cycle's reset must stop cycle N's consumer before starting
    // its own.
    assert!(controller.run_cycle().await.succeeded);
    assert!(controller.consumer_running());

    controller.shutdown().await;
    assert!(!controller.consumer_running());
}
