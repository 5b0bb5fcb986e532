mod common;

use std::fs;

use jobflow::db::SqliteStore;
use jobflow::eligibility::Eligibility;
use jobflow::error::FlowError;
use jobflow::status::store::session_id;
use jobflow::status::{StatusLevel, StatusStore};
use jobflow::submit::{SubmitOptions, Submitter};

use common::{add_jobs, MockScheduler, TestProject};

fn bundled(size: usize) -> SubmitOptions {
    SubmitOptions { bundle: Some(size), ..Default::default() }
}

#[test]
fn pretend_registers_and_real_submission_follows() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    let jobs = add_jobs(&store, &[1]);
    let submitter = Submitter::new(&project, &store, &scheduler);
    let status = StatusStore::new(&store);
    let session = session_id(&jobs[0], "run");

    let pretend = SubmitOptions { pretend: true, ..Default::default() };
    let summary = submitter.submit(None, None, None, &pretend).unwrap();
    assert_eq!(summary.sessions, vec![session.clone()]);
    assert_eq!(status.level(&jobs[0], &session).unwrap(), Some(StatusLevel::Registered));
    assert!(scheduler.submitted.borrow()[0].pretend);

    let summary = submitter.submit(None, None, None, &SubmitOptions::default()).unwrap();
    assert_eq!(summary.sessions, vec![session.clone()]);
    assert_eq!(status.level(&jobs[0], &session).unwrap(), Some(StatusLevel::Submitted));

    let recorded = scheduler.submitted.borrow();
    assert_eq!(recorded.len(), 2);
    assert!(!recorded[1].pretend);
    assert_eq!(recorded[1].name, session);
    assert_eq!(recorded[1].np, 1);
    assert!(recorded[1].script.ends_with("wait\n"));
    assert!(!recorded[1].script.contains(" &"));
}

#[test]
fn submitted_sessions_are_not_submitted_again() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    add_jobs(&store, &[1, 1, 1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    assert_eq!(submitter.submit(None, None, None, &SubmitOptions::default()).unwrap().sessions.len(), 3);
    assert!(submitter.submit(None, None, None, &SubmitOptions::default()).unwrap().sessions.is_empty());
    assert!(submitter.submit(None, None, None, &bundled(0)).unwrap().sessions.is_empty());
    assert_eq!(scheduler.submitted.borrow().len(), 3);

    let forced = SubmitOptions { force: true, ..Default::default() };
    assert_eq!(submitter.submit(None, None, None, &forced).unwrap().sessions.len(), 3);
}

#[test]
fn duplicate_candidates_are_submitted_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    let jobs = add_jobs(&store, &[1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let to_submit = vec![(jobs[0].clone(), "run".to_string()), (jobs[0].clone(), "run".to_string())];
    let summary = submitter.submit_jobs(to_submit, &SubmitOptions::default()).unwrap();
    assert_eq!(summary.sessions.len(), 1);
}

#[test]
fn repeated_job_ids_fill_one_bundle_slot() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    let jobs = add_jobs(&store, &[1, 1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let ids = vec![jobs[0].id().to_string(), jobs[0].id().to_string()];
    let summary = submitter.submit(Some(ids.as_slice()), None, None, &bundled(0)).unwrap();
    assert_eq!(summary.sessions, vec![session_id(&jobs[0], "run")]);
    {
        let recorded = scheduler.submitted.borrow();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].np, 1);
        assert_eq!(recorded[0].name, session_id(&jobs[0], "run"));
    }

    // forcing skips eligibility, not the repeat check
    let forced = SubmitOptions { bundle: Some(0), force: true, ..Default::default() };
    let ids = vec![jobs[1].id().to_string(), jobs[0].id().to_string(), jobs[1].id().to_string()];
    let summary = submitter.submit(Some(ids.as_slice()), None, None, &forced).unwrap();
    assert_eq!(summary.sessions, vec![session_id(&jobs[1], "run"), session_id(&jobs[0], "run")]);
    assert_eq!(scheduler.submitted.borrow()[1].np, 2);
}

#[test]
fn bundle_of_everything_sums_processors() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    add_jobs(&store, &[2, 3]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let summary = submitter.submit(None, None, None, &bundled(0)).unwrap();
    assert_eq!(summary.sessions.len(), 2);
    assert_eq!(summary.scheduler_ids.len(), 1);

    let recorded = scheduler.submitted.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].np, 5);
    assert!(recorded[0].name.starts_with("demo-bundle-"));
    assert_eq!(recorded[0].script.matches(" &\n").count(), 2);
    assert_eq!(recorded[0].script.matches("# Statepoint:").count(), 2);
    assert!(recorded[0].script.ends_with("wait\n"));

    let bundle = fs::read_to_string(dir.path().join(&recorded[0].name)).unwrap();
    let lines: Vec<&str> = bundle.lines().collect();
    assert_eq!(lines, summary.sessions.iter().map(String::as_str).collect::<Vec<&str>>());
}

#[test]
fn serial_bundle_takes_the_largest_operation() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    add_jobs(&store, &[2, 3, 1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let options = SubmitOptions { bundle: Some(0), serial: true, ..Default::default() };
    submitter.submit(None, None, None, &options).unwrap();

    let recorded = scheduler.submitted.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].np, 3);
    assert!(!recorded[0].script.contains(" &"));
    assert!(recorded[0].script.contains("mpirun -np 3 ./run run"));
}

#[test]
fn bundles_of_two_over_five_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    add_jobs(&store, &[1, 1, 1, 1, 1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let summary = submitter.submit(None, None, None, &bundled(2)).unwrap();
    assert_eq!(summary.sessions.len(), 5);

    let recorded = scheduler.submitted.borrow();
    let nps: Vec<u32> = recorded.iter().map(|r| r.np).collect();
    assert_eq!(nps, vec![2, 2, 1]);
    assert!(recorded[0].name.starts_with("demo-bundle-"));
    assert!(recorded[1].name.starts_with("demo-bundle-"));
    assert!(!recorded[2].name.starts_with("demo-bundle-"));
}

#[test]
fn num_caps_the_submission() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    add_jobs(&store, &[1, 1, 1, 1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let options = SubmitOptions { num: Some(3), bundle: Some(2), ..Default::default() };
    let summary = submitter.submit(None, None, None, &options).unwrap();
    assert_eq!(summary.sessions.len(), 3);
    assert_eq!(summary.scheduler_ids.len(), 2);

    let rest = submitter.submit(None, None, None, &SubmitOptions::default()).unwrap();
    assert_eq!(rest.sessions.len(), 1);
}

#[test]
fn serial_submissions_are_chained() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    add_jobs(&store, &[1, 1, 1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let options = SubmitOptions { serial: true, after: Some("77".to_string()), ..Default::default() };
    let summary = submitter.submit(None, None, None, &options).unwrap();
    assert_eq!(summary.scheduler_ids, vec!["1001", "1002", "1003"]);

    let after: Vec<Vec<String>> = scheduler.submitted.borrow().iter().map(|r| r.after.clone()).collect();
    assert_eq!(after, vec![vec!["77"], vec!["77", "1001"], vec!["77", "1001", "1002"]]);
}

#[test]
fn undefined_eligibility_aborts_before_anything_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let mut project = TestProject::new(dir.path());
    project.policy = Eligibility::Undefined;
    let scheduler = MockScheduler::default();
    let jobs = add_jobs(&store, &[1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let err = submitter.submit(None, None, None, &SubmitOptions::default()).unwrap_err();
    assert!(matches!(err, FlowError::EligibilityUndefined { ref job, .. } if job == jobs[0].id()));
    assert!(scheduler.submitted.borrow().is_empty());
    assert!(StatusStore::new(&store).get(&jobs[0]).unwrap().is_empty());
}

#[test]
fn missing_processor_count_aborts_the_unit() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let mut project = TestProject::new(dir.path());
    project.forget_np = true;
    let scheduler = MockScheduler::default();
    let jobs = add_jobs(&store, &[1, 1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let err = submitter.submit(None, None, None, &bundled(0)).unwrap_err();
    assert!(matches!(err, FlowError::UndeterminedProcessorCount { ref operation, .. } if operation == "run"));
    assert!(scheduler.submitted.borrow().is_empty());
    for job in &jobs {
        assert!(StatusStore::new(&store).get(job).unwrap().is_empty());
    }
}

#[test]
fn missing_mpi_wrapper_aborts_the_unit() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let mut project = TestProject::new(dir.path());
    project.with_mpi = false;
    let scheduler = MockScheduler::default();
    let jobs = add_jobs(&store, &[4]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let err = submitter.submit(None, None, None, &SubmitOptions::default()).unwrap_err();
    assert!(matches!(err, FlowError::MissingMpiWrapper { ref session, np: 4 } if *session == session_id(&jobs[0], "run")));
    assert!(scheduler.submitted.borrow().is_empty());
}

#[test]
fn failed_scheduler_call_keeps_the_status() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler { fail: true, ..Default::default() };
    let jobs = add_jobs(&store, &[1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    assert!(matches!(
        submitter.submit(None, None, None, &SubmitOptions::default()),
        Err(FlowError::Scheduler(_))
    ));
    let level = StatusStore::new(&store).level(&jobs[0], &session_id(&jobs[0], "run")).unwrap();
    assert_eq!(level, Some(StatusLevel::Submitted));
}

#[test]
fn explicit_job_ids_and_operation() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    let jobs = add_jobs(&store, &[1, 1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let ids = vec![jobs[1].id().to_string()];
    let summary = submitter.submit(Some(ids.as_slice()), Some("analyze"), None, &SubmitOptions::default()).unwrap();
    assert_eq!(summary.sessions, vec![session_id(&jobs[1], "analyze")]);

    let unknown = vec!["nope".to_string()];
    assert!(matches!(
        submitter.submit(Some(unknown.as_slice()), None, None, &SubmitOptions::default()),
        Err(FlowError::JobNotFound(_))
    ));
}

#[test]
fn filter_selects_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::in_memory().unwrap();
    let project = TestProject::new(dir.path());
    let scheduler = MockScheduler::default();
    let jobs = add_jobs(&store, &[1, 1, 1]);
    let submitter = Submitter::new(&project, &store, &scheduler);

    let filter = serde_json::json!({"i": 2}).as_object().cloned().unwrap();
    let summary = submitter.submit(None, None, Some(&filter), &SubmitOptions::default()).unwrap();
    assert_eq!(summary.sessions, vec![session_id(&jobs[2], "run")]);
}
