#![cfg(unix)]

use std::process::Command;
use std::time::{Duration, Instant};

use phonolab::dtw::{DtwCommand, DtwParameters, DtwTask, TaskEvent, TaskOutcome};

fn sh(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script);
    cmd
}

#[test]
fn streams_stdout_and_stderr_lines() {
    let task = DtwTask::spawn_command(sh("echo one; echo two >&2; echo three")).unwrap();
    let (mut lines, outcome) = task.wait();

    assert_eq!(outcome, TaskOutcome::Exited(Some(0)));
    lines.sort();
    assert_eq!(lines, vec!["one", "three", "two"]);
}

#[test]
fn reports_non_zero_exit() {
    let task = DtwTask::spawn_command(sh("echo failing; exit 3")).unwrap();
    let (lines, outcome) = task.wait();

    assert_eq!(lines, vec!["failing"]);
    assert_eq!(outcome, TaskOutcome::Exited(Some(3)));
    assert!(!outcome.is_success());
}

#[test]
fn cancel_stops_a_long_running_child() {
    let mut task = DtwTask::spawn_command(sh("echo started; exec sleep 30")).unwrap();
    let begun = Instant::now();

    let mut events = Vec::new();
    for event in task.events() {
        let first_line = matches!(&event, TaskEvent::Line(l) if l == "started");
        events.push(event);
        if first_line {
            break;
        }
    }
    task.cancel();
    let outcome = task
        .events()
        .find_map(|e| match e {
            TaskEvent::Finished(o) => Some(o),
            TaskEvent::Line(_) => None,
        })
        .unwrap();

    assert_eq!(outcome, TaskOutcome::Cancelled);
    assert!(task.is_finished());
    assert!(begun.elapsed() < Duration::from_secs(10));
    assert_eq!(events, vec![TaskEvent::Line("started".into())]);
}

#[test]
fn cancel_reaches_children_of_the_child() {
    // No `exec`: the shell forks `sleep`, which inherits the output pipes.
    let mut task =
        DtwTask::spawn_command(sh("echo started; sleep 30; echo done")).unwrap();
    let begun = Instant::now();

    assert_eq!(task.events().next(), Some(TaskEvent::Line("started".into())));
    task.cancel();
    let (lines, outcome) = task.wait();

    assert_eq!(outcome, TaskOutcome::Cancelled);
    assert!(lines.is_empty(), "unexpected output after cancel: {lines:?}");
    assert!(begun.elapsed() < Duration::from_secs(5));
}

#[test]
fn finishes_when_a_background_child_keeps_the_pipes_open() {
    let begun = Instant::now();
    let task = DtwTask::spawn_command(sh("echo main; sleep 30 &")).unwrap();
    let (lines, outcome) = task.wait();

    assert_eq!(lines, vec!["main"]);
    assert_eq!(outcome, TaskOutcome::Exited(Some(0)));
    assert!(begun.elapsed() < Duration::from_secs(5));
}

#[test]
fn dropping_a_running_task_returns_promptly() {
    let mut task = DtwTask::spawn_command(sh("echo up; sleep 30; true")).unwrap();
    assert_eq!(task.events().next(), Some(TaskEvent::Line("up".into())));

    let begun = Instant::now();
    drop(task);
    assert!(begun.elapsed() < Duration::from_secs(5));
}

#[test]
fn passes_parameters_as_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let command = DtwCommand {
        program: "echo".into(),
        working_dir: Some(dir.path().to_path_buf()),
        line_buffered: false,
    };
    let mut params = DtwParameters::default();
    params.set("knn", 3).unwrap();
    let (lines, outcome) = DtwTask::spawn(&command, &params).unwrap().wait();

    assert!(outcome.is_success());
    assert_eq!(lines, vec![params.to_args().join(" ")]);
    assert!(lines[0].contains("knn 3"));
}

#[test]
fn missing_program_fails_to_spawn() {
    let command = DtwCommand {
        program: "/definitely/not/a/dtw/binary".into(),
        ..DtwCommand::default()
    };
    assert!(DtwTask::spawn(&command, &DtwParameters::default()).is_err());
}
