use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::DtwParameters;
use crate::error::DtwError;

/// How often the supervisor checks for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// How long output readers may lag behind the exit of the child.
const READER_GRACE: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Where and how to start the DTW executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtwCommand {
    pub program: PathBuf,
    pub working_dir: Option<PathBuf>,
    /// Wrap the program in `stdbuf -o0` so output arrives line by line
    /// rather than when the C runtime flushes its buffer.
    pub line_buffered: bool,
}

impl Default for DtwCommand {
    fn default() -> Self {
        DtwCommand {
            program: PathBuf::from("dtw"),
            working_dir: None,
            line_buffered: false,
        }
    }
}

impl DtwCommand {
    pub fn build(&self, params: &DtwParameters) -> Command {
        let mut cmd = if self.line_buffered {
            let mut cmd = Command::new("stdbuf");
            cmd.arg("-o0").arg(&self.program);
            cmd
        } else {
            Command::new(&self.program)
        };
        cmd.args(params.to_args());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The process exited on its own; `None` when killed by a signal.
    Exited(Option<i32>),
    Cancelled,
    Failed(String),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Exited(Some(0)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// One line of stdout or stderr, without the line terminator.
    Line(String),
    /// Always the last event of a task.
    Finished(TaskOutcome),
}

/// A running DTW process whose merged stdout/stderr arrives as [`TaskEvent`]s.
///
/// Two reader threads forward lines; a supervisor thread waits for the
/// process, kills its process group once [`DtwTask::cancel`] has been called,
/// and sends [`TaskEvent::Finished`] after the readers are done or
/// [`READER_GRACE`] has passed. Dropping the task cancels it.
pub struct DtwTask {
    cancel: Arc<AtomicBool>,
    events: Receiver<TaskEvent>,
    supervisor: Option<JoinHandle<()>>,
    finished: bool,
}

impl DtwTask {
    pub fn spawn(command: &DtwCommand, params: &DtwParameters) -> Result<Self, DtwError> {
        Self::spawn_command(command.build(params))
    }

    /// Start an arbitrary command with the same streaming and cancellation.
    pub fn spawn_command(mut cmd: Command) -> Result<Self, DtwError> {
        let program = cmd.get_program().to_string_lossy().into_owned();
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DtwError::Spawn {
                program: program.clone(),
                source,
            })?;
        debug!("started {program} (pid {})", child.id());

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, events) = mpsc::channel();

        let mut readers = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            readers.push(forward_lines(out, tx.clone(), Arc::clone(&cancel)));
        }
        if let Some(err) = child.stderr.take() {
            readers.push(forward_lines(err, tx.clone(), Arc::clone(&cancel)));
        }

        let flag = Arc::clone(&cancel);
        let supervisor = thread::spawn(move || supervise(child, readers, flag, tx));

        Ok(DtwTask {
            cancel,
            events,
            supervisor: Some(supervisor),
            finished: false,
        })
    }

    /// Ask the process to stop. Readers stop forwarding at the next line and
    /// the supervisor kills the process together with its children.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Whether [`TaskEvent::Finished`] has been handed out.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next event if one is ready. Never blocks.
    pub fn try_event(&mut self) -> Option<TaskEvent> {
        if self.finished {
            return None;
        }
        match self.events.try_recv() {
            Ok(event) => Some(self.observe(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.observe(TaskEvent::Finished(
                TaskOutcome::Failed("supervisor vanished".into()),
            ))),
        }
    }

    /// Blocking iterator over the remaining events, ending after `Finished`.
    pub fn events(&mut self) -> Events<'_> {
        Events { task: self }
    }

    /// Drain the task, returning its output lines and outcome.
    pub fn wait(mut self) -> (Vec<String>, TaskOutcome) {
        let mut lines = Vec::new();
        let mut outcome = TaskOutcome::Failed("no outcome reported".into());
        for event in self.events() {
            match event {
                TaskEvent::Line(line) => lines.push(line),
                TaskEvent::Finished(o) => outcome = o,
            }
        }
        (lines, outcome)
    }

    fn observe(&mut self, event: TaskEvent) -> TaskEvent {
        if matches!(event, TaskEvent::Finished(_)) {
            self.finished = true;
            if let Some(handle) = self.supervisor.take() {
                let _ = handle.join();
            }
        }
        event
    }
}

impl Drop for DtwTask {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.cancel();
        if let Some(handle) = self.supervisor.take() {
            let _ = handle.join();
        }
    }
}

/// Iterator returned by [`DtwTask::events`].
pub struct Events<'a> {
    task: &'a mut DtwTask,
}

impl Iterator for Events<'_> {
    type Item = TaskEvent;

    fn next(&mut self) -> Option<TaskEvent> {
        if self.task.finished {
            return None;
        }
        let event = self.task.events.recv().unwrap_or_else(|_| {
            TaskEvent::Finished(TaskOutcome::Failed("supervisor vanished".into()))
        });
        Some(self.task.observe(event))
    }
}

// ---------------------------------------------------------------------------
// Threads
// ---------------------------------------------------------------------------

fn forward_lines<R>(source: R, tx: Sender<TaskEvent>, cancel: Arc<AtomicBool>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("reading process output: {e}");
                    break;
                }
            }
            if cancel.load(Ordering::SeqCst) {
                break;
            }
            let line = String::from_utf8_lossy(&buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            if tx.send(TaskEvent::Line(line)).is_err() {
                break;
            }
        }
    })
}

fn supervise(
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
    tx: Sender<TaskEvent>,
) {
    let outcome = loop {
        if cancel.load(Ordering::SeqCst) {
            terminate(&mut child);
            let _ = child.wait();
            break TaskOutcome::Cancelled;
        }
        match child.try_wait() {
            Ok(Some(status)) => break TaskOutcome::Exited(status.code()),
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => break TaskOutcome::Failed(e.to_string()),
        }
    };

    // A descendant that outlives the child keeps the pipes open, so the
    // readers are only waited for a short while once the child is gone.
    let deadline = Instant::now() + READER_GRACE;
    for reader in readers {
        while !reader.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
        if reader.is_finished() {
            let _ = reader.join();
        } else {
            warn!("process output still open after exit, detaching reader");
        }
    }
    debug!("process finished: {outcome:?}");
    let _ = tx.send(TaskEvent::Finished(outcome));
}

/// Kill the child and, on unix, everything else in its process group.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        // The child was started as the leader of its own group.
        let pgid = child.id() as libc::pid_t;
        // SAFETY: killpg only sends a signal; it touches no memory of ours.
        if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
            return;
        }
        debug!("killpg {pgid}: {}", std::io::Error::last_os_error());
    }
    if let Err(e) = child.kill() {
        // Already gone; nothing to terminate.
        debug!("kill: {e}");
    }
}
