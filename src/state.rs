use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

use phonolab::data::confusion::{CONFUSION_FILE, ConfusionMatrix};
use phonolab::data::model::FIGS_DIR;
use phonolab::dtw::{
    BOUNDS_PARAMETERS, DtwCommand, DtwParameters, DtwTask, NUMERIC_PARAMETERS, TaskEvent,
    TaskOutcome,
};
use phonolab::error::{DtwError, chain};
use phonolab::render::render_confusion_file;

/// Oldest output lines are dropped beyond this.
const MAX_OUTPUT_LINES: usize = 10_000;
/// Events drained per frame so a chatty process cannot stall the UI.
const MAX_EVENTS_PER_POLL: usize = 512;

pub const IDLE_MESSAGE: &str = "Return to change values or press Start to run again...";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Parameters,
    Output,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub screen: Screen,

    /// Values the next run will use.
    pub params: DtwParameters,

    /// Text typed into each parameter field. Empty means "keep current value".
    pub edits: BTreeMap<&'static str, String>,

    pub command: DtwCommand,

    /// Running (or just finished, not yet polled) process.
    pub task: Option<DtwTask>,

    /// Merged stdout/stderr of the current run.
    pub output: VecDeque<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Confusion matrix of the last completed run.
    pub matrix: Option<ConfusionMatrix>,

    /// Rendered heatmap of `matrix`.
    pub matrix_image: Option<PathBuf>,

    /// Bumped each time `matrix_image` is rewritten so the texture is reloaded.
    pub matrix_version: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::default(),
            params: DtwParameters::default(),
            edits: BTreeMap::new(),
            command: DtwCommand::default(),
            task: None,
            output: VecDeque::new(),
            status_message: None,
            matrix: None,
            matrix_image: None,
            matrix_version: 0,
        }
    }
}

impl AppState {
    /// Every editable parameter, in display order.
    pub fn editable_parameters() -> impl Iterator<Item = &'static str> {
        NUMERIC_PARAMETERS.into_iter().chain(BOUNDS_PARAMETERS)
    }

    /// Commit the typed values. Nothing changes unless all of them parse.
    pub fn apply_edits(&mut self) -> Result<(), DtwError> {
        let mut next = self.params.clone();
        for (name, text) in &self.edits {
            if !text.trim().is_empty() {
                next.set_text(name, text)?;
            }
        }
        self.params = next;
        self.edits.clear();
        Ok(())
    }

    /// Forget typed values; fields fall back to showing the current ones.
    pub fn reset_edits(&mut self) {
        self.edits.clear();
    }

    /// Leave the parameter form for the output screen.
    pub fn go_to_output(&mut self) {
        match self.apply_edits() {
            Ok(()) => {
                self.status_message = None;
                self.screen = Screen::Output;
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// The Start/Stop button.
    pub fn toggle_run(&mut self) {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn start(&mut self) {
        self.output.clear();
        self.matrix = None;
        self.matrix_image = None;
        match DtwTask::spawn(&self.command, &self.params) {
            Ok(task) => self.attach(task),
            Err(e) => {
                log::error!("{}", chain(&e));
                self.status_message = Some(chain(&e));
            }
        }
    }

    /// Watch an already started task.
    pub fn attach(&mut self, task: DtwTask) {
        log::info!("DTW run started");
        self.task = Some(task);
        self.status_message = Some("Running…".into());
    }

    pub fn stop(&mut self) {
        if let Some(task) = &self.task {
            task.cancel();
            self.status_message = Some("Stopping…".into());
        }
    }

    /// Pull pending output from the task. Returns whether anything changed.
    pub fn poll(&mut self) -> bool {
        let Some(task) = self.task.as_mut() else {
            return false;
        };
        let mut finished = None;
        let mut changed = false;
        for _ in 0..MAX_EVENTS_PER_POLL {
            match task.try_event() {
                Some(TaskEvent::Line(line)) => {
                    self.output.push_back(line);
                    changed = true;
                }
                Some(TaskEvent::Finished(outcome)) => {
                    finished = Some(outcome);
                    break;
                }
                None => break,
            }
        }
        while self.output.len() > MAX_OUTPUT_LINES {
            self.output.pop_front();
        }
        if let Some(outcome) = finished {
            self.task = None;
            self.finish(outcome);
            changed = true;
        }
        changed
    }

    fn finish(&mut self, outcome: TaskOutcome) {
        log::info!("DTW run ended: {outcome:?}");
        match outcome {
            TaskOutcome::Exited(code) => {
                if code != Some(0) {
                    log::warn!("DTW exited with status {code:?}");
                }
                self.output.push_back("Finished :: Generating Matrix".into());
                self.status_message = Some(match self.load_matrix() {
                    Ok(()) => IDLE_MESSAGE.to_string(),
                    Err(e) => format!("No confusion matrix: {e:#}"),
                });
            }
            TaskOutcome::Cancelled => self.status_message = Some("Stopped".into()),
            TaskOutcome::Failed(msg) => self.status_message = Some(format!("DTW failed: {msg}")),
        }
    }

    /// Render the confusion matrix the executable left in its working directory.
    pub fn load_matrix(&mut self) -> anyhow::Result<()> {
        let dir = self
            .command
            .working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let output = dir.join(FIGS_DIR).join("confusion_matrix.png");
        let matrix = render_confusion_file(&dir.join(CONFUSION_FILE), &output)?;
        self.matrix = Some(matrix);
        self.matrix_image = Some(output);
        self.matrix_version += 1;
        Ok(())
    }

    /// Replace the parameters with a preset file.
    pub fn load_preset(&mut self, path: &std::path::Path) {
        match DtwParameters::load(path) {
            Ok(params) => {
                self.params = params;
                self.edits.clear();
                self.status_message = Some(format!("Loaded {}", path.display()));
            }
            Err(e) => self.status_message = Some(chain(&e)),
        }
    }

    pub fn save_preset(&mut self, path: &std::path::Path) {
        let result = self.apply_edits().and_then(|()| self.params.save(path));
        self.status_message = Some(match result {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => chain(&e),
        });
    }
}
