//! Callback-based progress reporting for long-running workflows.
//!
//! The core never draws anything; a frontend installs a callback and renders
//! the events however it likes (the CLI bridges them to an indicatif bar).

#[derive(Debug, Clone)]
pub enum Progress {
    /// A batch of `total_steps` independent units is starting.
    TaskStart { total_steps: u64 },
    /// One unit of the current batch finished.
    TaskIncrement,
    /// The current batch is complete.
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
