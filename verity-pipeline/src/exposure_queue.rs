//! In-process FIFO `ExposureQueue`: a `Mutex<VecDeque<_>>` is sufficient for a
//! single-process deployment; a real multi-worker deployment plugs its own
//! at-least-once channel in behind the trait.

use std::collections::VecDeque;
use std::sync::Mutex;

use verity_core::errors::VerityResult;
use verity_core::traits::{ExposureJob, ExposureQueue};

#[derive(Default)]
pub struct InProcessExposureQueue {
    jobs: Mutex<VecDeque<ExposureJob>>,
}

impl InProcessExposureQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExposureQueue for InProcessExposureQueue {
    fn enqueue(&self, job: ExposureJob) -> VerityResult<()> {
        self.jobs.lock().unwrap().push_back(job);
        Ok(())
    }

    fn drain(&self, limit: usize) -> VerityResult<Vec<ExposureJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let n = limit.min(jobs.len());
        Ok(jobs.drain(..n).collect())
    }

    fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}
