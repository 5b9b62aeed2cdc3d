//! Background scene save / load
//!
//! A [`TaskQueue`] owns one worker thread fed through a flume channel. Each
//! submitted job reports back through its own channel, observed via the
//! returned [`SceneTask`]. Scene jobs lock the [`SharedScene`] for their whole
//! run, so no other mutation interleaves with a save or load.

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use super::{Scene, SceneError, SceneResult};

/// A scene shared between the main loop and the task worker
pub type SharedScene = Arc<Mutex<Scene>>;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Single background worker running scene jobs in submission order
pub struct TaskQueue {
    sender: Option<flume::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl TaskQueue {
    /// Spawn the worker thread
    pub fn new() -> SceneResult<Self> {
        let (sender, receiver) = flume::unbounded::<Job>();
        let worker = std::thread::Builder::new()
            .name("scene-tasks".to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    job();
                }
                log::debug!("Scene task worker stopped");
            })?;
        Ok(Self { sender: Some(sender), worker: Some(worker) })
    }

    /// Queue `job`; its result is delivered through the returned task
    pub fn submit<F>(&self, job: F) -> SceneTask
    where
        F: FnOnce() -> SceneResult<()> + Send + 'static,
    {
        let (done, receiver) = flume::bounded(1);
        let wrapped: Job = Box::new(move || {
            // The caller may have dropped its task; nothing to report then
            let _ = done.send(job());
        });

        let queued = self.sender.as_ref().is_some_and(|s| s.send(wrapped).is_ok());
        if !queued {
            log::error!("Scene task worker is not running");
        }
        SceneTask { receiver, result: None }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain pending jobs and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Scene task worker panicked");
            }
        }
    }
}

/// Completion handle of a submitted job
pub struct SceneTask {
    receiver: flume::Receiver<SceneResult<()>>,
    result: Option<SceneResult<()>>,
}

impl SceneTask {
    fn poll(&mut self) {
        if self.result.is_some() {
            return;
        }
        match self.receiver.try_recv() {
            Ok(result) => self.result = Some(result),
            Err(flume::TryRecvError::Disconnected) => self.result = Some(Err(SceneError::WorkerGone)),
            Err(flume::TryRecvError::Empty) => {}
        }
    }

    /// Whether the job has finished, successfully or not
    pub fn is_finished(&mut self) -> bool {
        self.poll();
        self.result.is_some()
    }

    /// Take the result if the job has finished
    pub fn try_result(&mut self) -> Option<SceneResult<()>> {
        self.poll();
        self.result.take()
    }

    /// Block until the job finishes
    pub fn wait(mut self) -> SceneResult<()> {
        if let Some(result) = self.result.take() {
            return result;
        }
        self.receiver.recv().unwrap_or(Err(SceneError::WorkerGone))
    }
}

impl Scene {
    /// Save `scene` on the task worker
    pub fn save_to_file_async(scene: &SharedScene, queue: &TaskQueue, path: impl Into<PathBuf>) -> SceneTask {
        let scene = Arc::clone(scene);
        let path = path.into();
        queue.submit(move || scene.lock().save_to_file(&path))
    }

    /// Load into `scene` on the task worker
    pub fn load_from_file_async(scene: &SharedScene, queue: &TaskQueue, path: impl Into<PathBuf>) -> SceneTask {
        let scene = Arc::clone(scene);
        let path = path.into();
        queue.submit(move || scene.lock().load_from_file(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_jobs_run_in_order_and_report() {
        let queue = TaskQueue::new().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let first = {
            let counter = Arc::clone(&counter);
            queue.submit(move || {
                assert_eq!(counter.fetch_add(1, Ordering::SeqCst), 0);
                Ok(())
            })
        };
        let second = {
            let counter = Arc::clone(&counter);
            queue.submit(move || {
                assert_eq!(counter.fetch_add(1, Ordering::SeqCst), 1);
                Err(SceneError::Format("bad".to_string()))
            })
        };

        assert!(first.wait().is_ok());
        assert!(matches!(second.wait(), Err(SceneError::Format(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_finished_task_keeps_result_until_taken() {
        let queue = TaskQueue::new().unwrap();
        let mut task = queue.submit(|| Ok(()));
        while !task.is_finished() {
            std::thread::yield_now();
        }
        assert!(task.is_finished());
        assert!(matches!(task.try_result(), Some(Ok(()))));
    }

    #[test]
    fn test_panicking_job_reports_worker_gone() {
        let queue = TaskQueue::new().unwrap();
        let task = queue.submit(|| panic!("job failed"));
        assert!(matches!(task.wait(), Err(SceneError::WorkerGone)));
    }
}
