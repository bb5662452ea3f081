use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs as tokio_fs;
use tokio::task::JoinHandle;

mod queue;


pub use queue::WorkQueue;

/// Per-path hook invoked by the tree walk.
#[async_trait::async_trait]
pub trait WalkCallback: Send + Sync {
    /// Process one discovered path. Returns true if the path is a directory
    /// that shall be expanded into its children.
    async fn process_entry(&self, path: &Path) -> bool;

    /// Report a failure tied to one path. Errors are local to the path they
    /// occurred on; the walk itself keeps going.
    async fn on_error(&self, path: &Path, message: String);
}

/// A parallel breadth-first directory tree walk with a custom callback.
///
/// A fixed pool of workers drains one FIFO queue of pending directories.
/// Visitation order approximates breadth-first once several workers are
/// active; only the parent-before-children relationship is guaranteed. Each
/// path is visited exactly once, there are no retries and no cancellation.
pub struct ParallelTreeWalk<C: WalkCallback + 'static> {
    num_workers: usize,
    callback: Arc<C>,
    queue: Arc<WorkQueue<PathBuf>>,
}

impl<C: WalkCallback + 'static> ParallelTreeWalk<C> {
    pub fn new(num_workers: usize, callback: Arc<C>) -> Self {
        Self {
            num_workers: num_workers.max(1),
            callback,
            queue: Arc::new(WorkQueue::new()),
        }
    }

    /// Walk the tree rooted at `path` and block until every discovered
    /// directory has been processed.
    ///
    /// Startup is two-phase on purpose: the root is processed synchronously
    /// first, then the workers are spawned, and only then is the root
    /// enqueued. Spawning workers before any work exists is safe solely
    /// because they block on the empty queue.
    pub async fn run(&self, path: &Path) {
        if !self.callback.process_entry(path).await {
            // Not a directory (or a symlink): nothing to walk
            return;
        }

        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(self.num_workers);
        for _ in 0..self.num_workers {
            let queue = Arc::clone(&self.queue);
            let callback = Arc::clone(&self.callback);
            workers.push(tokio::spawn(worker_task(queue, callback)));
        }

        self.queue.push(path.to_path_buf());
        self.queue.join().await;

        // All discovered work is drained; wind the pool down.
        self.queue.close();
        for worker in workers {
            let _ = worker.await;
        }
    }
}

async fn worker_task<C: WalkCallback>(queue: Arc<WorkQueue<PathBuf>>, callback: Arc<C>) {
    while let Some(path) = queue.pop().await {
        if let Err(err) = expand_directory(&queue, callback.as_ref(), &path).await {
            // Abandon this branch; siblings already enqueued are unaffected
            callback.on_error(&path, err.to_string()).await;
        }
        queue.task_done();
    }
}

/// List the immediate children of `path`, hand each one to the callback and
/// enqueue the ones reported as expandable.
async fn expand_directory<C: WalkCallback>(
    queue: &WorkQueue<PathBuf>, callback: &C, path: &Path,
) -> io::Result<()> {
    let mut entries = tokio_fs::read_dir(path).await?;

    while let Some(entry) = entries.next_entry().await? {
        let child = entry.path();
        if callback.process_entry(&child).await {
            queue.push(child);
        }
    }

    Ok(())
}
