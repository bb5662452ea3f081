use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One message on the report channel.
#[derive(Debug, Clone)]
pub enum ReportMessage {
    /// Dry run only: the path and its proposed post-conversion ACL text.
    Converted { path: PathBuf, acl_text: String },
    /// The converted ACL was written back successfully.
    Applied { path: PathBuf },
    /// Per-path failure; the walk continues.
    Failure { path: PathBuf, message: String },
}

/// Handle for submitting report messages from any worker.
///
/// All output goes through a single consumer task, so multi-line messages are
/// never interleaved between concurrent workers. The consumer ends once every
/// reporter clone has been dropped.
#[derive(Clone)]
pub struct Reporter {
    tx: mpsc::Sender<ReportMessage>,
}

impl Reporter {
    /// Create the reporter and spawn its consumer task. The returned handle
    /// must be awaited after all reporter clones are gone to flush output.
    pub fn spawn() -> (Reporter, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel::<ReportMessage>(1000);
        let handle = tokio::spawn(consume(rx));
        (Reporter { tx }, handle)
    }

    pub async fn converted(&self, path: &Path, acl_text: String) {
        self.send(ReportMessage::Converted {
            path: path.to_path_buf(),
            acl_text,
        })
        .await;
    }

    pub async fn applied(&self, path: &Path) {
        self.send(ReportMessage::Applied {
            path: path.to_path_buf(),
        })
        .await;
    }

    pub async fn failure(&self, path: &Path, message: String) {
        self.send(ReportMessage::Failure {
            path: path.to_path_buf(),
            message,
        })
        .await;
    }

    async fn send(&self, message: ReportMessage) {
        if let Err(err) = self.tx.send(message).await {
            log::error!("Report sink is gone, dropping message: {:?}", err.0);
        }
    }
}

async fn consume(mut rx: mpsc::Receiver<ReportMessage>) {
    while let Some(message) = rx.recv().await {
        match message {
            ReportMessage::Converted { path, acl_text } => {
                // Path line followed by the full ACL, as one atomic block
                println!("{}\n{}", path.display(), acl_text);
            }
            ReportMessage::Applied { path } => {
                log::info!("Converted ACL of {}", path.display());
            }
            ReportMessage::Failure { path, message } => {
                eprintln!("Failed to process {}: {}", path.display(), message);
            }
        }
    }
}
