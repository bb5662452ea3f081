use std::path::Path;
use std::sync::Arc;

use tokio::fs as tokio_fs;
use utils::error::{Error, Result};

use nfs4acl::{Acl, AclStore, Nfs4AclStore};

use crate::walk::{ParallelTreeWalk, WalkCallback};

mod report;

pub use report::{ReportMessage, Reporter};

/// Input parameters of one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertParams {
    /// Root directory of the tree to convert
    pub directory: String,
    /// Number of parallel workers for the tree walk
    pub num_threads: usize,
    /// Report the proposed ACLs instead of writing them back
    pub dry_run: bool,
}

/// Tree walk callback that fetches a directory's ACL, runs the conversion
/// rules and either reports or persists the result.
pub struct AclConverter<S: AclStore> {
    store: S,
    dry_run: bool,
    reporter: Reporter,
}

impl<S: AclStore> AclConverter<S> {
    pub fn new(store: S, dry_run: bool, reporter: Reporter) -> Self {
        Self {
            store,
            dry_run,
            reporter,
        }
    }

    async fn process_directory(&self, path: &Path) {
        let raw = match self.store.read_acl(path).await {
            Ok(raw) => raw,
            Err(err) => {
                self.reporter.failure(path, err.to_string()).await;
                return;
            }
        };

        let mut acl = match Acl::parse(&raw) {
            Ok(acl) => acl,
            Err(err) => {
                self.reporter.failure(path, err.to_string()).await;
                return;
            }
        };

        match acl.convert() {
            Ok(false) => {
                // Nothing to propagate, or already fully migrated
                log::debug!("ACL of {} left unchanged", path.display());
            }
            Ok(true) => {
                if self.dry_run {
                    self.reporter.converted(path, acl.to_text()).await;
                } else if let Err(err) = self.store.write_acl(path, &acl.to_text()).await {
                    self.reporter.failure(path, err.to_string()).await;
                } else {
                    self.reporter.applied(path).await;
                }
            }
            Err(err) => {
                self.reporter.failure(path, err.to_string()).await;
            }
        }
    }
}

#[async_trait::async_trait]
impl<S: AclStore> WalkCallback for AclConverter<S> {
    async fn process_entry(&self, path: &Path) -> bool {
        let metadata = match tokio_fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(err) => {
                self.reporter.failure(path, err.to_string()).await;
                return false;
            }
        };

        // Symbolic links are never followed, even when they point at
        // directories; everything that is not a directory is a leaf.
        if metadata.file_type().is_symlink() || !metadata.is_dir() {
            return false;
        }

        // A real directory stays expandable no matter how its own ACL
        // conversion turns out; failures only affect the directory itself.
        self.process_directory(path).await;
        true
    }

    async fn on_error(&self, path: &Path, message: String) {
        self.reporter.failure(path, message).await;
    }
}

/// Run one full conversion pass over the tree rooted at `params.directory`.
///
/// Per-path errors are reported on the error stream and never abort the
/// walk; the pass always runs to completion.
pub async fn run_convert(params: ConvertParams) -> Result<()> {
    log::info!("Starting ACL conversion with params: {:?}", params);

    let (reporter, report_handle) = Reporter::spawn();
    let converter = Arc::new(AclConverter::new(
        Nfs4AclStore::new(),
        params.dry_run,
        reporter,
    ));

    let walk = ParallelTreeWalk::new(params.num_threads, converter);
    walk.run(Path::new(&params.directory)).await;

    // Dropping the walk drops the last reporter clone; the sink then drains
    // its queue and ends.
    drop(walk);
    report_handle
        .await
        .map_err(|e| Error::with_source("Report sink task failed", Box::new(e)))?;

    log::info!("ACL conversion completed");
    Ok(())
}
