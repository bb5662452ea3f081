use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{AclError, Result};

const GETFACL: &str = "nfs4_getfacl";
const SETFACL: &str = "nfs4_setfacl";

/// Collaborator reading and writing the raw ACL text of one path.
///
/// `read_acl` returns the ordered ACE lines as produced by the backing tool;
/// `write_acl` replaces the whole ACL of the path atomically.
#[async_trait::async_trait]
pub trait AclStore: Send + Sync {
    async fn read_acl(&self, path: &Path) -> Result<String>;
    async fn write_acl(&self, path: &Path, acl_text: &str) -> Result<()>;
}

/// Production store shelling out to the nfs4-acl-tools binaries.
#[derive(Debug, Default, Clone)]
pub struct Nfs4AclStore;

impl Nfs4AclStore {
    pub fn new() -> Self {
        Nfs4AclStore
    }
}

#[async_trait::async_trait]
impl AclStore for Nfs4AclStore {
    async fn read_acl(&self, path: &Path) -> Result<String> {
        let output = Command::new(GETFACL)
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(AclError::Tool {
                tool: GETFACL,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn write_acl(&self, path: &Path, acl_text: &str) -> Result<()> {
        // `-S -` reads the full replacement ACL from stdin
        let mut child = Command::new(SETFACL)
            .arg("-S")
            .arg("-")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(acl_text.as_bytes()).await?;
            // Close stdin so the tool sees end of input
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(AclError::Tool {
                tool: SETFACL,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        log::debug!("Applied converted ACL to {}", path.display());
        Ok(())
    }
}
