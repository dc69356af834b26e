//! Where the inventory document comes from: a saved file or a live Terraform query

use super::Inventory;
use crate::{
    defaults::INVENTORY_QUERY_TIMEOUT,
    error::{AppError, Result},
    models::Config,
};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Inventory origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventorySource {
    /// JSON file written by a previous run or by hand
    File(PathBuf),
    /// `terraform output -json instances` in the given working directory
    Terraform(PathBuf),
}

impl InventorySource {
    /// An explicit inventory file wins over the Terraform directory
    pub fn from_config(config: &Config) -> Self {
        match &config.inventory_file {
            Some(path) => Self::File(path.clone()),
            None => Self::Terraform(config.terraform_dir.clone()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => format!("inventory file {}", path.display()),
            Self::Terraform(dir) => format!("Terraform outputs in {}", dir.display()),
        }
    }

    /// Read the raw inventory document
    pub async fn fetch_json(&self) -> Result<String> {
        match self {
            Self::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                AppError::io(format!("Failed to read inventory file {}: {}", path.display(), e))
            }),
            Self::Terraform(dir) => query_terraform(dir).await,
        }
    }

    /// Fetch and validate
    pub async fn load(&self) -> Result<Inventory> {
        let json = self.fetch_json().await?;
        Inventory::from_json(&json)
    }
}

async fn query_terraform(dir: &Path) -> Result<String> {
    let child = Command::new("terraform")
        .arg(format!("-chdir={}", dir.display()))
        .args(["output", "-json", "instances"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AppError::io(format!("Failed to run terraform: {}", e)))?;

    let output = tokio::time::timeout(INVENTORY_QUERY_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| {
            AppError::timeout(format!(
                "terraform output did not finish within {}s",
                INVENTORY_QUERY_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| AppError::io(format!("Failed to collect terraform output: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::malformed_inventory(format!(
            "No instances found in {} (run 'terraform apply' first): {}",
            dir.display(),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_source_selection() {
        let mut config = Config::default();
        assert_eq!(
            InventorySource::from_config(&config),
            InventorySource::Terraform(PathBuf::from("terraform"))
        );

        config.inventory_file = Some(PathBuf::from("inv.json"));
        assert_eq!(
            InventorySource::from_config(&config),
            InventorySource::File(PathBuf::from("inv.json"))
        );
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"n1": {{"region": "r", "az_id": "a", "private_ip": "10.0.0.1", "public_ip": "1.2.3.4"}}}}"#
        )
        .unwrap();

        let source = InventorySource::File(file.path().to_path_buf());
        let inventory = source.load().await.unwrap();
        assert_eq!(inventory.len(), 1);
        assert!(source.describe().contains("inventory file"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = InventorySource::File(PathBuf::from("/definitely/not/here.json"));
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn test_terraform_wrapper_in_saved_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sensitive": false, "type": "object", "value": {{
                "n1": {{"region": "r", "az_id": "a", "private_ip": "10.0.0.1", "public_ip": "1.2.3.4"}},
                "n2": {{"region": "r", "az_id": "b", "private_ip": "10.0.0.2"}}
            }}}}"#
        )
        .unwrap();

        let source = InventorySource::File(file.path().to_path_buf());
        let inventory = tokio_test::block_on(source.load()).unwrap();
        assert_eq!(inventory.regions(), vec!["r"]);
        assert!(inventory.get("n2").unwrap().public_address.is_none());
    }
}
