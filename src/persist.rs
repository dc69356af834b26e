//! Run directory persistence
//!
//! Layout of one run directory:
//!
//! ```text
//! <output_dir>/
//!   inventory.json        snapshot of the inventory the run was planned from
//!   results.partial.json  checkpoint, replaced after every region
//!   results.json          final run record
//!   report.txt            human-readable report
//! ```
//!
//! Every JSON file is written to a temporary sibling, synced and renamed into
//! place, so a reader never observes a half-written document.

use crate::{
    error::{AppError, ErrorContext, Result},
    inventory::Inventory,
    models::Run,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const INVENTORY_FILE: &str = "inventory.json";
pub const RESULTS_FILE: &str = "results.json";
pub const CHECKPOINT_FILE: &str = "results.partial.json";
pub const REPORT_FILE: &str = "report.txt";

/// Files of one run directory
#[derive(Debug, Clone)]
pub struct RunStore {
    output_dir: PathBuf,
}

impl RunStore {
    /// Open `output_dir`, creating it if needed
    pub fn create(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| {
            AppError::io(format!(
                "Failed to create output directory '{}': {}",
                output_dir.display(),
                e
            ))
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.output_dir.join(INVENTORY_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(RESULTS_FILE)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir.join(CHECKPOINT_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE)
    }

    /// Snapshot of the inventory, in the same shape it is loaded from
    pub fn save_inventory(&self, inventory: &Inventory) -> Result<PathBuf> {
        let path = self.inventory_path();
        let content = serde_json::to_string_pretty(&inventory.to_descriptors())?;
        write_atomic(&path, content.as_bytes())?;
        Ok(path)
    }

    /// Partial run; replaced wholesale on every call
    pub fn checkpoint(&self, run: &Run) -> Result<PathBuf> {
        let path = self.checkpoint_path();
        write_atomic(&path, run.to_json_pretty()?.as_bytes())?;
        Ok(path)
    }

    /// Final run record; the checkpoint is removed once it is written
    pub fn save_run(&self, run: &Run) -> Result<PathBuf> {
        let path = self.results_path();
        write_atomic(&path, run.to_json_pretty()?.as_bytes())?;

        let checkpoint = self.checkpoint_path();
        if checkpoint.exists() {
            fs::remove_file(&checkpoint).with_context(|| {
                format!("Failed to remove checkpoint '{}'", checkpoint.display())
            })?;
        }
        Ok(path)
    }

    pub fn save_report(&self, report: &str) -> Result<PathBuf> {
        let path = self.report_path();
        write_atomic(&path, report.as_bytes())?;
        Ok(path)
    }
}

/// Load a run record written by [`RunStore::save_run`] or [`RunStore::checkpoint`]
pub fn load_run(path: &Path) -> Result<Run> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read run file '{}'", path.display()))?;
    Run::from_json(&content).with_context(|| format!("Failed to parse run file '{}'", path.display()))
}

/// Resolve a `--report-from` argument: a run directory or a results file
pub fn resolve_run_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        let results = path.join(RESULTS_FILE);
        if results.exists() {
            results
        } else {
            path.join(CHECKPOINT_FILE)
        }
    } else {
        path.to_path_buf()
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::internal(format!("Invalid output path '{}'", path.display())))?;
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("Failed to create '{}'", temp_path.display()))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write '{}'", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync '{}'", temp_path.display()))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| {
        AppError::io(format!(
            "Failed to rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        ))
    })
}
