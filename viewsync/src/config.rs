//! Synchronizer configuration.
//!
//! Everything here is an initial setting: the synchronizer copies these
//! values into the live view at construction, and runtime toggles go
//! through [`crate::Synchronizer`] methods instead.

use std::io::Read;
use std::path::Path;

use eyre::Context;
use serde::Deserialize;
use transport::InterruptKind;

use crate::views::ValueFormat;

/// Periodic interrupt generator settings, sent along with an assemble
/// request when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct InterruptConfig {
    pub kind: InterruptKind,
    /// Cycles between interrupts.
    pub period: u32,
    /// Cycle of the first interrupt.
    pub first: u32,
}

/// Initial settings for a [`crate::Synchronizer`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Keep the editor scrolled to the executing line.
    pub follow_pc: bool,
    /// Initial register display format.
    pub value_format: ValueFormat,
    /// Rows per memory viewer page.
    pub rows_per_page: usize,
    /// Collapse repeated assembler diagnostics for the same line.
    pub dedupe_annotations: bool,
    /// Animation delay in milliseconds for run commands, zero for none.
    pub animation_speed_ms: u32,
    /// Interrupt generator, off when absent.
    pub interrupt: Option<InterruptConfig>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            follow_pc: true,
            value_format: ValueFormat::Hex,
            rows_per_page: 20,
            dedupe_annotations: false,
            animation_speed_ms: 0,
            interrupt: None,
        }
    }
}

pub fn load(reader: impl Read) -> eyre::Result<SyncConfig> {
    let config = serde_json::from_reader(reader).context("reading synchronizer configuration")?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> eyre::Result<SyncConfig> {
    let path = path.as_ref();
    let f = std::fs::File::open(path)
        .with_context(|| format!("opening configuration file {}", path.display()))?;
    let config = load(f).context("reading from configuration file")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert!(config.follow_pc);
        assert_eq!(config.value_format, ValueFormat::Hex);
        assert_eq!(config.rows_per_page, 20);
        assert!(config.interrupt.is_none());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config = load(r#"{"follow_pc": false, "value_format": "decsign"}"#.as_bytes()).unwrap();
        assert!(!config.follow_pc);
        assert_eq!(config.value_format, ValueFormat::DecSigned);
        assert_eq!(config.rows_per_page, 20);
    }

    #[test]
    fn interrupt_section() {
        let config = load(
            r#"{"interrupt": {"kind": "FIQ", "period": 100, "first": 50}}"#.as_bytes(),
        )
        .unwrap();
        let interrupt = config.interrupt.unwrap();
        assert_eq!(interrupt.kind, InterruptKind::Fiq);
        assert_eq!(interrupt.period, 100);
        assert_eq!(interrupt.first, 50);
    }

    #[test]
    fn load_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewsync.json");
        std::fs::write(&path, r#"{"rows_per_page": 8}"#).unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.rows_per_page, 8);

        assert!(load_from_path(dir.path().join("missing.json")).is_err());
    }
}
