//! Register and flag fields, and the display format transform.
//!
//! The backend addresses these fields by bare string ids (`r0`, `cpsr_n`,
//! `cycles_count`). Only ids present in the [`FieldRegistry`] are
//! accepted; an update for anything else is logged and skipped, so a
//! stray message tag can never touch arbitrary state.

use std::collections::HashMap;

use serde::Deserialize;
use transport::HighlightKind;
use tracing::debug;

/// How register values are presented.
///
/// Raw values arrive from the simulator as hex strings; the transform is
/// applied at display time only, so switching format never loses data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    #[default]
    Hex,
    Dec,
    #[serde(rename = "decsign")]
    DecSigned,
    Bin,
}

/// Interpret `raw` as a 32-bit hex value and render it in `format`.
///
/// Values that do not parse as hex are shown as-is, which covers fields
/// that are not numbers at all (flags, labels).
pub fn format_value(raw: &str, format: ValueFormat) -> String {
    if format == ValueFormat::Hex {
        return raw.to_string();
    }
    let Some(value) = transport::parse_hex_u32(raw.trim()) else {
        return raw.to_string();
    };
    match format {
        ValueFormat::Hex => raw.to_string(),
        ValueFormat::Dec => value.to_string(),
        ValueFormat::DecSigned => (value as i32).to_string(),
        ValueFormat::Bin => format!("{value:b}"),
    }
}

/// Per-field registration entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSpec {
    /// Whether the display transform applies to this field.
    pub formatted: bool,
}

/// The set of field ids the backend is allowed to write.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    specs: HashMap<String, FieldSpec>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every field the simulator interface shows: sixteen registers with
    /// the display transform, the CPSR/SPSR flag bits, and the cycle
    /// counter.
    pub fn simulator_defaults() -> Self {
        let mut registry = Self::new();
        for index in 0..16 {
            registry.register_formatted(format!("r{index}"));
        }
        for bank in ["cpsr", "spsr"] {
            for flag in ["n", "z", "c", "v", "i", "f"] {
                registry.register_plain(format!("{bank}_{flag}"));
            }
        }
        registry.register_plain("cycles_count");
        registry
    }

    pub fn register(&mut self, id: impl Into<String>, spec: FieldSpec) {
        self.specs.insert(id.into(), spec);
    }

    pub fn register_formatted(&mut self, id: impl Into<String>) {
        self.register(id, FieldSpec { formatted: true });
    }

    pub fn register_plain(&mut self, id: impl Into<String>) {
        self.register(id, FieldSpec { formatted: false });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.specs.contains_key(id)
    }

    fn spec(&self, id: &str) -> Option<&FieldSpec> {
        self.specs.get(id)
    }
}

#[derive(Debug, Default)]
struct FieldState {
    value: String,
    disabled: bool,
    highlight_read: bool,
    highlight_write: bool,
}

/// Live values for the registered fields.
#[derive(Debug)]
pub struct Fields {
    registry: FieldRegistry,
    states: HashMap<String, FieldState>,
    format: ValueFormat,
}

impl Fields {
    pub(crate) fn new(registry: FieldRegistry, format: ValueFormat) -> Self {
        Self {
            registry,
            states: HashMap::new(),
            format,
        }
    }

    /// Store a raw value. Returns false when the id is not registered,
    /// in which case nothing changes.
    pub(crate) fn set(&mut self, id: &str, value: String) -> bool {
        if !self.registry.contains(id) {
            debug!(%id, "ignoring update for unregistered field");
            return false;
        }
        self.states.entry(id.to_string()).or_default().value = value;
        true
    }

    /// Grey out a field. Unregistered ids are ignored.
    pub(crate) fn disable(&mut self, id: &str) -> bool {
        if !self.registry.contains(id) {
            debug!(%id, "ignoring disable for unregistered field");
            return false;
        }
        self.states.entry(id.to_string()).or_default().disabled = true;
        true
    }

    pub(crate) fn add_highlight(&mut self, id: &str, kind: HighlightKind) -> bool {
        if !self.registry.contains(id) {
            debug!(%id, "ignoring highlight for unregistered field");
            return false;
        }
        let state = self.states.entry(id.to_string()).or_default();
        match kind {
            HighlightKind::Read => state.highlight_read = true,
            HighlightKind::Write => state.highlight_write = true,
        }
        true
    }

    pub(crate) fn clear_highlights(&mut self) {
        for state in self.states.values_mut() {
            state.highlight_read = false;
            state.highlight_write = false;
        }
    }

    pub(crate) fn set_format(&mut self, format: ValueFormat) {
        self.format = format;
    }

    pub fn format(&self) -> ValueFormat {
        self.format
    }

    /// Raw value as last sent by the backend.
    pub fn raw(&self, id: &str) -> Option<&str> {
        self.states.get(id).map(|state| state.value.as_str())
    }

    /// Value to display: transformed for formatted fields, raw otherwise.
    pub fn display(&self, id: &str) -> Option<String> {
        let state = self.states.get(id)?;
        let formatted = self
            .registry
            .spec(id)
            .is_some_and(|spec| spec.formatted);
        Some(if formatted {
            format_value(&state.value, self.format)
        } else {
            state.value.clone()
        })
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.states
            .get(id)
            .is_some_and(|state| state.disabled)
    }

    pub fn highlights(&self, id: &str) -> (bool, bool) {
        self.states
            .get(id)
            .map(|state| (state.highlight_read, state.highlight_write))
            .unwrap_or((false, false))
    }

    /// Drop all values, highlights and disabled flags. The registry, and
    /// the chosen display format, survive.
    pub(crate) fn reset(&mut self) {
        self.states.clear();
    }
}
