//! Updates pushed by the simulator.
//!
//! The backend streams view state as tagged tuples, batched into arrays.
//! This module decodes each tuple exactly once, at the transport boundary,
//! into the closed [`Update`] enum. Tags this client does not recognize
//! become [`Update::Unknown`]; recognized tags with payloads that fail
//! validation are logged and dropped. A bad tuple never takes down the
//! stream.

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{
    Address, Bank, HighlightKind, HighlightTarget, Line, MemoryAccess, MemoryRow, ROW_BYTES,
};

/// One decoded frame: the tuples of a batch, in arrival order.
pub type Batch = Vec<Update>;

/// A single decoded update from the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// An assembler diagnostic for one source line.
    CodeError { line: Line, message: String },
    /// The full set of instruction breakpoints, replacing any current set.
    InstructionBreakpoints(Vec<Line>),
    /// The line about to execute, or `None` to clear the marker.
    DebugLine(Option<Line>),
    /// The line that will execute after the current one.
    NextLine(Line),
    /// Cells and fields touched by the last instruction.
    Highlight {
        kind: HighlightKind,
        targets: Vec<HighlightTarget>,
    },
    /// Addresses of the instruction currently executing.
    CurrentInstruction(Vec<Address>),
    /// Byte-level changes to already loaded memory.
    MemoryPatch(Vec<(Address, u8)>),
    /// A full reload of the memory dump.
    MemoryLoad(Vec<MemoryRow>),
    /// The full set of memory breakpoints for one access kind.
    MemoryBreakpoints {
        access: MemoryAccess,
        addrs: Vec<Address>,
    },
    /// Mapping from source line to instruction address, `None` for lines
    /// that assemble to nothing.
    LineTable(Vec<Option<Address>>),
    /// The register bank now visible.
    Banking(Bank),
    /// Disassembly text for the current program.
    Disassembly(String),
    /// A user-facing error message from the backend.
    Error(String),
    /// Grey out one named interface field.
    DisableField(String),
    /// The backend has returned to edit mode.
    EditMode,
    /// Fallback for a one-scalar tuple whose tag names an interface field.
    Field { id: String, value: String },
    /// A tuple with a tag this client does not understand.
    Unknown { tag: String },
}

/// Decode one frame body. A frame is either a batch (array of tuples) or a
/// single tuple; the two are told apart by the type of the first element.
pub fn decode_frame(value: &Value) -> Batch {
    let Some(items) = value.as_array() else {
        warn!("discarding frame that is not a JSON array");
        return Vec::new();
    };
    match items.first() {
        // A leading string means the frame is itself one tagged tuple.
        Some(Value::String(_)) => decode_tuple(value).into_iter().collect(),
        _ => items.iter().filter_map(decode_tuple).collect(),
    }
}

/// Decode a single `[tag, ...args]` tuple.
///
/// Returns `None` for tuples that are structurally broken or whose payload
/// fails validation, after logging.
pub fn decode_tuple(value: &Value) -> Option<Update> {
    let Some(items) = value.as_array() else {
        warn!("discarding tuple that is not a JSON array");
        return None;
    };
    let Some(tag) = items.first().and_then(Value::as_str) else {
        warn!("discarding tuple without a string tag");
        return None;
    };
    let update = decode_tagged(tag, &items[1..]);
    if update.is_none() {
        warn!(%tag, "discarding update with a malformed payload");
    }
    update
}

fn decode_tagged(tag: &str, args: &[Value]) -> Option<Update> {
    let update = match tag {
        "codeerror" => Update::CodeError {
            line: args.first().and_then(as_line)?,
            message: args.get(1).and_then(Value::as_str)?.to_string(),
        },
        "asm_breakpoints" => {
            Update::InstructionBreakpoints(list(args.first()?, as_line)?)
        }
        "debugline" => {
            // A negative or missing line means "no current line"; any
            // other non-integer payload is malformed.
            let line = match args.first() {
                None => None,
                Some(value) => {
                    let line = value.as_i64()?;
                    (line >= 0).then_some(line as Line)
                }
            };
            Update::DebugLine(line)
        }
        "nextline" => Update::NextLine(args.first().and_then(as_line)?),
        "debuginstrmem" => Update::CurrentInstruction(list(args.first()?, as_addr)?),
        "mempartial" => Update::MemoryPatch(list(args.first()?, as_patch)?),
        "mem" => Update::MemoryLoad(list(args.first()?, as_row)?),
        "membp_r" | "membp_w" | "membp_rw" | "membp_e" => {
            let suffix = tag.strip_prefix("membp_").unwrap_or(tag);
            Update::MemoryBreakpoints {
                access: MemoryAccess::from_wire_suffix(suffix)?,
                addrs: list(args.first()?, as_addr)?,
            }
        }
        "line2addr" => {
            let table = args.first()?.as_array()?;
            Update::LineTable(table.iter().map(as_optional_addr).collect::<Option<_>>()?)
        }
        "banking" => Update::Banking(Bank::from_label(args.first()?.as_str()?)),
        "disassembly" => Update::Disassembly(args.first()?.as_str()?.to_string()),
        "error" => Update::Error(args.first()?.as_str()?.to_string()),
        "disable" => Update::DisableField(args.first()?.as_str()?.to_string()),
        "edit_mode" => Update::EditMode,
        tag if tag.starts_with("highlight") => {
            let kind = match &tag["highlight".len()..] {
                "read" => HighlightKind::Read,
                _ => HighlightKind::Write,
            };
            Update::Highlight {
                kind,
                targets: highlight_targets(args.first()?)?,
            }
        }
        tag => {
            // A single scalar argument looks like a register or flag value,
            // so offer it to the field registry rather than dropping it.
            let scalar = match args {
                [arg] => scalar_to_string(arg),
                _ => None,
            };
            match scalar {
                Some(value) => Update::Field {
                    id: tag.to_string(),
                    value,
                },
                None => {
                    debug!(%tag, "unrecognized update tag");
                    Update::Unknown {
                        tag: tag.to_string(),
                    }
                }
            }
        }
    };
    Some(update)
}

/// Decode a homogeneous JSON array with a per-element parser.
fn list<T>(value: &Value, parse: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    value.as_array()?.iter().map(&parse).collect()
}

fn as_line(value: &Value) -> Option<Line> {
    value.as_u64().map(|line| line as Line)
}

/// Addresses arrive as JSON numbers, but hex strings are tolerated too.
fn as_addr(value: &Value) -> Option<Address> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| Address::try_from(n).ok()),
        Value::String(s) => crate::types::parse_hex_u32(s),
        _ => None,
    }
}

fn as_optional_addr(value: &Value) -> Option<Option<Address>> {
    match value {
        Value::Null => Some(None),
        other => as_addr(other).map(Some),
    }
}

/// Cell values arrive as two-digit hex strings, but numbers are tolerated.
fn as_byte(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        Value::String(s) => crate::types::parse_hex_byte(s),
        _ => None,
    }
}

fn as_patch(value: &Value) -> Option<(Address, u8)> {
    let pair = value.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    Some((as_addr(&pair[0])?, as_byte(&pair[1])?))
}

/// A memory row is `[base, [cell; 16]]` where each cell is a hex string or
/// null for an unmapped byte.
fn as_row(value: &Value) -> Option<MemoryRow> {
    let row = value.as_array()?;
    if row.len() != 2 {
        return None;
    }
    let base = as_addr(&row[0])?;
    let raw_cells = row[1].as_array()?;
    if raw_cells.len() != ROW_BYTES {
        return None;
    }
    let mut cells = [None; ROW_BYTES];
    for (slot, cell) in cells.iter_mut().zip(raw_cells) {
        *slot = match cell {
            Value::Null => None,
            other => Some(as_byte(other)?),
        };
    }
    Some(MemoryRow { base, cells })
}

fn highlight_targets(value: &Value) -> Option<Vec<HighlightTarget>> {
    let tokens = value.as_array()?;
    let mut targets = Vec::with_capacity(tokens.len());
    for token in tokens {
        let Some(token) = token.as_str() else {
            warn!("discarding non-string highlight target");
            continue;
        };
        match HighlightTarget::parse(token) {
            Some(target) => targets.push(target),
            // One bad token should not drop its siblings.
            None => warn!(%token, "discarding unparseable highlight target"),
        }
    }
    Some(targets)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
