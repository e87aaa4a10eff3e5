//! Scalar types shared by commands and updates.

/// A simulated memory address.
///
/// The simulated machine exposes a 32-bit address space, so raw `u32`
/// values are used wherever an address crosses the wire.
pub type Address = u32;

/// A zero-based line number in the assembly source editor.
pub type Line = usize;

/// Number of bytes shown per memory row.
pub const ROW_BYTES: usize = 16;

/// Access kind attached to a memory breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryAccess {
    Read,
    Write,
    ReadWrite,
    Execute,
}

impl MemoryAccess {
    /// The wire suffix used in `breakpointsmem` commands and `membp_*` tags.
    pub fn wire_suffix(&self) -> &'static str {
        match self {
            MemoryAccess::Read => "r",
            MemoryAccess::Write => "w",
            MemoryAccess::ReadWrite => "rw",
            MemoryAccess::Execute => "e",
        }
    }

    pub fn from_wire_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "r" => Some(MemoryAccess::Read),
            "w" => Some(MemoryAccess::Write),
            "rw" => Some(MemoryAccess::ReadWrite),
            "e" => Some(MemoryAccess::Execute),
            _ => None,
        }
    }
}

/// Register bank reported by the simulator's `banking` update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bank {
    User,
    Fiq,
    Irq,
    Svc,
    /// A bank label this client does not know about. Kept verbatim so the
    /// interface can still display it.
    Other(String),
}

impl Bank {
    pub fn from_label(label: &str) -> Self {
        match label {
            "User" => Bank::User,
            "FIQ" => Bank::Fiq,
            "IRQ" => Bank::Irq,
            "SVC" => Bank::Svc,
            other => Bank::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Bank::User => "User",
            Bank::Fiq => "FIQ",
            Bank::Irq => "IRQ",
            Bank::Svc => "SVC",
            Bank::Other(label) => label,
        }
    }
}

/// Which flavor of access a read/write highlight reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    Read,
    Write,
}

/// Target of a read/write highlight.
///
/// The simulator names targets with bare tokens: `MEM_<hexaddr>` for a
/// memory cell, anything else for a register or flag field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HighlightTarget {
    Memory(Address),
    Field(String),
}

impl HighlightTarget {
    /// Parse a highlight token. Returns `None` when the token claims to be
    /// a memory cell but the address does not parse.
    pub fn parse(token: &str) -> Option<Self> {
        match token.strip_prefix("MEM_") {
            Some(hex) => parse_hex_u32(hex).map(HighlightTarget::Memory),
            None => Some(HighlightTarget::Field(token.to_string())),
        }
    }
}

/// One row of the memory dump: a 16-byte aligned base address plus the
/// cell contents, `None` where the simulator reports an unmapped byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRow {
    pub base: Address,
    pub cells: [Option<u8>; ROW_BYTES],
}

/// Format an address the way the simulator prints them: `0x` followed by
/// exactly eight lowercase hex digits.
pub fn format_hex_u32(value: u32) -> String {
    format!("0x{value:08x}")
}

/// Parse a hex string with or without a `0x` prefix.
pub fn parse_hex_u32(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

/// Parse a one or two digit hex byte, as typed into a memory cell.
pub fn parse_hex_byte(text: &str) -> Option<u8> {
    if text.is_empty() || text.len() > 2 {
        return None;
    }
    u8::from_str_radix(text, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_addresses() {
        assert_eq!(format_hex_u32(0), "0x00000000");
        assert_eq!(format_hex_u32(0x1a2b), "0x00001a2b");
        assert_eq!(format_hex_u32(u32::MAX), "0xffffffff");
    }

    #[test]
    fn parse_addresses() {
        assert_eq!(parse_hex_u32("1a2b"), Some(0x1a2b));
        assert_eq!(parse_hex_u32("0x1A2B"), Some(0x1a2b));
        assert_eq!(parse_hex_u32("xyz"), None);
        assert_eq!(parse_hex_u32(""), None);
    }

    #[test]
    fn parse_bytes() {
        assert_eq!(parse_hex_byte("ab"), Some(0xab));
        assert_eq!(parse_hex_byte("AB"), Some(0xab));
        assert_eq!(parse_hex_byte("7"), Some(0x7));
        assert_eq!(parse_hex_byte(""), None);
        assert_eq!(parse_hex_byte("abc"), None);
        assert_eq!(parse_hex_byte("zz"), None);
    }

    #[test]
    fn highlight_targets() {
        assert_eq!(
            HighlightTarget::parse("MEM_80"),
            Some(HighlightTarget::Memory(0x80))
        );
        assert_eq!(
            HighlightTarget::parse("r11"),
            Some(HighlightTarget::Field("r11".to_string()))
        );
        assert_eq!(HighlightTarget::parse("MEM_nope"), None);
    }

    #[test]
    fn bank_labels_round_trip() {
        for label in ["User", "FIQ", "IRQ", "SVC"] {
            assert_eq!(Bank::from_label(label).label(), label);
        }
        assert_eq!(Bank::from_label("ABT"), Bank::Other("ABT".to_string()));
    }
}
