//! Commands sent from the interface to the simulator.
//!
//! Every command serializes to a JSON array whose first element is the
//! command tag, which is the shape the simulator parses on its end.

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::types::{Address, Line, MemoryAccess, format_hex_u32};

/// Source language submitted with [`Command::Assemble`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    Arm,
    Thumb,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Arm => "ARM",
            Language::Thumb => "THUMB",
        }
    }
}

/// Stepping granularity for [`Command::Execute`].
///
/// The wire tag of an execute command is the mode itself, so these names
/// match the simulator's run-mode vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    Into,
    Out,
    Forward,
    Run,
}

impl StepMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepMode::Into => "stepinto",
            StepMode::Out => "stepout",
            StepMode::Forward => "stepforward",
            StepMode::Run => "run",
        }
    }
}

/// Interrupt source configured by [`Command::Interrupt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterruptKind {
    Fiq,
    Irq,
}

impl InterruptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterruptKind::Fiq => "FIQ",
            InterruptKind::Irq => "IRQ",
        }
    }
}

/// A command for the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Assemble the given source and enter the simulation.
    Assemble { source: String, language: Language },
    /// Leave the simulation and return the backend to edit mode.
    Stop,
    /// Reset the simulated CPU without reassembling.
    Reset,
    /// Run or step the simulation. `speed` is the animation delay in
    /// milliseconds, zero for no animation.
    Execute { mode: StepMode, speed: u32 },
    /// Replace the full set of instruction breakpoints.
    InstructionBreakpoints { lines: Vec<Line> },
    /// Toggle a memory breakpoint for one access kind at an address.
    MemoryBreakpoint { addr: Address, access: MemoryAccess },
    /// Write a single byte of simulated memory.
    MemoryChange { addr: Address, value: u8 },
    /// Configure the periodic interrupt generator.
    Interrupt {
        active: bool,
        kind: InterruptKind,
        period: u32,
        first: u32,
    },
}

impl Command {
    /// The wire tag this command serializes under.
    pub fn tag(&self) -> &'static str {
        match self {
            Command::Assemble { .. } => "assemble",
            Command::Stop => "stop",
            Command::Reset => "reset",
            Command::Execute { mode, .. } => mode.as_str(),
            Command::InstructionBreakpoints { .. } => "breakpointsinstr",
            Command::MemoryBreakpoint { .. } => "breakpointsmem",
            Command::MemoryChange { .. } => "memchange",
            Command::Interrupt { .. } => "interrupt",
        }
    }
}

impl Serialize for Command {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Command::Assemble { source, language } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(source)?;
                seq.serialize_element(language.as_str())?;
                seq.end()
            }
            Command::Stop | Command::Reset => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(self.tag())?;
                seq.end()
            }
            Command::Execute { speed, .. } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(speed)?;
                seq.end()
            }
            Command::InstructionBreakpoints { lines } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(lines)?;
                seq.end()
            }
            Command::MemoryBreakpoint { addr, access } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(&format_hex_u32(*addr))?;
                seq.serialize_element(access.wire_suffix())?;
                seq.end()
            }
            Command::MemoryChange { addr, value } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(addr)?;
                seq.serialize_element(&format!("{value:02x}"))?;
                seq.end()
            }
            Command::Interrupt {
                active,
                kind,
                period,
                first,
            } => {
                let mut seq = serializer.serialize_seq(Some(5))?;
                seq.serialize_element(self.tag())?;
                seq.serialize_element(active)?;
                seq.serialize_element(kind.as_str())?;
                seq.serialize_element(period)?;
                seq.serialize_element(first)?;
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(cmd: Command) -> serde_json::Value {
        serde_json::to_value(cmd).unwrap()
    }

    #[test]
    fn serialize_assemble() {
        let cmd = Command::Assemble {
            source: "mov r0, #1".to_string(),
            language: Language::Arm,
        };
        assert_eq!(wire(cmd), json!(["assemble", "mov r0, #1", "ARM"]));
    }

    #[test]
    fn serialize_bare_commands() {
        assert_eq!(wire(Command::Stop), json!(["stop"]));
        assert_eq!(wire(Command::Reset), json!(["reset"]));
    }

    #[test]
    fn serialize_execute_uses_mode_as_tag() {
        let cmd = Command::Execute {
            mode: StepMode::Into,
            speed: 0,
        };
        assert_eq!(wire(cmd), json!(["stepinto", 0]));

        let cmd = Command::Execute {
            mode: StepMode::Run,
            speed: 200,
        };
        assert_eq!(wire(cmd), json!(["run", 200]));
    }

    #[test]
    fn serialize_instruction_breakpoints() {
        let cmd = Command::InstructionBreakpoints { lines: vec![2, 5, 9] };
        assert_eq!(wire(cmd), json!(["breakpointsinstr", [2, 5, 9]]));
    }

    #[test]
    fn serialize_memory_breakpoint_formats_address() {
        let cmd = Command::MemoryBreakpoint {
            addr: 0x80,
            access: MemoryAccess::Write,
        };
        assert_eq!(wire(cmd), json!(["breakpointsmem", "0x00000080", "w"]));
    }

    #[test]
    fn serialize_memory_change() {
        let cmd = Command::MemoryChange {
            addr: 0x1000,
            value: 0xab,
        };
        assert_eq!(wire(cmd), json!(["memchange", 4096, "ab"]));
    }

    #[test]
    fn serialize_interrupt() {
        let cmd = Command::Interrupt {
            active: true,
            kind: InterruptKind::Fiq,
            period: 100,
            first: 50,
        };
        assert_eq!(wire(cmd), json!(["interrupt", true, "FIQ", 100, 50]));
    }
}
