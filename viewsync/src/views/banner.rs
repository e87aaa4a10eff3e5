//! Mode banner, notices, and the disassembly panel.

use transport::Bank;

/// Status strip state: the visible register bank, the latest notice
/// message, and the disassembly listing.
#[derive(Debug)]
pub struct Banner {
    bank: Bank,
    notice: Option<String>,
    disassembly: String,
}

impl Banner {
    pub(crate) fn new() -> Self {
        Self {
            bank: Bank::User,
            notice: None,
            disassembly: String::new(),
        }
    }

    pub(crate) fn set_bank(&mut self, bank: Bank) {
        self.bank = bank;
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    /// Title for the SPSR column. The user bank has no saved status
    /// register, so it gets the bare title; every other bank is spelled
    /// out.
    pub fn spsr_title(&self) -> String {
        match &self.bank {
            Bank::User => "SPSR".to_string(),
            other => format!("SPSR ({})", other.label()),
        }
    }

    pub(crate) fn set_notice(&mut self, message: String) {
        self.notice = Some(message);
    }

    pub(crate) fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub(crate) fn set_disassembly(&mut self, text: String) {
        self.disassembly = text;
    }

    pub fn disassembly(&self) -> &str {
        &self.disassembly
    }

    /// Clear the notice and listing. The bank selection is cosmetic and
    /// stays put.
    pub(crate) fn reset(&mut self) {
        self.notice = None;
        self.disassembly.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spsr_title_tracks_the_bank() {
        let mut banner = Banner::new();
        assert_eq!(banner.spsr_title(), "SPSR");

        banner.set_bank(Bank::Fiq);
        assert_eq!(banner.spsr_title(), "SPSR (FIQ)");

        banner.set_bank(Bank::Other("ABT".to_string()));
        assert_eq!(banner.spsr_title(), "SPSR (ABT)");
    }

    #[test]
    fn reset_keeps_the_bank() {
        let mut banner = Banner::new();
        banner.set_bank(Bank::Irq);
        banner.set_notice("runtime fault".to_string());
        banner.set_disassembly("mov r0, #1".to_string());

        banner.reset();
        assert_eq!(banner.bank(), &Bank::Irq);
        assert_eq!(banner.notice(), None);
        assert_eq!(banner.disassembly(), "");
    }
}
