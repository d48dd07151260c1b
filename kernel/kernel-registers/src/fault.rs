use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Page-fault cause code, delivered by the trap mechanism.
    ///
    /// Three bits encode privilege × access type × presence, giving the
    /// eight combinations hardware can report:
    ///
    /// | Bit | Set means |
    /// |-----|-----------|
    /// | `PRESENT` | The page was present — the fault is a protection violation, not a missing page. |
    /// | `WRITE`   | The access was a write (clear: a read). |
    /// | `USER`    | The access came from user mode (clear: supervisor). |
    #[derive(Copy, Clone, Eq, PartialEq)]
    pub struct FaultCode: u32 {
        const PRESENT = 1 << 0;
        const WRITE   = 1 << 1;
        const USER    = 1 << 2;
    }
}

impl FaultCode {
    /// Cause for a supervisor access to a not-present page.
    #[must_use]
    pub const fn not_present(write: bool) -> Self {
        if write {
            Self::WRITE
        } else {
            Self::empty()
        }
    }

    /// The page was present and the access was disallowed.
    #[must_use]
    pub const fn is_protection_violation(self) -> bool {
        self.contains(Self::PRESENT)
    }

    #[must_use]
    pub const fn is_write(self) -> bool {
        self.contains(Self::WRITE)
    }

    #[must_use]
    pub const fn is_user(self) -> bool {
        self.contains(Self::USER)
    }

    /// Human-readable decode of the 3-bit cause, for fault diagnostics.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self.bits() & 0b111 {
            0b000 => "supervisor read, not present",
            0b001 => "supervisor read, protection violation",
            0b010 => "supervisor write, not present",
            0b011 => "supervisor write, protection violation",
            0b100 => "user read, not present",
            0b101 => "user read, protection violation",
            0b110 => "user write, not present",
            _ => "user write, protection violation",
        }
    }
}

impl fmt::Debug for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaultCode({:#05b}: {})", self.bits(), self.describe())
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_eight_combinations() {
        let mut seen = [false; 8];
        for bits in 0..8u32 {
            let code = FaultCode::from_bits_truncate(bits);
            let text = code.describe();
            assert!(!text.is_empty());
            // Every combination maps to a distinct description.
            for (i, other) in seen.iter().enumerate().take(bits as usize) {
                if *other {
                    assert_ne!(FaultCode::from_bits_truncate(i as u32).describe(), text);
                }
            }
            seen[bits as usize] = true;
        }
    }

    #[test]
    fn predicates_match_the_bits() {
        let code = FaultCode::WRITE;
        assert!(!code.is_protection_violation());
        assert!(code.is_write());
        assert!(!code.is_user());
        assert_eq!(code, FaultCode::not_present(true));
        assert_eq!(FaultCode::empty(), FaultCode::not_present(false));

        let violation = FaultCode::PRESENT | FaultCode::USER;
        assert!(violation.is_protection_violation());
        assert_eq!(violation.describe(), "user read, protection violation");
    }
}
