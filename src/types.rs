use std::fmt;
use std::ops::BitOr;

/// Which textual integer forms a field accepts.
///
/// Declared per field with `int=` in the field tag (any combination of
/// `d`, `h`, `o`, case-insensitive). An empty mode means "use the type's
/// default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct IntMode(u8);

impl IntMode {
    /// Accept decimal literals.
    pub const DEC: IntMode = IntMode(0b001);
    /// Accept hexadecimal literals.
    pub const HEX: IntMode = IntMode(0b010);
    /// Accept octal literals.
    pub const OCT: IntMode = IntMode(0b100);

    pub const fn empty() -> Self {
        IntMode(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: IntMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: IntMode) -> Self {
        IntMode(self.0 | other.0)
    }

    /// Parse the `int=` tag value. Unknown letters are ignored.
    pub fn parse(spec: &str) -> Self {
        let mut mode = IntMode::empty();
        if spec.contains(['d', 'D']) {
            mode = mode | IntMode::DEC;
        }
        if spec.contains(['h', 'H']) {
            mode = mode | IntMode::HEX;
        }
        if spec.contains(['o', 'O']) {
            mode = mode | IntMode::OCT;
        }
        mode
    }

    /// `self`, or `default` when no mode was declared.
    pub fn or(self, default: IntMode) -> Self {
        if self.is_empty() { default } else { self }
    }
}

impl BitOr for IntMode {
    type Output = IntMode;

    fn bitor(self, rhs: IntMode) -> IntMode {
        IntMode(self.0 | rhs.0)
    }
}

impl fmt::Display for IntMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, letter) in [(IntMode::DEC, 'd'), (IntMode::HEX, 'h'), (IntMode::OCT, 'o')] {
            if self.contains(flag) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

/// One key assignment read from config text.
///
/// `value` is `None` for a blank assignment (a bare `name` line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub section: String,
    pub subsection: Option<String>,
    pub variable: String,
    pub value: Option<String>,
    /// 1-indexed line the variable name appeared on.
    pub line: usize,
}
