use std::fmt;

use thiserror::Error;

use crate::rawframe::{RawFrame, DIGIT_COUNT};

/// Digit byte the meter sends for an overloaded segment (`>`).
pub const OVERFLOW_BYTE: u8 = 0x3e;

/// Character shown for an overloaded segment.
pub const OVERFLOW_MARK: char = 'L';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Generator,
    Amps,
    MilliAmps,
    Temperature,
    Capacitance,
    Frequency,
    Diode,
    Resistance,
    MilliVolts,
    DcVolts,
    AcVolts,
    /// Mode code without a known meaning.
    Unknown(u8),
}

impl From<u8> for Mode {
    fn from(code: u8) -> Self {
        match code {
            0x4 => Self::Generator,
            0x5 => Self::Amps,
            0x6 => Self::MilliAmps,
            0x8 => Self::Temperature,
            0x9 => Self::Capacitance,
            0xa => Self::Frequency,
            0xb => Self::Diode,
            0xc => Self::Resistance,
            0xd => Self::MilliVolts,
            0xe => Self::DcVolts,
            0xf => Self::AcVolts,
            other => Self::Unknown(other),
        }
    }
}

impl Mode {
    /// Base unit of the mode, if the mode has one.
    pub fn unit(self) -> Option<Unit> {
        match self {
            Self::Amps | Self::MilliAmps => Some(Unit::Ampere),
            Self::Temperature => Some(Unit::Celsius),
            Self::Capacitance => Some(Unit::Farad),
            Self::Frequency => Some(Unit::Hertz),
            Self::Diode | Self::MilliVolts | Self::DcVolts | Self::AcVolts => Some(Unit::Volt),
            Self::Resistance => Some(Unit::Ohm),
            Self::Generator | Self::Unknown(_) => None,
        }
    }

    /// Unit prefix and decimal point position for a raw position taken from the frame.
    ///
    /// The result may leave 0..=3, which means no decimal point is shown.
    pub fn scale(self, raw_position: i8) -> (Option<Prefix>, i8) {
        match self {
            Self::Amps | Self::Diode | Self::DcVolts | Self::AcVolts => (None, raw_position - 1),
            Self::MilliAmps | Self::MilliVolts => (Some(Prefix::Milli), raw_position),
            Self::Capacitance if raw_position < 4 => (Some(Prefix::Nano), raw_position - 1),
            Self::Capacitance => (Some(Prefix::Micro), raw_position - 4),
            Self::Resistance => match raw_position {
                1 => (None, raw_position + 1),
                5 | 6 => (Some(Prefix::Mega), raw_position - 5),
                _ => (Some(Prefix::Kilo), raw_position - 2),
            },
            Self::Generator | Self::Temperature | Self::Frequency | Self::Unknown(_) => {
                (None, raw_position)
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Generator => f.write_str("Gen"),
            Mode::Amps => f.write_str("A"),
            Mode::MilliAmps => f.write_str("mA"),
            Mode::Temperature => f.write_str("Temp"),
            Mode::Capacitance => f.write_str("Cap"),
            Mode::Frequency => f.write_str("Freq"),
            Mode::Diode => f.write_str("Diode"),
            Mode::Resistance => f.write_str("Ohm"),
            Mode::MilliVolts => f.write_str("mV"),
            Mode::DcVolts => f.write_str("DCV"),
            Mode::AcVolts => f.write_str("ACV"),
            Mode::Unknown(_) => f.write_str("?"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Ampere,
    Celsius,
    Farad,
    Hertz,
    Volt,
    Ohm,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Ampere => f.write_str("A"),
            Unit::Celsius => f.write_str("°C"),
            Unit::Farad => f.write_str("F"),
            Unit::Hertz => f.write_str("Hz"),
            Unit::Volt => f.write_str("V"),
            Unit::Ohm => f.write_str("Ω"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Nano,
    Micro,
    Milli,
    Kilo,
    Mega,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Nano => f.write_str("n"),
            Prefix::Micro => f.write_str("µ"),
            Prefix::Milli => f.write_str("m"),
            Prefix::Kilo => f.write_str("k"),
            Prefix::Mega => f.write_str("M"),
        }
    }
}

/// Display character for one digit byte.
pub fn digit_of(byte: u8) -> char {
    if byte.is_ascii_digit() {
        byte as char
    } else if byte == OVERFLOW_BYTE {
        OVERFLOW_MARK
    } else {
        ' '
    }
}

/// Incomplete decode, reported next to an otherwise usable rendering.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("Mode not set")]
    ModeNotSet,
    #[error("Unit not set")]
    UnitNotSet,
}

/// Which decorations surround the digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_mode: bool,
    pub show_unit: bool,
}

impl RenderOptions {
    pub fn full() -> Self {
        Self {
            show_mode: true,
            show_unit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Content of the meter display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub mode: Mode,
    pub negative: bool,
    pub digits: [char; DIGIT_COUNT],
    /// Index of the digit followed by the decimal point. Values outside
    /// 0..=3 mean the value is shown without a point.
    pub decimal_position: i8,
    pub unit: Option<Unit>,
    pub prefix: Option<Prefix>,
}

impl From<&RawFrame> for Reading {
    fn from(frame: &RawFrame) -> Self {
        let mode = Mode::from(frame.mode_code());
        let (prefix, decimal_position) = mode.scale(frame.raw_decimal_position());

        let mut digits = [' '; DIGIT_COUNT];
        for (digit, byte) in digits.iter_mut().zip(frame.digit_bytes()) {
            *digit = digit_of(*byte);
        }

        Self {
            mode,
            negative: frame.is_negative(),
            digits,
            decimal_position,
            unit: mode.unit(),
            prefix,
        }
    }
}

impl Reading {
    /// Index of the digit followed by the decimal point, if a point is shown.
    pub fn point_after(&self) -> Option<usize> {
        match self.decimal_position {
            pos @ 0..=3 => Some(pos as usize),
            _ => None,
        }
    }

    pub fn render(&self, options: RenderOptions) -> Rendered {
        let mut text = String::with_capacity(24);
        let mut diagnostics = Vec::new();

        if options.show_mode {
            if let Mode::Unknown(_) = self.mode {
                diagnostics.push(Diagnostic::ModeNotSet);
            }
            text.push_str(&self.mode.to_string());
            text.push(' ');
        }

        if self.negative {
            text.push('-');
        }

        let point = self.point_after();
        for (i, digit) in self.digits.iter().enumerate() {
            text.push(*digit);
            if point == Some(i) {
                text.push('.');
            }
        }

        if options.show_unit {
            text.push(' ');
            if let Some(prefix) = self.prefix {
                text.push_str(&prefix.to_string());
            }
            match self.unit {
                Some(unit) => text.push_str(&unit.to_string()),
                None => {
                    diagnostics.push(Diagnostic::UnitNotSet);
                    text.push('?');
                }
            }
        }

        Rendered { text, diagnostics }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(RenderOptions::full()).text)
    }
}
