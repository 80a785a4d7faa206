/// Requests understood by the meter.
///
/// The VC8145 knows a single request: it answers `ReadDisplay` with a
/// snapshot of its main display. The answer echoes the request byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    ReadDisplay = 0x89,
}

impl Command {
    pub fn byte(self) -> u8 {
        self as u8
    }
}
