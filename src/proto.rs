pub mod codec;
pub mod command;
pub mod line;

#[cfg(test)]
pub mod fake;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("Open communication device \"{path}\" error: {reason}")]
    Open { path: String, reason: String },

    #[error("Set attributes to communication device \"{path}\" error: {reason}")]
    Config { path: String, reason: String },

    #[error("Communication device write error: {0}")]
    Write(String),

    #[error("Communication device timeout")]
    Timeout,

    #[error("Communication device wait error: {0}")]
    Select(std::io::Error),

    #[error("Communication device error: {0}")]
    Line(String),

    #[error("Communication device read error, rx_len={received}")]
    ShortRead { received: usize },

    #[error("Communication device invalid answer: {0}")]
    InvalidFrame(String),
}

/// Any other line failure spoils the exchange.
impl From<std::io::Error> for ProtoError {
    fn from(err: std::io::Error) -> Self {
        Self::Line(err.to_string())
    }
}

impl ProtoError {
    /// Setup errors end the whole run, everything else only spoils one cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Config { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProtoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_errors_are_fatal() {
        let open = ProtoError::Open {
            path: "/dev/ttyS9".into(),
            reason: "No such file or directory".into(),
        };
        assert!(open.is_fatal());
        assert_eq!(
            open.to_string(),
            "Open communication device \"/dev/ttyS9\" error: No such file or directory"
        );
        assert!(ProtoError::Config {
            path: "/dev/ttyS9".into(),
            reason: "Invalid argument".into()
        }
        .is_fatal());
    }

    #[test]
    fn exchange_errors_are_per_cycle() {
        assert!(!ProtoError::Timeout.is_fatal());
        assert!(!ProtoError::ShortRead { received: 7 }.is_fatal());
        assert!(!ProtoError::InvalidFrame("00".into()).is_fatal());
        assert_eq!(
            ProtoError::ShortRead { received: 7 }.to_string(),
            "Communication device read error, rx_len=7"
        );
    }

    #[test]
    fn io_errors_become_line_errors() {
        let err = ProtoError::from(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "gone",
        ));
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Communication device error: gone");
    }
}
