use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};
use tracing::debug;

use super::{ProtoError, Result};
use crate::BAUDRATE;

/// Upper bound for the first answer byte. The meter needs about 11ms.
pub const ANSWER_TIMEOUT: Duration = Duration::from_millis(100);

/// Upper bound for the gap between two answer bytes (one tenth of a second).
pub const INTER_BYTE_TIMEOUT: Duration = Duration::from_millis(100);

/// A byte line the meter is attached to.
pub trait Line: AsyncRead + AsyncWrite + Unpin + Send {
    /// Drops every received byte nobody has read yet.
    fn discard_input(&mut self) -> io::Result<()>;

    /// Puts back the line configuration found before the line was opened.
    fn restore(&mut self) -> io::Result<()>;
}

/// Serial port in raw mode, 9600 baud, 8N1, no flow control.
pub struct SerialLine {
    port: SerialStream,
    #[cfg(unix)]
    settings: Option<LineSettings>,
}

impl SerialLine {
    pub fn open(path: &str) -> Result<Self> {
        #[cfg(unix)]
        let settings = LineSettings::capture(path)?;

        let port = tokio_serial::new(path, BAUDRATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(ANSWER_TIMEOUT)
            .open_native_async();

        let port = match port {
            Ok(port) => port,
            Err(err) => {
                #[cfg(unix)]
                settings.restore_logged();
                return Err(open_error(path, err));
            }
        };

        let mut line = Self {
            port,
            #[cfg(unix)]
            settings: Some(settings),
        };

        #[cfg(unix)]
        if let Err(err) = line.port.set_exclusive(false) {
            if let Some(settings) = line.settings.take() {
                settings.restore_logged();
            }
            return Err(ProtoError::Config {
                path: path.to_string(),
                reason: err.to_string(),
            });
        }

        debug!(path, baudrate = BAUDRATE, "communication device configured");
        Ok(line)
    }
}

fn open_error(path: &str, err: tokio_serial::Error) -> ProtoError {
    match err.kind() {
        tokio_serial::ErrorKind::InvalidInput => ProtoError::Config {
            path: path.to_string(),
            reason: err.to_string(),
        },
        _ => ProtoError::Open {
            path: path.to_string(),
            reason: err.to_string(),
        },
    }
}

impl Line for SerialLine {
    fn discard_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    #[cfg(unix)]
    fn restore(&mut self) -> io::Result<()> {
        match self.settings.take() {
            Some(settings) => settings.restore(),
            None => Ok(()),
        }
    }

    #[cfg(not(unix))]
    fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsyncRead for SerialLine {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.port).poll_read(cx, buf)
    }
}

impl AsyncWrite for SerialLine {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.port).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.port).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.port).poll_shutdown(cx)
    }
}

#[cfg(unix)]
pub use self::settings::LineSettings;

#[cfg(unix)]
mod settings {
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::unix::fs::OpenOptionsExt;

    use nix::fcntl::OFlag;
    use nix::sys::termios::{tcgetattr, tcsetattr, SetArg, Termios};
    use tracing::warn;

    use crate::proto::{ProtoError, Result};

    /// Terminal attributes of a device node as found before we touched it.
    ///
    /// The node stays open through its own handle, so the attributes can be
    /// written back even if the serial stream is in a bad state.
    pub struct LineSettings {
        file: File,
        original: Termios,
    }

    impl LineSettings {
        pub fn capture(path: &str) -> Result<Self> {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .custom_flags((OFlag::O_NOCTTY | OFlag::O_NONBLOCK).bits())
                .open(path)
                .map_err(|err| ProtoError::Open {
                    path: path.to_string(),
                    reason: err.to_string(),
                })?;
            let original = tcgetattr(&file).map_err(|err| ProtoError::Config {
                path: path.to_string(),
                reason: err.to_string(),
            })?;
            Ok(Self { file, original })
        }

        pub fn restore(self) -> io::Result<()> {
            tcsetattr(&self.file, SetArg::TCSANOW, &self.original).map_err(io::Error::from)
        }

        pub(crate) fn restore_logged(self) {
            if let Err(err) = self.restore() {
                warn!(%err, "restoring communication device attributes failed");
            }
        }
    }
}
