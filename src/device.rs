use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace, warn};

use crate::proto::{
    codec::FrameCodec,
    command::Command,
    line::{Line, SerialLine, ANSWER_TIMEOUT, INTER_BYTE_TIMEOUT},
    ProtoError, Result,
};
use crate::rawframe::{RawFrame, FRAME_LEN};
use crate::reading::{Reading, RenderOptions, Rendered};

/// Session with one meter.
///
/// The line configuration found at [`Device::open`] is put back exactly once,
/// either by [`Device::close`] or when the session is dropped.
pub struct Device {
    line: Box<dyn Line>,
    codec: FrameCodec,
    open: bool,
}

impl Device {
    /// Opens the device node and switches it to 9600 baud, 8N1, raw mode.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(path: impl AsRef<str>) -> Result<Self> {
        let path = path.as_ref();
        let line = SerialLine::open(path)?;
        debug!(path, "communication device opened");
        Ok(Self::with_line(line))
    }

    /// Runs the session over an already prepared line.
    pub fn with_line(line: impl Line + 'static) -> Self {
        Self {
            line: Box::new(line),
            codec: FrameCodec,
            open: true,
        }
    }

    /// One request/response cycle: returns the answer as received, unvalidated.
    ///
    /// No retries; a failed exchange is reported as is.
    pub async fn exchange(&mut self) -> Result<RawFrame> {
        self.line.discard_input()?;

        let mut request = BytesMut::with_capacity(1);
        self.codec.encode(Command::ReadDisplay, &mut request)?;
        let written = self
            .line
            .write(&request)
            .await
            .map_err(|err| ProtoError::Write(err.to_string()))?;
        if written != request.len() {
            return Err(ProtoError::Write(format!("tx_len={}", written)));
        }
        trace!("request {:02X} sent", request[0]);

        let mut buf = BytesMut::with_capacity(FRAME_LEN);
        match timeout(ANSWER_TIMEOUT, self.line.read_buf(&mut buf)).await {
            Err(_elapsed) => return Err(ProtoError::Timeout),
            Ok(Err(err)) => return Err(ProtoError::Select(err)),
            Ok(Ok(0)) => return Err(ProtoError::Line("line closed".to_string())),
            Ok(Ok(_)) => {}
        }

        loop {
            if let Some(frame) = self.codec.decode(&mut buf)? {
                debug!(frame = %frame.hex(), "answer received");
                return Ok(frame);
            }
            match timeout(INTER_BYTE_TIMEOUT, self.line.read_buf(&mut buf)).await {
                Err(_) | Ok(Ok(0)) => {
                    return Err(ProtoError::ShortRead {
                        received: buf.len(),
                    })
                }
                Ok(Err(err)) => return Err(ProtoError::Line(err.to_string())),
                Ok(Ok(_)) => {}
            }
        }
    }

    /// Exchanges, validates and decodes one answer.
    pub async fn read(&mut self) -> Result<Reading> {
        let frame = self.exchange().await?.validate()?;
        Ok(Reading::from(&frame))
    }

    /// Reads the display and renders it as text.
    pub async fn poll(&mut self, options: RenderOptions) -> Result<Rendered> {
        Ok(self.read().await?.render(options))
    }

    /// Restores the original line configuration and releases the line.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(err) = self.line.restore() {
            warn!(%err, "restoring communication device attributes failed");
        }
        debug!("communication device closed");
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.release();
    }
}
