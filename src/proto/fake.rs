use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use super::line::Line;

/// One scripted event on the receive side of a [`FakeLine`].
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Bytes that were already queued before the request went out.
    Stale(Vec<u8>),
    /// Bytes delivered by the next read.
    Reply(Vec<u8>),
    /// Nothing arrives; reads stay pending until a discard follows the stall.
    Silence,
    /// The line hangs up (read returns zero bytes).
    Hangup,
    /// The read fails.
    Fail(io::ErrorKind),
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    script: VecDeque<Step>,
    pub(crate) written: Vec<u8>,
    pub(crate) accept: Option<usize>,
    pub(crate) discards: usize,
    pub(crate) restores: usize,
    stalled: bool,
}

/// In-memory line replaying a script of answers.
#[derive(Clone, Default)]
pub(crate) struct FakeLine {
    state: Arc<Mutex<FakeState>>,
}

impl FakeLine {
    pub(crate) fn new(script: impl IntoIterator<Item = Step>) -> Self {
        let line = Self::default();
        line.state().script.extend(script);
        line
    }

    /// Accept at most `n` bytes per write.
    pub(crate) fn accepting(self, n: usize) -> Self {
        self.state().accept = Some(n);
        self
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Line for FakeLine {
    fn discard_input(&mut self) -> io::Result<()> {
        let mut state = self.state();
        state.discards += 1;
        loop {
            match state.script.front() {
                Some(Step::Stale(_)) => {}
                Some(Step::Silence) if state.stalled => {}
                _ => break,
            }
            if let Some(Step::Silence) = state.script.pop_front() {
                state.stalled = false;
            }
        }
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        self.state().restores += 1;
        Ok(())
    }
}

impl tokio::io::AsyncRead for FakeLine {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut state = self.state();
        if matches!(state.script.front(), Some(Step::Silence)) {
            state.stalled = true;
            return Poll::Pending;
        }
        match state.script.pop_front() {
            Some(Step::Stale(mut data)) | Some(Step::Reply(mut data)) => {
                let c = buf.remaining().min(data.len());
                buf.put_slice(&data[0..c]);
                data.drain(0..c);
                if !data.is_empty() {
                    state.script.push_front(Step::Reply(data));
                }
                Poll::Ready(Ok(()))
            }
            Some(Step::Hangup) => Poll::Ready(Ok(())),
            Some(Step::Fail(kind)) => Poll::Ready(Err(io::Error::new(kind, "fake line failure"))),
            Some(Step::Silence) | None => Poll::Pending,
        }
    }
}

impl tokio::io::AsyncWrite for FakeLine {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::result::Result<usize, io::Error>> {
        let mut state = self.state();
        let n = state.accept.unwrap_or(buf.len()).min(buf.len());
        state.written.extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}
