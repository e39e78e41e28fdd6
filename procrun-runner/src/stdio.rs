//! Wiring of the child's standard streams.

use std::fmt;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::ChildStdin;

/// Where the child's stdin comes from.
#[derive(Default)]
pub enum StdinSource {
    /// No input; the child reads end-of-file.
    #[default]
    Null,
    /// These bytes, written through a pipe and then closed.
    Bytes(Vec<u8>),
    /// A caller-supplied stdio handle (inherited terminal, file, ...).
    Stdio(Stdio),
}

impl StdinSource {
    pub(crate) fn into_parts(self) -> (Stdio, Option<Vec<u8>>) {
        match self {
            StdinSource::Null => (Stdio::null(), None),
            StdinSource::Bytes(bytes) => (Stdio::piped(), Some(bytes)),
            StdinSource::Stdio(stdio) => (stdio, None),
        }
    }
}

impl fmt::Debug for StdinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StdinSource::Null => f.write_str("Null"),
            StdinSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            StdinSource::Stdio(_) => f.write_str("Stdio"),
        }
    }
}

pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Where one of the child's output streams goes.
#[derive(Default)]
pub enum OutputSink {
    /// Into an in-memory buffer reported in the execution result.
    #[default]
    Capture,
    /// Copied into a caller-supplied writer; nothing is captured.
    Writer(BoxedWriter),
    /// Straight to a caller-supplied stdio handle; nothing is captured.
    Stdio(Stdio),
}

impl OutputSink {
    pub fn writer<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        OutputSink::Writer(Box::new(writer))
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, OutputSink::Capture)
    }

    pub(crate) fn into_parts(self) -> (Stdio, Drain) {
        match self {
            OutputSink::Capture => (Stdio::piped(), Drain::Capture),
            OutputSink::Writer(writer) => (Stdio::piped(), Drain::Writer(writer)),
            OutputSink::Stdio(stdio) => (stdio, Drain::Detached),
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Capture => f.write_str("Capture"),
            OutputSink::Writer(_) => f.write_str("Writer"),
            OutputSink::Stdio(_) => f.write_str("Stdio"),
        }
    }
}

/// What happens to a piped output stream once the child is running.
pub(crate) enum Drain {
    Capture,
    Writer(BoxedWriter),
    Detached,
}

impl fmt::Debug for Drain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drain::Capture => f.write_str("Capture"),
            Drain::Writer(_) => f.write_str("Writer"),
            Drain::Detached => f.write_str("Detached"),
        }
    }
}

impl Drain {
    /// Reads the stream to its end. Returns the bytes only when capturing.
    pub(crate) async fn run<R>(self, reader: Option<R>) -> io::Result<Vec<u8>>
    where
        R: AsyncRead + Unpin,
    {
        let Some(mut reader) = reader else {
            return Ok(Vec::new());
        };

        match self {
            Drain::Capture => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await?;
                Ok(buf)
            }
            Drain::Writer(mut writer) => {
                tokio::io::copy(&mut reader, &mut writer).await?;
                writer.flush().await?;
                Ok(Vec::new())
            }
            Drain::Detached => Ok(Vec::new()),
        }
    }
}

/// Writes `bytes` to the child's stdin and closes it.
///
/// A child that exits without reading all of its input is not an error.
pub(crate) async fn feed_stdin(stdin: Option<ChildStdin>, bytes: Option<Vec<u8>>) -> io::Result<()> {
    let (Some(mut stdin), Some(bytes)) = (stdin, bytes) else {
        return Ok(());
    };

    match stdin.write_all(&bytes).await {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e),
        Ok(()) => stdin.shutdown().await.or_else(|e| {
            if e.kind() == io::ErrorKind::BrokenPipe {
                Ok(())
            } else {
                Err(e)
            }
        }),
    }
}
