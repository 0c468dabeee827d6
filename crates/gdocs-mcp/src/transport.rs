//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! Stdout carries nothing but protocol messages; logs go to stderr.

use std::io::{self, BufRead};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// Lines buffered between the stdin thread and the server loop.
const LINE_BUFFER: usize = 16;

/// Message that can be received from the client.
#[derive(Debug)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

/// Where incoming lines come from.
enum LineSource {
    Reader(Box<dyn AsyncBufRead + Send + Unpin>),
    /// Fed by a detached reader thread; closed channel means EOF.
    Channel(mpsc::Receiver<io::Result<String>>),
}

impl LineSource {
    /// Next raw line, `None` at EOF.
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        match self {
            LineSource::Reader(reader) => {
                let mut line = String::new();
                if reader.read_line(&mut line).await? == 0 {
                    return Ok(None);
                }
                Ok(Some(line))
            }
            LineSource::Channel(lines) => lines.recv().await.transpose(),
        }
    }
}

pub struct StdioTransport {
    source: LineSource,
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl StdioTransport {
    /// Create a transport using stdin/stdout.
    ///
    /// Stdin is read by a detached thread, so dropping the transport never
    /// waits on a blocked read.
    pub fn stdio() -> Self {
        Self::from_lines(
            spawn_line_reader(io::BufReader::new(io::stdin())),
            Box::new(tokio::io::stdout()),
        )
    }

    pub fn new(
        reader: Box<dyn AsyncBufRead + Send + Unpin>,
        writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> Self {
        Self {
            source: LineSource::Reader(reader),
            writer,
        }
    }

    /// Create a transport reading lines from a channel.
    pub fn from_lines(
        lines: mpsc::Receiver<io::Result<String>>,
        writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> Self {
        Self {
            source: LineSource::Channel(lines),
            writer,
        }
    }

    /// Read the next message. Blank lines are skipped; `Ok(None)` means EOF.
    ///
    /// Malformed messages fail with `ErrorKind::InvalidData`; any other error
    /// comes from the underlying stream.
    pub async fn read_message(&mut self) -> io::Result<Option<IncomingMessage>> {
        while let Some(line) = self.source.next_line().await? {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return parse_message(trimmed).map(Some);
            }
        }
        Ok(None)
    }

    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        tracing::debug!(message = %json, "Sending");

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

/// Read lines on a dedicated thread and forward them to the returned channel.
///
/// The thread stops at EOF, after the first read error, or once the receiver
/// is dropped. It is never joined.
pub fn spawn_line_reader<R>(mut reader: R) -> mpsc::Receiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    std::thread::spawn(move || loop {
        let mut line = String::new();
        let item = match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => Ok(line),
            Err(e) => Err(e),
        };
        let failed = item.is_err();
        if tx.blocking_send(item).is_err() || failed {
            break;
        }
    });

    rx
}

fn parse_message(line: &str) -> io::Result<IncomingMessage> {
    tracing::debug!(message = line, "Received");

    // A request carries an `id`; anything else with a method is a notification.
    if let Ok(request) = serde_json::from_str::<JsonRpcRequest>(line) {
        return Ok(IncomingMessage::Request(request));
    }
    if let Ok(notification) = serde_json::from_str::<JsonRpcNotification>(line) {
        return Ok(IncomingMessage::Notification(notification));
    }

    tracing::warn!(message = line, "Failed to parse message");
    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("Invalid JSON-RPC message: {}", line),
    ))
}

/// In-memory writer whose contents stay readable after the transport owns it.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedWriter {
    pub(crate) fn lines(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

#[cfg(test)]
impl AsyncWrite for SharedWriter {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        std::task::Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }
}
