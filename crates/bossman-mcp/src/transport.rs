//! Newline-delimited message framing.
//!
//! One line is one message: either a single JSON object or a JSON
//! array (a batch). The reader half belongs to the dispatch loop; the
//! writer half is cheaply clonable and serializes writes behind a
//! mutex so responses completing on different tasks cannot interleave
//! inside one frame.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::protocol::{Request, Response};

/// Hard cap on a single framed line
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// How a read can fail
#[derive(Debug)]
pub enum ReadError {
    /// Input closed cleanly
    Eof,
    /// The line was not a well-formed message; the connection is still usable
    Parse(String),
    /// The underlying stream failed; the connection is dead
    Io(io::Error),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Eof => write!(f, "end of input"),
            ReadError::Parse(msg) => write!(f, "parse error: {}", msg),
            ReadError::Io(err) => write!(f, "transport error: {}", err),
        }
    }
}

impl std::error::Error for ReadError {}

/// Reads framed messages from the input stream. Single-consumer by
/// contract: only the dispatch loop calls [`MessageReader::read_message`].
pub struct MessageReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(input: R) -> Self {
        MessageReader {
            reader: BufReader::new(input),
            buf: Vec::new(),
        }
    }

    /// Consume one framed line and parse it into one or more requests.
    /// The flag is true when the wire form was a batch (JSON array).
    pub async fn read_message(&mut self) -> Result<(Vec<Request>, bool), ReadError> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(ReadError::Io)?;
        if n == 0 {
            return Err(ReadError::Eof);
        }
        if self.buf.len() > MAX_LINE_BYTES {
            return Err(ReadError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("message exceeds {} bytes", MAX_LINE_BYTES),
            )));
        }
        parse_line(&self.buf)
    }
}

/// Batch detection: scan past leading whitespace and test whether the
/// first significant byte opens an array.
fn parse_line(data: &[u8]) -> Result<(Vec<Request>, bool), ReadError> {
    for &b in data {
        match b {
            b' ' | b'\t' | b'\n' | b'\r' => continue,
            b'[' => {
                let batch: Vec<Request> =
                    serde_json::from_slice(data).map_err(|e| ReadError::Parse(e.to_string()))?;
                if batch.is_empty() {
                    return Err(ReadError::Parse("empty batch".to_string()));
                }
                return Ok((batch, true));
            }
            _ => {
                let request: Request =
                    serde_json::from_slice(data).map_err(|e| ReadError::Parse(e.to_string()))?;
                return Ok((vec![request], false));
            }
        }
    }
    Err(ReadError::Parse("empty message".to_string()))
}

/// Writes framed responses to the output stream. Clones share one
/// mutex-guarded writer.
pub struct MessageWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for MessageWriter<W> {
    fn clone(&self) -> Self {
        MessageWriter {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> MessageWriter<W> {
    pub fn new(output: W) -> Self {
        MessageWriter {
            inner: Arc::new(Mutex::new(output)),
        }
    }

    /// Emit one response as one line
    pub async fn write_response(&self, response: &Response) -> io::Result<()> {
        let data = serde_json::to_vec(response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.write_line(data).await
    }

    /// Emit a list of responses as a JSON array on one line.
    /// An empty batch produces no output.
    pub async fn write_batch_response(&self, responses: &[Response]) -> io::Result<()> {
        if responses.is_empty() {
            return Ok(());
        }
        let data = serde_json::to_vec(responses)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.write_line(data).await
    }

    async fn write_line(&self, mut data: Vec<u8>) -> io::Result<()> {
        data.push(b'\n');
        let mut writer = self.inner.lock().await;
        writer.write_all(&data).await?;
        writer.flush().await
    }
}
