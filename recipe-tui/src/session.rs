use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use recipe_config::Command;
use recipe_runner::{ExecutionResult, ExecutionStrategy};
use tempfile::NamedTempFile;
use tracing::trace;

/// Upper bound on bytes consumed from the sink per poll tick.
pub const POLL_CHUNK_BYTES: usize = 64 * 1024;

const SINK_PREFIX: &str = "recipe-stream-";
const SINK_SUFFIX: &str = ".log";

/// Append-only temp file a running command writes into. Deleted on drop.
#[derive(Debug)]
pub struct TransientSink {
    file: NamedTempFile,
}

impl TransientSink {
    pub fn create() -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(SINK_PREFIX)
            .suffix(SINK_SUFFIX)
            .tempfile()?;
        Ok(Self { file })
    }

    pub fn create_in(dir: impl AsRef<Path>) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(SINK_PREFIX)
            .suffix(SINK_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Up to `limit` bytes starting at `offset`.
    pub fn read_from(&self, offset: u64, limit: usize) -> io::Result<Vec<u8>> {
        let mut file = File::open(self.path())?;
        file.seek(SeekFrom::Start(offset))?;
        let mut chunk = Vec::with_capacity(limit.min(8_192));
        file.take(limit as u64).read_to_end(&mut chunk)?;
        Ok(chunk)
    }

    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        std::fs::read(self.path())
    }
}

/// Holds back an incomplete trailing UTF-8 sequence until the rest of it
/// arrives.
#[derive(Debug, Default)]
pub struct Utf8Tail {
    pending: Vec<u8>,
}

impl Utf8Tail {
    /// Decode everything but an incomplete trailing sequence. Invalid bytes
    /// elsewhere become U+FFFD.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let split = complete_prefix_len(&self.pending);
        let text = String::from_utf8_lossy(&self.pending[..split]).into_owned();
        self.pending.drain(..split);
        text
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn complete_prefix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let byte = bytes[len - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return len,
        };
        return if width > back { len - back } else { len };
    }
    len
}

/// Observation state of the command currently shown in the execution view.
#[derive(Debug)]
pub struct ExecutionSession {
    pub run_id: u64,
    pub command: Command,
    pub strategy: ExecutionStrategy,
    /// Text decoded from the sink so far.
    pub output: String,
    sink: TransientSink,
    offset: u64,
    tail: Utf8Tail,
    running: bool,
}

impl ExecutionSession {
    pub fn new(
        run_id: u64,
        command: Command,
        strategy: ExecutionStrategy,
        sink: TransientSink,
    ) -> Self {
        Self {
            run_id,
            command,
            strategy,
            output: String::new(),
            sink,
            offset: 0,
            tail: Utf8Tail::default(),
            running: true,
        }
    }

    pub fn sink_path(&self) -> &Path {
        self.sink.path()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Read what the child wrote since the last tick. Returns the number of
    /// bytes consumed.
    pub fn poll(&mut self) -> io::Result<usize> {
        let chunk = self.sink.read_from(self.offset, POLL_CHUNK_BYTES)?;
        if chunk.is_empty() {
            return Ok(0);
        }
        self.offset += chunk.len() as u64;
        let text = self.tail.push(&chunk);
        self.output.push_str(&text);
        trace!(run_id = self.run_id, bytes = chunk.len(), offset = self.offset, "polled sink");
        Ok(chunk.len())
    }

    /// Fold the whole sink into `result`. The sink is re-read from the start
    /// so nothing that arrived after the last tick is lost.
    pub fn finish(&mut self, mut result: ExecutionResult) -> ExecutionResult {
        self.running = false;
        match self.sink.read_all() {
            Ok(content) => {
                let streamed = String::from_utf8_lossy(&content);
                if result.output.is_empty() {
                    result.output = streamed.into_owned();
                } else if !streamed.is_empty() {
                    result.output = format!("{streamed}{}", result.output);
                }
            }
            Err(error) => {
                tracing::warn!(run_id = self.run_id, %error, "failed to re-read output sink");
                if result.output.is_empty() {
                    result.output = std::mem::take(&mut self.output);
                }
            }
        }
        result
    }
}
