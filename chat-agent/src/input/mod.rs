use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// Supplies user input one line at a time. `None` means end of input.
#[async_trait]
pub trait LineSource: Send {
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Invalid UTF-8 is replaced rather than rejected.
pub struct ReaderLines<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin + Send> ReaderLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
        }
    }
}

pub type StdinLines = ReaderLines<BufReader<Stdin>>;

pub fn stdin_lines() -> StdinLines {
    ReaderLines::new(BufReader::new(tokio::io::stdin()))
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LineSource for ReaderLines<R> {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer).await? == 0 {
            return Ok(None);
        }

        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&self.buffer).into_owned()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl LineSource for ScriptedLines {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
