//! Line-oriented terminal I/O shared by the menu picker, the prompt picker
//! and the terminal prompter.

use std::{
    io::{self, BufRead, Write},
    sync::Mutex,
};

enum Input {
    /// Process stdin; its buffer is shared by every reader in the process.
    Stdin,
    Reader(Box<dyn BufRead + Send>),
}

/// Prompt-and-read-a-line console.
pub struct LineConsole {
    input: Mutex<Input>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl LineConsole {
    /// Console over stdin and stdout.
    pub fn stdio() -> Self {
        Self {
            input: Mutex::new(Input::Stdin),
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    pub fn new(input: impl BufRead + Send + 'static, output: impl Write + Send + 'static) -> Self {
        Self {
            input: Mutex::new(Input::Reader(Box::new(input))),
            output: Mutex::new(Box::new(output)),
        }
    }

    pub fn write(&self, text: &str) -> io::Result<()> {
        let mut output = self.output.lock().expect("console output lock poisoned");
        output.write_all(text.as_bytes())?;
        output.flush()
    }

    /// Next line without its terminator; `None` at end of input.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = match &mut *self.input.lock().expect("console input lock poisoned") {
            Input::Stdin => io::stdin().read_line(&mut line)?,
            Input::Reader(reader) => reader.read_line(&mut line)?,
        };
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Write `prompt`, then read a line.
    pub fn ask(&self, prompt: &str) -> io::Result<Option<String>> {
        self.write(prompt)?;
        self.read_line()
    }
}

impl std::fmt::Debug for LineConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineConsole").finish_non_exhaustive()
    }
}

/// In-memory writer whose contents stay readable after being handed to a console.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn scripted(input: &str) -> (LineConsole, SharedBuffer) {
    let output = SharedBuffer::default();
    let console = LineConsole::new(io::Cursor::new(input.as_bytes().to_vec()), output.clone());
    (console, output)
}
