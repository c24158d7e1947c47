use std::fs::File;
use std::io::{self, BufWriter, StdoutLock, Write};
use std::path::{Path, PathBuf};

/// Destination of the serialized document.
///
/// Opened once per invocation. Dropping the sink releases the file or the
/// stdout lock on every path; [`finish`](Self::finish) flushes it on success.
#[derive(Debug)]
pub enum OutputSink {
    File {
        path: PathBuf,
        writer: BufWriter<File>,
    },
    Stdout(StdoutLock<'static>),
}

impl OutputSink {
    /// Create `path` fresh (truncating), or lock stdout when no path is given.
    pub fn open(path: Option<&Path>) -> io::Result<Self> {
        match path {
            Some(path) => Ok(OutputSink::File {
                path: path.to_path_buf(),
                writer: BufWriter::new(File::create(path)?),
            }),
            None => Ok(OutputSink::Stdout(io::stdout().lock())),
        }
    }

    /// The file path, or `None` for stdout.
    pub fn path(&self) -> Option<&Path> {
        match self {
            OutputSink::File { path, .. } => Some(path),
            OutputSink::Stdout(_) => None,
        }
    }

    /// Human-readable destination for logs.
    pub fn describe(&self) -> String {
        match self.path() {
            Some(path) => path.display().to_string(),
            None => "stdout".to_string(),
        }
    }

    /// Flush and close, returning the path written for file sinks.
    pub fn finish(mut self) -> io::Result<Option<PathBuf>> {
        self.flush()?;
        match self {
            OutputSink::File { path, writer } => {
                writer.into_inner().map_err(|err| err.into_error())?.sync_all()?;
                Ok(Some(path))
            }
            OutputSink::Stdout(_) => Ok(None),
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::File { writer, .. } => writer.write(buf),
            OutputSink::Stdout(lock) => lock.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::File { writer, .. } => writer.flush(),
            OutputSink::Stdout(lock) => lock.flush(),
        }
    }
}
