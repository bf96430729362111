//! Output management module
//!
//! Buffered writing of filtered text to a file or stdout.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default buffer size for writing (1MB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Where the output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::File(path.to_path_buf()),
            None => Self::Stdout,
        }
    }
}

/// Output writer with buffering
pub struct OutputWriter {
    writer: BufWriter<Box<dyn Write + Send>>,
    destination: Destination,
    lines_written: u64,
    bytes_written: u64,
}

impl OutputWriter {
    /// Create a new output writer, truncating an existing file
    pub fn new(destination: Destination, buffer_size: usize) -> anyhow::Result<Self> {
        let sink: Box<dyn Write + Send> = match &destination {
            Destination::Stdout => Box::new(std::io::stdout()),
            Destination::File(path) => {
                ensure_parent_dir(path)?;
                let file: File = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| anyhow::anyhow!("Failed to open output file {:?}: {}", path, e))?;
                Box::new(file)
            }
        };

        Ok(Self {
            writer: BufWriter::with_capacity(buffer_size.max(1), sink),
            destination,
            lines_written: 0,
            bytes_written: 0,
        })
    }

    /// Write a line to the output
    pub fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.lines_written += 1;
        self.bytes_written += line.len() as u64 + 1; // +1 for newline
        Ok(())
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl Drop for OutputWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Create the parent directory of an output file if needed
pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_writer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("filtered.txt");

        let mut writer = OutputWriter::new(Destination::File(path.clone()), 1024).unwrap();
        writer.write_line("hello").unwrap();
        writer.write_line("w***d").unwrap();
        writer.flush().unwrap();

        assert_eq!(writer.lines_written(), 2);
        assert_eq!(writer.bytes_written(), 12);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "hello\nw***d\n");
    }

    #[test]
    fn test_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("out.txt");

        let mut writer = OutputWriter::new(Destination::File(path.clone()), 16).unwrap();
        writer.write_line("x").unwrap();
        drop(writer);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
    }

    #[test]
    fn test_destination_from_path() {
        assert_eq!(Destination::from_path(None), Destination::Stdout);
        assert_eq!(
            Destination::from_path(Some(Path::new("out.txt"))),
            Destination::File(PathBuf::from("out.txt"))
        );
    }
}
