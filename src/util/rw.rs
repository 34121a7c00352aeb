use std::{fmt::Write, io, path::PathBuf};

use super::rc::{RcRefCell, RcRefCellT};

pub struct StringBuffer {
    s: String,
}

impl StringBuffer {
    pub fn new() -> StringBuffer {
        StringBuffer{s: String::new()}
    }

    pub fn as_str(&self) -> &str {
        self.s.as_str()
    }
}

// String only implements fmt::Write
impl io::Write for StringBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let str_rep = std::str::from_utf8(buf)
            .map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, e)
            })?;
        self.s.write_str(str_rep)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// For convenience, so we can pass around a shared stream writer.
//
// Used to capture warnings of interest to users (unrecognized csv columns,
// skipped exchange rate observations), so they can be presented either to
// stderr, or buffered for inspection in tests.
pub struct WriteHandle {
    w: RcRefCell<dyn io::Write>,
}

impl WriteHandle {
    pub fn stdout_write_handle() -> WriteHandle {
        WriteHandle{
            w: RcRefCellT::new(io::stdout())
        }
    }

    pub fn stderr_write_handle() -> WriteHandle {
        WriteHandle{
            w: RcRefCellT::new(io::stderr())
        }
    }

    pub fn string_buff_write_handle() -> (WriteHandle, RcRefCell<StringBuffer>) {
        let buffer =
            RcRefCellT::new(StringBuffer::new());
        let h = WriteHandle{
            w: buffer.clone()
        };
        (h, buffer)
    }

    pub fn empty_write_handle() -> WriteHandle {
        WriteHandle{
            w: RcRefCellT::new(io::empty())
        }
    }
}

impl Clone for WriteHandle {
    fn clone(&self) -> Self {
        WriteHandle{ w: self.w.clone() }
    }
}

impl io::Write for WriteHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.w.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.borrow_mut().flush()
    }
}

/// writeln! that ignores the result. For best-effort user warnings.
#[macro_export]
macro_rules! write_errln {
    ($dst:expr, $($arg:tt)*) => {{
        let _ = writeln!($dst, $($arg)*);
    }};
}

// Generally, this will represent a file that has been opened,
// where we want to track the name along with it.
// Though it may be pre-read, in which case, we can just store
// the string.
pub enum DescribedReader {
    String((String, String)),
    FilePath(PathBuf),
}

impl DescribedReader {
    pub fn from_string(desc: String, data: String) -> DescribedReader {
        DescribedReader::String((desc, data))
    }

    pub fn from_file_path(path: PathBuf) -> DescribedReader {
        DescribedReader::FilePath(path)
    }

    pub fn desc(&self) -> &str {
        match self {
            DescribedReader::String((name, _)) => name,
            DescribedReader::FilePath(path) =>
                path.to_str().unwrap_or("<unknown path>"),
        }
    }

    pub fn reader<'a>(&'a self) -> Result<Box<dyn io::Read + 'a>, io::Error> {
        match self {
            DescribedReader::String((_, text)) => {
                Ok(Box::new(text.as_bytes()))
            },
            DescribedReader::FilePath(path) => {
                Ok(Box::new(std::fs::File::open(path)?))
            },
        }
    }
}
