use std::fmt;
use std::io;

/// Adapts an [`io::Write`] to [`fmt::Write`], remembering the underlying IO
/// error so that it can be returned instead of a bare [`fmt::Error`].
pub struct Writer<W> {
    writer: W,
    err: Option<io::Error>,
}

impl<W> Writer<W>
where
    W: io::Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer, err: None }
    }

    pub fn take_err(&mut self) -> Option<io::Error> {
        self.err.take()
    }
}

impl<W> fmt::Write for Writer<W>
where
    W: io::Write,
{
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.writer.write_all(s.as_bytes()).map_err(|e| {
            self.err = Some(e);
            fmt::Error
        })
    }
}
