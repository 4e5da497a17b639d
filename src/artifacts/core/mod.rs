//! Shared plumbing used across areas and commands
//!
//! - `lockfile`: exclusive `<file>.lock` + rename writer
//! - `PagerWriter`: `Write` adapter feeding the `minus` pager

use derive_new::new;
use minus::Pager;
use std::io::{self, Write};

pub mod lockfile;

/// Adapts the minus pager to `std::io::Write`, so command handlers can
/// write to it exactly as they would to stdout.
///
/// ```ignore
/// let pager = Pager::new();
/// let mut writer = PagerWriter::new(pager.clone());
/// writeln!(writer, "commit ...")?;
/// minus::page_all(pager)?;
/// ```
#[derive(new)]
pub struct PagerWriter {
    pager: Pager,
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pager
            .push_str(String::from_utf8_lossy(buf))
            .map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
