//! Early console and logger
//!
//! Output goes through a single registered `putc` routine, the way the
//! on-chip-RAM stage has no driver model yet: the board entry sets up its
//! UART, registers a `putc` with [`set_putc`] and from then on both the
//! `log` facade and fatal diagnostics reach the serial port.

use core::fmt::{self, Write};

use arrayvec::ArrayString;
use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Maximum formatted length of one log line
pub const LINE_LEN: usize = 160;

/// Byte sink; `ctx` is typically the UART base address
pub type PutcFn = fn(ctx: usize, byte: u8);

#[derive(Clone, Copy)]
struct Sink {
    putc: PutcFn,
    ctx: usize,
}

static SINK: Mutex<Option<Sink>> = Mutex::new(None);

/// Register the console output routine
pub fn set_putc(putc: PutcFn, ctx: usize) {
    *SINK.lock() = Some(Sink { putc, ctx });
}

/// Drop the console output routine; later output is discarded
pub fn clear_putc() {
    *SINK.lock() = None;
}

pub fn putc(byte: u8) {
    let sink = *SINK.lock();
    if let Some(sink) = sink {
        (sink.putc)(sink.ctx, byte);
    }
}

/// Write `s`, expanding `\n` to `\r\n`
pub fn puts(s: &str) {
    let sink = *SINK.lock();
    let Some(sink) = sink else { return };
    for byte in s.bytes() {
        if byte == b'\n' {
            (sink.putc)(sink.ctx, b'\r');
        }
        (sink.putc)(sink.ctx, byte);
    }
}

/// `fmt::Write` adapter over the console
pub struct ConsoleWriter;

impl Write for ConsoleWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        puts(s);
        Ok(())
    }
}

/// Line buffer that truncates instead of failing when full
pub struct LineBuffer(ArrayString<LINE_LEN>);

impl LineBuffer {
    pub const fn new() -> Self {
        Self(ArrayString::new_const())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.0.try_push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Format one log record as a console line
pub fn format_line(level: Level, target: &str, args: &fmt::Arguments<'_>) -> LineBuffer {
    let tag = match level {
        Level::Error => "ERROR",
        Level::Warn => " WARN",
        Level::Info => " INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };
    let target = target.rsplit("::").next().unwrap_or(target);

    let mut line = LineBuffer::new();
    let _ = write!(line, "{} {}: {}", tag, target, args);
    line
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format_line(record.level(), record.target(), record.args());
            puts(line.as_str());
            puts("\n");
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the console logger; a second call is ignored
pub fn init_logger(level: LevelFilter) {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level)).ok();
}

/// Emit a diagnostic that bypasses the log level filter
pub fn diag(args: fmt::Arguments<'_>) {
    let _ = ConsoleWriter.write_fmt(args);
    puts("\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;

    static CAPTURED: Mutex<Vec<u8>> = Mutex::new(Vec::new());

    fn capture(ctx: usize, byte: u8) {
        assert_eq!(ctx, 0x3086_0000);
        CAPTURED.lock().push(byte);
    }

    #[test]
    fn test_format_line_strips_module_path() {
        let line = format_line(Level::Info, "moduline_bootloader::gate", &format_args!("secure path"));
        assert_eq!(line.as_str(), " INFO gate: secure path");
    }

    #[test]
    fn test_long_lines_are_truncated() {
        let long = "x".repeat(LINE_LEN * 2);
        let line = format_line(Level::Warn, "t", &format_args!("{}", long));
        assert_eq!(line.as_str().len(), LINE_LEN);
    }

    // The sink is global; everything that touches it lives in this one test.
    #[test]
    fn test_output_goes_through_registered_putc() {
        puts("dropped\n");
        set_putc(capture, 0x3086_0000);
        putc(b'>');
        puts("a\nb");
        diag(format_args!("halt {}", 1));
        clear_putc();
        puts("dropped");

        let text = String::from_utf8(CAPTURED.lock().clone()).unwrap();
        assert_eq!(text, ">a\r\nbhalt 1\r\n");
    }
}
