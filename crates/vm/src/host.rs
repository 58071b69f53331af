//! Syscall host: the side effects a program can request through SYSCALL.
//!
//! | selector | stack effect            | host call            |
//! |----------|-------------------------|----------------------|
//! | 0        | pop int                 | [`Host::print_int`]  |
//! | 1        | pop float               | [`Host::print_float`]|
//! | 2        | pop int (seconds)       | [`Host::sleep`]      |
//! | 3        | pop family, type, proto | [`Host::socket`]     |

use std::io::{self, Stdout, Write};
use std::thread;
use std::time::Duration;

use chipvm_common::Instruction;

/// Host services available to a running program.
pub trait Host {
    /// Print an integer.
    fn print_int(&mut self, value: i32) -> io::Result<()>;

    /// Print a float.
    fn print_float(&mut self, value: f32) -> io::Result<()>;

    /// Block the executing thread for `seconds`.
    fn sleep(&mut self, seconds: u32) -> io::Result<()>;

    /// Reserved socket creation. No observable effect by default.
    fn socket(&mut self, _family: i32, _kind: i32, _protocol: i32) -> io::Result<()> {
        Ok(())
    }

    /// Called with every instruction before it executes.
    fn trace(&mut self, _ip: usize, _instr: &Instruction, _sp: usize) {}
}

impl<H: Host + ?Sized> Host for &mut H {
    fn print_int(&mut self, value: i32) -> io::Result<()> {
        (**self).print_int(value)
    }

    fn print_float(&mut self, value: f32) -> io::Result<()> {
        (**self).print_float(value)
    }

    fn sleep(&mut self, seconds: u32) -> io::Result<()> {
        (**self).sleep(seconds)
    }

    fn socket(&mut self, family: i32, kind: i32, protocol: i32) -> io::Result<()> {
        (**self).socket(family, kind, protocol)
    }

    fn trace(&mut self, ip: usize, instr: &Instruction, sp: usize) {
        (**self).trace(ip, instr, sp)
    }
}

/// Host writing printed values to a [`Write`] sink, one per line.
///
/// Integers print in decimal, floats with six fractional digits. Tracing,
/// when enabled, goes to stderr.
#[derive(Debug)]
pub struct StdHost<W: Write = Stdout> {
    out: W,
    trace: bool,
}

impl StdHost<Stdout> {
    /// Host printing to stdout.
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for StdHost<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdHost<W> {
    /// Host printing to `out`.
    pub fn with_writer(out: W) -> Self {
        Self { out, trace: false }
    }

    /// Enable or disable the per-instruction trace.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Recover the output sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Host for StdHost<W> {
    fn print_int(&mut self, value: i32) -> io::Result<()> {
        writeln!(self.out, "{value}")
    }

    fn print_float(&mut self, value: f32) -> io::Result<()> {
        writeln!(self.out, "{value:.6}")
    }

    fn sleep(&mut self, seconds: u32) -> io::Result<()> {
        self.out.flush()?;
        thread::sleep(Duration::from_secs(u64::from(seconds)));
        Ok(())
    }

    fn trace(&mut self, ip: usize, instr: &Instruction, sp: usize) {
        if self.trace {
            eprintln!("[{ip:>5}] {instr} sp={sp}");
        }
    }
}
