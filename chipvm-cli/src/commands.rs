//! CLI command implementations.

use std::fs;
use std::path::Path;

use chipvm_common::{Image, Program};
use chipvm_vm::{StdHost, VM};

/// Flags shared by the commands. Unknown flags are rejected.
#[derive(Debug, Default)]
struct Options {
    input: Option<String>,
    output: Option<String>,
    raw: bool,
    trace: bool,
}

/// Assemble a .S text file to a binary.
pub fn assemble(args: &[String]) -> Result<(), i32> {
    const USAGE: &str = "Usage: chipvm assemble <input.S> [-o output.bin] [--raw]";
    let opts = parse_options(args, &["-o", "--raw"], USAGE)?;
    let input = require_input(&opts, "assemble", USAGE)?;

    let output = opts.output.clone().unwrap_or_else(|| default_output(input));

    let program = read_source(input)?;
    let bytes = if opts.raw {
        program.encode_raw()
    } else {
        program.encode()
    };

    fs::write(&output, &bytes).map_err(|e| {
        eprintln!("error: cannot write '{output}': {e}");
        1
    })?;

    eprintln!(
        "assembled {} instructions ({} bytes) -> {output}",
        program.len(),
        bytes.len()
    );
    Ok(())
}

/// Execute a binary program.
pub fn run(args: &[String]) -> Result<(), i32> {
    const USAGE: &str = "Usage: chipvm run <input.bin> [--trace]";
    let opts = parse_options(args, &["--trace"], USAGE)?;
    let input = require_input(&opts, "run", USAGE)?;

    let bytes = fs::read(input).map_err(|e| {
        eprintln!("error: cannot read '{input}': {e}");
        1
    })?;
    execute(&bytes, opts.trace)
}

/// Disassemble a binary to text.
pub fn disassemble(args: &[String]) -> Result<(), i32> {
    const USAGE: &str = "Usage: chipvm disassemble <input.bin>";
    let opts = parse_options(args, &[], USAGE)?;
    let input = require_input(&opts, "disassemble", USAGE)?;

    let bytes = fs::read(input).map_err(|e| {
        eprintln!("error: cannot read '{input}': {e}");
        1
    })?;
    let program = Program::decode(&bytes).map_err(|e| {
        eprintln!("error: invalid binary: {e}");
        1
    })?;
    print!("{}", chipvm_assembler::disassemble(&program));
    Ok(())
}

/// Assemble a .S text file and execute it without writing a binary.
pub fn exec(args: &[String]) -> Result<(), i32> {
    const USAGE: &str = "Usage: chipvm exec <input.S> [--trace]";
    let opts = parse_options(args, &["--trace"], USAGE)?;
    let input = require_input(&opts, "exec", USAGE)?;

    let program = read_source(input)?;
    execute(&program.encode(), opts.trace)
}

// --- Helpers ---

fn parse_options(args: &[String], allowed: &[&str], usage: &str) -> Result<Options, i32> {
    let mut opts = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let flag = arg.as_str();
        if flag.starts_with('-') && !allowed.contains(&flag) {
            eprintln!("error: unexpected option '{flag}'");
            eprintln!("{usage}");
            return Err(1);
        }
        match flag {
            "-o" => match iter.next() {
                Some(path) => opts.output = Some(path.clone()),
                None => {
                    eprintln!("error: -o requires a path");
                    eprintln!("{usage}");
                    return Err(1);
                }
            },
            "--raw" => opts.raw = true,
            "--trace" => opts.trace = true,
            _ if opts.input.is_none() => opts.input = Some(arg.clone()),
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("{usage}");
                return Err(1);
            }
        }
    }
    Ok(opts)
}

fn require_input<'a>(opts: &'a Options, command: &str, usage: &str) -> Result<&'a str, i32> {
    opts.input.as_deref().ok_or_else(|| {
        eprintln!("error: {command} requires an input file");
        eprintln!("{usage}");
        1
    })
}

/// `prog.S` becomes `prog.bin`.
fn default_output(input: &str) -> String {
    Path::new(input)
        .with_extension("bin")
        .to_string_lossy()
        .into_owned()
}

/// Read and assemble a text file.
fn read_source(path: &str) -> Result<Program, i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    chipvm_assembler::assemble(&text).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

/// Execute an encoded stream, printing syscall output to stdout.
fn execute(bytes: &[u8], trace: bool) -> Result<(), i32> {
    let image = Image::parse(bytes).map_err(|e| {
        eprintln!("error: invalid binary: {e}");
        1
    })?;

    let host = StdHost::new().with_trace(trace);
    VM::new(image, host).execute().map_err(|e| {
        eprintln!("runtime error: {e}");
        2
    })
}
