use bytesize::ByteSize;
use colored::*;
use rustyline::Editor;
use sdb::typedef::*;
use sdb::{Machine, Mode, Monitor, ToyMachine, DEFAULT_MEM_BASE, DEFAULT_MEM_SIZE, VERSION};
use std::io;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "sdb", about = "A simple debugger for a tiny RV32I machine")]
struct Opt {
    /// Run the program to completion without prompting
    #[structopt(short = "b", long = "batch")]
    batch: bool,
    /// Start of guest memory (hex)
    #[structopt(long = "base", parse(try_from_str = parse_hex))]
    base: Option<Address>,
    /// Size of guest memory in bytes
    #[structopt(long = "mem-size")]
    mem_size: Option<usize>,
    /// Raw binary image to load at the start of memory
    #[structopt(parse(from_os_str))]
    image: Option<PathBuf>,
}

fn parse_hex(text: &str) -> ::std::result::Result<Address, String> {
    sdb::command::parse_hex(text).ok_or_else(|| format!("invalid hex address {:?}", text))
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => ::std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            ::std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let opts = Opt::from_args();

    let mut machine = ToyMachine::new(
        opts.base.unwrap_or(DEFAULT_MEM_BASE),
        opts.mem_size.unwrap_or(DEFAULT_MEM_SIZE),
    )?;

    println!("{}", format!("Welcome to sdb {}!", *VERSION).cyan());

    let mem_line = format!(
        "Guest memory: {} at 0x{:08x}",
        ByteSize(machine.mem_size() as u64),
        machine.base()
    );
    println!("{}", mem_line.cyan());

    let image_line = match opts.image {
        Some(ref path) => {
            let size = machine.load_image(path)?;
            format!("Image: {}, size = {}", path.display(), ByteSize(size as u64))
        }
        None => "No image is given. Use the default built-in image.".to_string(),
    };
    println!("{}", image_line.cyan());

    if !opts.batch {
        println!("For help, type \"help\"");
    }
    println!();

    let mode = if opts.batch {
        Mode::Batch
    } else {
        Mode::Interactive
    };

    let mut monitor = Monitor::new(machine, Editor::<()>::new(), io::stdout()).with_mode(mode);
    monitor.run()?;

    Ok(monitor.machine().state().is_good_exit())
}
