//! Entrypoint for CLI
use std::{env, error::Error, fs, time::Instant};

use chip8_vm::{prelude::*, IMPL_VERSION};
use log::{error, info, LevelFilter};

use crate::{
    config::{RunConfig, DEFAULT_MAX_STEPS},
    devices::ScriptedDevices,
    error::AppError,
};

mod config;
mod devices;
mod error;

static USAGE: &str = r#"
usage: chip8 CMD [FILE] [OPTIONS]

commands:
    run     Run the target ROM file headless
    dis     Disassemble the target ROM into readable assembly

options:
    --config FILE   YAML run configuration
    --steps N       Maximum number of interpreter steps (overrides config)

examples:
    chip8 run maze.rom --steps 5000
    chip8 run breakout.rom --config breakout.yaml
    chip8 dis breakout.rom
"#;

/// Run the ROM until the step budget is spent.
///
/// Returns the fault that halted the machine, if any.
fn run_bytecode(filepath: &str, opts: &Options) -> Result<Option<Fault>, AppError> {
    let config = match &opts.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    let max_steps = opts
        .steps
        .or(config.max_steps)
        .unwrap_or(DEFAULT_MAX_STEPS);

    let bytecode = fs::read(filepath)?;
    let mut vm = Chip8Vm::with_bytecode(config.vm_conf(), &bytecode)?;
    let mut devices = ScriptedDevices::new(config.keys);

    info!("running {filepath} for at most {max_steps} steps");

    let start = Instant::now();
    let mut steps = 0;
    let mut fault = None;

    while steps < max_steps {
        devices.advance(steps);

        match vm.tick(&mut devices) {
            Ok(Flow::Interrupt) => break,
            Ok(_) => steps += 1,
            Err(Chip8Error::Runtime(err)) => {
                fault = Some(err);
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let end = Instant::now();
    info!(
        "ran {steps} steps in {}ms, {} frames presented",
        end.duration_since(start).as_nanos() as f64 / 1000000.0,
        devices.frame_count()
    );

    if vm.state() != VmState::Running {
        info!("final state: {:?}", vm.state());
    }

    print!("{}", devices.screen());

    Ok(fault)
}

fn disassemble(filepath: &str) -> Result<(), AppError> {
    let bytecode = fs::read(filepath)?;
    Disassembler::new(&bytecode).print_bytecode()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    match parse_args() {
        Some(Cmd::Run { filepath, opts }) => {
            if let Some(fault) = run_bytecode(&filepath, &opts)? {
                error!("machine halted: {fault}");
                std::process::exit(1)
            }
        }
        Some(Cmd::Dis { filepath }) => disassemble(&filepath)?,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    match args.next() {
        Some(cmd) => {
            // don't format me T.T
            match cmd.as_str() {
                "run" => Some(Cmd::Run {
                    filepath: consume_arg(&mut args)?,
                    opts: parse_options(args)?,
                }),
                "dis" => Some(Cmd::Dis {
                    filepath: consume_arg(&mut args)?,
                }),
                _ => None,
            }
        }
        None => None,
    }
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Option<Options> {
    let mut opts = Options::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => opts.config = Some(consume_arg(&mut args)?),
            "--steps" => opts.steps = Some(consume_arg(&mut args)?.parse().ok()?),
            _ => {
                eprintln!("unknown option: {arg}");
                return None;
            }
        }
    }

    Some(opts)
}

/// Consumes the next argument, if it exists.
fn consume_arg(args: &mut impl Iterator<Item = String>) -> Option<String> {
    args.next()
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Run file
    Run { filepath: String, opts: Options },
    /// Disassemble
    Dis { filepath: String },
}

#[derive(Default)]
struct Options {
    config: Option<String>,
    steps: Option<usize>,
}
