//! CHIP-8 virtual machine.
mod bytecode;
pub mod constants;
mod cpu;
mod devices;
mod disasm;
mod display;
mod error;
mod instr;
mod memory;
mod stack;
mod timer;
mod vm;

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use self::{
    devices::{Devices, Headless, InvalidKeyCode, KeyCode, Keypad},
    display::Framebuffer,
    error::{Chip8Error, Chip8Result, Fault},
    instr::Instr,
    memory::{check_program_size, Memory},
    timer::Timer,
    vm::{Chip8Conf, Chip8Vm, Flow, Quirks, VmState},
};

pub mod prelude {
    pub use super::{
        cpu::Chip8Cpu,
        devices::{Devices, Headless, KeyCode, Keypad},
        disasm::Disassembler,
        display::Framebuffer,
        error::{Chip8Error, Chip8Result, Fault},
        instr::Instr,
        vm::{Chip8Conf, Chip8Vm, Flow, Quirks, VmState},
    };
}
