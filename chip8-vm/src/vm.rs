//! Virtual machine.
use std::fmt::Write;

use rand::prelude::*;

use crate::{
    constants::*,
    cpu::Chip8Cpu,
    devices::{Devices, KeyCode},
    display::Framebuffer,
    error::{Chip8Error, Chip8Result, Fault},
    instr::Instr,
    memory::{check_program_size, Memory},
    stack::CallStack,
    timer::Timer,
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    memory: Memory,
    stack: CallStack,
    display: Framebuffer,
    delay_timer: Timer,
    sound_timer: Timer,
    state: VmState,
    /// Fault that halted the machine, if any.
    fault: Option<Fault>,
    rng: StdRng,
    conf: Chip8Conf,
}

impl Chip8Vm {
    /// Create a VM with the font loaded and an empty program.
    pub fn new(conf: Chip8Conf) -> Self {
        let rng = match conf.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Chip8Vm {
            cpu: Chip8Cpu::new(),
            memory: Memory::new(),
            stack: CallStack::new(),
            display: Framebuffer::new(),
            delay_timer: Timer::new(),
            sound_timer: Timer::new(),
            state: VmState::Running,
            fault: None,
            rng,
            conf,
        }
    }

    /// Create a VM with the given program loaded.
    ///
    /// The program is validated before the VM is created.
    pub fn with_bytecode(conf: Chip8Conf, bytecode: &[u8]) -> Chip8Result<Self> {
        if !check_program_size(bytecode) {
            return Err(Chip8Error::LargeProgram {
                size: bytecode.len(),
            });
        }

        let mut vm = Self::new(conf);
        vm.load_bytecode(bytecode)?;
        Ok(vm)
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    /// Replace the loaded program, resetting the machine.
    ///
    /// When the program doesn't fit in memory an error is returned
    /// and the VM is left untouched.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if !check_program_size(bytecode) {
            return Err(Chip8Error::LargeProgram {
                size: bytecode.len(),
            });
        }

        // Start with clean memory to avoid leaking previous program.
        self.memory.reset();

        // Load program into virtual RAM
        self.memory.load_program(bytecode);

        self.reset();

        log::debug!("loaded program: {} bytes", bytecode.len());

        Ok(())
    }

    /// Clear internal state in preparation for a fresh startup.
    fn reset(&mut self) {
        self.cpu = Chip8Cpu::new();
        self.stack.clear();
        self.display.clear();
        self.delay_timer = Timer::new();
        self.sound_timer = Timer::new();
        self.state = VmState::Running;
        self.fault = None;
    }

    pub fn display_buffer(&self) -> &Framebuffer {
        &self.display
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.cpu.registers
    }

    /// Value of the address register `I`.
    pub fn address(&self) -> Address {
        self.cpu.address
    }

    pub fn pc(&self) -> Address {
        self.cpu.pc
    }

    /// The most recently fetched instruction word.
    pub fn instruction_register(&self) -> u16 {
        self.cpu.ir
    }

    pub fn call_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.read()
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.read()
    }

    /// Whether the sound timer is counting down, and a tone should be playing.
    pub fn is_sound_active(&self) -> bool {
        self.sound_timer.is_active()
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }
}

/// Execution state between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Running,
    /// Stalled on `Fx0A` (`LD Vx, K`) until a key is pressed.
    ///
    /// The key will be stored in register `vx`.
    KeyWait { vx: u8 },
    /// Stopped by a fault or by an interrupt request.
    /// Loading a program resets the machine to running.
    Halted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Flow {
    Ok,
    /// The machine was interrupted, and is halted.
    Interrupt,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// The display buffer changed and was presented.
    Draw,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct Chip8Conf {
    /// Behaviour variations of specific instructions.
    pub quirks: Quirks,
    /// Seed for the random number generator used by `Cxnn` (`RND Vx, byte`).
    ///
    /// When not set, the generator is seeded from the operating system.
    pub seed: Option<u64>,
}

/// Historical variations of instruction behaviour.
///
/// Interpreters over the years disagreed on some instructions, and
/// programs were written against one or the other. The defaults are
/// the most common modern conventions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct Quirks {
    /// `8xy6` and `8xyE` shift `Vy` and store the result in `Vx`,
    /// instead of shifting `Vx` in place.
    pub shift_uses_vy: bool,
    /// `8xy1`, `8xy2` and `8xy3` reset `VF` to 0.
    pub logic_resets_vf: bool,
    /// `Fx55` and `Fx65` leave `I` pointing past the last register accessed.
    pub memory_increments_i: bool,
}

/// Interpreter
impl Chip8Vm {
    /// Request the machine to stop.
    ///
    /// The instruction in progress, if any, completes. The next tick
    /// reports [`Flow::Interrupt`].
    pub fn interrupt(&mut self) {
        if self.state != VmState::Halted {
            log::info!("interrupted at {:04X}", self.cpu.pc);
            self.state = VmState::Halted;
        }
    }

    /// Advance the machine by one instruction.
    ///
    /// While waiting on a key, each tick polls the devices for a key press
    /// instead of executing an instruction.
    ///
    /// Faults halt the machine. Every tick after a fault returns the same error.
    pub fn tick(&mut self, devices: &mut impl Devices) -> Chip8Result<Flow> {
        match self.state {
            VmState::Halted => match self.fault {
                Some(fault) => Err(Chip8Error::Runtime(fault)),
                None => Ok(Flow::Interrupt),
            },
            VmState::KeyWait { vx } => Ok(self.resume_key_wait(vx, devices)),
            VmState::Running => match self.step(devices) {
                Ok(flow) => Ok(flow),
                Err(fault) => {
                    self.halt(fault);
                    Err(Chip8Error::Runtime(fault))
                }
            },
        }
    }

    /// Run up to the given number of ticks.
    ///
    /// Stops early when the machine is interrupted or faults.
    pub fn run_steps(&mut self, devices: &mut impl Devices, step_count: usize) -> Chip8Result<Flow> {
        let mut control_flow = Flow::Ok;

        for _ in 0..step_count {
            control_flow = self.tick(devices)?;
            if control_flow == Flow::Interrupt {
                break;
            }
        }

        Ok(control_flow)
    }

    fn halt(&mut self, fault: Fault) {
        log::warn!("halted: {fault}");
        self.state = VmState::Halted;
        self.fault = Some(fault);
    }

    fn resume_key_wait(&mut self, vx: u8, devices: &mut impl Devices) -> Flow {
        match devices.poll_next_key() {
            Some(key) => {
                self.cpu.set_v(vx, key.as_u8());
                self.state = VmState::Running;
                Flow::Ok
            }
            None => Flow::KeyWait,
        }
    }

    /// Fetch, decode and execute a single instruction.
    fn step(&mut self, devices: &mut impl Devices) -> Result<Flow, Fault> {
        let pc = self.cpu.pc;

        // Each instruction is two bytes, and must fit in memory.
        if pc as usize >= MEM_SIZE - 2 {
            return Err(Fault::PcOutOfBounds { pc });
        }
        let word = self
            .memory
            .word(pc as usize)
            .ok_or(Fault::PcOutOfBounds { pc })?;

        self.cpu.ir = word;
        self.cpu.pc = pc + 2;

        let instr = Instr::decode(word);

        #[cfg(feature = "op_trace")]
        log::trace!("{pc:04X}: {word:04X} {instr}");

        self.execute(instr, pc, devices)
    }

    /// Execute a decoded instruction.
    ///
    /// The program counter has already been advanced past the instruction,
    /// which was located at `pc`.
    fn execute(&mut self, instr: Instr, pc: Address, devices: &mut impl Devices) -> Result<Flow, Fault> {
        use Instr as I;

        let mut control_flow = Flow::Ok;

        match instr {
            // 0NNN (SYS addr)
            //
            // Machine code routines can't be emulated.
            I::Sys { .. } | I::Unknown(_) => {
                log::trace!("ignored instruction {:04X} at {pc:04X}", self.cpu.ir);
            }
            // 00E0 (CLS)
            I::ClearScreen => {
                self.display.clear();
                devices.present(&self.display);
                control_flow = Flow::Draw;
            }
            // 00EE (RET)
            //
            // Set the program counter to the address at the top of the stack.
            I::Return => {
                self.cpu.pc = self
                    .stack
                    .pop()
                    .map_err(|_| Fault::StackUnderflow { pc })?;
                control_flow = Flow::Jump;
            }
            // 1NNN (JP addr)
            I::Jump { address } => {
                self.cpu.pc = address;
                control_flow = Flow::Jump;
            }
            // 2NNN (CALL addr)
            //
            // Push the return address, which is the next instruction.
            I::Call { address } => {
                self.stack
                    .push(self.cpu.pc)
                    .map_err(|_| Fault::StackOverflow { pc })?;
                self.cpu.pc = address;
                control_flow = Flow::Jump;
            }
            // 3XNN (SE Vx, byte)
            I::Skip_Eq_Byte { vx, nn } => {
                if self.cpu.v(vx) == nn {
                    self.cpu.skip();
                }
            }
            // 4XNN (SNE Vx, byte)
            I::Skip_NotEq_Byte { vx, nn } => {
                if self.cpu.v(vx) != nn {
                    self.cpu.skip();
                }
            }
            // 5XY0 (SE Vx, Vy)
            I::Skip_Eq { vx, vy } => {
                if self.cpu.v(vx) == self.cpu.v(vy) {
                    self.cpu.skip();
                }
            }
            // 6XNN (LD Vx, byte)
            I::Load_Byte { vx, nn } => self.cpu.set_v(vx, nn),
            // 7XNN (ADD Vx, byte)
            //
            // Carry flag is not set.
            I::Add_Byte { vx, nn } => {
                let x = self.cpu.v(vx);
                self.cpu.set_v(vx, x.wrapping_add(nn));
            }
            // 9XY0 (SNE Vx, Vy)
            I::Skip_NotEq { vx, vy } => {
                if self.cpu.v(vx) != self.cpu.v(vy) {
                    self.cpu.skip();
                }
            }
            // ANNN (LD I, addr)
            I::Load_Address { address } => self.cpu.address = address,
            // BNNN (JP V0, addr)
            I::Jump_V0 { address } => {
                self.cpu.pc = (self.cpu.v(0) as Address).wrapping_add(address);
                control_flow = Flow::Jump;
            }
            // CXNN (RND Vx, byte)
            //
            // Set register VX to the result of bitwise AND between a random number and NN.
            I::Random { vx, nn } => {
                let value = self.rng.gen::<u8>() & nn;
                self.cpu.set_v(vx, value);
            }
            // DXYN (DRW Vx, Vy, nibble)
            I::Draw { vx, vy, n } => {
                self.exec_draw(vx, vy, n, pc)?;
                devices.present(&self.display);
                control_flow = Flow::Draw;
            }
            // EX9E (SKP Vx)
            I::Skip_Key { vx } => {
                if devices.is_key_pressed(KeyCode::from_nibble(self.cpu.v(vx))) {
                    self.cpu.skip();
                }
            }
            // EXA1 (SKNP Vx)
            I::Skip_NotKey { vx } => {
                if !devices.is_key_pressed(KeyCode::from_nibble(self.cpu.v(vx))) {
                    self.cpu.skip();
                }
            }
            // FX0A (LD Vx, K)
            //
            // All execution stops until a key is pressed.
            // Presses that happened before this instruction don't count.
            I::Wait_Key { vx } => {
                devices.discard_key_presses();
                match devices.poll_next_key() {
                    Some(key) => self.cpu.set_v(vx, key.as_u8()),
                    None => {
                        self.state = VmState::KeyWait { vx };
                        control_flow = Flow::KeyWait;
                    }
                }
            }
            I::Load_Delay { .. }
            | I::Set_Delay { .. }
            | I::Set_Sound { .. }
            | I::Add_Address { .. }
            | I::Load_Glyph { .. }
            | I::Store_Bcd { .. }
            | I::Store_Registers { .. }
            | I::Load_Registers { .. } => self.exec_misc(instr, pc)?,
            I::Load_Vx_Vy { .. }
            | I::Or_Vx_Vy { .. }
            | I::And_Vx_Vy { .. }
            | I::Xor_Vx_Vy { .. }
            | I::Add_Vx_Vy { .. }
            | I::Sub_Vx_Vy { .. }
            | I::ShiftRight { .. }
            | I::SubReverse_Vx_Vy { .. }
            | I::ShiftLeft { .. } => self.exec_math(instr),
        }

        Ok(control_flow)
    }

    /// Execute an arithmetic instruction
    ///
    /// Where the flag register is written, it is written last, so
    /// when `Vx` is `VF` the flag wins.
    #[inline]
    fn exec_math(&mut self, instr: Instr) {
        use Instr as I;

        let quirks = self.conf.quirks;

        match instr {
            // 8XY0 (LD Vx, Vy)
            I::Load_Vx_Vy { vx, vy } => self.cpu.set_v(vx, self.cpu.v(vy)),
            // 8XY1 (OR Vx, Vy)
            I::Or_Vx_Vy { vx, vy } => {
                self.cpu.set_v(vx, self.cpu.v(vx) | self.cpu.v(vy));
                if quirks.logic_resets_vf {
                    self.cpu.set_flag(false);
                }
            }
            // 8XY2 (AND Vx, Vy)
            I::And_Vx_Vy { vx, vy } => {
                self.cpu.set_v(vx, self.cpu.v(vx) & self.cpu.v(vy));
                if quirks.logic_resets_vf {
                    self.cpu.set_flag(false);
                }
            }
            // 8XY3 (XOR Vx, Vy)
            I::Xor_Vx_Vy { vx, vy } => {
                self.cpu.set_v(vx, self.cpu.v(vx) ^ self.cpu.v(vy));
                if quirks.logic_resets_vf {
                    self.cpu.set_flag(false);
                }
            }
            // 8XY4 (ADD Vx, Vy)
            //
            // If overflow, set VF to 1, else 0.
            I::Add_Vx_Vy { vx, vy } => {
                let (result, carry) = self.cpu.v(vx).overflowing_add(self.cpu.v(vy));
                self.cpu.set_v(vx, result);
                self.cpu.set_flag(carry);
            }
            // 8XY5 (SUB Vx, Vy)
            //
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            I::Sub_Vx_Vy { vx, vy } => {
                let (result, borrow) = self.cpu.v(vx).overflowing_sub(self.cpu.v(vy));
                self.cpu.set_v(vx, result);
                self.cpu.set_flag(!borrow);
            }
            // 8XY6 (SHR Vx)
            //
            // VF is set to the least-significant bit that is shifted out.
            I::ShiftRight { vx, vy } => {
                let src = if quirks.shift_uses_vy { vy } else { vx };
                let value = self.cpu.v(src);
                self.cpu.set_v(vx, value >> 1);
                self.cpu.set_flag(value & 1 != 0);
            }
            // 8XY7 (SUBN Vx, Vy)
            //
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            I::SubReverse_Vx_Vy { vx, vy } => {
                let (result, borrow) = self.cpu.v(vy).overflowing_sub(self.cpu.v(vx));
                self.cpu.set_v(vx, result);
                self.cpu.set_flag(!borrow);
            }
            // 8XYE (SHL Vx)
            //
            // VF is set to the most-significant bit that is shifted out.
            I::ShiftLeft { vx, vy } => {
                let src = if quirks.shift_uses_vy { vy } else { vx };
                let value = self.cpu.v(src);
                self.cpu.set_v(vx, value << 1);
                self.cpu.set_flag(value >> 7 != 0);
            }
            _ => unreachable!("not an arithmetic instruction: {instr:?}"),
        }
    }

    /// Execute a timer or memory instruction
    #[inline]
    fn exec_misc(&mut self, instr: Instr, pc: Address) -> Result<(), Fault> {
        use Instr as I;

        let addr = self.cpu.address as usize;
        let out_of_bounds = || Fault::AddressOutOfBounds { pc, address: addr };

        match instr {
            // FX07 (LD Vx, DT)
            I::Load_Delay { vx } => self.cpu.set_v(vx, self.delay_timer.read()),
            // FX15 (LD DT, Vx)
            I::Set_Delay { vx } => self.delay_timer.arm(self.cpu.v(vx)),
            // FX18 (LD ST, Vx)
            I::Set_Sound { vx } => self.sound_timer.arm(self.cpu.v(vx)),
            // FX1E (ADD I, Vx)
            I::Add_Address { vx } => {
                self.cpu.address = self.cpu.address.wrapping_add(self.cpu.v(vx) as Address);
            }
            // FX29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            I::Load_Glyph { vx } => {
                let digit = (self.cpu.v(vx) & 0xF) as Address;
                self.cpu.address = FONTSET_START + digit * FONTSET_HEIGHT as Address;
            }
            // FX33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            I::Store_Bcd { vx } => {
                let x = self.cpu.v(vx);
                let digits = self.memory.slice_mut(addr, 3).ok_or_else(out_of_bounds)?;
                digits[0] = x / 100 % 10;
                digits[1] = x / 10  % 10;
                digits[2] = x       % 10;
            }
            // FX55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            I::Store_Registers { vx } => {
                let count = vx as usize + 1;
                self.memory
                    .slice_mut(addr, count)
                    .ok_or_else(out_of_bounds)?
                    .copy_from_slice(&self.cpu.registers[..count]);
                self.advance_address(count);
            }
            // FX65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            I::Load_Registers { vx } => {
                let count = vx as usize + 1;
                let values = self.memory.slice(addr, count).ok_or_else(out_of_bounds)?;
                self.cpu.registers[..count].copy_from_slice(values);
                self.advance_address(count);
            }
            _ => unreachable!("not a timer or memory instruction: {instr:?}"),
        }

        Ok(())
    }

    fn advance_address(&mut self, count: usize) {
        if self.conf.quirks.memory_increments_i {
            self.cpu.address = self.cpu.address.wrapping_add(count as Address);
        }
    }

    /// Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
    ///
    /// Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
    /// memory pointed to by address register I.
    ///
    /// If the drawing operation erases existing pixels in the display buffer, register VF is set to
    /// 1, and set to 0 if no display bits are unset. This is used for collision detection.
    fn exec_draw(&mut self, vx: u8, vy: u8, n: u8, pc: Address) -> Result<(), Fault> {
        let (x, y) = (self.cpu.v(vx) as usize, self.cpu.v(vy) as usize);
        let addr = self.cpu.address as usize;

        let sprite: &[u8] = if n == 0 {
            &[]
        } else {
            self.memory
                .slice(addr, n as usize)
                .ok_or(Fault::AddressOutOfBounds { pc, address: addr })?
        };

        let is_erased = self.display.draw_sprite(x, y, sprite);
        self.cpu.set_flag(is_erased);

        Ok(())
    }
}

/// Troubleshooting
#[doc(hidden)]
impl Chip8Vm {
    /// Returns the program memory as a human readable string, one instruction per line.
    pub fn dump_ram(&self, count: usize) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        let end = (MEM_START + count).min(MEM_SIZE - 1);

        for addr in (MEM_START..end).step_by(2) {
            let word = self.memory.word(addr).unwrap_or_default();
            writeln!(buf, "{:04X}: {:04X}", addr, word)?;
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        write!(buf, "{}", self.display)?;
        Ok(buf)
    }
}
