//! Main execution loop and opcode dispatch for the ChipVM.

use crate::error::RuntimeError;
use crate::host::Host;
use crate::machine::{State, VM};
use crate::memory::{Address, WORD};
use chipvm_common::{Instruction, Opcode};

/// Where control goes after an instruction.
enum Flow {
    Next,
    Jump(usize),
    /// CALL or RET already moved the instruction pointer.
    Moved,
    Halt,
}

impl<'a, H: Host> VM<'a, H> {
    /// Execute the program until the top-level RET or a fault.
    pub fn execute(&mut self) -> Result<(), RuntimeError> {
        while self.step()? == State::Running {}
        Ok(())
    }

    /// Fetch and execute a single instruction.
    ///
    /// After a fault the machine stays faulted: every further step returns
    /// the same error without executing anything.
    pub fn step(&mut self) -> Result<State, RuntimeError> {
        match self.state {
            State::Running => {}
            State::Halted => return Ok(State::Halted),
            State::Faulted => {
                if let Some(fault) = &self.fault {
                    return Err(fault.clone());
                }
            }
        }

        let result = self.advance();
        if let Err(fault) = &result {
            self.state = State::Faulted;
            self.fault = Some(fault.clone());
        }
        result
    }

    fn advance(&mut self) -> Result<State, RuntimeError> {
        let instr = self.fetch()?;
        self.host.trace(self.ip, &instr, self.sp);

        match self.dispatch(&instr)? {
            Flow::Next => self.ip += 1,
            Flow::Jump(target) => self.ip = target,
            Flow::Moved => {}
            Flow::Halt => self.state = State::Halted,
        }
        Ok(self.state)
    }

    fn dispatch(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        match instr.opcode {
            // Stack & memory
            Opcode::Push => self.push_i32(instr.left)?,
            Opcode::LoadI => self.exec_load(instr)?,
            Opcode::StoreI => self.exec_store(instr)?,
            Opcode::LoadC => self.exec_load_byte(instr)?,
            Opcode::StoreC => self.exec_store_byte(instr)?,
            Opcode::Lda => self.exec_lda(instr)?,
            Opcode::Deref => self.exec_deref()?,
            Opcode::Sta => self.exec_sta()?,

            // Conversion
            Opcode::Cf2i32 => {
                let value = self.pop_f32()?;
                self.push_i32(value as i32)?;
            }
            Opcode::Ci2f32 => {
                let value = self.pop_i32()?;
                self.push_f32(value as f32)?;
            }

            // Arithmetic
            Opcode::Add => self.exec_int_op(i32::wrapping_add)?,
            Opcode::AddF => self.exec_float_op(|a, b| a + b)?,
            Opcode::Sub => self.exec_int_op(i32::wrapping_sub)?,
            Opcode::SubF => self.exec_float_op(|a, b| a - b)?,
            Opcode::Mul => self.exec_int_op(i32::wrapping_mul)?,
            Opcode::MulF => self.exec_float_op(|a, b| a * b)?,
            Opcode::Div => self.exec_div(i32::wrapping_div)?,
            Opcode::DivF => self.exec_float_op(|a, b| a / b)?,
            Opcode::Mod => self.exec_div(i32::wrapping_rem)?,
            Opcode::Shl => self.exec_int_op(|a, b| a.wrapping_shl(b as u32))?,
            Opcode::Shr => self.exec_int_op(|a, b| a.wrapping_shr(b as u32))?,
            Opcode::And => self.exec_int_op(|a, b| a & b)?,

            // Comparison
            Opcode::CmpLt => self.exec_int_cmp(|a, b| a < b)?,
            Opcode::CmpLtF => self.exec_float_cmp(|a, b| a < b)?,
            Opcode::CmpGt => self.exec_int_cmp(|a, b| a > b)?,
            Opcode::CmpGtF => self.exec_float_cmp(|a, b| a > b)?,
            Opcode::Neq => self.exec_int_cmp(|a, b| a != b)?,

            // Control flow
            Opcode::Je => {
                let pop1 = self.pop_i32()?;
                let pop2 = self.pop_i32()?;
                if pop1 == pop2 {
                    return Ok(Flow::Jump(self.jump_target(instr.left)?));
                }
            }
            Opcode::Jmp => return Ok(Flow::Jump(self.jump_target(instr.left)?)),
            Opcode::Call => {
                let arg_bytes = self.byte_count(instr.right)?;
                let target = self.jump_target(instr.left)?;
                self.enter_frame(arg_bytes, target)?;
                return Ok(Flow::Moved);
            }
            Opcode::Ret => {
                return Ok(if self.leave_frame(instr.left)? {
                    Flow::Moved
                } else {
                    Flow::Halt
                });
            }
            Opcode::Syscall => self.exec_syscall(instr)?,
        }
        Ok(Flow::Next)
    }

    /// Instruction indices are unsigned; a negative target can never be fetched.
    fn jump_target(&self, left: i32) -> Result<usize, RuntimeError> {
        usize::try_from(left).map_err(|_| RuntimeError::UnexpectedEndOfProgram { at: self.ip })
    }

    fn byte_count(&self, operand: i32) -> Result<usize, RuntimeError> {
        usize::try_from(operand).map_err(|_| RuntimeError::StackUnderflow { at: self.ip })
    }

    // ---- Stack & memory ----

    fn exec_load(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let offset = self.var_offset(instr.left)?;
        let word: [u8; WORD] = self.vars.read(offset).unwrap_or_default();
        self.push_bytes(&word)
    }

    fn exec_store(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let offset = self.var_offset(instr.left)?;
        let word = self.pop_bytes::<WORD>()?;
        self.vars.write(offset, &word);
        Ok(())
    }

    /// LOADC copies a whole word but advances the stack pointer by one byte.
    fn exec_load_byte(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let offset = self.var_offset(instr.left)?;
        let word: [u8; WORD] = self.vars.read(offset).unwrap_or_default();
        self.stack
            .write(self.sp, &word)
            .ok_or(RuntimeError::StackOverflow { at: self.ip })?;
        self.sp += 1;
        Ok(())
    }

    /// STOREC retreats the stack pointer by one byte and stores the word found there.
    fn exec_store_byte(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let offset = self.var_offset(instr.left)?;
        let sp = self
            .sp
            .checked_sub(1)
            .ok_or(RuntimeError::StackUnderflow { at: self.ip })?;
        let word: [u8; WORD] = self
            .stack
            .read(sp)
            .ok_or(RuntimeError::StackOverflow { at: self.ip })?;
        self.sp = sp;
        self.vars.write(offset, &word);
        Ok(())
    }

    fn exec_lda(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let offset = self.var_offset(instr.left)?;
        self.push_address(Address {
            offset: offset as u32,
            frame: self.frame_id,
        })
    }

    fn exec_deref(&mut self) -> Result<(), RuntimeError> {
        let addr = self.pop_address()?;
        let word = self.read_through(addr)?;
        self.push_bytes(&word)
    }

    fn exec_sta(&mut self) -> Result<(), RuntimeError> {
        let addr = self.pop_address()?;
        let word = self.pop_bytes::<WORD>()?;
        self.write_through(addr, word)
    }

    // ---- Arithmetic & comparison ----

    /// Pop `pop1` then `pop2`, push `op(pop1, pop2)`.
    fn exec_int_op(&mut self, op: fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let pop1 = self.pop_i32()?;
        let pop2 = self.pop_i32()?;
        self.push_i32(op(pop1, pop2))
    }

    fn exec_div(&mut self, op: fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let pop1 = self.pop_i32()?;
        let pop2 = self.pop_i32()?;
        if pop2 == 0 {
            return Err(RuntimeError::DivideByZero { at: self.ip });
        }
        self.push_i32(op(pop1, pop2))
    }

    fn exec_float_op(&mut self, op: fn(f32, f32) -> f32) -> Result<(), RuntimeError> {
        let pop1 = self.pop_f32()?;
        let pop2 = self.pop_f32()?;
        self.push_f32(op(pop1, pop2))
    }

    fn exec_int_cmp(&mut self, op: fn(i32, i32) -> bool) -> Result<(), RuntimeError> {
        let pop1 = self.pop_i32()?;
        let pop2 = self.pop_i32()?;
        self.push_i32(op(pop1, pop2) as i32)
    }

    fn exec_float_cmp(&mut self, op: fn(f32, f32) -> bool) -> Result<(), RuntimeError> {
        let pop1 = self.pop_f32()?;
        let pop2 = self.pop_f32()?;
        self.push_i32(op(pop1, pop2) as i32)
    }

    // ---- Syscalls ----

    fn exec_syscall(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let at = self.ip;
        let result = match instr.left {
            0 => {
                let value = self.pop_i32()?;
                self.host.print_int(value)
            }
            1 => {
                let value = self.pop_f32()?;
                self.host.print_float(value)
            }
            2 => {
                let seconds = self.pop_i32()?;
                self.host.sleep(seconds.max(0) as u32)
            }
            3 => {
                let family = self.pop_i32()?;
                let kind = self.pop_i32()?;
                let protocol = self.pop_i32()?;
                self.host.socket(family, kind, protocol)
            }
            selector => return Err(RuntimeError::UnknownSyscall { at, selector }),
        };
        result.map_err(|e| RuntimeError::Host {
            at,
            message: e.to_string(),
        })
    }
}
