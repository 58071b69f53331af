//! VM state management: operand stack, variable store, call stack, frame pool.

use std::mem;

use crate::error::RuntimeError;
use crate::host::Host;
use crate::memory::{Address, Segment, ADDRESS, WORD};
use chipvm_common::{DecodeError, Image, Instruction};

/// Capacity in bytes of every operand stack and variable store.
pub const SEGMENT_SIZE: usize = 65535;

/// Default maximum number of live call frames.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Engine limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Capacity of each operand stack and variable store.
    pub segment_size: usize,
    /// Maximum call stack depth before CALL faults.
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            segment_size: SEGMENT_SIZE,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

/// A suspended caller, saved by CALL and restored by RET.
#[derive(Debug)]
pub struct CallFrame {
    /// Instruction index to resume at after RET.
    pub return_index: usize,
    /// Id the caller's addresses are tagged with.
    pub(crate) id: u32,
    /// The caller's operand stack.
    pub(crate) stack: Segment,
    /// The caller's variable store.
    pub(crate) vars: Segment,
}

/// Whether the machine can keep stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    /// RET executed with an empty call stack.
    Halted,
    /// A runtime fault stopped the program. Further steps repeat the fault.
    Faulted,
}

/// The ChipVM virtual machine.
///
/// The stack pointer is shared by all frames: a callee pushes into its own
/// fresh operand stack starting at the caller's depth, and RET hands the
/// top bytes back at the same offsets.
pub struct VM<'a, H: Host> {
    /// The program being executed.
    pub(crate) image: Image<'a>,
    /// Syscall services.
    pub(crate) host: H,
    pub(crate) limits: Limits,
    /// Instruction pointer (record index).
    pub(crate) ip: usize,
    /// Operand stack pointer (byte offset).
    pub(crate) sp: usize,
    /// Current operand stack.
    pub(crate) stack: Segment,
    /// Current variable store.
    pub(crate) vars: Segment,
    /// Id of the current frame.
    pub(crate) frame_id: u32,
    /// Last frame id handed out.
    pub(crate) last_frame_id: u32,
    /// Suspended callers, innermost last.
    pub(crate) call_stack: Vec<CallFrame>,
    /// Released segment pairs, zeroed and ready for the next CALL.
    pub(crate) pool: Vec<(Segment, Segment)>,
    pub(crate) state: State,
    /// The fault that stopped the program, if any.
    pub(crate) fault: Option<RuntimeError>,
}

impl<'a, H: Host> VM<'a, H> {
    /// Create a new VM for the given image with default limits.
    pub fn new(image: Image<'a>, host: H) -> Self {
        Self::with_limits(image, host, Limits::default())
    }

    /// Create a new VM with explicit limits.
    pub fn with_limits(image: Image<'a>, host: H, limits: Limits) -> Self {
        Self {
            image,
            host,
            limits,
            ip: 0,
            sp: 0,
            stack: Segment::new(limits.segment_size),
            vars: Segment::new(limits.segment_size),
            frame_id: 0,
            last_frame_id: 0,
            call_stack: Vec::new(),
            pool: Vec::new(),
            state: State::Running,
            fault: None,
        }
    }

    /// Current instruction pointer.
    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Current operand stack pointer in bytes.
    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Number of suspended callers.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Run state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The fault that stopped the program, if it faulted.
    pub fn fault(&self) -> Option<&RuntimeError> {
        self.fault.as_ref()
    }

    /// The 4-byte word just below the stack pointer, as an integer.
    pub fn peek_i32(&self) -> Option<i32> {
        let start = self.sp.checked_sub(WORD)?;
        self.stack.read(start).map(i32::from_le_bytes)
    }

    /// The 4-byte word at `offset` in the current variable store.
    pub fn variable_i32(&self, offset: usize) -> Option<i32> {
        self.vars.read(offset).map(i32::from_le_bytes)
    }

    /// Borrow the syscall host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the VM, returning its host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Fetch the instruction at the current ip.
    pub(crate) fn fetch(&self) -> Result<Instruction, RuntimeError> {
        match self.image.fetch(self.ip) {
            Some(Ok(instr)) => Ok(instr),
            Some(Err(DecodeError::UnknownOpcode(opcode))) => Err(RuntimeError::UnknownOpcode {
                at: self.ip,
                opcode,
            }),
            Some(Err(e)) => Err(e.into()),
            None => Err(RuntimeError::UnexpectedEndOfProgram { at: self.ip }),
        }
    }

    // ---- Operand stack ----

    pub(crate) fn push_bytes(&mut self, data: &[u8]) -> Result<(), RuntimeError> {
        let overflow = RuntimeError::StackOverflow { at: self.ip };
        let end = self.sp.checked_add(data.len()).ok_or(overflow.clone())?;
        self.stack.write(self.sp, data).ok_or(overflow)?;
        self.sp = end;
        Ok(())
    }

    pub(crate) fn pop_bytes<const N: usize>(&mut self) -> Result<[u8; N], RuntimeError> {
        let start = self
            .sp
            .checked_sub(N)
            .ok_or(RuntimeError::StackUnderflow { at: self.ip })?;
        let bytes = self
            .stack
            .read(start)
            .ok_or(RuntimeError::StackOverflow { at: self.ip })?;
        self.sp = start;
        Ok(bytes)
    }

    pub(crate) fn push_i32(&mut self, value: i32) -> Result<(), RuntimeError> {
        self.push_bytes(&value.to_le_bytes())
    }

    pub(crate) fn pop_i32(&mut self) -> Result<i32, RuntimeError> {
        self.pop_bytes::<WORD>().map(i32::from_le_bytes)
    }

    pub(crate) fn push_f32(&mut self, value: f32) -> Result<(), RuntimeError> {
        self.push_bytes(&value.to_bits().to_le_bytes())
    }

    pub(crate) fn pop_f32(&mut self) -> Result<f32, RuntimeError> {
        self.pop_bytes::<WORD>()
            .map(|bytes| f32::from_bits(u32::from_le_bytes(bytes)))
    }

    pub(crate) fn push_address(&mut self, addr: Address) -> Result<(), RuntimeError> {
        self.push_bytes(&addr.to_bytes())
    }

    pub(crate) fn pop_address(&mut self) -> Result<Address, RuntimeError> {
        self.pop_bytes::<ADDRESS>().map(Address::from_bytes)
    }

    // ---- Variable store ----

    fn out_of_bounds(&self, offset: i64, size: usize) -> RuntimeError {
        RuntimeError::OutOfBounds {
            at: self.ip,
            offset,
            size,
        }
    }

    /// Validate a `left` operand as a word offset into the current store.
    pub(crate) fn var_offset(&self, left: i32) -> Result<usize, RuntimeError> {
        usize::try_from(left)
            .ok()
            .filter(|&offset| self.vars.slice(offset, WORD).is_some())
            .ok_or_else(|| self.out_of_bounds(i64::from(left), self.vars.len()))
    }

    /// The variable store an address points into.
    fn segment_for(&self, addr: Address) -> Result<&Segment, RuntimeError> {
        if addr.frame == self.frame_id {
            return Ok(&self.vars);
        }
        self.call_stack
            .iter()
            .rev()
            .find(|frame| frame.id == addr.frame)
            .map(|frame| &frame.vars)
            .ok_or(RuntimeError::DanglingAddress {
                at: self.ip,
                frame: addr.frame,
            })
    }

    fn segment_for_mut(&mut self, addr: Address) -> Result<&mut Segment, RuntimeError> {
        if addr.frame == self.frame_id {
            return Ok(&mut self.vars);
        }
        let at = self.ip;
        self.call_stack
            .iter_mut()
            .rev()
            .find(|frame| frame.id == addr.frame)
            .map(|frame| &mut frame.vars)
            .ok_or(RuntimeError::DanglingAddress {
                at,
                frame: addr.frame,
            })
    }

    pub(crate) fn read_through(&self, addr: Address) -> Result<[u8; WORD], RuntimeError> {
        let segment = self.segment_for(addr)?;
        segment
            .read(addr.offset as usize)
            .ok_or_else(|| self.out_of_bounds(i64::from(addr.offset), segment.len()))
    }

    pub(crate) fn write_through(&mut self, addr: Address, word: [u8; WORD]) -> Result<(), RuntimeError> {
        let at = self.ip;
        let segment = self.segment_for_mut(addr)?;
        let size = segment.len();
        segment
            .write(addr.offset as usize, &word)
            .ok_or(RuntimeError::OutOfBounds {
                at,
                offset: i64::from(addr.offset),
                size,
            })
    }

    // ---- Frames ----

    /// Suspend the caller and switch to fresh, zeroed segments.
    ///
    /// The top `arg_bytes` of the caller's operand stack become the start of
    /// the callee's variable store and are removed from the stack.
    pub(crate) fn enter_frame(&mut self, arg_bytes: usize, target: usize) -> Result<(), RuntimeError> {
        if self.call_stack.len() >= self.limits.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                at: self.ip,
                limit: self.limits.max_call_depth,
            });
        }
        let args_start = self
            .sp
            .checked_sub(arg_bytes)
            .ok_or(RuntimeError::StackUnderflow { at: self.ip })?;
        if arg_bytes > self.vars.len() {
            return Err(self.out_of_bounds(arg_bytes as i64, self.vars.len()));
        }
        // Frame ids are never reused.
        let frame_id = self
            .last_frame_id
            .checked_add(1)
            .ok_or(RuntimeError::FrameIdsExhausted { at: self.ip })?;

        let size = self.limits.segment_size;
        let (stack, vars) = self
            .pool
            .pop()
            .unwrap_or_else(|| (Segment::new(size), Segment::new(size)));
        let caller_stack = mem::replace(&mut self.stack, stack);
        let caller_vars = mem::replace(&mut self.vars, vars);

        if let Some(args) = caller_stack.slice(args_start, arg_bytes) {
            self.vars.write(0, args);
        }

        self.call_stack.push(CallFrame {
            return_index: self.ip + 1,
            id: self.frame_id,
            stack: caller_stack,
            vars: caller_vars,
        });
        self.last_frame_id = frame_id;
        self.frame_id = frame_id;
        self.sp = args_start;
        self.ip = target;
        Ok(())
    }

    /// Restore the innermost caller, handing back the top `ret_bytes` of
    /// the callee's operand stack.
    ///
    /// Returns false when there is no caller to return to; the byte count is
    /// not examined in that case. On error no state has changed.
    pub(crate) fn leave_frame(&mut self, ret_bytes: i32) -> Result<bool, RuntimeError> {
        if self.call_stack.is_empty() {
            return Ok(false);
        }
        let underflow = RuntimeError::StackUnderflow { at: self.ip };
        let ret_bytes = usize::try_from(ret_bytes).map_err(|_| underflow.clone())?;
        let start = self.sp.checked_sub(ret_bytes).ok_or(underflow)?;
        let Some(frame) = self.call_stack.pop() else {
            return Ok(false);
        };

        let mut callee_stack = mem::replace(&mut self.stack, frame.stack);
        let mut callee_vars = mem::replace(&mut self.vars, frame.vars);

        if let Some(value) = callee_stack.slice(start, ret_bytes) {
            self.stack.write(start, value);
        }

        callee_stack.clear();
        callee_vars.clear();
        self.pool.push((callee_stack, callee_vars));

        self.frame_id = frame.id;
        self.ip = frame.return_index;
        Ok(true)
    }
}
