//! Call stack of return addresses.
use crate::constants::*;

/// Fixed depth stack used by `CALL` and `RET`.
///
/// Overflow and underflow are reported to the caller instead of wrapping
/// the stack pointer.
#[derive(Debug, Clone)]
pub struct CallStack {
    frames: [Address; STACK_SIZE],
    /// Number of occupied frames. Zero is empty.
    len: usize,
}

impl Default for CallStack {
    fn default() -> Self {
        Self {
            frames: [0; STACK_SIZE],
            len: 0,
        }
    }
}

/// Push onto a full stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackOverflow;

/// Pop from an empty stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackUnderflow;

impl CallStack {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, addr: Address) -> Result<(), StackOverflow> {
        let slot = self.frames.get_mut(self.len).ok_or(StackOverflow)?;
        *slot = addr;
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Address, StackUnderflow> {
        self.len = self.len.checked_sub(1).ok_or(StackUnderflow)?;
        Ok(self.frames[self.len])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.frames.fill(0);
        self.len = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_pop_order() {
        let mut stack = CallStack::new();

        for i in 0..STACK_SIZE as Address {
            stack.push(0x200 + i * 2).unwrap();
        }
        assert_eq!(stack.len(), STACK_SIZE);

        for i in (0..STACK_SIZE as Address).rev() {
            assert_eq!(stack.pop(), Ok(0x200 + i * 2));
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_overflow() {
        let mut stack = CallStack::new();
        for _ in 0..STACK_SIZE {
            stack.push(0x300).unwrap();
        }
        assert_eq!(stack.push(0x400), Err(StackOverflow));
        assert_eq!(stack.len(), STACK_SIZE);
        assert_eq!(stack.pop(), Ok(0x300));
    }

    #[test]
    fn test_underflow() {
        let mut stack = CallStack::new();
        assert_eq!(stack.pop(), Err(StackUnderflow));

        stack.push(0x222).unwrap();
        assert_eq!(stack.pop(), Ok(0x222));
        assert_eq!(stack.pop(), Err(StackUnderflow));
        assert!(stack.is_empty());
    }
}
