use std::fmt;

use zeroize::Zeroize;

#[derive(Debug, PartialEq, Eq)]
pub enum SecureBufferError {
    AllocationFailed(usize),
}

impl fmt::Display for SecureBufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed(size) => {
                write!(f, "failed allocating secure buffer of {} bytes", size)
            }
        }
    }
}

impl std::error::Error for SecureBufferError {}

/// Exclusively owned byte region whose contents are overwritten before the
/// memory is released or reused. The wipe goes through `zeroize`, which uses
/// volatile writes and compiler fences so the overwrite cannot be elided.
pub struct SecureBuffer {
    data: Vec<u8>,
}

impl SecureBuffer {
    /// Create a zero-filled buffer of `size` bytes. Allocation failure leaves
    /// nothing behind and is reported instead of aborting.
    pub fn new(size: usize) -> Result<Self, SecureBufferError> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| SecureBufferError::AllocationFailed(size))?;
        data.resize(size, 0);
        Ok(Self { data })
    }

    pub fn empty() -> Self {
        Self { data: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Resize to `new_size` bytes. The common prefix is preserved, any grown
    /// tail is zero-filled, and the previously held region is wiped before it
    /// is released. On allocation failure the buffer is left unchanged.
    pub fn resize(&mut self, new_size: usize) -> Result<(), SecureBufferError> {
        if new_size == self.data.len() {
            return Ok(());
        }

        if new_size == 0 {
            self.data.zeroize();
            self.data = Vec::new();
            return Ok(());
        }

        let mut next = Vec::new();
        next.try_reserve_exact(new_size)
            .map_err(|_| SecureBufferError::AllocationFailed(new_size))?;
        next.resize(new_size, 0);

        let keep = self.data.len().min(new_size);
        next[..keep].copy_from_slice(&self.data[..keep]);

        self.data.zeroize();
        self.data = next;
        Ok(())
    }

    /// Overwrite the current contents with zeroes, keeping the length and
    /// allocation. Zeroizing the slice rather than the `Vec` keeps the
    /// elements live; `Vec::zeroize` would also clear them out.
    pub fn wipe(&mut self) {
        self.data.as_mut_slice().zeroize();
    }

    /// Wipe and release the underlying region, leaving the buffer empty.
    pub fn wipe_and_release(&mut self) {
        self.data.zeroize();
        self.data = Vec::new();
    }
}

impl Drop for SecureBuffer {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

impl Default for SecureBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

// Redact contents from any debug rendering.
impl fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}
