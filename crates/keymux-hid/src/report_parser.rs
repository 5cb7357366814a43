//! HID report parsing utilities

use keymux_errors::{DeviceError, DeviceResult};

/// Sequential reader over a borrowed input report.
pub struct ReportParser<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ReportParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Fail unless at least `count` bytes are left.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::MalformedReport`] naming the full frame size
    /// that was required.
    pub fn require(&self, count: usize) -> DeviceResult<()> {
        if self.remaining() < count {
            return Err(self.short(count));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeviceError::MalformedReport`] at end of data.
    pub fn read_u8(&mut self) -> DeviceResult<u8> {
        let value = *self.buffer.get(self.position).ok_or_else(|| self.short(1))?;
        self.position = self.position.saturating_add(1);
        Ok(value)
    }

    /// # Errors
    ///
    /// Returns [`DeviceError::MalformedReport`] when fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self) -> DeviceResult<[u8; N]> {
        let end = self.position.saturating_add(N);
        let bytes = self
            .buffer
            .get(self.position..end)
            .ok_or_else(|| self.short(N))?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.position = end;
        Ok(out)
    }

    fn short(&self, wanted: usize) -> DeviceError {
        DeviceError::MalformedReport {
            expected: self.position.saturating_add(wanted),
            actual: self.buffer.len(),
        }
    }
}
