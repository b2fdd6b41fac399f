use crate::error::{EncodeError, Result};

/// Growable output byte region written at caller-tracked offsets.
///
/// Capacity is asserted once per encode call, before any write. The buffer
/// never shrinks while in use. An optional `max_size` models a region that
/// cannot grow past a fixed limit.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    max_size: Option<usize>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer with `bytes` addressable up front.
    pub fn with_size(bytes: usize) -> Self {
        Self {
            data: vec![0u8; bytes],
            max_size: None,
        }
    }

    /// Buffer that refuses to grow beyond `limit` bytes.
    pub fn with_max_size(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            max_size: Some(limit),
        }
    }

    /// Guarantee at least `total` bytes are addressable from the start of the buffer.
    pub fn assert_capacity(&mut self, total: usize) -> Result<()> {
        if total <= self.data.len() {
            return Ok(());
        }
        if let Some(limit) = self.max_size {
            if total > limit {
                return Err(EncodeError::CapacityViolation {
                    needed: total,
                    available: limit,
                });
            }
        }
        self.data.resize(total, 0);
        Ok(())
    }

    /// Number of addressable bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer, keeping only the first `written` bytes.
    pub fn into_written(mut self, written: usize) -> Vec<u8> {
        self.data.truncate(written);
        self.data
    }
}

/// Borrow `capacity` bytes of `out` starting at `pos`.
///
/// Codecs use this to obtain their write window instead of slicing directly.
pub fn output_window(out: &mut [u8], pos: usize, capacity: usize) -> Result<&mut [u8]> {
    let available = out.len();
    let end = pos
        .checked_add(capacity)
        .filter(|&end| end <= available)
        .ok_or(EncodeError::CapacityViolation {
            needed: pos.saturating_add(capacity),
            available,
        })?;
    Ok(&mut out[pos..end])
}
