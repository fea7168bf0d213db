/// Fixed-capacity circular buffer of PCM16 samples.
///
/// Only the newest `capacity` samples are kept. `total_samples` counts every
/// sample ever pushed and is never reset by eviction, so elapsed time stays
/// monotonic past the buffer length.
#[derive(Debug, Clone)]
pub struct PcmRingBuffer {
    samples: Vec<i16>,
    /// Next write position
    head: usize,
    len: usize,
    total_samples: u64,
    /// Low byte of a sample split across two frames
    pending_byte: Option<u8>,
}

impl PcmRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0; capacity],
            head: 0,
            len: 0,
            total_samples: 0,
            pending_byte: None,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Buffered samples, at most `capacity`.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Append little-endian PCM16 bytes. Returns the number of samples added.
    pub fn push_bytes(&mut self, mut bytes: &[u8]) -> usize {
        let mut decoded = Vec::with_capacity(bytes.len() / 2 + 1);

        if let Some(low) = self.pending_byte.take() {
            match bytes.split_first() {
                Some((&high, rest)) => {
                    decoded.push(i16::from_le_bytes([low, high]));
                    bytes = rest;
                }
                None => {
                    self.pending_byte = Some(low);
                    return 0;
                }
            }
        }

        let chunks = bytes.chunks_exact(2);
        self.pending_byte = chunks.remainder().first().copied();
        decoded.extend(chunks.map(|pair| i16::from_le_bytes([pair[0], pair[1]])));

        self.push_samples(&decoded);
        decoded.len()
    }

    pub fn push_samples(&mut self, input: &[i16]) {
        self.total_samples += input.len() as u64;

        let capacity = self.capacity();
        if capacity == 0 || input.is_empty() {
            return;
        }

        let input = &input[input.len().saturating_sub(capacity)..];
        let first = (capacity - self.head).min(input.len());
        self.samples[self.head..self.head + first].copy_from_slice(&input[..first]);
        let rest = input.len() - first;
        self.samples[..rest].copy_from_slice(&input[first..]);

        self.head = (self.head + input.len()) % capacity;
        self.len = (self.len + input.len()).min(capacity);
    }

    /// Copy of the newest `n` samples, oldest first. `None` when fewer are buffered.
    pub fn latest(&self, n: usize) -> Option<Vec<i16>> {
        if n > self.len {
            return None;
        }

        let capacity = self.capacity();
        let mut out = Vec::with_capacity(n);
        if n == 0 {
            return Some(out);
        }

        let start = (self.head + capacity - n) % capacity;
        if start + n <= capacity {
            out.extend_from_slice(&self.samples[start..start + n]);
        } else {
            out.extend_from_slice(&self.samples[start..]);
            out.extend_from_slice(&self.samples[..n - (capacity - start)]);
        }
        Some(out)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.pending_byte = None;
    }
}
