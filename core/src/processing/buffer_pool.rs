/// Recycles display-column buffers so a full rebuild does not allocate per ping.
#[derive(Debug)]
pub struct ColumnPool {
    buffers: Vec<Vec<f32>>,
    max_retained: usize,
}

impl ColumnPool {
    pub fn with_capacity(max_retained: usize) -> Self {
        Self {
            buffers: Vec::with_capacity(max_retained),
            max_retained,
        }
    }

    /// Hands out a zeroed buffer of `length`, reusing a released one if any.
    pub fn checkout(&mut self, length: usize) -> Vec<f32> {
        match self.buffers.pop() {
            Some(mut buffer) => {
                buffer.clear();
                buffer.resize(length, 0.0);
                buffer
            }
            None => vec![0.0; length],
        }
    }

    /// Returns a buffer for reuse; extras beyond the retention limit are dropped.
    pub fn release(&mut self, buffer: Vec<f32>) {
        if self.buffers.len() < self.max_retained {
            self.buffers.push(buffer);
        }
    }

    pub fn retained(&self) -> usize {
        self.buffers.len()
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_reuses_released_buffers_zeroed() {
        let mut pool = ColumnPool::with_capacity(2);
        let mut buffer = pool.checkout(4);
        buffer[2] = 9.0;
        pool.release(buffer);
        assert_eq!(pool.retained(), 1);
        let reused = pool.checkout(6);
        assert_eq!(reused, vec![0.0; 6]);
        assert_eq!(pool.retained(), 0);
    }

    #[test]
    fn release_respects_retention_limit() {
        let mut pool = ColumnPool::with_capacity(1);
        pool.release(vec![0.0; 3]);
        pool.release(vec![0.0; 3]);
        assert_eq!(pool.retained(), 1);
        pool.reset();
        assert_eq!(pool.retained(), 0);
    }
}
