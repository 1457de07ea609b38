//! Key encoding for the RocksDB backend

/// Prefix bytes for different key types
pub mod prefix {
    pub const META: u8 = 0x01;
    pub const SNAPSHOT: u8 = 0x02;
}

/// Well-known metadata keys
pub mod meta {
    pub const DATABASES: &str = "databases";
    pub const SNAPSHOT_BOTTOM: &str = "snapshot_bottom";
    pub const SNAPSHOT_TOP: &str = "snapshot_top";
}

/// Key builder for storage operations
#[derive(Debug)]
pub struct KeyBuilder {
    buffer: Vec<u8>,
}

impl KeyBuilder {
    /// Create a new key builder with estimated capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Key for a named metadata entry
    pub fn meta(name: &str) -> Vec<u8> {
        let mut builder = Self::new(1 + name.len());
        builder.push_u8(prefix::META);
        builder.push_bytes(name.as_bytes());
        builder.finish()
    }

    /// Key for the snapshot at a stack position (0 is the bottom)
    ///
    /// Big-endian encoding keeps snapshots in stack order when iterated.
    pub fn snapshot(position: u64) -> Vec<u8> {
        let mut builder = Self::new(9);
        builder.push_u8(prefix::SNAPSHOT);
        builder.push_u64(position);
        builder.finish()
    }

    fn push_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    fn push_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

/// Decode a big-endian u64 value
pub fn decode_u64(bytes: &[u8]) -> Option<u64> {
    let array: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(array))
}
