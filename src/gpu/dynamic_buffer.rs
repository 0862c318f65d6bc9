//! Growable GPU buffers.
//!
//! Buffers grow by 2x when data exceeds capacity and never shrink (GPU
//! buffers cannot be resized in place). Callers rebuild bind groups when a
//! write reports a reallocation.

use std::marker::PhantomData;

/// Smallest allocation, also keeps empty storage bindings valid.
const MIN_CAPACITY: usize = 64;

/// Capacity to grow to when `needed` bytes no longer fit in `current`.
fn grown_capacity(current: usize, needed: usize) -> usize {
    (needed * 2).max(current + 1024)
}

/// A GPU buffer of `T` that grows on demand.
pub struct TypedBuffer<T> {
    buffer: wgpu::Buffer,
    capacity: usize, // bytes
    count: usize,
    usage: wgpu::BufferUsages,
    label: String,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> TypedBuffer<T> {
    /// Buffer with room for `capacity` items.
    pub fn with_capacity(
        device: &wgpu::Device,
        label: &str,
        capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let capacity = (size_of::<T>() * capacity).max(MIN_CAPACITY);
        Self {
            buffer: Self::allocate(device, label, capacity, usage),
            capacity,
            count: 0,
            usage,
            label: label.to_owned(),
            _marker: PhantomData,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        label: &str,
        bytes: usize,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: bytes as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Replace the contents, growing if necessary.
    ///
    /// Returns `true` if the buffer was reallocated (bind groups need
    /// recreation).
    pub fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[T],
    ) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let reallocated = bytes.len() > self.capacity;
        if reallocated {
            self.capacity = grown_capacity(self.capacity, bytes.len());
            self.buffer =
                Self::allocate(device, &self.label, self.capacity, self.usage);
            log::debug!(
                "{}: grew to {} bytes for {} items",
                self.label,
                self.capacity,
                data.len()
            );
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.count = data.len();
        reallocated
    }

    /// The underlying wgpu buffer.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Items written by the last [`write`](Self::write).
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the last write was empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Capacity in items.
    pub fn capacity(&self) -> usize {
        self.capacity / size_of::<T>().max(1)
    }
}
