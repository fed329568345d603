//! Vertex format and GPU buffer wrappers.
//!
//! [`Vertex`] is the single vertex format shared by every mesh in the engine.
//! [`GrowBuffer`] wraps a wgpu buffer with a grow-only reallocation policy:
//! uploads that fit the current allocation overwrite it in place, larger
//! uploads recreate the buffer at the new size. The allocation never shrinks.

use wgpu::util::DeviceExt;

use crate::gpu::RenderDevice;

/// A vertex with position, normal, and texture coordinates.
///
/// `#[repr(C)]` plus the bytemuck derives give a predictable 32-byte layout
/// for direct GPU upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Vertex buffer layout: position (loc 0), normal (loc 1), uv (loc 2).
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Whether an upload of `required` bytes forces a new allocation.
///
/// This is the whole reallocation policy: grow when the data no longer fits,
/// otherwise reuse the existing allocation.
pub(crate) fn needs_realloc(capacity: u64, required: u64) -> bool {
    required > capacity
}

/// A GPU buffer that grows to fit uploads but never shrinks.
pub struct GrowBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    len: u32,
    usage: wgpu::BufferUsages,
    label: &'static str,
}

impl GrowBuffer {
    /// Create a vertex buffer initialized with `vertices`.
    pub fn vertices(device: &RenderDevice, vertices: &[Vertex], label: &'static str) -> Self {
        Self::with_data(
            device,
            bytemuck::cast_slice(vertices),
            vertices.len() as u32,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            label,
        )
    }

    /// Create an index buffer initialized with `indices`.
    pub fn indices(device: &RenderDevice, indices: &[u32], label: &'static str) -> Self {
        Self::with_data(
            device,
            bytemuck::cast_slice(indices),
            indices.len() as u32,
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            label,
        )
    }

    fn with_data(
        device: &RenderDevice,
        bytes: &[u8],
        len: u32,
        usage: wgpu::BufferUsages,
        label: &'static str,
    ) -> Self {
        let buffer = device
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytes,
                usage,
            });
        Self {
            buffer,
            capacity: bytes.len() as u64,
            len,
            usage,
            label,
        }
    }

    /// Upload new contents, reallocating only if the data outgrew the buffer.
    pub fn upload(&mut self, device: &RenderDevice, bytes: &[u8], len: u32) {
        if needs_realloc(self.capacity, bytes.len() as u64) {
            self.buffer = device
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(self.label),
                    contents: bytes,
                    usage: self.usage,
                });
            self.capacity = bytes.len() as u64;
        } else {
            device.queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.len = len;
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocation size in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The underlying wgpu buffer.
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn smaller_uploads_reuse_the_allocation() {
        assert!(!needs_realloc(1024, 512));
        assert!(!needs_realloc(1024, 1024));
    }

    #[test]
    fn larger_uploads_reallocate() {
        assert!(needs_realloc(1024, 1025));
        assert!(needs_realloc(0, 1));
    }
}
