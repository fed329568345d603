//! Mesh data generation and GPU-resident geometry.
//!
//! Generators ([`plane`], [`cube`], [`sphere`], [`screen_quad`]) are pure
//! functions from parameters to [`MeshData`]: no GPU access, and equal inputs
//! produce identical output. [`Geometry`] uploads a `MeshData` into GPU
//! buffers and stores the draw descriptor that [`Geometry::draw`] dispatches
//! on.

use crate::buffer::{GrowBuffer, Vertex};
use crate::command::{DrawFunction, DrawMode, Shape};
use crate::gpu::RenderDevice;

/// CPU-side mesh data produced by the generators.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    /// Empty for non-indexed geometry.
    pub indices: Vec<u32>,
    pub shape: Shape,
}

impl MeshData {
    /// The draw descriptor for this data.
    pub fn draw_function(&self) -> DrawFunction {
        if self.indices.is_empty() {
            DrawFunction {
                mode: DrawMode::Arrays,
                shape: self.shape,
                count: self.vertices.len() as u32,
            }
        } else {
            DrawFunction {
                mode: DrawMode::Indexed,
                shape: self.shape,
                count: self.indices.len() as u32,
            }
        }
    }
}

/// A flat square on the XZ plane, centered at the origin, normals up.
pub fn plane(size: f32) -> MeshData {
    let half = size * 0.5;
    let vertices = vec![
        Vertex::new([-half, 0.0, -half], [0.0, 1.0, 0.0], [0.0, 0.0]),
        Vertex::new([half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 0.0]),
        Vertex::new([half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 1.0]),
        Vertex::new([-half, 0.0, half], [0.0, 1.0, 0.0], [0.0, 1.0]),
    ];
    let indices = vec![0, 1, 2, 2, 3, 0];

    MeshData {
        vertices,
        indices,
        shape: Shape::Triangles,
    }
}

/// A unit cube centered at the origin, four vertices per face for flat
/// normals.
pub fn cube() -> MeshData {
    #[rustfmt::skip]
    let vertices = vec![
        // Front (Z+)
        Vertex::new([-0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
        Vertex::new([ 0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
        Vertex::new([ 0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
        Vertex::new([-0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
        // Back (Z-)
        Vertex::new([ 0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
        Vertex::new([-0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
        Vertex::new([-0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
        Vertex::new([ 0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
        // Top (Y+)
        Vertex::new([-0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
        Vertex::new([ 0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
        Vertex::new([ 0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
        Vertex::new([-0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
        // Bottom (Y-)
        Vertex::new([-0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
        Vertex::new([ 0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
        Vertex::new([ 0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
        Vertex::new([-0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
        // Right (X+)
        Vertex::new([ 0.5, -0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
        Vertex::new([ 0.5, -0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
        Vertex::new([ 0.5,  0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
        Vertex::new([ 0.5,  0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
        // Left (X-)
        Vertex::new([-0.5, -0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 0.0]),
        Vertex::new([-0.5, -0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 0.0]),
        Vertex::new([-0.5,  0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 1.0]),
        Vertex::new([-0.5,  0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 1.0]),
    ];

    #[rustfmt::skip]
    let indices: Vec<u32> = vec![
        0,  1,  2,  2,  3,  0,  // front
        4,  5,  6,  6,  7,  4,  // back
        8,  9,  10, 10, 11, 8,  // top
        12, 13, 14, 14, 15, 12, // bottom
        16, 17, 18, 18, 19, 16, // right
        20, 21, 22, 22, 23, 20, // left
    ];

    MeshData {
        vertices,
        indices,
        shape: Shape::Triangles,
    }
}

/// A UV sphere from latitude/longitude subdivision.
///
/// Produces `(stacks + 1) * (sectors + 1)` vertices; the rows touching each
/// pole contribute one triangle per sector instead of two. UVs are the
/// equirectangular `(sector / sectors, stack / stacks)`.
pub fn sphere(radius: f32, stacks: u32, sectors: u32) -> MeshData {
    let mut vertices = Vec::with_capacity(((stacks + 1) * (sectors + 1)) as usize);
    let mut indices = Vec::new();

    for stack in 0..=stacks {
        let phi = std::f32::consts::FRAC_PI_2 - std::f32::consts::PI * stack as f32 / stacks as f32;
        let y = phi.sin();
        let ring_radius = phi.cos();

        for sector in 0..=sectors {
            let theta = 2.0 * std::f32::consts::PI * sector as f32 / sectors as f32;
            let x = ring_radius * theta.cos();
            let z = ring_radius * theta.sin();

            vertices.push(Vertex::new(
                [x * radius, y * radius, z * radius],
                [x, y, z],
                [
                    sector as f32 / sectors as f32,
                    stack as f32 / stacks as f32,
                ],
            ));
        }
    }

    for stack in 0..stacks {
        let mut k1 = stack * (sectors + 1);
        let mut k2 = k1 + sectors + 1;

        for _ in 0..sectors {
            // Degenerate quads at the poles collapse to a single triangle.
            if stack != 0 {
                indices.push(k1);
                indices.push(k2);
                indices.push(k1 + 1);
            }
            if stack != stacks - 1 {
                indices.push(k1 + 1);
                indices.push(k2);
                indices.push(k2 + 1);
            }
            k1 += 1;
            k2 += 1;
        }
    }

    MeshData {
        vertices,
        indices,
        shape: Shape::Triangles,
    }
}

/// A full-screen quad in clip space, drawn as a non-indexed triangle strip.
pub fn screen_quad() -> MeshData {
    let vertices = vec![
        Vertex::new([-1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        Vertex::new([1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
        Vertex::new([-1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
        Vertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
    ];

    MeshData {
        vertices,
        indices: Vec::new(),
        shape: Shape::TriangleStrip,
    }
}

/// GPU-resident geometry: vertex/index buffers plus the stored draw
/// descriptor.
pub struct Geometry {
    vertices: GrowBuffer,
    indices: Option<GrowBuffer>,
    draw_function: DrawFunction,
}

impl Geometry {
    /// Upload mesh data into fresh GPU buffers.
    pub fn new(device: &RenderDevice, data: &MeshData, label: &'static str) -> Self {
        let vertices = GrowBuffer::vertices(device, &data.vertices, label);
        let indices = if data.indices.is_empty() {
            None
        } else {
            Some(GrowBuffer::indices(device, &data.indices, label))
        };
        Self {
            vertices,
            indices,
            draw_function: data.draw_function(),
        }
    }

    /// Replace the geometry contents, reusing allocations where they still
    /// fit.
    ///
    /// An update cannot switch between indexed and non-indexed drawing.
    pub fn update(&mut self, device: &RenderDevice, data: &MeshData) {
        self.vertices.upload(
            device,
            bytemuck::cast_slice(&data.vertices),
            data.vertices.len() as u32,
        );
        if let Some(indices) = &mut self.indices {
            debug_assert!(!data.indices.is_empty());
            indices.upload(
                device,
                bytemuck::cast_slice(&data.indices),
                data.indices.len() as u32,
            );
        }
        self.draw_function = data.draw_function();
    }

    pub fn draw_function(&self) -> DrawFunction {
        self.draw_function
    }

    /// Bind buffers and issue the draw call described by the stored
    /// descriptor.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertices.raw().slice(..));
        match self.draw_function.mode {
            DrawMode::Arrays => {
                pass.draw(0..self.draw_function.count, 0..1);
            }
            DrawMode::Indexed => {
                if let Some(indices) = &self.indices {
                    pass.set_index_buffer(indices.raw().slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..self.draw_function.count, 0, 0..1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_has_expected_vertex_count() {
        let data = sphere(1.0, 16, 32);
        assert_eq!(data.vertices.len(), (16 + 1) * (32 + 1));
    }

    #[test]
    fn sphere_vertices_lie_on_the_radius() {
        let radius = 2.5;
        let data = sphere(radius, 8, 12);
        for v in &data.vertices {
            let len =
                (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2)).sqrt();
            approx::assert_relative_eq!(len, radius, epsilon = 1e-4);
        }
    }

    #[test]
    fn sphere_indices_are_in_bounds() {
        let data = sphere(1.0, 6, 10);
        let max = data.vertices.len() as u32;
        assert!(data.indices.iter().all(|&i| i < max));
        assert_eq!(data.indices.len() % 3, 0);
    }

    #[test]
    fn sphere_pole_rows_emit_one_triangle_per_sector() {
        let (stacks, sectors) = (6u32, 10u32);
        let data = sphere(1.0, stacks, sectors);
        // Two pole rows with one triangle each, interior rows with two.
        let expected_triangles = sectors * (2 * (stacks - 2) + 2);
        assert_eq!(data.indices.len() as u32, expected_triangles * 3);
    }

    #[test]
    fn sphere_uvs_cover_unit_square() {
        let data = sphere(1.0, 4, 4);
        for v in &data.vertices {
            assert!((0.0..=1.0).contains(&v.uv[0]));
            assert!((0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn generators_are_reproducible() {
        let a = sphere(1.0, 12, 24);
        let b = sphere(1.0, 12, 24);
        for (va, vb) in a.vertices.iter().zip(&b.vertices) {
            assert_eq!(va.position, vb.position);
            assert_eq!(va.normal, vb.normal);
            assert_eq!(va.uv, vb.uv);
        }
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn cube_has_four_vertices_per_face() {
        let data = cube();
        assert_eq!(data.vertices.len(), 24);
        assert_eq!(data.indices.len(), 36);
    }

    #[test]
    fn plane_spans_its_size() {
        let data = plane(10.0);
        assert!(data.vertices.iter().all(|v| v.position[0].abs() == 5.0));
        assert!(data.vertices.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn screen_quad_is_a_non_indexed_strip() {
        let data = screen_quad();
        let draw = data.draw_function();
        assert_eq!(draw.mode, DrawMode::Arrays);
        assert_eq!(draw.shape, Shape::TriangleStrip);
        assert_eq!(draw.count, 4);
    }

    #[test]
    fn indexed_data_dispatches_on_index_count() {
        let data = cube();
        let draw = data.draw_function();
        assert_eq!(draw.mode, DrawMode::Indexed);
        assert_eq!(draw.count, 36);
    }
}
