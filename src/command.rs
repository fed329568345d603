//! Engine-level draw state and its wgpu translations.
//!
//! Pipelines and draw calls are described with small engine enums rather than
//! raw wgpu types, then translated exactly once at pipeline creation. Every
//! translation is an exhaustive `match` so adding a variant is a compile
//! error until each call site handles it.

/// Primitive shape a geometry is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Triangles,
    TriangleStrip,
    Lines,
    Points,
}

impl Shape {
    /// The wgpu primitive topology for this shape.
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Shape::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Shape::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            Shape::Lines => wgpu::PrimitiveTopology::LineList,
            Shape::Points => wgpu::PrimitiveTopology::PointList,
        }
    }
}

/// Whether a geometry is drawn from its vertex buffer alone or through an
/// index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    Arrays,
    Indexed,
}

/// Complete draw descriptor stored on a geometry at creation time.
///
/// Draw code dispatches on this and never inspects the buffers directly.
#[derive(Clone, Copy, Debug)]
pub struct DrawFunction {
    pub mode: DrawMode,
    pub shape: Shape,
    /// Vertex count for [`DrawMode::Arrays`], index count for
    /// [`DrawMode::Indexed`].
    pub count: u32,
}

/// Blending applied by a pipeline's color target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    /// Overwrite the destination.
    Replace,
    /// Sum source and destination (used by the bloom upsample walk).
    Additive,
}

impl Blend {
    /// The wgpu blend state for this mode.
    pub fn state(self) -> wgpu::BlendState {
        match self {
            Blend::Replace => wgpu::BlendState::REPLACE,
            Blend::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_map_to_matching_topologies() {
        assert_eq!(
            Shape::Triangles.topology(),
            wgpu::PrimitiveTopology::TriangleList
        );
        assert_eq!(
            Shape::TriangleStrip.topology(),
            wgpu::PrimitiveTopology::TriangleStrip
        );
        assert_eq!(Shape::Lines.topology(), wgpu::PrimitiveTopology::LineList);
        assert_eq!(Shape::Points.topology(), wgpu::PrimitiveTopology::PointList);
    }

    #[test]
    fn additive_blend_sums_source_and_destination() {
        let state = Blend::Additive.state();
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(state.color.operation, wgpu::BlendOperation::Add);
    }
}
