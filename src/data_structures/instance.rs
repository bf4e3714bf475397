//! Per-instance transform data for GPU rendering.
//!
//! Every occurrence of a mesh in the grid contributes one world matrix to the
//! owning material group's instance buffer; the shaders apply the camera's
//! view-projection on top.

use cgmath::Matrix4;

use crate::data_structures::material::Vertex;

/**
 * The raw instance is the actual data stored on the GPU: one column-major
 * world matrix per occurrence.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
}

impl From<Matrix4<f32>> for InstanceRaw {
    fn from(world: Matrix4<f32>) -> Self {
        Self {
            model: world.into(),
        }
    }
}

/**
 * A mat4 takes up 4 vertex slots as it is technically 4 vec4s, so the
 * instance transform occupies shader locations 5 through 8. The step mode
 * advances per instance, not per vertex.
 */
impl Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}
