//! Material groups: per-material geometry batches and their GPU resources.
//!
//! A [`MaterialGroup`] owns one vertex/index buffer pair, the material's
//! diffuse texture and a small uniform of scalar shading parameters. All grid
//! cells whose meshes use this material are rendered by a single instanced
//! draw. Staged vertex/index data only lives until [`MaterialGroup::upload`]
//! moves it to the GPU, it is never kept resident twice.

use wgpu::util::DeviceExt;

use crate::data_structures::texture::Texture;

/// Types that describe their own GPU vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// One tileset vertex as stored in a group's vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TileVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for TileVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<TileVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Scalar shading parameters, uniform for the whole group.
///
/// Per-instance material variation is deliberately unsupported; only the
/// per-instance transform differs within one draw.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MaterialParams {
    pub metallic: f32,
    pub roughness: f32,
    pub anisotropy: f32,
    pub sheen: f32,
    pub clearcoat_thickness: f32,
    pub clearcoat_roughness: f32,
}

impl MaterialParams {
    /// Extract the tinyobj PBR extension keys from an MTL material.
    pub fn from_mtl(material: &tobj::Material) -> Self {
        let scalar = |key: &str| {
            material
                .unknown_param
                .get(key)
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.0)
        };
        Self {
            metallic: scalar("Pm"),
            roughness: scalar("Pr"),
            anisotropy: scalar("aniso"),
            sheen: scalar("Ps"),
            clearcoat_thickness: scalar("Pc"),
            clearcoat_roughness: scalar("Pcr"),
        }
    }

    fn to_raw(self) -> MaterialParamsRaw {
        MaterialParamsRaw {
            metallic: self.metallic,
            roughness: self.roughness,
            anisotropy: self.anisotropy,
            sheen: self.sheen,
            clearcoat_thickness: self.clearcoat_thickness,
            clearcoat_roughness: self.clearcoat_roughness,
            _padding: [0.0; 2],
        }
    }
}

// Uniforms require 16 byte spacing, hence the trailing padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialParamsRaw {
    metallic: f32,
    roughness: f32,
    anisotropy: f32,
    sheen: f32,
    clearcoat_thickness: f32,
    clearcoat_roughness: f32,
    _padding: [f32; 2],
}

/// Vertex/index streams accumulated while loading, dropped on upload.
#[derive(Debug, Default)]
struct Staging {
    vertices: Vec<TileVertex>,
    indices: Vec<u32>,
    diffuse: Option<Vec<u8>>,
}

#[derive(Debug)]
struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    bind_group: wgpu::BindGroup,
    instance_buffer: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

/// One material's batched geometry plus the GPU resources to draw it.
#[derive(Debug)]
pub struct MaterialGroup {
    pub name: String,
    pub params: MaterialParams,
    staging: Option<Staging>,
    gpu: Option<GpuGeometry>,
}

impl MaterialGroup {
    pub fn new(name: &str, params: MaterialParams, diffuse: Option<Vec<u8>>) -> Self {
        Self {
            name: name.to_string(),
            params,
            staging: Some(Staging {
                diffuse,
                ..Default::default()
            }),
            gpu: None,
        }
    }

    pub fn push_vertex(&mut self, vertex: TileVertex) {
        self.staging
            .as_mut()
            .expect("geometry staged after upload()")
            .vertices
            .push(vertex);
    }

    pub fn push_indices(&mut self, indices: impl IntoIterator<Item = u32>) {
        self.staging
            .as_mut()
            .expect("geometry staged after upload()")
            .indices
            .extend(indices);
    }

    pub fn staged_vertex_count(&self) -> usize {
        self.staging.as_ref().map_or(0, |s| s.vertices.len())
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn index_count(&self) -> u32 {
        self.gpu.as_ref().map_or(0, |gpu| gpu.index_count)
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self
            .gpu
            .as_ref()
            .expect("material group used before upload()")
            .bind_group
    }

    /// Move the staged vertex/index data into GPU buffers.
    ///
    /// Must be called exactly once per group; a second call is a logged no-op
    /// and never re-uploads. The staging data is consumed here. Materials
    /// without a diffuse texture bind a 1x1 white default so the pipeline
    /// stays uniform across groups.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<()> {
        if self.gpu.is_some() {
            log::warn!("material group {:?} uploaded twice, ignoring", self.name);
            return Ok(());
        }
        let staging = self
            .staging
            .take()
            .expect("staging data present before first upload");

        let texture = match &staging.diffuse {
            Some(bytes) => Texture::from_bytes(device, queue, bytes, &self.name)?,
            None => Texture::create_default_diffuse(device, queue),
        };

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&staging.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(&staging.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Params Buffer", self.name)),
            contents: bytemuck::cast_slice(&[self.params.to_raw()]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let sampler = texture
            .sampler
            .as_ref()
            .expect("diffuse textures always carry a sampler");
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
            label: Some(&format!("{:?} Material Bind Group", self.name)),
        });

        self.gpu = Some(GpuGeometry {
            vertex_buffer,
            index_buffer,
            index_count: staging.indices.len() as u32,
            bind_group,
            instance_buffer: None,
            instance_capacity: 0,
        });
        Ok(())
    }

    /// Upload this frame's instance transforms, growing the buffer on demand.
    pub fn write_instances(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        instances: &[crate::data_structures::instance::InstanceRaw],
    ) {
        let gpu = self
            .gpu
            .as_mut()
            .expect("material group written before upload()");
        if instances.is_empty() {
            return;
        }
        if gpu.instance_capacity < instances.len() || gpu.instance_buffer.is_none() {
            gpu.instance_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{:?} Instance Buffer", self.name)),
                size: std::mem::size_of_val(instances) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            gpu.instance_capacity = instances.len();
        }
        let buffer = gpu.instance_buffer.as_ref().expect("just created above");
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(instances));
    }

    /// Bind this group's buffers and texture and issue one instanced draw.
    ///
    /// Precondition: a render pass with the tile pipeline is active and
    /// [`upload`](Self::upload) plus [`write_instances`](Self::write_instances)
    /// have run. Postcondition: the group's buffers and bind group stay bound,
    /// consecutive draws from other groups must not assume isolation.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, amount: u32) {
        let gpu = self
            .gpu
            .as_ref()
            .expect("material group drawn before upload()");
        if amount == 0 || gpu.index_count == 0 {
            return;
        }
        let instances = gpu
            .instance_buffer
            .as_ref()
            .expect("instances written before draw");
        render_pass.set_bind_group(0, &gpu.bind_group, &[]);
        render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, instances.slice(..));
        render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..gpu.index_count, 0, 0..amount);
    }
}
