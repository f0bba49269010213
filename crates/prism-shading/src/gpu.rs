//! GPU side of the surface stage: uniform packing, the render pipeline, and
//! atlas upload.
//!
//! Bind groups:
//! - Group 0: frame transform uniform (vertex)
//! - Group 1: light uniform (fragment)
//! - Group 2: material uniform + atlas texture array (fragment)

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use prism_materials::{MaterialUniform, TextureArrayAtlas};
use tracing::info;

use crate::frame::FrameContext;
use crate::vertex::SURFACE_VERTEX_LAYOUT;

/// WGSL source of the surface shader (`vs_main` / `fs_main`).
pub const VOXEL_SURFACE_SHADER_SOURCE: &str = include_str!("voxel_surface.wgsl");

/// Atlas texel format. Sampled without gamma conversion.
pub const ATLAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Per-draw matrices. 256 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameTransformUniform {
    /// Model matrix.
    pub model: [[f32; 4]; 4],
    /// View matrix.
    pub view: [[f32; 4]; 4],
    /// Projection matrix.
    pub projection: [[f32; 4]; 4],
    /// Normal matrix in the upper 3x3; WGSL has no `inverse`, so it is
    /// computed here.
    pub normal_matrix: [[f32; 4]; 4],
}

impl FrameTransformUniform {
    /// Pack a frame's transform.
    pub fn from_frame(frame: &FrameContext) -> Self {
        let t = frame.transform();
        Self {
            model: t.model.to_cols_array_2d(),
            view: t.view.to_cols_array_2d(),
            projection: t.projection.to_cols_array_2d(),
            normal_matrix: glam::Mat4::from_mat3(frame.prepared().normal_matrix()).to_cols_array_2d(),
        }
    }
}

/// Per-frame light state. 64 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightUniform {
    /// xyz = view position, w = time.
    pub view_pos_time: [f32; 4],
    /// xyz = light position, w = intensity.
    pub light_pos_intensity: [f32; 4],
    /// x = ambient factor, yzw unused.
    pub params: [f32; 4],
    /// x = connected directions mask, yzw unused.
    pub flags: [u32; 4],
}

impl LightUniform {
    /// Pack a frame's light state.
    pub fn from_frame(frame: &FrameContext) -> Self {
        let l = frame.light();
        Self {
            view_pos_time: l.view_pos.extend(l.time).to_array(),
            light_pos_intensity: l.light_pos.extend(l.light.intensity).to_array(),
            params: [l.light.ambient, 0.0, 0.0, 0.0],
            flags: [u32::from(l.connected.bits()), 0, 0, 0],
        }
    }
}

/// Render pipeline for voxel surfaces.
pub struct SurfacePipeline {
    /// The compiled render pipeline.
    pub pipeline: wgpu::RenderPipeline,
    /// Frame transform bind group layout (group 0).
    pub frame_bind_group_layout: wgpu::BindGroupLayout,
    /// Light bind group layout (group 1).
    pub light_bind_group_layout: wgpu::BindGroupLayout,
    /// Material + atlas bind group layout (group 2).
    pub material_bind_group_layout: wgpu::BindGroupLayout,
}

fn uniform_entry<T>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

impl SurfacePipeline {
    /// Create the pipeline and its three bind group layouts.
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let frame_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("surface-frame-bgl"),
            entries: &[uniform_entry::<FrameTransformUniform>(0, wgpu::ShaderStages::VERTEX)],
        });

        let light_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("surface-light-bgl"),
            entries: &[uniform_entry::<LightUniform>(0, wgpu::ShaderStages::FRAGMENT)],
        });

        let material_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("surface-material-bgl"),
            entries: &[
                uniform_entry::<MaterialUniform>(0, wgpu::ShaderStages::FRAGMENT),
                // binding 1: atlas texture array, read with textureLoad
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("surface-pipeline-layout"),
            bind_group_layouts: &[
                &frame_bind_group_layout,
                &light_bind_group_layout,
                &material_bind_group_layout,
            ],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("surface-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[SURFACE_VERTEX_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            frame_bind_group_layout,
            light_bind_group_layout,
            material_bind_group_layout,
        }
    }
}

/// Upload every atlas layer into one `D2Array` texture.
pub fn upload_atlas(device: &wgpu::Device, queue: &wgpu::Queue, atlas: &TextureArrayAtlas) -> wgpu::Texture {
    let (width, height) = (atlas.tile_width(), atlas.tile_height());
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("surface-atlas"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: atlas.layer_count(),
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ATLAS_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (i, layer) in atlas.layers().iter().enumerate() {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: i as u32,
                },
                aspect: wgpu::TextureAspect::All,
            },
            layer.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    info!(
        width,
        height,
        layers = atlas.layer_count(),
        "atlas uploaded"
    );
    texture
}

/// View of an uploaded atlas suitable for binding 1 of group 2.
pub fn atlas_view(texture: &wgpu::Texture) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("surface-atlas-view"),
        dimension: Some(wgpu::TextureViewDimension::D2Array),
        ..Default::default()
    })
}
