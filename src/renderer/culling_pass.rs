use std::mem;

use bytemuck::{Pod, Zeroable};
use glam::UVec2;

use crate::culling::{CullingData, CullingRenderPass, CullingView, CULLING_ITEM_BATCH};
use crate::light::LightData;

pub const TILE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Uint;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ViewUniform {
    view: [[f32; 4]; 4],
    projection_inv: [[f32; 4]; 4],
}

/// GPU storage of one culling batch.
pub struct BatchResources {
    pub tiles: UVec2,
    pub light_buffer: wgpu::Buffer,
    pub culling_buffer: wgpu::Buffer,
    pub tile_texture: wgpu::Texture,
    pub tile_view: wgpu::TextureView,
    binning_bind_group: wgpu::BindGroup,
    /// Lights, culling data and tile texture, laid out as [`TileBinningPass::shading_layout`].
    pub shading_bind_group: wgpu::BindGroup,
}

/// Fullscreen pass writing, for every screen tile, the bit mask of the batch lights touching it.
pub struct TileBinningPass {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    binning_layout: wgpu::BindGroupLayout,
    shading_layout: wgpu::BindGroupLayout,
    view_buffer: wgpu::Buffer,
    allocations: usize,
}

impl TileBinningPass {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Light Culling Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("light_culling.wgsl").into()),
        });

        let binning_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("LightCullingBindLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
            ],
        });

        let shading_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("LightShadingBindLayout"),
            entries: &[
                storage_entry(0),
                storage_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Uint,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Light Culling Pipeline Layout"),
            bind_group_layouts: &[&binning_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Light Culling Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TILE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("LightCullingViewBuffer"),
            size: mem::size_of::<ViewUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            device: device.clone(),
            queue: queue.clone(),
            pipeline,
            binning_layout,
            shading_layout,
            view_buffer,
            allocations: 0,
        }
    }

    /// Layout of [`BatchResources::shading_bind_group`] for shading pipelines.
    pub fn shading_layout(&self) -> &wgpu::BindGroupLayout {
        &self.shading_layout
    }

    /// Batch resources created so far, resizes included.
    pub fn allocation_count(&self) -> usize {
        self.allocations
    }

    fn create_tile_texture(&self, tiles: UVec2) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("LightCullingTiles"),
            size: wgpu::Extent3d {
                width: tiles.x.max(1),
                height: tiles.y.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TILE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    fn create_shading_bind_group(
        &self,
        light_buffer: &wgpu::Buffer,
        culling_buffer: &wgpu::Buffer,
        tile_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("LightShadingBindGroup"),
            layout: &self.shading_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: culling_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(tile_view),
                },
            ],
        })
    }

    fn create_resources(&mut self, tiles: UVec2) -> BatchResources {
        let light_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("LightCullingLightBuffer"),
            size: (CULLING_ITEM_BATCH * mem::size_of::<LightData>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let culling_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("LightCullingDataBuffer"),
            size: mem::size_of::<CullingData>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let binning_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("LightCullingBindGroup"),
            layout: &self.binning_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.view_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: culling_buffer.as_entire_binding(),
                },
            ],
        });

        let (tile_texture, tile_view) = self.create_tile_texture(tiles);
        let shading_bind_group =
            self.create_shading_bind_group(&light_buffer, &culling_buffer, &tile_view);

        self.allocations += 1;
        log::info!(
            "Allocated light culling batch resources ({}x{} tiles)",
            tiles.x,
            tiles.y
        );

        BatchResources {
            tiles,
            light_buffer,
            culling_buffer,
            tile_texture,
            tile_view,
            binning_bind_group,
            shading_bind_group,
        }
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl CullingRenderPass for TileBinningPass {
    type Resources = BatchResources;

    fn set_view(&mut self, view: &CullingView) {
        let uniform = ViewUniform {
            view: view.view().to_cols_array_2d(),
            projection_inv: view.projection().inverse().to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    fn ensure_resources(&mut self, slot: &mut Option<BatchResources>, tiles: UVec2) {
        let Some(resources) = slot.as_mut() else {
            *slot = Some(self.create_resources(tiles));
            return;
        };
        if resources.tiles == tiles {
            return;
        }

        let (tile_texture, tile_view) = self.create_tile_texture(tiles);
        resources.shading_bind_group = self.create_shading_bind_group(
            &resources.light_buffer,
            &resources.culling_buffer,
            &tile_view,
        );
        resources.tile_texture = tile_texture;
        resources.tile_view = tile_view;
        resources.tiles = tiles;
        self.allocations += 1;
        log::info!("Resized light culling tiles to {}x{}", tiles.x, tiles.y);
    }

    fn upload(
        &mut self,
        resources: &mut BatchResources,
        item_data: &[u8],
        culling_data: &CullingData,
    ) {
        if !item_data.is_empty() {
            self.queue
                .write_buffer(&resources.light_buffer, 0, item_data);
        }
        self.queue.write_buffer(
            &resources.culling_buffer,
            0,
            bytemuck::bytes_of(culling_data),
        );
    }

    fn render(&mut self, resources: &BatchResources) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Light Culling Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Light Culling Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &resources.tile_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &resources.binning_bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
    }
}
