//! Device-side copies of a [`Mesh`].
//!
//! A [`Drawable`] owns its vertex, index and transform buffers. It is not
//! `Clone`; dropping it destroys the buffers, so each one is released once.

use glam::Mat4;
use wgpu::util::DeviceExt;
use crate::{gpu::GpuError, mesh::Mesh};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub transform: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(transform: Mat4) -> Self {
        Self { transform: transform.to_cols_array_2d() }
    }
}

pub struct Drawable {
    label: String,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
}

impl Drawable {
    pub fn model_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0, visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Uniform, has_dynamic_offset: false, min_binding_size: None }, count: None,
            }], label: Some("Model Layout"),
        })
    }

    /// Uploads `mesh` once as static data. Allocation failure is reported, never retried.
    pub fn upload(device: &wgpu::Device, model_layout: &wgpu::BindGroupLayout, label: &str, mesh: &Mesh) -> Result<Self, GpuError> {
        if mesh.is_empty() {
            return Err(GpuError::EmptyMesh(label.to_owned()));
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")), contents: bytemuck::cast_slice(mesh.vertices()), usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Indices")), contents: bytemuck::cast_slice(mesh.indices()), usage: wgpu::BufferUsages::INDEX,
        });
        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Transform")), contents: bytemuck::cast_slice(&[ModelUniform::new(Mat4::IDENTITY)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::Allocation { label: label.to_owned(), message: err.to_string() });
        }

        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: model_layout, entries: &[wgpu::BindGroupEntry { binding: 0, resource: model_buffer.as_entire_binding() }], label: Some(label),
        });

        log::debug!("uploaded `{label}`: {} vertices, {} indices", mesh.vertices().len(), mesh.indices().len());
        Ok(Self {
            label: label.to_owned(),
            vertex_buffer, index_buffer,
            index_count: mesh.indices().len() as u32,
            model_buffer, model_bind_group,
        })
    }

    pub fn set_transform(&self, queue: &wgpu::Queue, transform: Mat4) {
        queue.write_buffer(&self.model_buffer, 0, bytemuck::cast_slice(&[ModelUniform::new(transform)]));
    }

    /// Indexed triangle-list draw over the full index range.
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_bind_group(1, &self.model_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

impl Drop for Drawable {
    fn drop(&mut self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.model_buffer.destroy();
        log::debug!("released `{}`", self.label);
    }
}
