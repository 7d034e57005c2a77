//! The seam between the terrain and whatever owns the GPU.
//!
//! Buffers are bevy meshes; uploading one yields a handle, and drawing is
//! whatever the context decides to do with that handle for the current frame.

use bevy::prelude::*;

pub trait RenderDevice {
    fn create_buffer(&mut self, mesh: Mesh) -> Handle<Mesh>;
}

impl RenderDevice for Assets<Mesh> {
    fn create_buffer(&mut self, mesh: Mesh) -> Handle<Mesh> {
        self.add(mesh)
    }
}

pub trait DrawContext {
    fn draw_triangle_list(&mut self, buffer: &Handle<Mesh>, index_count: usize);

    fn draw_line_list(&mut self, buffer: &Handle<Mesh>, index_count: usize);
}

/// Draw calls collected for one frame.
#[derive(Default, Debug)]
pub struct DrawList {
    pub triangles: Vec<(Handle<Mesh>, usize)>,
    pub lines: Vec<(Handle<Mesh>, usize)>,
}

impl DrawList {
    pub fn clear(&mut self) {
        self.triangles.clear();
        self.lines.clear();
    }

    pub fn draws_triangles(&self, buffer: &Handle<Mesh>) -> bool {
        self.triangles.iter().any(|(handle, _)| handle == buffer)
    }

    pub fn draws_lines(&self, buffer: &Handle<Mesh>) -> bool {
        self.lines.iter().any(|(handle, _)| handle == buffer)
    }
}

impl DrawContext for DrawList {
    fn draw_triangle_list(&mut self, buffer: &Handle<Mesh>, index_count: usize) {
        self.triangles.push((buffer.clone_weak(), index_count));
    }

    fn draw_line_list(&mut self, buffer: &Handle<Mesh>, index_count: usize) {
        self.lines.push((buffer.clone_weak(), index_count));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use bevy::asset::HandleId;

    use super::*;

    /// Keeps uploaded meshes in memory and hands out weak handles.
    #[derive(Default)]
    pub struct MemoryDevice {
        pub meshes: Vec<(Handle<Mesh>, Mesh)>,
    }

    impl RenderDevice for MemoryDevice {
        fn create_buffer(&mut self, mesh: Mesh) -> Handle<Mesh> {
            let handle = Handle::weak(HandleId::random::<Mesh>());
            self.meshes.push((handle.clone_weak(), mesh));
            handle
        }
    }
}
