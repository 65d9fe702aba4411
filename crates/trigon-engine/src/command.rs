//! Command recording seam.
//!
//! Drawables record into a [`CommandList`] rather than a concrete render pass, so
//! the same code drives a `wgpu::RenderPass` or a [`CommandRecorder`] that keeps
//! the commands for inspection.

use std::ops::Range;

use crate::mesh::VertexBufferView;
use crate::pso::PipelineState;

/// Commands a drawable may record inside a render pass.
pub trait CommandList {
    /// Makes `state` the active pipeline state for subsequent draws.
    fn set_pipeline_state(&mut self, state: &PipelineState);

    /// Binds a vertex buffer view to input slot `slot`.
    fn bind_vertex_buffer(&mut self, slot: u32, view: &VertexBufferView);

    /// Non-indexed draw.
    fn draw_instanced(&mut self, vertices: Range<u32>, instances: Range<u32>);
}

impl CommandList for wgpu::RenderPass<'_> {
    fn set_pipeline_state(&mut self, state: &PipelineState) {
        self.set_pipeline(state.pipeline());
    }

    fn bind_vertex_buffer(&mut self, slot: u32, view: &VertexBufferView) {
        self.set_vertex_buffer(slot, view.buffer().slice(..view.size_in_bytes()));
    }

    fn draw_instanced(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.draw(vertices, instances);
    }
}

/// A command captured by [`CommandRecorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCommand {
    SetPipelineState {
        name: String,
        topology: wgpu::PrimitiveTopology,
    },
    BindVertexBuffer {
        slot: u32,
        stride: u64,
        size_in_bytes: u64,
    },
    Draw(DrawCall),
}

/// A captured non-indexed draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub vertices: Range<u32>,
    pub instances: Range<u32>,
    /// Topology of the pipeline state active at the time of the draw.
    pub topology: Option<wgpu::PrimitiveTopology>,
}

impl DrawCall {
    pub fn vertex_count(&self) -> u32 {
        self.vertices.end.saturating_sub(self.vertices.start)
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.end.saturating_sub(self.instances.start)
    }
}

/// [`CommandList`] that records instead of executing.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<RecordedCommand>,
    active_topology: Option<wgpu::PrimitiveTopology>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands in recording order.
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// The draw calls, in recording order.
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|cmd| match cmd {
            RecordedCommand::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.active_topology = None;
    }
}

impl CommandList for CommandRecorder {
    fn set_pipeline_state(&mut self, state: &PipelineState) {
        self.active_topology = Some(state.topology());
        self.commands.push(RecordedCommand::SetPipelineState {
            name: state.name().to_owned(),
            topology: state.topology(),
        });
    }

    fn bind_vertex_buffer(&mut self, slot: u32, view: &VertexBufferView) {
        self.commands.push(RecordedCommand::BindVertexBuffer {
            slot,
            stride: view.stride(),
            size_in_bytes: view.size_in_bytes(),
        });
    }

    fn draw_instanced(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.commands.push(RecordedCommand::Draw(DrawCall {
            vertices,
            instances,
            topology: self.active_topology,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_without_pipeline_has_no_topology() {
        let mut recorder = CommandRecorder::new();
        recorder.draw_instanced(0..3, 0..1);

        let draws: Vec<_> = recorder.draw_calls().collect();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].topology, None);
        assert_eq!(draws[0].vertex_count(), 3);
        assert_eq!(draws[0].instance_count(), 1);
    }

    #[test]
    fn clear_resets_commands_and_state() {
        let mut recorder = CommandRecorder::new();
        recorder.draw_instanced(0..6, 0..2);
        recorder.clear();
        assert!(recorder.commands().is_empty());
        assert_eq!(recorder.draw_calls().count(), 0);
    }
}
