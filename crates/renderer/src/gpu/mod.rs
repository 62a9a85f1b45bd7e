//! GPU-facing half of the renderer: surface acquisition, the variant-matched
//! pipeline, uniform mirroring, and frame timing.

mod context;
mod pipeline;
mod state;
pub mod timeline;
mod uniforms;

pub(crate) use state::GpuState;
