use bytemuck::{Pod, Zeroable};

/// CPU-side mirror of the `FieldParams` uniform block.
///
/// The layout must observe std140 rules for the GLSL prelude in
/// `compile.rs`: a vec2 at offset 0, two scalars at offsets 8 and 12,
/// 16 bytes total.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FieldUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub strength: f32,
}

unsafe impl Zeroable for FieldUniforms {}
unsafe impl Pod for FieldUniforms {}

impl FieldUniforms {
    /// Prepares a uniform block sized to the current surface.
    pub fn new(width: u32, height: u32, strength: f32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            time: 0.0,
            strength,
        }
    }

    /// Writes the current surface dimensions into the resolution slot.
    pub fn set_resolution(&mut self, width: f32, height: f32) {
        self.resolution = [width, height];
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }
}
