//! Shared value types used across the renderer surface and pipeline modules.

use winit::dpi::LogicalSize;

/// Largest device-pixel-ratio honoured when sizing the backing store.
///
/// Capping the ratio bounds the per-frame pixel cost on high-density
/// displays; the visual is a soft noise field and does not benefit from
/// rendering beyond 2x.
pub const MAX_SCALE_FACTOR: f64 = 2.0;

/// Which capability level the surface was acquired at.
///
/// Chosen once at startup and fixed for the process lifetime; every later
/// call (shader dialect, geometry setup) must use the same variant's feature
/// set. Only the modern variant may draw without an explicit vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextVariant {
    /// Full adapter limits; vertex positions synthesized from the vertex index.
    Modern,
    /// Downlevel (WebGL2-class) limits; explicit vertex buffer and attribute.
    Legacy,
}

/// Shader stage identifier carried in compile diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Backing-store dimensions computed from logical size and scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    pub width: u32,
    pub height: u32,
}

impl SurfaceDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

/// Computes the target pixel size as `floor(logical * min(scale, 2.0))`.
///
/// Pure so resize idempotence can be checked without a GPU: calling this
/// twice with unchanged inputs yields an identical descriptor, which is the
/// signal the surface manager uses to skip reallocation.
pub fn surface_pixel_size(logical: LogicalSize<f64>, scale_factor: f64) -> SurfaceDescriptor {
    let scale = scale_factor.min(MAX_SCALE_FACTOR).max(0.0);
    SurfaceDescriptor::new(
        (logical.width * scale).floor() as u32,
        (logical.height * scale).floor() as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_size_floors_the_scaled_dimensions() {
        let descriptor = surface_pixel_size(LogicalSize::new(801.5, 599.5), 1.0);
        assert_eq!(descriptor, SurfaceDescriptor::new(801, 599));
    }

    #[test]
    fn pixel_size_caps_the_scale_factor() {
        let capped = surface_pixel_size(LogicalSize::new(800.0, 600.0), 3.0);
        assert_eq!(capped, SurfaceDescriptor::new(1600, 1200));

        let uncapped = surface_pixel_size(LogicalSize::new(800.0, 600.0), 1.5);
        assert_eq!(uncapped, SurfaceDescriptor::new(1200, 900));
    }

    #[test]
    fn pixel_size_is_idempotent_for_unchanged_inputs() {
        let logical = LogicalSize::new(1280.0, 720.0);
        let first = surface_pixel_size(logical, 1.25);
        let second = surface_pixel_size(logical, 1.25);
        assert_eq!(first, second);
    }

    #[test]
    fn pixel_size_never_collapses_to_zero() {
        let descriptor = surface_pixel_size(LogicalSize::new(0.0, 0.0), 1.0);
        assert_eq!(descriptor, SurfaceDescriptor::new(1, 1));
    }
}
