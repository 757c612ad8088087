/// RGBA color, one byte per channel.
pub type Rgba = [u8; 4];

/// Fully transparent pixel; lets the background fill show through.
pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Common error type for configuration entry points.
///
/// The per-column rendering path never fails; only building or reconfiguring
/// a composer can reject its inputs.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("empty ping sequence: {0}")]
    EmptySequence(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Linear interpolation between two scalars.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Alpha-composites `color` over an opaque `background`.
pub fn composite(color: Rgba, background: Rgba) -> Rgba {
    match color[3] {
        255 => color,
        0 => background,
        alpha => {
            let t = alpha as f32 / 255.0;
            let mut out = [0, 0, 0, 255];
            for channel in 0..3 {
                out[channel] =
                    lerp(background[channel] as f32, color[channel] as f32, t).round() as u8;
            }
            out
        }
    }
}
