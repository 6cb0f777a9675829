#[cfg(feature = "io_ext")]
pub mod io_ext;

pub mod color;
pub mod scene;

/// Scales a normalized float channel to 8 bits, rounding halves up.
/// Values outside `[0, 1]` saturate, `NaN` becomes `0`.
pub fn f32_to_unorm8(c: f32) -> u8 {
	(c * 255.0 + 0.5).floor() as u8
}

/// Scales an 8 bit channel to a normalized float
pub fn unorm8_to_f32(b: u8) -> f32 {
	b as f32 / 255.0
}
