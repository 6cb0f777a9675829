use ultraviolet::vec::Vec4;

use crate::{
	f32_to_unorm8,
	unorm8_to_f32
};

/// Linear RGBA color with channels in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub red: f32,
	pub green: f32,
	pub blue: f32,
	pub alpha: f32,
}

impl Color {
	pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

	pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Color {
		Color {
			red: red,
			green: green,
			blue: blue,
			alpha: alpha,
		}
	}

	/// Expands four 8 bit channels in RGBA order
	pub fn from_rgba8(rgba: [u8; 4]) -> Color {
		Color {
			red: unorm8_to_f32(rgba[0]),
			green: unorm8_to_f32(rgba[1]),
			blue: unorm8_to_f32(rgba[2]),
			alpha: unorm8_to_f32(rgba[3]),
		}
	}

	/// Quantizes to four 8 bit channels in RGBA order
	pub fn to_rgba8(&self) -> [u8; 4] {
		[
			f32_to_unorm8(self.red),
			f32_to_unorm8(self.green),
			f32_to_unorm8(self.blue),
			f32_to_unorm8(self.alpha),
		]
	}

	/// Returns `true` if every channel is within `tolerance` of `other`'s
	pub fn approx_eq(&self, other: &Color, tolerance: f32) -> bool {
		(self.red - other.red).abs() <= tolerance &&
			(self.green - other.green).abs() <= tolerance &&
			(self.blue - other.blue).abs() <= tolerance &&
			(self.alpha - other.alpha).abs() <= tolerance
	}
}

impl Default for Color {
	fn default() -> Self {
		Color::WHITE
	}
}

impl From<Vec4> for Color {
	fn from(v: Vec4) -> Self {
		Color::new(v.x, v.y, v.z, v.w)
	}
}

impl From<Color> for Vec4 {
	fn from(c: Color) -> Self {
		Vec4::new(c.red, c.green, c.blue, c.alpha)
	}
}
