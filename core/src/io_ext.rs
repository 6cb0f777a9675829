use std::io::{
	Read,
	Result,
	Write
};

use ultraviolet::vec::{
	Vec2,
	Vec3,
	Vec4
};

pub trait ReadBinExt: Read {
	/// Reads a little endian 2D vector
	#[inline]
	fn read_vec2_le(&mut self) -> Result<Vec2> {
		let mut x = [0; 4];
		let mut y = x;

		self.read_exact(&mut x)?;
		self.read_exact(&mut y)?;

		Ok(Vec2::new(f32::from_le_bytes(x), f32::from_le_bytes(y)))
	}

	/// Reads a little endian 3D vector
	#[inline]
	fn read_vec3_le(&mut self) -> Result<Vec3> {
		let mut x = [0; 4];
		let mut y = x;
		let mut z = y;

		self.read_exact(&mut x)?;
		self.read_exact(&mut y)?;
		self.read_exact(&mut z)?;

		Ok(Vec3::new(f32::from_le_bytes(x), f32::from_le_bytes(y), f32::from_le_bytes(z)))
	}

	/// Reads a little endian 4D vector
	#[inline]
	fn read_vec4_le(&mut self) -> Result<Vec4> {
		let mut x = [0; 4];
		let mut y = x;
		let mut z = y;
		let mut w = z;

		self.read_exact(&mut x)?;
		self.read_exact(&mut y)?;
		self.read_exact(&mut z)?;
		self.read_exact(&mut w)?;

		Ok(Vec4::new(f32::from_le_bytes(x), f32::from_le_bytes(y), f32::from_le_bytes(z),
			f32::from_le_bytes(w)))
	}
}

impl<R> ReadBinExt for R
where
	R: Read + ?Sized,
{
}

pub trait WriteBinExt: Write {
	/// Writes a little endian 2D vector
	#[inline]
	fn write_vec2_le(&mut self, v: Vec2) -> Result<()> {
		self.write_all(&v.x.to_le_bytes())?;
		self.write_all(&v.y.to_le_bytes())
	}

	/// Writes a little endian 3D vector
	#[inline]
	fn write_vec3_le(&mut self, v: Vec3) -> Result<()> {
		self.write_all(&v.x.to_le_bytes())?;
		self.write_all(&v.y.to_le_bytes())?;
		self.write_all(&v.z.to_le_bytes())
	}

	/// Writes a little endian 4D vector
	#[inline]
	fn write_vec4_le(&mut self, v: Vec4) -> Result<()> {
		self.write_all(&v.x.to_le_bytes())?;
		self.write_all(&v.y.to_le_bytes())?;
		self.write_all(&v.z.to_le_bytes())?;
		self.write_all(&v.w.to_le_bytes())
	}
}

impl<W> WriteBinExt for W
where
	W: Write + ?Sized,
{
}

#[cfg(test)]
mod tests {
	use std::io::ErrorKind;

	use ultraviolet::vec::{
		Vec2,
		Vec3,
		Vec4
	};

	use super::*;

	#[test]
	fn test_read_vecs() {
		let mut vec2: &[u8] = &[0x5c, 0x1f, 0x7f, 0x3c, 0xa4, 0xfb, 0xf0, 0x3d][..];
		let mut vec3: &[u8] = &[0x5c, 0x1f, 0x7f, 0x3c, 0xa4, 0xfb, 0xf0, 0x3d, 0xd4, 0xf1, 0xb6, 0x3d][..];
		let mut vec4: &[u8] = &[0x5c, 0x1f, 0x7f, 0x3c, 0xa4, 0xfb, 0xf0, 0x3d, 0xd4, 0xf1, 0xb6, 0x3d,
			0, 0xa0, 0xd9, 0xbd][..];
		assert_eq!(Vec2::new(0.0155714415, 0.117667466), vec2.read_vec2_le().unwrap());
		assert_eq!(Vec3::new(0.0155714415, 0.117667466, 0.089328438), vec3.read_vec3_le().unwrap());
		assert_eq!(Vec4::new(0.0155714415, 0.117667466, 0.089328438, -0.106262207), vec4.read_vec4_le().unwrap());
	}

	#[test]
	fn test_write_vecs() {
		let mut buf = vec![];
		buf.write_vec2_le(Vec2::new(1.0, -2.0)).unwrap();
		buf.write_vec3_le(Vec3::new(0.5, 0.25, 0.125)).unwrap();
		buf.write_vec4_le(Vec4::new(1.0, 0.0, 0.0, 1.0)).unwrap();
		assert_eq!(buf.len(), 36);
		assert_eq!(&buf[..4], &[0x00, 0x00, 0x80, 0x3f]);

		let mut data = buf.as_slice();
		assert_eq!(data.read_vec2_le().unwrap(), Vec2::new(1.0, -2.0));
		assert_eq!(data.read_vec3_le().unwrap(), Vec3::new(0.5, 0.25, 0.125));
		assert_eq!(data.read_vec4_le().unwrap(), Vec4::new(1.0, 0.0, 0.0, 1.0));
	}

	#[test]
	fn test_read_short() {
		let mut data: &[u8] = &[0x00, 0x00, 0x80, 0x3f, 0x00][..];
		assert_eq!(data.read_vec2_le().unwrap_err().kind(), ErrorKind::UnexpectedEof);
	}
}
