//! Binary runtime mesh container.
//!
//! # Layout (little endian)
//! ```text
//! u32 magic
//! u32 version
//! u32 attribute flags
//! u32 vertex count (N)
//! f32[N][3] positions
//! f32[N][3] normals
//! colors          u8[N][4] in version 2, f32[N][4] in version 1
//! f32[N][2] uvs   version 2 only
//! u32 index width (2 or 4)
//! u32 index count
//! u16/u32 indices, grouped in triangles
//! ```

use bitflags::bitflags;

use ultraviolet::vec::{
	Vec2,
	Vec3
};

use meshkit_core::{
	color::Color,
	scene::{
		Face,
		Mesh,
		Vertex
	}
};

pub const MAGIC: u32 = 0xB2E2AA2A;
pub const HEADER_SIZE: usize = 16;

bitflags! {
	pub struct AttributeFlags: u32 {
		const POSITION = 1;
		const NORMAL = 2;
		const COLOR = 4;
		const UV = 8;
	}
}

impl AttributeFlags {
	/// Attributes every version requires
	pub const REQUIRED: AttributeFlags = AttributeFlags::from_bits_truncate(
		AttributeFlags::POSITION.bits() | AttributeFlags::NORMAL.bits());
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Version {
	/// Legacy layout: colors always present as four floats, no UVs
	V1 = 1,
	V2 = 2,
}

impl Version {
	pub const CURRENT: Version = Version::V2;

	/// Attribute set stored for a mesh with the given optional data
	pub fn attributes(self, has_colors: bool, has_uvs: bool) -> AttributeFlags {
		match self {
			Version::V1 => AttributeFlags::REQUIRED | AttributeFlags::COLOR,
			Version::V2 => {
				let mut flags = AttributeFlags::REQUIRED;
				if has_colors {
					flags |= AttributeFlags::COLOR;
				}
				if has_uvs {
					flags |= AttributeFlags::UV;
				}
				flags
			},
		}
	}

	/// Size of one vertex color in bytes
	pub fn color_size(self) -> usize {
		match self {
			Version::V1 => 16,
			Version::V2 => 4,
		}
	}
}

impl TryFrom<u32> for Version {
	type Error = u32;

	fn try_from(v: u32) -> Result<Self, Self::Error> {
		match v {
			1 => Ok(Version::V1),
			2 => Ok(Version::V2),
			_ => Err(v),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum IndexWidth {
	U16 = 2,
	U32 = 4,
}

impl IndexWidth {
	/// Vertex count from which 16-bit indices no longer suffice
	pub const U32_THRESHOLD: usize = 65536;

	pub fn for_vertex_count(count: usize) -> IndexWidth {
		if count < Self::U32_THRESHOLD {
			IndexWidth::U16
		} else {
			IndexWidth::U32
		}
	}

	pub fn bytes(self) -> usize {
		self as usize
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	/// Written as [`MAGIC`] regardless of this value
	pub magic: u32,
	pub version: Version,
}

impl Header {
	pub fn new(version: Version) -> Header {
		Header {
			magic: MAGIC,
			version: version,
		}
	}
}

/// File-shaped view of a binary mesh.
///
/// Attribute flags and index width are not stored; they follow from the
/// version and from which optional attributes are present.
#[derive(Clone, Debug, PartialEq)]
pub struct BinMesh {
	pub header: Header,
	pub positions: Vec<Vec3>,
	pub normals: Vec<Vec3>,
	/// Ignored by version 1, which always writes white
	pub colors: Option<Vec<Color>>,
	/// Never written by version 1
	pub uvs: Option<Vec<Vec2>>,
	pub indices: Vec<Face>,
}

impl BinMesh {
	pub fn version(&self) -> Version {
		self.header.version
	}

	pub fn vertex_count(&self) -> usize {
		self.positions.len()
	}

	pub fn index_count(&self) -> usize {
		self.indices.len() * 3
	}

	pub fn attributes(&self) -> AttributeFlags {
		self.version().attributes(self.colors.is_some(), self.uvs.is_some())
	}

	pub fn index_width(&self) -> IndexWidth {
		IndexWidth::for_vertex_count(self.vertex_count())
	}

	/// Size of the encoded file in bytes
	pub fn byte_len(&self) -> usize {
		let n = self.vertex_count();
		let attributes = self.attributes();
		let mut len = HEADER_SIZE + n * 24;

		if attributes.contains(AttributeFlags::COLOR) {
			len += n * self.version().color_size();
		}

		if attributes.contains(AttributeFlags::UV) {
			len += n * 8;
		}

		len + 8 + self.index_count() * self.index_width().bytes()
	}

	/// Converts into the intermediate mesh representation
	pub fn to_mesh(&self) -> Mesh {
		let vertices = self.positions.iter()
			.zip(self.normals.iter())
			.enumerate()
			.map(|(i, (position, normal))| Vertex {
				position: *position,
				normal: *normal,
				color: self.colors.as_ref().map(|c| c[i]),
				uv: self.uvs.as_ref().map(|uv| uv[i]),
			})
			.collect();

		Mesh::new(vertices, self.indices.clone())
	}
}

#[cfg(feature = "import")]
pub mod import {
	use byteorder::{
		LE,
		ReadBytesExt
	};

	use log::debug;

	use std::io::{
		ErrorKind,
		self
	};

	use thiserror::Error;

	use meshkit_core::io_ext::ReadBinExt;
	use super::*;

	/// Upper bound on elements reserved up front from a count read from the file
	const PREALLOC_LIMIT: usize = 1 << 16;

	#[derive(Error, Debug)]
	pub enum BinMeshImportError {
		#[error("Not a binary mesh file: {0:X}")]
		BadMagic(u32),
		#[error("Unknown/unsupported format version: {0}")]
		UnsupportedVersion(u32),
		#[error("Unexpected end of data while reading {0}")]
		Truncated(&'static str),
		#[error("Malformed attribute flags: {0:#x}")]
		MalformedAttributeFlags(u32),
		#[error("Index width mismatch: expected {expected}, got {found}")]
		IndexWidth {
			expected: u32,
			found: u32,
		},
		#[error("Index count is not a multiple of 3: {0}")]
		IndexCount(u32),
		#[error("Index {index} out of range for {vertex_count} vertices")]
		IndexOutOfRange {
			index: u32,
			vertex_count: u32,
		},
		#[error("I/O error")]
		IO {
			#[from]
			source: io::Error,
		},
	}

	/// Maps an end of stream to [`BinMeshImportError::Truncated`]
	trait InField<T> {
		fn in_field(self, name: &'static str) -> Result<T, BinMeshImportError>;
	}

	impl<T> InField<T> for io::Result<T> {
		fn in_field(self, name: &'static str) -> Result<T, BinMeshImportError> {
			self.map_err(|e| match e.kind() {
				ErrorKind::UnexpectedEof => BinMeshImportError::Truncated(name),
				_ => BinMeshImportError::from(e),
			})
		}
	}

	impl Header {
		fn read<R>(buf: &mut R) -> Result<Header, BinMeshImportError>
		where
			R: ReadBytesExt,
		{
			let magic = buf.read_u32::<LE>().in_field("magic")?;
			if magic != MAGIC {
				return Err(BinMeshImportError::BadMagic(magic));
			}

			let version = buf.read_u32::<LE>().in_field("version")?;

			Ok(Header {
				magic: magic,
				version: Version::try_from(version)
					.map_err(BinMeshImportError::UnsupportedVersion)?,
			})
		}
	}

	/// Validates stored flags against what the version can express
	fn attributes(version: Version, bits: u32) -> Result<AttributeFlags, BinMeshImportError> {
		let flags = AttributeFlags::from_bits(bits)
			.ok_or(BinMeshImportError::MalformedAttributeFlags(bits))?;

		if !flags.contains(AttributeFlags::REQUIRED) {
			return Err(BinMeshImportError::MalformedAttributeFlags(bits));
		}

		if version == Version::V1 && flags != version.attributes(true, false) {
			return Err(BinMeshImportError::MalformedAttributeFlags(bits));
		}

		Ok(flags)
	}

	fn vec3s<R>(count: usize, name: &'static str, buf: &mut R) -> Result<Vec<Vec3>, BinMeshImportError>
	where
		R: ReadBinExt,
	{
		let mut out = Vec::with_capacity(count.min(PREALLOC_LIMIT));
		for _ in 0..count {
			out.push(buf.read_vec3_le().in_field(name)?);
		}

		Ok(out)
	}

	fn colors<R>(version: Version, count: usize, buf: &mut R) -> Result<Vec<Color>, BinMeshImportError>
	where
		R: ReadBytesExt + ReadBinExt,
	{
		let mut out = Vec::with_capacity(count.min(PREALLOC_LIMIT));
		for _ in 0..count {
			out.push(match version {
				Version::V1 => Color::from(buf.read_vec4_le().in_field("colors")?),
				Version::V2 => {
					let mut rgba = [0; 4];
					buf.read_exact(&mut rgba).in_field("colors")?;
					Color::from_rgba8(rgba)
				},
			});
		}

		Ok(out)
	}

	fn uvs<R>(count: usize, buf: &mut R) -> Result<Vec<Vec2>, BinMeshImportError>
	where
		R: ReadBinExt,
	{
		let mut out = Vec::with_capacity(count.min(PREALLOC_LIMIT));
		for _ in 0..count {
			out.push(buf.read_vec2_le().in_field("uvs")?);
		}

		Ok(out)
	}

	fn indices<R>(width: IndexWidth, count: u32, vertex_count: u32, buf: &mut R)
		-> Result<Vec<Face>, BinMeshImportError>
	where
		R: ReadBytesExt,
	{
		let num_faces = (count / 3) as usize;
		let mut faces = Vec::with_capacity(num_faces.min(PREALLOC_LIMIT));

		for _ in 0..num_faces {
			let mut face = [0; 3];

			for index in face.iter_mut() {
				*index = match width {
					IndexWidth::U16 => buf.read_u16::<LE>().in_field("indices")? as u32,
					IndexWidth::U32 => buf.read_u32::<LE>().in_field("indices")?,
				};

				if *index >= vertex_count {
					return Err(BinMeshImportError::IndexOutOfRange {
						index: *index,
						vertex_count: vertex_count,
					});
				}
			}

			faces.push(face);
		}

		Ok(faces)
	}

	impl BinMesh {
		pub fn read<R>(buf: &mut R) -> Result<BinMesh, BinMeshImportError>
		where
			R: ReadBytesExt + ReadBinExt,
		{
			let header = Header::read(buf)?;
			let version = header.version;

			let flags = attributes(version, buf.read_u32::<LE>().in_field("attribute flags")?)?;
			let vertex_count = buf.read_u32::<LE>().in_field("vertex count")?;
			let nverts = vertex_count as usize;
			debug!("Reading {} vertices with attributes {:?}", nverts, flags);

			let positions = vec3s(nverts, "positions", buf)?;
			let normals = vec3s(nverts, "normals", buf)?;

			let colors = match flags.contains(AttributeFlags::COLOR) {
				true => Some(colors(version, nverts, buf)?),
				false => None,
			};

			let uvs = match flags.contains(AttributeFlags::UV) {
				true => Some(uvs(nverts, buf)?),
				false => None,
			};

			let expected = IndexWidth::for_vertex_count(nverts);
			let found = buf.read_u32::<LE>().in_field("index width")?;
			if found != expected as u32 {
				return Err(BinMeshImportError::IndexWidth {
					expected: expected as u32,
					found: found,
				});
			}

			let index_count = buf.read_u32::<LE>().in_field("index count")?;
			if index_count % 3 != 0 {
				return Err(BinMeshImportError::IndexCount(index_count));
			}

			debug!("Reading {} indices as {:?}", index_count, expected);
			let faces = indices(expected, index_count, vertex_count, buf)?;

			Ok(BinMesh {
				header: header,
				positions: positions,
				normals: normals,
				colors: colors,
				uvs: uvs,
				indices: faces,
			})
		}
	}

	/// Decodes a complete binary mesh. Bytes past the index block are ignored.
	pub fn decode(data: &[u8]) -> Result<Mesh, BinMeshImportError> {
		let mut buf = data;
		let model = BinMesh::read(&mut buf)?;

		if !buf.is_empty() {
			debug!("Ignoring {} trailing bytes", buf.len());
		}

		Ok(model.to_mesh())
	}

	#[cfg(test)]
	mod tests {
		use super::*;

		/// Single triangle, version 2, no optional attributes
		fn triangle_v2() -> Vec<u8> {
			let mut data = vec![];
			data.extend_from_slice(&MAGIC.to_le_bytes());
			data.extend_from_slice(&2u32.to_le_bytes());
			data.extend_from_slice(&3u32.to_le_bytes());
			data.extend_from_slice(&3u32.to_le_bytes());
			for f in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
				data.extend_from_slice(&f.to_le_bytes());
			}
			for _ in 0..3 {
				for f in [0.0f32, 0.0, 1.0] {
					data.extend_from_slice(&f.to_le_bytes());
				}
			}
			data.extend_from_slice(&2u32.to_le_bytes());
			data.extend_from_slice(&3u32.to_le_bytes());
			for i in [0u16, 1, 2] {
				data.extend_from_slice(&i.to_le_bytes());
			}
			data
		}

		#[test]
		fn test_read_triangle() {
			let data = triangle_v2();
			let model = BinMesh::read(&mut data.as_slice()).unwrap();
			assert_eq!(model.version(), Version::V2);
			assert_eq!(model.attributes(), AttributeFlags::POSITION | AttributeFlags::NORMAL);
			assert_eq!(model.positions[1], Vec3::new(1.0, 0.0, 0.0));
			assert_eq!(model.normals[2], Vec3::unit_z());
			assert_eq!(model.indices, vec![[0, 1, 2]]);
			assert_eq!(model.colors, None);
			assert_eq!(model.uvs, None);
			assert_eq!(model.byte_len(), data.len());
		}

		#[test]
		fn test_bad_magic() {
			let mut data = triangle_v2();
			data[0] ^= 0xFF;
			assert!(matches!(decode(&data), Err(BinMeshImportError::BadMagic(_))));
		}

		#[test]
		fn test_unsupported_version() {
			let mut data = triangle_v2();
			data[4..8].copy_from_slice(&3u32.to_le_bytes());
			assert!(matches!(decode(&data), Err(BinMeshImportError::UnsupportedVersion(3))));
		}

		#[test]
		fn test_missing_required_attribute() {
			let mut data = triangle_v2();
			data[8..12].copy_from_slice(&AttributeFlags::POSITION.bits().to_le_bytes());
			assert!(matches!(decode(&data), Err(BinMeshImportError::MalformedAttributeFlags(1))));

			data[8..12].copy_from_slice(&0x13u32.to_le_bytes());
			assert!(matches!(decode(&data), Err(BinMeshImportError::MalformedAttributeFlags(0x13))));
		}

		#[test]
		fn test_v1_requires_color() {
			let mut data = triangle_v2();
			data[4..8].copy_from_slice(&1u32.to_le_bytes());
			assert!(matches!(decode(&data), Err(BinMeshImportError::MalformedAttributeFlags(3))));
		}

		#[test]
		fn test_truncated() {
			let data = triangle_v2();

			// inside the position block
			assert!(matches!(decode(&data[..30]), Err(BinMeshImportError::Truncated("positions"))));
			assert!(matches!(decode(&data[..2]), Err(BinMeshImportError::Truncated("magic"))));
			assert!(matches!(decode(&data[..data.len() - 1]),
				Err(BinMeshImportError::Truncated("indices"))));
		}

		#[test]
		fn test_index_width_mismatch() {
			let mut data = triangle_v2();
			let at = HEADER_SIZE + 3 * 24;
			data[at..at + 4].copy_from_slice(&4u32.to_le_bytes());
			assert!(matches!(decode(&data), Err(BinMeshImportError::IndexWidth { expected: 2, found: 4 })));
		}

		#[test]
		fn test_index_count() {
			let mut data = triangle_v2();
			let at = HEADER_SIZE + 3 * 24 + 4;
			data[at..at + 4].copy_from_slice(&4u32.to_le_bytes());
			assert!(matches!(decode(&data), Err(BinMeshImportError::IndexCount(4))));
		}

		#[test]
		fn test_index_out_of_range() {
			let mut data = triangle_v2();
			let at = data.len() - 2;
			data[at..].copy_from_slice(&3u16.to_le_bytes());
			assert!(matches!(decode(&data),
				Err(BinMeshImportError::IndexOutOfRange { index: 3, vertex_count: 3 })));
		}

		#[test]
		fn test_huge_count_is_truncated() {
			let mut data = triangle_v2();
			data[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
			assert!(matches!(decode(&data), Err(BinMeshImportError::Truncated("positions"))));
		}

		#[test]
		fn test_trailing_bytes_ignored() {
			let mut data = triangle_v2();
			data.extend_from_slice(&[0xAB; 5]);
			assert_eq!(decode(&data).unwrap().faces, vec![[0, 1, 2]]);
		}
	}
}

#[cfg(feature = "export")]
pub mod export {
	use byteorder::{
		LE,
		WriteBytesExt
	};

	use log::{
		debug,
		warn
	};

	use std::io;
	use thiserror::Error;

	use meshkit_core::{
		io_ext::WriteBinExt,
		scene::MeshError
	};

	use super::*;

	#[derive(Error, Debug)]
	pub enum BinMeshExportError {
		#[error("Invalid input mesh: {0}")]
		InvalidInput(#[from] MeshError),
		#[error("Attribute {attribute} has {found} entries, expected {expected}")]
		AttributeLength {
			attribute: &'static str,
			expected: usize,
			found: usize,
		},
		#[error("Unknown/unsupported format version: {0}")]
		UnsupportedVersion(u32),
		#[error("I/O error")]
		IO {
			#[from]
			source: io::Error,
		},
	}

	fn check_len(attribute: &'static str, expected: usize, found: usize) -> Result<(), BinMeshExportError> {
		match expected == found {
			true => Ok(()),
			false => Err(BinMeshExportError::AttributeLength {
				attribute: attribute,
				expected: expected,
				found: found,
			}),
		}
	}

	impl Header {
		fn write<W>(&self, buf: &mut W) -> io::Result<()>
		where
			W: WriteBytesExt,
		{
			buf.write_u32::<LE>(MAGIC)?;
			buf.write_u32::<LE>(self.version as u32)
		}
	}

	impl BinMesh {
		/// Builds the file representation of `mesh` for the given format version
		pub fn from_mesh(mesh: &Mesh, version: Version) -> Result<BinMesh, BinMeshExportError> {
			mesh.validate()?;

			let has_colors = mesh.has_colors();
			let has_uvs = mesh.has_uvs();

			let colors = match version {
				Version::V1 => Some(vec![Color::WHITE; mesh.vertices.len()]),
				Version::V2 if has_colors => {
					debug!("Found color attributes");
					Some(mesh.vertices.iter().map(|v| v.color.unwrap_or_default()).collect())
				},
				Version::V2 => None,
			};

			let uvs = match version {
				Version::V2 if has_uvs => {
					debug!("Found UV attributes");
					Some(mesh.vertices.iter().map(|v| v.uv.unwrap_or_else(Vec2::zero)).collect())
				},
				_ => None,
			};

			if version == Version::V1 && (has_colors || has_uvs) {
				debug!("Version 1 stores white vertex colors and no UVs");
			}

			Ok(BinMesh {
				header: Header::new(version),
				positions: mesh.vertices.iter().map(|v| v.position).collect(),
				normals: mesh.vertices.iter().map(|v| v.normal).collect(),
				colors: colors,
				uvs: uvs,
				indices: mesh.faces.clone(),
			})
		}

		/// Checks array lengths and index ranges before anything is written
		fn check(&self) -> Result<(), BinMeshExportError> {
			let n = self.vertex_count();

			if n == 0 {
				return Err(MeshError::Empty.into());
			}

			if n > u32::MAX as usize {
				return Err(MeshError::TooManyVertices(n).into());
			}

			if self.indices.len() > (u32::MAX / 3) as usize {
				return Err(MeshError::TooManyFaces(self.indices.len()).into());
			}

			check_len("normal", n, self.normals.len())?;

			if let Some(colors) = &self.colors {
				check_len("color", n, colors.len())?;
			}

			if let Some(uvs) = &self.uvs {
				check_len("uv", n, uvs.len())?;
			}

			for (i, face) in self.indices.iter().enumerate() {
				if let Some(index) = face.iter().find(|index| **index as usize >= n) {
					return Err(MeshError::FaceIndex {
						face: i,
						index: *index,
						vertex_count: n,
					}.into());
				}
			}

			Ok(())
		}

		pub fn write<W>(&self, buf: &mut W) -> Result<(), BinMeshExportError>
		where
			W: WriteBytesExt + WriteBinExt,
		{
			self.check()?;

			let version = self.version();
			let attributes = self.attributes();
			let n = self.vertex_count();

			self.header.write(buf)?;
			buf.write_u32::<LE>(attributes.bits())?;
			buf.write_u32::<LE>(n as u32)?;

			debug!("Writing {} vertices...", n);

			for p in self.positions.iter() {
				buf.write_vec3_le(*p)?;
			}

			for normal in self.normals.iter() {
				buf.write_vec3_le(*normal)?;
			}

			if attributes.contains(AttributeFlags::COLOR) {
				for i in 0..n {
					match version {
						Version::V1 => buf.write_vec4_le(Color::WHITE.into())?,
						Version::V2 => {
							let color = self.colors.as_ref().map_or(Color::WHITE, |c| c[i]);
							buf.write_all(&color.to_rgba8())?
						},
					}
				}
			}

			if attributes.contains(AttributeFlags::UV) {
				if let Some(uvs) = &self.uvs {
					for uv in uvs.iter() {
						buf.write_vec2_le(*uv)?;
					}
				}
			} else if self.uvs.is_some() {
				warn!("Version {} cannot store UVs, skipping", version as u32);
			}

			let width = self.index_width();
			debug!("Index type: {:?}", width);

			buf.write_u32::<LE>(width as u32)?;
			buf.write_u32::<LE>(self.index_count() as u32)?;

			debug!("Writing {} indices...", self.index_count());

			for face in self.indices.iter() {
				for index in face.iter() {
					match width {
						IndexWidth::U16 => buf.write_u16::<LE>(*index as u16)?,
						IndexWidth::U32 => buf.write_u32::<LE>(*index)?,
					}
				}
			}

			Ok(())
		}
	}

	/// Encodes `mesh` as a complete binary mesh of the given format version
	pub fn encode(mesh: &Mesh, version: u32) -> Result<Vec<u8>, BinMeshExportError> {
		let version = Version::try_from(version)
			.map_err(BinMeshExportError::UnsupportedVersion)?;

		let model = BinMesh::from_mesh(mesh, version)?;
		let mut data = Vec::with_capacity(model.byte_len());
		model.write(&mut data)?;

		Ok(data)
	}

}
