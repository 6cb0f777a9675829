pub mod binmesh;

use bitflags::bitflags;

#[cfg(any(feature = "import", feature = "export"))]
use log::info;

#[cfg(any(feature = "import", feature = "export"))]
use std::{
	fs,
	path::Path
};

#[cfg(any(feature = "import", feature = "export"))]
use meshkit_core::scene::Mesh;

use binmesh::Version;

#[cfg(feature = "export")]
pub use binmesh::export::{
	BinMeshExportError,
	encode
};

#[cfg(feature = "import")]
pub use binmesh::import::{
	BinMeshImportError,
	decode
};

bitflags! {
	pub struct ExportFlag: u32 {
		const CREATE_DIRS = 1;
	}
}

impl Default for ExportFlag {
	fn default() -> Self {
		ExportFlag::CREATE_DIRS
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportCfg {
	pub flags: ExportFlag,
	/// Format version to write, `1` or `2`
	pub version: u32,
}

impl Default for ExportCfg {
	fn default() -> Self {
		Self {
			flags: ExportFlag::default(),
			version: Version::CURRENT as u32,
		}
	}
}

#[cfg(feature = "import")]
pub fn read<P>(filepath: P) -> Result<Mesh, BinMeshImportError>
where
	P: AsRef<Path>,
{
	let path = filepath.as_ref();
	let mesh = decode(&fs::read(path)?)?;

	info!("Read {} vertices and {} faces from {}", mesh.vertices.len(), mesh.faces.len(),
		path.display());

	Ok(mesh)
}

#[cfg(feature = "export")]
pub fn write<P>(filepath: P, mesh: &Mesh, cfg: &ExportCfg) -> Result<(), BinMeshExportError>
where
	P: AsRef<Path>,
{
	let path = filepath.as_ref();
	info!("Output path: {}", path.display());

	let data = encode(mesh, cfg.version)?;

	if cfg.flags.contains(ExportFlag::CREATE_DIRS) {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
	}

	fs::write(path, &data)?;
	info!("Wrote {} bytes", data.len());

	Ok(())
}

#[cfg(all(test, feature = "import", feature = "export"))]
mod tests {
	use ultraviolet::vec::{
		Vec2,
		Vec3
	};

	use meshkit_core::{
		color::Color,
		scene::Vertex
	};

	use super::*;

	fn colored_triangle() -> Mesh {
		let vertices = [
			Vec3::new(0.0, 0.0, 0.0),
			Vec3::new(1.0, 0.0, 0.0),
			Vec3::new(0.0, 1.0, 0.0),
		].iter().map(|p| Vertex::new(*p, Vec3::unit_z())
			.with_color(Color::new(p.x, p.y, 0.0, 1.0))
			.with_uv(Vec2::new(p.x, p.y))).collect();

		Mesh::new(vertices, vec![[0, 1, 2]])
	}

	#[test]
	fn test_default_cfg() {
		let cfg = ExportCfg::default();
		assert_eq!(cfg.version, 2);
		assert!(cfg.flags.contains(ExportFlag::CREATE_DIRS));
	}

	#[test]
	fn test_write_read_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("data").join("meshes").join("triangle.bin");
		let mesh = colored_triangle();

		write(&path, &mesh, &ExportCfg::default()).unwrap();
		assert_eq!(fs::metadata(&path).unwrap().len(), 16 + 3 * (24 + 4 + 8) + 8 + 6);
		assert_eq!(read(&path).unwrap(), mesh);
	}

	#[test]
	fn test_write_without_dirs() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("missing").join("triangle.bin");
		let cfg = ExportCfg {
			flags: ExportFlag::empty(),
			version: 1,
		};

		assert!(matches!(write(&path, &colored_triangle(), &cfg), Err(BinMeshExportError::IO { .. })));
		assert!(!path.exists());
	}

	#[test]
	fn test_read_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(read(dir.path().join("nope.bin")), Err(BinMeshImportError::IO { .. })));
	}
}
