use thiserror::Error;

use ultraviolet::vec::{
	Vec2,
	Vec3
};

use crate::color::Color;

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
	pub position: Vec3,
	pub normal: Vec3,
	pub color: Option<Color>,
	pub uv: Option<Vec2>,
}

impl Vertex {
	pub fn new(position: Vec3, normal: Vec3) -> Vertex {
		Vertex {
			position: position,
			normal: normal,
			color: None,
			uv: None,
		}
	}

	pub fn with_color(mut self, color: Color) -> Vertex {
		self.color = Some(color);
		self
	}

	pub fn with_uv(mut self, uv: Vec2) -> Vertex {
		self.uv = Some(uv);
		self
	}
}

/// Triangle as three vertex indices, in winding order
pub type Face = [u32; 3];

#[derive(Clone, Debug, Error, PartialEq)]
pub enum MeshError {
	#[error("Mesh has no vertices")]
	Empty,
	#[error("Mesh has {0} vertices, more than a 32-bit count can hold")]
	TooManyVertices(usize),
	#[error("Mesh has {0} faces, more than a 32-bit index count can hold")]
	TooManyFaces(usize),
	#[error("Face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
	FaceIndex {
		face: usize,
		index: u32,
		vertex_count: usize,
	},
	#[error("Attribute {0} is present on some vertices but not all")]
	PartialAttribute(&'static str),
}

/// Resolved triangle mesh
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
	pub vertices: Vec<Vertex>,
	pub faces: Vec<Face>,
}

impl Mesh {
	pub fn new(vertices: Vec<Vertex>, faces: Vec<Face>) -> Mesh {
		Mesh {
			vertices: vertices,
			faces: faces,
		}
	}

	/// Returns `true` if every vertex carries a color
	pub fn has_colors(&self) -> bool {
		!self.vertices.is_empty() && self.vertices.iter().all(|v| v.color.is_some())
	}

	/// Returns `true` if every vertex carries a UV coordinate
	pub fn has_uvs(&self) -> bool {
		!self.vertices.is_empty() && self.vertices.iter().all(|v| v.uv.is_some())
	}

	/// Checks the mesh can be stored in a 32-bit indexed container
	pub fn validate(&self) -> Result<(), MeshError> {
		let vertex_count = self.vertices.len();

		if vertex_count == 0 {
			return Err(MeshError::Empty);
		}

		if vertex_count > u32::MAX as usize {
			return Err(MeshError::TooManyVertices(vertex_count));
		}

		if self.faces.len() > (u32::MAX / 3) as usize {
			return Err(MeshError::TooManyFaces(self.faces.len()));
		}

		let colored = self.vertices.iter().filter(|v| v.color.is_some()).count();
		if colored != 0 && colored != vertex_count {
			return Err(MeshError::PartialAttribute("color"));
		}

		let mapped = self.vertices.iter().filter(|v| v.uv.is_some()).count();
		if mapped != 0 && mapped != vertex_count {
			return Err(MeshError::PartialAttribute("uv"));
		}

		for (i, face) in self.faces.iter().enumerate() {
			for index in face.iter() {
				if *index as usize >= vertex_count {
					return Err(MeshError::FaceIndex {
						face: i,
						index: *index,
						vertex_count: vertex_count,
					});
				}
			}
		}

		Ok(())
	}
}
