use std::{
	env,
	fs::read,
	process::exit
};

use meshkit_models_binmesh::{
	binmesh::BinMesh,
	BinMeshImportError
};

fn main() -> Result<(), BinMeshImportError> {
	env_logger::init();

	let args: Vec<String> = env::args().collect();
	if args.len() < 2 {
		eprintln!("Usage: {} <mesh.bin>", args[0]);
		exit(1);
	}

	let data = read(&args[1])?;
	let model = BinMesh::read(&mut data.as_slice())?;

	println!("Version: {}", model.version() as u32);
	println!("Attributes: {:?}", model.attributes());
	println!("Vertices: {}", model.vertex_count());
	println!("Index type: {:?}", model.index_width());
	println!("Indices: {}", model.index_count());
	println!("Size: {} bytes", model.byte_len());

	Ok(())
}
