use std::path::Path;

use gltf::buffer::Data;
use gltf::mesh::Mode;
use nalgebra::Matrix4;

use crate::error::{Error, Result};
use crate::geometry::{Fp, Triangle, Vec3f, Vec4f};
use crate::scene::triangles_from_indexed_mesh;

/// Loads every triangle reachable from the scenes of a glTF file, in world
/// space, all tagged with `material_index`.
pub fn load_gltf_triangles(path: &Path, material_index: u32) -> Result<Vec<Triangle>> {
    let (document, buffers, _) = gltf::import(path).map_err(|error| Error::Gltf {
        path: path.to_path_buf(),
        error,
    })?;
    let default_transformation = Matrix4::<Fp>::identity();
    let mut triangles = vec![];
    for gltf_scene in document.scenes() {
        for node in gltf_scene.nodes() {
            read_triangles(
                &mut triangles,
                &buffers,
                &node,
                &default_transformation,
                material_index,
            )?;
        }
    }
    if triangles.is_empty() {
        return Err(Error::EmptyMesh {
            mesh: path.display().to_string(),
        });
    }
    Ok(triangles)
}

fn pp4_to_r3(v: Vec4f) -> Vec3f {
    Vec3f::new(v.x / v.w, v.y / v.w, v.z / v.w)
}

fn read_triangles(
    triangles: &mut Vec<Triangle>,
    buffers: &[Data],
    node: &gltf::Node,
    transformation: &Matrix4<Fp>,
    material_index: u32,
) -> Result<()> {
    // column-major
    let local_transformation_slice = node.transform().matrix();
    let local_transformation = Matrix4::from_fn(|y, x| local_transformation_slice[x][y] as Fp);
    let m_transformation = transformation * local_transformation;

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh #{}", mesh.index()));
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                log::warn!(
                    "{}: skipping primitive #{} with mode {:?}",
                    mesh_name,
                    primitive.index(),
                    primitive.mode()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let Some(positions) = reader.read_positions() else {
                log::warn!("{}: primitive #{} has no positions", mesh_name, primitive.index());
                continue;
            };
            let positions = positions
                .map(|p| {
                    let point = Vec4f::new(p[0] as Fp, p[1] as Fp, p[2] as Fp, 1.0);
                    pp4_to_r3(m_transformation * point)
                })
                .collect::<Vec<_>>();
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<_>>(),
                None => (0..positions.len() as u32).collect(),
            };
            triangles.extend(triangles_from_indexed_mesh(
                &mesh_name,
                &positions,
                &indices,
                material_index,
            )?);
        }
    }
    for child in node.children() {
        read_triangles(triangles, buffers, &child, &m_transformation, material_index)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "mesh": 0, "translation": [10.0, 0.0, 0.0] } ],
        "meshes": [ { "name": "tri", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1 } ] } ],
        "buffers": [ { "uri": "tri.bin", "byteLength": 44 } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    fn triangle_bin() -> Vec<u8> {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let indices: [u16; 4] = [0, 1, 2, 0];
        let mut bytes = bytemuck::cast_slice::<f32, u8>(&positions).to_vec();
        bytes.extend_from_slice(bytemuck::cast_slice(&indices));
        bytes
    }

    #[test]
    fn loads_transformed_triangle() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tri.bin"), triangle_bin()).unwrap();
        let path = dir.path().join("tri.gltf");
        fs::write(&path, TRIANGLE_GLTF).unwrap();

        let triangles = load_gltf_triangles(&path, 3).unwrap();
        assert_eq!(triangles.len(), 1);
        let t = triangles[0];
        assert_eq!(t.v0, Vec3f::new(10.0, 0.0, 0.0));
        assert_eq!(t.v1, Vec3f::new(11.0, 0.0, 0.0));
        assert_eq!(t.v2, Vec3f::new(10.0, 1.0, 0.0));
        assert_eq!(t.material_index, 3);
    }

    #[test]
    fn missing_file_is_a_gltf_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_gltf_triangles(&dir.path().join("absent.gltf"), 0);
        assert!(matches!(result, Err(Error::Gltf { .. })));
    }
}
