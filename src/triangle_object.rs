use crate::error::{TracerError, TracerResult};
use crate::math::Transform;
use crate::scene::{Material, Triangle};
use glam::{vec3, Vec3};
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A named mesh placed in the scene with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCreation {
    pub file_name: &'static str,
    pub material: Material,
    pub transform: Transform,
}

/// Raw mesh as read from disk: vertex positions plus index triples.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub points: Vec<Vec3>,
    pub faces: Vec<[usize; 3]>,
}

pub fn load_objects(assets_dir: &Path, objects: &[ObjectCreation]) -> TracerResult<Vec<Triangle>> {
    let mut triangles = vec![];

    for object in objects {
        let path = assets_dir.join(object.file_name);
        let mesh = read_mesh(&path)?;
        let object_triangles = generate_triangles(&mesh, &object.transform, object.material);

        log::debug!(
            "loaded {} with {} triangles",
            path.display(),
            object_triangles.len()
        );

        triangles.extend(object_triangles);
    }

    Ok(triangles)
}

/// Reads `.obj` or `.stl` geometry. Anything else is parsed as OBJ.
pub fn read_mesh(path: &Path) -> TracerResult<MeshData> {
    // open first so a missing file is reported as such and not as a parse error
    let file = File::open(path).map_err(|e| TracerError::resource_missing(path, e))?;

    let is_stl = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"));

    if is_stl {
        read_stl(path, file)
    } else {
        drop(file);
        read_obj(path)
    }
}

fn read_obj(path: &Path) -> TracerResult<MeshData> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )
    .map_err(|e| TracerError::mesh_parse(path, e))?;

    let mut mesh = MeshData::default();

    // all models of the file share one vertex list
    for model in &models {
        let offset = mesh.points.len();
        let positions = &model.mesh.positions;

        mesh.points.extend(
            positions
                .chunks_exact(3)
                .map(|p| vec3(p[0], p[1], p[2])),
        );

        mesh.faces.extend(model.mesh.indices.chunks_exact(3).map(|face| {
            [
                offset + face[0] as usize,
                offset + face[1] as usize,
                offset + face[2] as usize,
            ]
        }));
    }

    validate_indices(path, mesh)
}

fn read_stl(path: &Path, file: File) -> TracerResult<MeshData> {
    let mut reader = BufReader::new(file);

    let stl_file = stl_io::read_stl(&mut reader).map_err(|e| TracerError::mesh_parse(path, e))?;

    let mesh = MeshData {
        points: stl_file
            .vertices
            .iter()
            .map(|&vertex| vec3(vertex[0], vertex[1], vertex[2]))
            .collect(),
        faces: stl_file.faces.iter().map(|face| face.vertices).collect(),
    };

    validate_indices(path, mesh)
}

fn validate_indices(path: &Path, mesh: MeshData) -> TracerResult<MeshData> {
    let vertex_count = mesh.points.len();

    if let Some(face) = mesh
        .faces
        .iter()
        .find(|face| face.iter().any(|&index| index >= vertex_count))
    {
        return Err(TracerError::mesh_parse(
            PathBuf::from(path),
            format!("face {face:?} references a vertex past {vertex_count}"),
        ));
    }

    Ok(mesh)
}

/// Moves every vertex into world space and builds the triangles from the
/// transformed positions, so normals reflect rotation and non-uniform scale.
pub fn generate_triangles(mesh: &MeshData, transform: &Transform, material: Material) -> Vec<Triangle> {
    let matrix = transform.matrix();

    let transformed_points: Vec<Vec3> = mesh
        .points
        .par_iter()
        .map(|&point| matrix.transform_point3(point))
        .collect();

    mesh.faces
        .par_iter()
        .map(|indexes| {
            Triangle::new(
                transformed_points[indexes[0]],
                transformed_points[indexes[1]],
                transformed_points[indexes[2]],
                material,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> MeshData {
        MeshData {
            points: vec![
                vec3(0.0, 0.0, 0.0),
                vec3(1.0, 0.0, 0.0),
                vec3(1.0, 1.0, 0.0),
                vec3(0.0, 1.0, 0.0),
            ],
            faces: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    #[test]
    fn normals_come_from_transformed_vertices() {
        let material = Material::new(1.0, 0.0, 1.0, 0.5);
        // rotate the +Z facing square a quarter turn about X so it faces -Y
        let transform = Transform::new([5.0, 0.0, 0.0], [90.0, 0.0, 0.0], [3.0, 0.5, 7.0]);
        let triangles = generate_triangles(&unit_square(), &transform, material);

        assert_eq!(triangles.len(), 2);
        for tri in &triangles {
            let n = Vec3::from(tri.normal);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!((n - vec3(0.0, -1.0, 0.0)).length() < 1e-5, "{n:?}");
            assert_eq!(tri.material, material);
        }
        assert!((Vec3::from(triangles[0].b) - vec3(8.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn skewed_scale_keeps_unit_normals() {
        let mesh = MeshData {
            points: vec![
                vec3(0.3, -1.0, 2.0),
                vec3(1.5, 0.2, -0.7),
                vec3(-0.4, 0.9, 0.1),
            ],
            faces: vec![[0, 1, 2]],
        };
        let transform = Transform::new([1.0, 2.0, 3.0], [10.0, 20.0, 30.0], [150.0, 0.5, 40.0]);
        let tri = generate_triangles(&mesh, &transform, Material::new(1.0, 1.0, 0.0, 0.5))[0];
        assert!((Vec3::from(tri.normal).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn missing_file_is_a_missing_resource() {
        let err = read_mesh(Path::new("does/not/exist.obj")).unwrap_err();
        assert!(matches!(err, TracerError::ResourceMissing { .. }), "{err}");
    }

    #[test]
    fn out_of_range_face_is_rejected() {
        let mesh = MeshData {
            points: vec![Vec3::ZERO; 2],
            faces: vec![[0, 1, 2]],
        };
        let err = validate_indices(Path::new("broken.obj"), mesh).unwrap_err();
        assert!(matches!(err, TracerError::MeshParse { .. }));
    }
}
