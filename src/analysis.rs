// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Surface area and volume of imported scenes

use crate::scene::{BufferGeometry, SceneNode};
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Derived metrics of a scene, recomputed on demand
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Total surface area in square units
    pub surface_area: f64,
    /// Enclosed volume in cubic units
    pub volume: f64,
}

/// Scene statistics and analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneStats {
    #[serde(flatten)]
    pub metrics: AnalysisResult,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    pub mesh_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

impl SceneStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            metrics: AnalysisResult::default(),
            bbox: [0.0; 6],
            mesh_count: 0,
            vertex_count: 0,
            triangle_count: 0,
        }
    }

    /// Pretty print statistics
    pub fn print(&self) {
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║                  STEP IMPORT ANALYTICS                   ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!(
            "║ Volume:          {:>14.4} units³                 ║",
            self.metrics.volume
        );
        println!(
            "║ Surface Area:    {:>14.4} units²                 ║",
            self.metrics.surface_area
        );
        println!("║                                                          ║");
        println!("║ Bounding Box:                                            ║");
        println!(
            "║   Min: ({:>9.2}, {:>9.2}, {:>9.2})                  ║",
            self.bbox[0], self.bbox[1], self.bbox[2]
        );
        println!(
            "║   Max: ({:>9.2}, {:>9.2}, {:>9.2})                  ║",
            self.bbox[3], self.bbox[4], self.bbox[5]
        );
        println!("║                                                          ║");
        println!(
            "║ Meshes:          {:>10}                              ║",
            self.mesh_count
        );
        println!(
            "║ Vertices:        {:>10}                              ║",
            self.vertex_count
        );
        println!(
            "║ Triangles:       {:>10}                              ║",
            self.triangle_count
        );
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Area of triangle `(a, b, c)`
pub fn triangle_area(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Signed volume of the tetrahedron spanned by the origin and `(a, b, c)`
pub fn signed_tetrahedron_volume(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    // Rounding would otherwise leave a residue for collapsed triangles
    if a == b || b == c || a == c {
        return 0.0;
    }
    a.dot(&b.cross(c)) / 6.0
}

/// Surface area of one geometry
pub fn geometry_surface_area(geometry: &BufferGeometry) -> f64 {
    geometry
        .triangle_positions()
        .map(|[a, b, c]| triangle_area(&a, &b, &c))
        .sum()
}

/// Signed enclosed volume of one geometry (not made absolute)
pub fn geometry_signed_volume(geometry: &BufferGeometry) -> f64 {
    geometry
        .triangle_positions()
        .map(|[a, b, c]| signed_tetrahedron_volume(&a, &b, &c))
        .sum()
}

/// Total surface area of every triangle mesh in the tree.
///
/// Exact for any triangulated surface, open or closed.
pub fn surface_area(scene: &SceneNode) -> f64 {
    sum_per_mesh(scene, geometry_surface_area)
}

/// Volume enclosed by the tree's triangle meshes.
///
/// Sums signed tetrahedron volumes against the origin over all triangles of
/// all meshes and returns the absolute total.
///
/// # Precondition
///
/// The meshes must be closed and consistently wound. This is not checked:
/// on open or inconsistently wound meshes the result is a number without
/// physical meaning, not an error.
pub fn volume(scene: &SceneNode) -> f64 {
    sum_per_mesh(scene, geometry_signed_volume).abs()
}

/// Per-mesh values computed in parallel, added in tree order so the total
/// is bit-identical from run to run
fn sum_per_mesh(scene: &SceneNode, per_mesh: fn(&BufferGeometry) -> f64) -> f64 {
    let partials: Vec<f64> = scene
        .meshes()
        .par_iter()
        .map(|mesh| per_mesh(&mesh.geometry))
        .collect();
    partials.into_iter().sum()
}

/// Surface area and volume together
pub fn analyze(scene: &SceneNode) -> AnalysisResult {
    AnalysisResult {
        surface_area: surface_area(scene),
        volume: volume(scene),
    }
}

/// Full statistics: metrics, counts and bounding box
pub fn stats(scene: &SceneNode) -> SceneStats {
    let meshes = scene.meshes();
    if meshes.is_empty() {
        return SceneStats::empty();
    }

    let vertex_count = meshes.iter().map(|m| m.geometry.vertex_count()).sum();
    let triangle_count = meshes.iter().map(|m| m.geometry.triangle_count()).sum();

    SceneStats {
        metrics: analyze(scene),
        bbox: calculate_bounding_box(scene),
        mesh_count: meshes.len(),
        vertex_count,
        triangle_count,
    }
}

/// Calculate bounding box over every position of every mesh
fn calculate_bounding_box(scene: &SceneNode) -> [f64; 6] {
    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    let mut any = false;

    for mesh in scene.meshes() {
        for p in mesh.geometry.positions().chunks_exact(3) {
            any = true;
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis] as f64);
                max[axis] = max[axis].max(p[axis] as f64);
            }
        }
    }

    if !any {
        return [0.0; 6];
    }

    [min[0], min[1], min[2], max[0], max[1], max[2]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::RawMesh;
    use crate::resources::ResourceTracker;
    use crate::scene::SceneBuilder;
    use approx::assert_relative_eq;

    fn unit_square_open() -> RawMesh {
        RawMesh::new(
            vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 2.0, 2.0, 0.0, 0.0, 2.0, 0.0],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn test_open_surface_area() {
        let tracker = ResourceTracker::new();
        let scene = SceneBuilder::new().build_scene(vec![unit_square_open()], &tracker);
        assert_relative_eq!(surface_area(&scene), 4.0);
        // Flat and through the origin: every tetrahedron is flat
        assert_relative_eq!(volume(&scene), 0.0);
    }

    #[test]
    fn test_degenerate_triangle_contributes_nothing() {
        let a = Vector3::new(0.3, 1.7, -2.1);
        let c = Vector3::new(5.0, -0.25, 9.5);
        assert_eq!(triangle_area(&a, &a, &c), 0.0);
        assert_eq!(signed_tetrahedron_volume(&a, &a, &c), 0.0);
        assert_eq!(signed_tetrahedron_volume(&a, &c, &c), 0.0);
        assert_eq!(triangle_area(&a, &c, &c), 0.0);
    }

    #[test]
    fn test_multi_mesh_totals_are_reproducible() {
        let tracker = ResourceTracker::new();
        let meshes: Vec<_> = (0..64)
            .map(|i| {
                let s = 0.1 + i as f32 * 0.37;
                RawMesh::new(
                    vec![s, 0.3, 1.1, 2.0 * s, 0.7, -0.4, 0.2, s, 3.3, 1.0, 1.0, s],
                    vec![0, 1, 2, 0, 3, 1, 1, 3, 2, 2, 3, 0],
                )
            })
            .collect();
        let scene = SceneBuilder::new().build_scene(meshes, &tracker);

        let sequential_area: f64 = scene
            .meshes()
            .iter()
            .map(|m| geometry_surface_area(&m.geometry))
            .sum();
        let sequential_volume: f64 = scene
            .meshes()
            .iter()
            .map(|m| geometry_signed_volume(&m.geometry))
            .sum::<f64>()
            .abs();

        for _ in 0..16 {
            assert_eq!(surface_area(&scene).to_bits(), sequential_area.to_bits());
            assert_eq!(volume(&scene).to_bits(), sequential_volume.to_bits());
        }
    }

    #[test]
    fn test_empty_scene_stats() {
        let scene = SceneNode::group("empty", Vec::new());
        let stats = stats(&scene);
        assert_eq!(stats.mesh_count, 0);
        assert_eq!(stats.metrics, AnalysisResult::default());
    }

    #[test]
    fn test_stats_counts_and_bbox() {
        let tracker = ResourceTracker::new();
        let scene = SceneBuilder::new()
            .build_scene(vec![unit_square_open(), unit_square_open()], &tracker);
        let stats = stats(&scene);
        assert_eq!(stats.mesh_count, 2);
        assert_eq!(stats.vertex_count, 8);
        assert_eq!(stats.triangle_count, 4);
        assert_eq!(stats.bbox, [0.0, 0.0, 0.0, 2.0, 2.0, 0.0]);
        assert_relative_eq!(stats.metrics.surface_area, 8.0);
    }

    #[test]
    fn test_stats_json_flattens_metrics() {
        let mut stats = SceneStats::empty();
        stats.metrics.volume = 8.0;
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["volume"], 8.0);
        assert!(json.get("metrics").is_none());
    }
}
