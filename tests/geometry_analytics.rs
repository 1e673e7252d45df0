// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Surface area and volume verification tests

use anyhow::Result;
use approx::assert_relative_eq;
use stepmesh::scene::SceneBuilder;
use stepmesh::{analyze, stats, surface_area, volume, RawMesh, ResourceTracker, SceneNode};

/// Closed, outward-wound cube of edge `l` with its min corner at `origin`
fn cube(l: f32, origin: [f32; 3]) -> RawMesh {
    let [x, y, z] = origin;
    let corners = [
        [0.0, 0.0, 0.0],
        [l, 0.0, 0.0],
        [l, l, 0.0],
        [0.0, l, 0.0],
        [0.0, 0.0, l],
        [l, 0.0, l],
        [l, l, l],
        [0.0, l, l],
    ];
    let positions = corners
        .iter()
        .flat_map(|c| [c[0] + x, c[1] + y, c[2] + z])
        .collect();
    let indices = vec![
        0, 2, 1, 0, 3, 2, // bottom
        4, 5, 6, 4, 6, 7, // top
        0, 1, 5, 0, 5, 4, // front
        3, 7, 6, 3, 6, 2, // back
        0, 4, 7, 0, 7, 3, // left
        1, 2, 6, 1, 6, 5, // right
    ];
    RawMesh::new(positions, indices)
}

fn scene_of(meshes: Vec<RawMesh>, tracker: &ResourceTracker) -> SceneNode {
    SceneBuilder::new().build_scene(meshes, tracker)
}

#[test]
fn test_cube_volume_and_surface_area() -> Result<()> {
    let tracker = ResourceTracker::new();
    let edge = 3.0;
    let scene = scene_of(vec![cube(edge, [0.0, 0.0, 0.0])], &tracker);
    let result = analyze(&scene);

    println!("Cube {edge}:");
    println!("  Volume: {:.6} (expected: 27)", result.volume);
    println!("  Surface area: {:.6} (expected: 54)", result.surface_area);

    assert_relative_eq!(result.surface_area, 54.0, max_relative = 1e-6);
    assert_relative_eq!(result.volume, 27.0, max_relative = 1e-6);
    assert_eq!(stats(&scene).triangle_count, 12);

    Ok(())
}

#[test]
fn test_volume_independent_of_position() {
    let tracker = ResourceTracker::new();
    let scene = scene_of(vec![cube(2.0, [10.5, -4.25, 7.0])], &tracker);

    assert_relative_eq!(volume(&scene), 8.0, max_relative = 1e-6);
    assert_relative_eq!(surface_area(&scene), 24.0, max_relative = 1e-6);
}

#[test]
fn test_metrics_sum_across_meshes() {
    let tracker = ResourceTracker::new();
    let scene = scene_of(
        vec![cube(1.0, [0.0, 0.0, 0.0]), cube(2.0, [5.0, 0.0, 0.0])],
        &tracker,
    );
    let result = analyze(&scene);

    assert_relative_eq!(result.volume, 9.0, max_relative = 1e-6);
    assert_relative_eq!(result.surface_area, 30.0, max_relative = 1e-6);
}

#[test]
fn test_triangle_order_does_not_matter() {
    let tracker = ResourceTracker::new();
    let original = cube(1.5, [0.25, 0.5, -1.0]);

    // Reverse the triangle list and rotate each triangle, keeping winding
    let mut shuffled = original.clone();
    shuffled.indices = original
        .indices
        .chunks(3)
        .rev()
        .flat_map(|t| [t[1], t[2], t[0]])
        .collect();

    let a = analyze(&scene_of(vec![original], &tracker));
    let b = analyze(&scene_of(vec![shuffled], &tracker));

    assert_relative_eq!(a.surface_area, b.surface_area, max_relative = 1e-12);
    assert_relative_eq!(a.volume, b.volume, max_relative = 1e-12);
}

#[test]
fn test_degenerate_triangle_adds_nothing() {
    let tracker = ResourceTracker::new();
    let clean = cube(2.0, [1.0, 2.0, 3.0]);

    let mut padded = clean.clone();
    // Second and third corners coincide
    padded.indices.extend_from_slice(&[0, 6, 6]);

    let a = analyze(&scene_of(vec![clean], &tracker));
    let b = analyze(&scene_of(vec![padded], &tracker));

    assert_eq!(a.surface_area, b.surface_area);
    assert_eq!(a.volume, b.volume);
}

#[test]
fn test_open_mesh_volume_is_not_an_error() {
    // Dropping the top face leaves an open box; the number is meaningless
    // but still finite and non-negative
    let tracker = ResourceTracker::new();
    let mut open = cube(1.0, [3.0, 3.0, 3.0]);
    open.indices.drain(6..12);

    let scene = scene_of(vec![open], &tracker);
    let v = volume(&scene);
    assert!(v.is_finite());
    assert!(v >= 0.0);
    assert_relative_eq!(surface_area(&scene), 5.0, max_relative = 1e-6);
}

#[test]
fn test_stats_json_serialization() -> Result<()> {
    let tracker = ResourceTracker::new();
    let scene = scene_of(vec![cube(4.0, [0.0, 0.0, 0.0])], &tracker);
    let scene_stats = stats(&scene);

    let json = serde_json::to_string_pretty(&scene_stats)?;
    println!("Stats JSON:\n{}", json);

    let deserialized: stepmesh::SceneStats = serde_json::from_str(&json)?;
    assert_eq!(deserialized.vertex_count, 8);
    assert_eq!(deserialized.mesh_count, 1);
    assert!((deserialized.metrics.volume - 64.0).abs() < 1e-6);
    assert_eq!(deserialized.bbox, [0.0, 0.0, 0.0, 4.0, 4.0, 4.0]);

    Ok(())
}
