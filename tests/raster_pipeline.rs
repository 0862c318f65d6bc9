//! End-to-end checks of the CPU reference pipeline: scene JSON through the
//! encoder, then clear, bin and rasterize.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use strokeraster::camera::Camera;
use strokeraster::encoding::{encode_scene, InstanceRecord, ShapeType};
use strokeraster::raster::cpu::{self, TileLists};
use strokeraster::raster::shapes::{hit_depth, Ray};
use strokeraster::raster::{tile_capacity, TileGrid, TransformUniform, MAX_FRAGMENTS};
use strokeraster::scene::prepass::resolve_mixtures;
use strokeraster::scene::{SceneFile, StrokeParams};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 0.0];

fn uniform(width: u32, height: u32, count: usize) -> TransformUniform {
    let camera = Camera {
        eye: Vec3::new(0.0, 0.0, 5.0),
        target: Vec3::ZERO,
        up: Vec3::Y,
        aspect: width as f32 / height as f32,
        fovy: 45.0,
        znear: 0.1,
        zfar: 100.0,
    };
    let grid = TileGrid::new(width, height);
    let count = count as u32;
    let (capacity, capped) = tile_capacity(grid, count, u64::MAX);
    assert!(!capped);
    TransformUniform::new(grid, count, capacity, &camera.matrices(), Vec3::ONE)
}

fn stroke(tag: &str, shape_params: Vec<f32>, color: [f32; 3], density: f32) -> StrokeParams {
    StrokeParams {
        shape_params,
        color_params: color.to_vec(),
        density_params: density,
        stroke_type: Some(tag.to_owned()),
    }
}

fn scene(strokes: Vec<StrokeParams>) -> SceneFile {
    let mut scene = SceneFile {
        shape_type: "ellipsoid".to_owned(),
        ..SceneFile::default()
    };
    for (i, s) in strokes.into_iter().enumerate() {
        let _ = scene.stroke_params.insert(format!("stroke.{i}"), s);
    }
    scene
}

fn encode(strokes: Vec<StrokeParams>) -> Vec<InstanceRecord> {
    let encoded = encode_scene(&scene(strokes));
    assert!(encoded.skipped.is_empty(), "{:?}", encoded.skipped);
    encoded.records
}

fn pixel(pixels: &[[f32; 4]], width: u32, x: u32, y: u32) -> [f32; 4] {
    pixels[(y * width + x) as usize]
}

#[test]
fn red_disc_on_white() {
    let records = encode(vec![stroke(
        "ellipsoid",
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        1.0,
    )]);
    let u = uniform(128, 128, records.len());
    let frame = cpu::render(&records, &u);

    assert_eq!(pixel(&frame.pixels, 128, 64, 64), [1.0, 0.0, 0.0, 1.0]);
    for (x, y) in [(0, 0), (127, 0), (0, 127), (127, 127)] {
        assert_eq!(pixel(&frame.pixels, 128, x, y), WHITE);
    }
    // Unit sphere at distance 5 under a 45 degree fov: radius ~31 px.
    assert_eq!(pixel(&frame.pixels, 128, 64, 10), WHITE);
    assert_eq!(pixel(&frame.pixels, 128, 64, 45), [1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn empty_scene_is_background() {
    let u = uniform(40, 24, 0);
    let frame = cpu::render(&[], &u);
    assert_eq!(frame.pixels.len(), 40 * 24);
    assert!(frame.pixels.iter().all(|&p| p == WHITE));
}

#[test]
fn coverage_is_monotonic_in_density() {
    let alpha_at_center = |density: f32| {
        let records = encode(vec![stroke(
            "cube",
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            density,
        )]);
        let u = uniform(32, 32, records.len());
        pixel(&cpu::render(&records, &u).pixels, 32, 16, 16)[3]
    };
    let alphas: Vec<f32> = [0.0, 0.25, 0.5, 1.0, 2.0]
        .into_iter()
        .map(alpha_at_center)
        .collect();
    assert_eq!(alphas[0], 0.0);
    assert!(alphas.windows(2).all(|w| w[0] <= w[1]), "{alphas:?}");
    assert_eq!(alphas[3], 1.0);
    assert_eq!(alphas[4], 1.0);
}

#[test]
fn nearer_opaque_stroke_hides_farther_one() {
    let records = encode(vec![
        stroke("ellipsoid", vec![0.5, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0], [0.0, 1.0, 0.0], 1.0),
        stroke("ellipsoid", vec![0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0], 1.0),
    ]);
    let u = uniform(64, 64, records.len());
    let frame = cpu::render(&records, &u);
    assert_eq!(pixel(&frame.pixels, 64, 32, 32), [1.0, 0.0, 0.0, 1.0]);
}

/// A seeded mix of every family scattered in front of the camera.
fn random_scene(rng: &mut StdRng, count: usize) -> Vec<InstanceRecord> {
    let mut strokes = Vec::with_capacity(count);
    for i in 0..count {
        let mut r = |lo: f32, hi: f32| rng.random_range(lo..hi);
        let rot = [r(-3.0, 3.0), r(-3.0, 3.0), r(-3.0, 3.0)];
        let pos = [r(-1.5, 1.5), r(-1.5, 1.5), r(-1.5, 1.5)];
        let color = [r(0.0, 1.0), r(0.0, 1.0), r(0.0, 1.0)];
        let density = r(0.2, 1.0);
        let s = r(0.1, 0.5);
        let posed = |mut head: Vec<f32>| {
            head.extend_from_slice(&rot);
            head.extend_from_slice(&pos);
            head
        };
        let (tag, shape_params): (&str, Vec<f32>) = match i % 10 {
            0 => ("ellipsoid_multiscale", posed(vec![s, r(0.1, 0.5), r(0.1, 0.5)])),
            1 => ("cube", posed(vec![s])),
            2 => ("tetrahedron", posed(vec![s])),
            3 => ("octahedron", posed(vec![s])),
            4 => ("round_cube", posed(vec![s, r(0.0, 1.0)])),
            5 => ("capsule", posed(vec![s * 0.5, s])),
            6 => ("cylinder", posed(vec![s * 0.5, s])),
            7 => ("line", posed(vec![s, r(-0.05, 0.05), s * 0.5])),
            8 => {
                let mut controls: Vec<f32> = (0..4)
                    .flat_map(|_| pos.map(|p| p + r(-0.5, 0.5)))
                    .collect();
                controls.extend_from_slice(&[r(0.02, 0.15), r(0.02, 0.15)]);
                ("bezier", controls)
            }
            _ => {
                let mut mix = vec![r(-2.0, 2.0), r(-2.0, 2.0), r(-2.0, 2.0)];
                mix.extend_from_slice(&[r(0.1, 0.5), r(-0.3, 0.3)]);
                mix.extend_from_slice(&[r(0.1, 0.4), r(0.1, 0.4), r(0.1, 0.4)]);
                ("mix", posed(mix))
            }
        };
        strokes.push(stroke(tag, shape_params, color, density));
    }
    encode(strokes)
}

#[test]
fn binning_has_no_false_negatives() {
    let mut rng = StdRng::seed_from_u64(7);
    let records = random_scene(&mut rng, 48);
    let (width, height) = (64, 48);
    let u = uniform(width, height, records.len());
    let grid = u.grid();
    let frame = cpu::render(&records, &u);

    for y in 0..height {
        for x in 0..width {
            let ray = Ray::through_pixel(u.inverse_mvp(), x, y, width, height);
            let candidates = frame.lists.candidates(grid.tile_of(x, y));
            for (index, (record, prepared)) in records.iter().zip(&frame.prepared).enumerate() {
                if hit_depth(record, prepared, &ray).is_some() {
                    assert!(
                        candidates.contains(&(index as u32)),
                        "instance {index} covers pixel ({x}, {y}) but is not binned"
                    );
                }
            }
        }
    }
}

#[test]
fn candidate_order_does_not_change_the_image() {
    let mut rng = StdRng::seed_from_u64(21);
    let records = random_scene(&mut rng, 40);
    let u = uniform(48, 48, records.len());
    let grid = u.grid();
    let reference = cpu::render(&records, &u);

    let shuffled = TileLists::new(grid.tile_count(), u.tile_capacity);
    for tile in 0..grid.tile_count() {
        let mut candidates = reference.lists.candidates(tile);
        candidates.shuffle(&mut rng);
        for index in candidates {
            shuffled.push(tile, index);
        }
    }
    let mut pixels = vec![WHITE; grid.pixel_count()];
    cpu::rasterize(&records, &reference.prepared, &shuffled, &u, &mut pixels);

    assert_eq!(pixels, reference.pixels);
}

#[test]
fn output_stays_in_unit_range() {
    let mut rng = StdRng::seed_from_u64(3);
    let records = random_scene(&mut rng, 64);
    let u = uniform(40, 40, records.len());
    let frame = cpu::render(&records, &u);
    for p in &frame.pixels {
        assert!(p.iter().all(|v| (0.0..=1.0 + 1e-5).contains(v)), "{p:?}");
    }
}

#[test]
fn binning_covers_bezier_and_mixture_strokes() {
    let mut rng = StdRng::seed_from_u64(11);
    let records = random_scene(&mut rng, 30);
    let (width, height) = (48, 48);
    let u = uniform(width, height, records.len());
    let frame = cpu::render(&records, &u);

    let mut hits = 0;
    for y in 0..height {
        for x in 0..width {
            let ray = Ray::through_pixel(u.inverse_mvp(), x, y, width, height);
            let candidates = frame.lists.candidates(u.grid().tile_of(x, y));
            for (index, (record, prepared)) in records.iter().zip(&frame.prepared).enumerate() {
                let tag = record.shape_type_id();
                let bezier = tag == ShapeType::Capsule.id() && record.stroke_id() % 10 == 8;
                let curved_or_mixed = bezier || tag == ShapeType::Mixture.id();
                if curved_or_mixed && hit_depth(record, prepared, &ray).is_some() {
                    hits += 1;
                    assert!(candidates.contains(&(index as u32)), "instance {index} at ({x}, {y})");
                }
            }
        }
    }
    assert!(hits > 0);
}

/// Render a mixture scene and its pre-passed rewrite side by side.
fn render_mix_and_resolved(logits: [f32; 3]) -> (Vec<[f32; 4]>, Vec<[f32; 4]>) {
    let mut shape_params = logits.to_vec();
    shape_params.extend_from_slice(&[0.8, 0.3, 0.6, 0.25, 0.3, 0.2, -0.4, 0.5, 0.1, -0.2, 0.0]);
    let mut mix = scene(vec![stroke("mix", shape_params, [0.2, 0.6, 0.9], 1.0)]);
    let mix_records = encode_scene(&mix).records;
    assert_eq!(resolve_mixtures(&mut mix), 1);
    let resolved = encode_scene(&mix);
    assert!(resolved.skipped.is_empty(), "{:?}", resolved.skipped);

    let u = uniform(64, 64, 1);
    (
        cpu::render(&mix_records, &u).pixels,
        cpu::render(&resolved.records, &u).pixels,
    )
}

#[test]
fn resolved_mixture_renders_like_the_mixture() {
    for logits in [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0]] {
        let (mix, resolved) = render_mix_and_resolved(logits);
        assert_eq!(mix, resolved, "{logits:?}");
    }

    // The line is sphere traced in both forms, from different bounds.
    let (mix, resolved) = render_mix_and_resolved([0.0, 0.0, 2.0]);
    assert_eq!(pixel(&mix, 64, 32, 32), pixel(&resolved, 64, 32, 32));
    assert!(pixel(&mix, 64, 32, 32)[3] > 0.0);
    let differing = mix
        .iter()
        .zip(&resolved)
        .filter(|(a, b)| a.iter().zip(b.iter()).any(|(x, y)| (x - y).abs() > 1e-3))
        .count();
    assert!(differing * 100 <= mix.len(), "{differing} pixels differ");
}

#[test]
fn only_the_nearest_fragments_are_composited() {
    let layers = 40;
    let strokes = (0..layers)
        .map(|i| {
            let z = -2.0 + i as f32 * 0.05;
            let far = i < layers - MAX_FRAGMENTS;
            let color = if far { [1.0, 0.0, 0.0] } else { [0.0, 1.0, 0.0] };
            stroke("ellipsoid", vec![0.5, 0.0, 0.0, 0.0, 0.0, 0.0, z], color, 0.05)
        })
        .collect();
    let records = encode(strokes);
    let u = uniform(32, 32, records.len());
    let [r, g, b, a] = pixel(&cpu::render(&records, &u).pixels, 32, 16, 16);

    let kept = 1.0 - 0.95_f32.powi(MAX_FRAGMENTS as i32);
    let all = 1.0 - 0.95_f32.powi(layers as i32);
    assert!((kept - all).abs() > 1e-2);
    assert!((a - kept).abs() < 1e-4, "{a} vs {kept}");
    assert!((r - (1.0 - kept)).abs() < 1e-4, "{r}");
    assert!((g - 1.0).abs() < 1e-4, "{g}");
    assert!((b - (1.0 - kept)).abs() < 1e-4, "{b}");
}
