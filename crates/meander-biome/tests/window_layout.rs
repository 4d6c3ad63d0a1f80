use std::sync::Arc;

use meander_biome::{
    BiomeFeatures, BiomeId, BiomeRegistry, BiomeWindow, BiomeWindowConfig, Direction,
    default_registry,
};
use meander_layout::{
    MeanderParams, MeanderSampler, PathLayoutEngine, SpawnKind, SpawnRequest, StepStatus,
};

fn fixed_registry(lengths: &[f64]) -> BiomeRegistry {
    let mut registry = BiomeRegistry::new();
    for (i, &len) in lengths.iter().enumerate() {
        registry
            .register(BiomeFeatures::new(format!("b{i}")).with_length(len, len))
            .unwrap();
    }
    registry
}

fn fixed_window(lengths: &[f64], seed: u64) -> BiomeWindow {
    BiomeWindow::new(fixed_registry(lengths), BiomeId(0), seed, BiomeWindowConfig::default())
        .unwrap()
}

fn catalog_window(seed: u64) -> BiomeWindow {
    let (registry, filler) = default_registry().unwrap();
    BiomeWindow::new(registry, filler, seed, BiomeWindowConfig::default()).unwrap()
}

#[test]
fn test_contiguity_and_coverage_while_scrolling() {
    let mut window = catalog_window(11);
    let mut center = 0.0;
    for step in 0..300 {
        // Mostly forward, with occasional reversals.
        center += if step % 37 < 30 { 97.0 } else { -211.0 };
        window.ensure_window(center, 2000.0);

        let instances: Vec<_> = window.instances().collect();
        let n = instances.len();
        for pair in instances.windows(2) {
            assert_eq!(pair[0].z_max(), pair[1].z_min(), "gap at step {step}");
        }
        for inst in &instances {
            assert!(inst.z_min() < inst.z_max());
        }
        assert!(
            instances[n - 2].z_max() >= center + 2000.0,
            "positive margin lost at step {step}"
        );
        assert!(
            instances[1].z_min() <= center - 2000.0,
            "negative margin lost at step {step}"
        );
    }
}

#[test]
fn test_half_open_membership() {
    let window = catalog_window(3);
    let instances: Vec<_> = window.instances().cloned().collect();
    for inst in &instances {
        let mid = 0.5 * (inst.z_min() + inst.z_max());
        assert!(Arc::ptr_eq(window.instance_at(mid), inst));
        assert!(Arc::ptr_eq(window.instance_at(inst.z_max()), inst));
    }
    for pair in instances.windows(2) {
        assert!(
            Arc::ptr_eq(window.instance_at(pair[1].z_min()), &pair[0]),
            "a shared boundary belongs to the lower instance"
        );
    }
    let first = &instances[0];
    assert!(Arc::ptr_eq(window.instance_at(first.z_min()), first));
}

#[test]
fn test_deck_alternation_from_fresh_window() {
    let window = fixed_window(&[100.0, 100.0, 100.0, 100.0], 5);
    for direction in [Direction::Positive, Direction::Negative] {
        let mut run: Vec<_> = window
            .instances()
            .filter(|i| i.key().direction == direction)
            .collect();
        run.sort_by_key(|i| i.key().ordinal);
        assert!(run.len() >= 10, "only {} instances in {direction:?}", run.len());
        for (n, inst) in run.iter().take(10).enumerate() {
            assert_eq!(inst.key().ordinal, n as u64);
            if n % 2 == 0 {
                assert_eq!(inst.biome(), BiomeId(0), "draw {n} must be the filler");
            } else {
                assert_ne!(inst.biome(), BiomeId(0), "draw {n} must not be the filler");
            }
        }
    }
}

#[test]
fn test_blend_weights_at_and_near_boundary() {
    let window = fixed_window(&[1000.0, 1000.0], 1);
    let below = window.instance_at(999.0).clone();
    let above = window.instance_at(1001.0).clone();

    let at = window.blend_weights(1000.0);
    assert!((at.w1 - 0.5).abs() < 1e-12 && (at.w2 - 0.5).abs() < 1e-12);

    let inside = window.blend_weights(1010.0);
    assert!(Arc::ptr_eq(&inside.primary, &above));
    assert!(Arc::ptr_eq(inside.secondary.as_ref().unwrap(), &below));
    assert!((inside.w1 - 0.7).abs() < 1e-12, "w1 = {}", inside.w1);
    assert!((inside.w2 - 0.3).abs() < 1e-12, "w2 = {}", inside.w2);

    let symmetric = window.blend_weights(990.0);
    assert!(Arc::ptr_eq(&symmetric.primary, &below));
    assert!((symmetric.w1 - 0.7).abs() < 1e-12);

    let far = window.blend_weights(1030.0);
    assert!(far.secondary.is_none());
    assert_eq!(far.w1, 1.0);
}

#[test]
fn test_segments_tile_any_range() {
    let window = catalog_window(21);
    let ranges = [
        (-1900.0, 1900.0),
        (1900.0, -1900.0),
        (0.0, 1.0),
        (-3.5, 1500.0),
        (1200.0, 1199.0),
    ];
    for (a, b) in ranges {
        let segs = window.feature_segments(a, b);
        assert!(!segs.is_empty());
        assert_eq!(segs[0].z_start, a);
        assert_eq!(segs[segs.len() - 1].z_end, b);
        for pair in segs.windows(2) {
            assert_eq!(pair[0].z_end, pair[1].z_start, "segments of ({a}, {b}) not contiguous");
        }
        for s in &segs {
            let (lo, hi) = (s.z_start.min(s.z_end), s.z_start.max(s.z_end));
            assert!(lo >= s.biome_z_min && hi <= s.biome_z_max);
        }
    }
}

#[test]
fn test_range_inside_one_instance_is_one_segment() {
    let window = fixed_window(&[3000.0], 9);
    let segs = window.feature_segments(-1000.0, -500.0);
    assert_eq!(segs.len(), 1);
    assert_eq!((segs[0].z_start, segs[0].z_end), (-1000.0, -500.0));
    assert_eq!((segs[0].biome_z_min, segs[0].biome_z_max), (-3000.0, 0.0));
    assert!(Arc::ptr_eq(segs[0].features(), window.instance_at(-750.0).features()));

    let reversed = window.feature_segments(-500.0, -1000.0);
    assert_eq!(reversed.len(), 1);
    assert_eq!((reversed[0].z_start, reversed[0].z_end), (-500.0, -1000.0));
}

#[test]
fn test_same_seed_same_world() {
    let summary = |w: &BiomeWindow| -> Vec<(BiomeId, f64, f64)> {
        w.instances().map(|i| (i.biome(), i.z_min(), i.z_max())).collect()
    };
    assert_eq!(summary(&catalog_window(77)), summary(&catalog_window(77)));
    assert_ne!(summary(&catalog_window(77)), summary(&catalog_window(78)));
}

#[test]
fn test_instance_layout_cached_and_populated_incrementally() {
    let window = catalog_window(4);
    let engine = PathLayoutEngine::default();
    let sampler = MeanderSampler::new(MeanderParams::default());

    let inst = window.instance_at(500.0).clone();
    let layout = inst.layout(&engine, &sampler);
    assert!(Arc::ptr_eq(&layout, &inst.layout(&engine, &sampler)));
    assert!(!layout.is_empty());

    let sections = &layout.sections;
    assert_eq!(sections[0].i_start, 0);
    assert_eq!(sections[sections.len() - 1].i_end, layout.path.len() - 1);
    for p in &layout.path {
        assert!(p.boat_offset.abs() <= p.sample.bank_dist - 5.0 + 1e-9);
    }

    let mut all_at_once: Vec<SpawnRequest> = Vec::new();
    inst.populator(&engine, &sampler)
        .run_to_completion(usize::MAX, &mut |req| all_at_once.push(req));

    let mut populator = inst.populator(&engine, &sampler);
    let mut chunked: Vec<SpawnRequest> = Vec::new();
    let mut steps = 0;
    loop {
        let before = chunked.len();
        let status = populator.step(7, &mut |req| chunked.push(req));
        assert!(chunked.len() - before <= 7);
        steps += 1;
        if status == StepStatus::Done {
            break;
        }
    }
    assert_eq!(chunked, all_at_once, "chunked population must match a single pass");
    assert_eq!(chunked.len(), populator.total());
    assert!(steps >= chunked.len() / 7);
    assert!(chunked.iter().any(|r| r.kind == SpawnKind::Placement));
}

#[test]
fn test_layout_survives_prune_and_regrowth() {
    let mut window = catalog_window(8);
    let engine = PathLayoutEngine::default();
    let sampler = MeanderSampler::new(MeanderParams::default());

    let before = window.instance_at(100.0).clone();
    let layout_before = before.layout(&engine, &sampler);

    window.ensure_window(50_000.0, 2000.0);
    assert!(window.instances().all(|i| !Arc::ptr_eq(i, &before)), "instance should be pruned");
    window.ensure_window(0.0, 2000.0);

    let after = window.instance_at(100.0).clone();
    assert_eq!(after.key(), before.key());
    assert_eq!((after.z_min(), after.z_max()), (before.z_min(), before.z_max()));
    assert!(after.cached_layout().is_none(), "regrown instance starts without a layout");
    assert_eq!(*after.layout(&engine, &sampler), *layout_before);
}
