//! Built-in biome set: a calm filler and a handful of themed biomes.

use glam::{Vec3, Vec4};
use meander_layout::{
    DecorationConfig, DecorationRule, EntityTag, ExplicitPlacement, LayoutConfig, PatternChoice,
    PatternConfig, PatternLogic, PlaceMode, StageConfig, TrackConfig,
};

use crate::features::{BiomeFeatures, SkyGradient};
use crate::registry::{BiomeId, BiomeRegistry, BiomeRegistryError};

/// Name of the filler biome interleaved between themed biomes.
pub const FILLER_BIOME: &str = "meadow";

fn tags(names: &[&str]) -> Vec<EntityTag> {
    names.iter().map(|&n| EntityTag::from(n)).collect()
}

fn stage(range: [f64; 2], sets: &[&[(&str, f64)]]) -> StageConfig {
    StageConfig::new(
        range,
        sets.iter()
            .map(|set| {
                set.iter()
                    .map(|&(name, weight)| PatternChoice::new(name, weight))
                    .collect()
            })
            .collect(),
    )
}

/// Registers the built-in biomes and returns the registry and filler id.
///
/// # Errors
///
/// Fails if a name is registered twice or a built-in layout does not validate.
pub fn default_registry() -> Result<(BiomeRegistry, BiomeId), BiomeRegistryError> {
    let mut registry = BiomeRegistry::new();
    let filler = registry.register(meadow())?;
    registry.register(canyon())?;
    registry.register(marsh())?;
    registry.register(rapids())?;
    registry.register(pine_forest())?;
    Ok((registry, filler))
}

fn meadow() -> BiomeFeatures {
    let layout = LayoutConfig::new()
        .with_pattern(
            "drift",
            PatternConfig::new(
                PatternLogic::Scatter,
                PlaceMode::Slalom,
                [0.3, 0.6],
                tags(&["log", "branch"]),
            ),
        )
        .with_pattern(
            "reeds",
            PatternConfig::new(
                PatternLogic::Sequence,
                PlaceMode::Shore,
                [0.5, 0.5],
                tags(&["reed"]),
            ),
        )
        .with_track(TrackConfig::Stages(vec![stage(
            [0.0, 1.0],
            &[&[("drift", 1.0)], &[("reeds", 1.0)]],
        )]))
        .with_water_tags(tags(&["log", "branch"]));

    BiomeFeatures::new(FILLER_BIOME)
        .with_length(1500.0, 1500.0)
        .with_ground_color(|p| {
            let t = (p.x.abs() / 200.0).min(1.0) as f32;
            Vec3::new(0.35, 0.6, 0.25).lerp(Vec3::new(0.45, 0.55, 0.3), t)
        })
        .with_fog(0.0015, 150.0, 1800.0)
        .with_layout(layout)
        .with_decorations(DecorationConfig::new(vec![DecorationRule::new(
            "willow",
            35.0,
            [4.0, 30.0],
        )]))
}

fn canyon() -> BiomeFeatures {
    let layout = LayoutConfig::new()
        .with_pattern(
            "boulders",
            PatternConfig::new(
                PatternLogic::Staggered,
                PlaceMode::Slalom,
                [0.8, 2.0],
                tags(&["boulder"]),
            )
            .with_counts(Some(2), Some(12)),
        )
        .with_pattern(
            "pillars",
            PatternConfig::new(
                PatternLogic::Gate,
                PlaceMode::Slalom,
                [0.3, 0.8],
                tags(&["pillar"]),
            )
            .with_counts(Some(1), None),
        )
        .with_pattern(
            "scree",
            PatternConfig::new(
                PatternLogic::Scatter,
                PlaceMode::Shore,
                [1.0, 1.5],
                tags(&["scree"]),
            ),
        )
        .with_track(TrackConfig::Stages(vec![
            stage([0.0, 0.6], &[&[("boulders", 3.0), ("pillars", 1.0)]]),
            stage([0.4, 1.0], &[&[("pillars", 2.0), ("boulders", 1.0)], &[("scree", 1.0)]]),
        ]))
        .with_track(TrackConfig::Explicit(vec![ExplicitPlacement {
            name: "arch".into(),
            place: PlaceMode::Path,
            at: 0.5,
            tag: EntityTag::from("stone_arch"),
        }]))
        .with_water_tags(tags(&["boulder", "pillar"]));

    BiomeFeatures::new("canyon")
        .with_length(1200.0, 2000.0)
        .with_flat_ground_color(Vec3::new(0.7, 0.45, 0.3))
        .with_screen_tint(Vec4::new(1.0, 0.6, 0.3, 0.08))
        .with_sky_palettes(
            SkyGradient::new(Vec3::new(0.05, 0.03, 0.06), Vec3::new(0.2, 0.1, 0.08)),
            SkyGradient::new(Vec3::new(0.45, 0.6, 0.85), Vec3::new(0.95, 0.75, 0.55)),
        )
        .with_fog(0.001, 300.0, 2500.0)
        .with_multipliers(1.6, 0.8)
        .with_layout(layout)
        .with_decorations(DecorationConfig::new(vec![
            DecorationRule::new("cliff", 25.0, [0.0, 10.0]),
            DecorationRule::new("cactus", 40.0, [12.0, 40.0]),
        ]))
}

fn marsh() -> BiomeFeatures {
    let layout = LayoutConfig::new()
        .with_pattern(
            "lilies",
            PatternConfig::new(
                PatternLogic::Sequence,
                PlaceMode::Path,
                [1.0, 1.0],
                tags(&["lily_pad"]),
            ),
        )
        .with_pattern(
            "crocodiles",
            PatternConfig::new(
                PatternLogic::Cluster,
                PlaceMode::Slalom,
                [0.4, 1.2],
                tags(&["crocodile"]),
            )
            .with_counts(Some(2), Some(6))
            .with_aggressiveness([0.2, 0.9]),
        )
        .with_pattern(
            "reeds",
            PatternConfig::new(
                PatternLogic::Scatter,
                PlaceMode::Shore,
                [2.0, 3.0],
                tags(&["reed", "cattail"]),
            ),
        )
        .with_track(TrackConfig::Stages(vec![stage(
            [0.0, 1.0],
            &[&[("lilies", 1.0), ("crocodiles", 1.0)]],
        )]))
        .with_track(TrackConfig::Stages(vec![stage([0.0, 1.0], &[&[("reeds", 1.0)]])]))
        .with_water_tags(tags(&["lily_pad", "crocodile"]));

    BiomeFeatures::new("marsh")
        .with_length(1000.0, 1600.0)
        .with_flat_ground_color(Vec3::new(0.3, 0.4, 0.2))
        .with_screen_tint(Vec4::new(0.4, 0.6, 0.3, 0.12))
        .with_fog(0.004, 60.0, 900.0)
        .with_multipliers(0.6, 1.3)
        .with_layout(layout)
        .with_decorations(DecorationConfig::new(vec![DecorationRule::new(
            "mangrove",
            20.0,
            [2.0, 18.0],
        )]))
}

fn rapids() -> BiomeFeatures {
    let layout = LayoutConfig::new()
        .with_pattern(
            "rocks",
            PatternConfig::new(
                PatternLogic::Scatter,
                PlaceMode::Slalom,
                [1.5, 4.0],
                tags(&["rock", "boulder"]),
            )
            .with_counts(Some(3), None),
        )
        .with_pattern(
            "buoys",
            PatternConfig::new(
                PatternLogic::Gate,
                PlaceMode::Slalom,
                [0.5, 1.0],
                tags(&["buoy"]),
            ),
        )
        .with_pattern(
            "whirlpool",
            PatternConfig::new(
                PatternLogic::Cluster,
                PlaceMode::Path,
                [0.2, 0.4],
                tags(&["whirlpool"]),
            )
            .with_counts(Some(1), Some(2))
            .with_aggressiveness([0.5, 1.0]),
        )
        .with_track(TrackConfig::Stages(vec![
            stage([0.0, 0.5], &[&[("buoys", 1.0)]]),
            stage([0.5, 1.0], &[&[("rocks", 2.0), ("whirlpool", 1.0)]]),
        ]))
        .with_water_tags(tags(&["rock", "boulder", "buoy", "whirlpool"]));

    BiomeFeatures::new("rapids")
        .with_length(800.0, 1300.0)
        .with_flat_ground_color(Vec3::new(0.45, 0.45, 0.4))
        .with_fog(0.002, 100.0, 1500.0)
        .with_multipliers(1.2, 0.7)
        .with_layout(layout)
}

fn pine_forest() -> BiomeFeatures {
    let layout = LayoutConfig::new()
        .with_pattern(
            "deer",
            PatternConfig::new(
                PatternLogic::Cluster,
                PlaceMode::Shore,
                [0.3, 0.6],
                tags(&["deer"]),
            )
            .with_counts(None, Some(4)),
        )
        .with_pattern(
            "logs",
            PatternConfig::new(
                PatternLogic::Staggered,
                PlaceMode::Slalom,
                [0.5, 1.0],
                tags(&["log"]),
            ),
        )
        .with_track(TrackConfig::Stages(vec![stage(
            [0.0, 1.0],
            &[&[("logs", 1.0)], &[("deer", 1.0)]],
        )]))
        .with_water_tags(tags(&["log"]));

    BiomeFeatures::new("pine_forest")
        .with_length(1200.0, 1800.0)
        .with_ground_color(|p| {
            let dapple = ((p.x * 0.05).sin() * (p.z * 0.05).cos()) as f32;
            Vec3::new(0.2, 0.35, 0.18) + Vec3::splat(0.04 * dapple)
        })
        .with_fog(0.003, 80.0, 1200.0)
        .with_multipliers(1.1, 1.0)
        .with_layout(layout)
        .with_decorations(DecorationConfig::new(vec![
            DecorationRule::new("pine", 12.0, [2.0, 35.0]),
            DecorationRule::new("boulder_moss", 45.0, [0.0, 6.0]),
        ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_contents() {
        let (registry, filler) = default_registry().unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get(filler).name(), FILLER_BIOME);
        assert_eq!(registry.lookup_by_name("rapids").map(|id| id.0), Some(3));
    }

    #[test]
    fn test_default_layouts_validate() {
        let (registry, _) = default_registry().unwrap();
        for id in registry.ids() {
            let features = registry.get(id);
            assert!(
                features.layout_config().validate().is_ok(),
                "{} has an invalid layout config",
                features.name()
            );
        }
    }

    #[test]
    fn test_filler_has_fixed_length() {
        let (registry, filler) = default_registry().unwrap();
        let (min, max) = registry.get(filler).length();
        assert_eq!(min, max);
    }
}
