//! Ready-made skyline scene: four weather kinds over a city silhouette.
//!
//! Low `u` is a clear day with sun and birds, high `u` a storm with lightning over
//! factories. The tables double as a reference for writing custom catalogs.
use crate::catalog::{
    Band, ConditionKind, KindCatalog, MixAnchor, QuotaAnchor, SceneTables, ShapeGroup, ShapeId,
    ShapeMeta, Variant,
};
use crate::compose::{ComposeConfig, EnsureShapeAtExtreme, SceneComposer};
use crate::error::Result;
use crate::grid::{ForbiddenRects, FractionalRect, GridSpec};
use crate::pool::DensityCurve;

/// Control value up to which the composer guarantees a sun.
pub const SUN_GUARANTEE_MAX_U: f32 = 0.1;

/// Bands, metadata, catalogs and kind mix of the skyline scene.
pub fn skyline_tables() -> SceneTables {
    use ShapeId::*;

    let clear = KindCatalog::new(vec![
        Variant::new(Sun, 1, 1),
        Variant::new(Bird, 1, 1),
        Variant::new(House, 1, 1),
        Variant::new(Tree, 1, 1),
    ])
    .with_anchor(
        QuotaAnchor::new(0.0)
            .capped(Sun, 1)
            .capped(Bird, 3)
            .unbounded(House)
            .unbounded(Tree),
    )
    .with_anchor(
        QuotaAnchor::new(0.5)
            .capped(Sun, 0)
            .capped(Bird, 1)
            .unbounded(House)
            .unbounded(Tree),
    )
    .with_anchor(
        QuotaAnchor::new(1.0)
            .capped(Sun, 0)
            .capped(Bird, 0)
            .unbounded(House)
            .unbounded(Tree),
    );

    let cloudy = KindCatalog::new(vec![
        Variant::new(Cloud, 2, 1),
        Variant::new(House, 1, 1),
        Variant::new(Car, 2, 1),
        Variant::new(Tree, 1, 1),
    ])
    .with_anchor(
        QuotaAnchor::new(0.0)
            .capped(Cloud, 2)
            .capped(Car, 2)
            .unbounded(House)
            .unbounded(Tree),
    )
    .with_anchor(
        QuotaAnchor::new(1.0)
            .capped(Cloud, 5)
            .capped(Car, 1)
            .unbounded(House)
            .unbounded(Tree),
    );

    let rainy = KindCatalog::new(vec![
        Variant::new(RainCloud, 2, 1),
        Variant::new(Tower, 1, 3),
        Variant::new(Bus, 3, 1),
        Variant::new(Car, 2, 1),
    ])
    .with_anchor(
        QuotaAnchor::new(0.0)
            .capped(RainCloud, 2)
            .capped(Bus, 1)
            .unbounded(Tower)
            .unbounded(Car),
    )
    .with_anchor(
        QuotaAnchor::new(1.0)
            .capped(RainCloud, 4)
            .capped(Bus, 2)
            .unbounded(Tower)
            .unbounded(Car),
    );

    let stormy = KindCatalog::new(vec![
        Variant::new(StormCloud, 3, 1),
        Variant::new(Lightning, 1, 2),
        Variant::new(Factory, 2, 2),
        Variant::new(Tower, 1, 3),
    ])
    .with_anchor(
        QuotaAnchor::new(0.0)
            .capped(StormCloud, 1)
            .capped(Lightning, 0)
            .unbounded(Factory)
            .unbounded(Tower),
    )
    .with_anchor(
        QuotaAnchor::new(1.0)
            .capped(StormCloud, 3)
            .capped(Lightning, 2)
            .unbounded(Factory)
            .unbounded(Tower),
    );

    SceneTables::new()
        .with_kind(ConditionKind::Clear, clear)
        .with_kind(ConditionKind::Cloudy, cloudy)
        .with_kind(ConditionKind::Rainy, rainy)
        .with_kind(ConditionKind::Stormy, stormy)
        .with_mix(MixAnchor::new(0.0, [10.0, 2.0, 0.0, 0.0]))
        .with_mix(MixAnchor::new(0.35, [4.0, 8.0, 2.0, 0.0]))
        .with_mix(MixAnchor::new(0.7, [1.0, 4.0, 8.0, 3.0]))
        .with_mix(MixAnchor::new(1.0, [0.0, 2.0, 4.0, 10.0]))
        .with_shape(Sun, Band::new(0.0, 0.35), ShapeMeta::new(ShapeGroup::Sky, 8.0))
        .with_shape(
            Bird,
            Band::new(0.05, 0.5),
            ShapeMeta::new(ShapeGroup::Fauna, 2.5).decorative(),
        )
        .with_shape(Cloud, Band::new(0.0, 0.4), ShapeMeta::new(ShapeGroup::Cloud, 3.0))
        .with_shape(
            RainCloud,
            Band::new(0.0, 0.4),
            ShapeMeta::new(ShapeGroup::Cloud, 3.0),
        )
        .with_shape(
            StormCloud,
            Band::new(0.0, 0.35),
            ShapeMeta::new(ShapeGroup::Cloud, 3.5),
        )
        .with_shape(
            Lightning,
            Band::new(0.2, 0.7),
            ShapeMeta::new(ShapeGroup::Weather, 4.0),
        )
        .with_shape(
            House,
            Band::new(0.55, 1.0),
            ShapeMeta::new(ShapeGroup::Building, 1.5),
        )
        .with_shape(
            Tower,
            Band::new(0.35, 1.0),
            ShapeMeta::new(ShapeGroup::Building, 2.0),
        )
        .with_shape(
            Factory,
            Band::new(0.5, 1.0),
            ShapeMeta::new(ShapeGroup::Building, 3.0),
        )
        .with_shape(
            Tree,
            Band::new(0.6, 1.0),
            ShapeMeta::new(ShapeGroup::Nature, 1.5).decorative(),
        )
        .with_shape(Car, Band::new(0.85, 1.0), ShapeMeta::new(ShapeGroup::Vehicle, 2.0))
        .with_shape(Bus, Band::new(0.85, 1.0), ShapeMeta::new(ShapeGroup::Vehicle, 3.0))
}

/// Twelve rows over the top 85% of the canvas, with a title area kept clear.
pub fn skyline_grid() -> GridSpec {
    GridSpec::new(12, 0.85).with_forbidden(ForbiddenRects(vec![FractionalRect::centered(
        0.3, 0.2, 0.45,
    )]))
}

pub fn skyline_config() -> ComposeConfig {
    ComposeConfig::new(skyline_grid()).with_salt(0x5C3E)
}

/// Pool grows from 14 members on a clear day to 34 in a storm.
pub fn skyline_density() -> DensityCurve {
    DensityCurve::new()
        .with_anchor(0.0, 14.0)
        .with_anchor(0.5, 24.0)
        .with_anchor(1.0, 34.0)
}

/// Tables and config of the skyline scene, both valid.
pub fn skyline() -> (SceneTables, ComposeConfig) {
    (skyline_tables(), skyline_config())
}

/// Composer over the skyline tables that always shows a sun near `u = 0`.
pub fn skyline_composer() -> Result<SceneComposer> {
    Ok(
        SceneComposer::try_new(skyline_tables(), skyline_config())?.with_post_fix(
            EnsureShapeAtExtreme::new(ShapeId::Sun, SUN_GUARANTEE_MAX_U),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_interpolates_between_anchors() {
        let density = skyline_density();
        density.validate().unwrap();
        assert_eq!(density.desired_size(0.0), 14);
        assert_eq!(density.desired_size(0.25), 19);
        assert_eq!(density.desired_size(1.0), 34);
        assert_eq!(density.desired_size(7.0), 34);
    }

    #[test]
    fn every_shape_has_band_and_meta() {
        let tables = skyline_tables();
        for shape in ShapeId::ALL {
            assert!(tables.band(shape).is_ok(), "{shape}");
            assert!(tables.meta(shape).is_ok(), "{shape}");
        }
    }

    #[test]
    fn config_is_valid() {
        let (tables, config) = skyline();
        tables.validate().unwrap();
        config.validate().unwrap();
        assert!(skyline_composer().is_ok());
    }
}
