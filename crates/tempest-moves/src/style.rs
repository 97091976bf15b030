//! Built-in move content: basic weapon moves and breathing-style forms.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tempest_combat::{AttackDefinition, CombatConfig, ConfigError, HitShape, MoveCatalog, ResourceKind};
use tempest_common::{CooldownCategory, MoveId};
use tracing::info;

use crate::technique::Technique;

/// A breathing style: a themed set of numbered forms paid for with breath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathingStyle {
    /// Flowing, multi-hit forms.
    Water,
    /// Heavy, fast-committing forms.
    Flame,
    /// Dash forms covering distance.
    Thunder,
    /// Area forms around the attacker.
    Wind,
    /// Slow, piercing forms.
    Stone,
}

/// One numbered form of a style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormSpec {
    /// Form number within the style (1-based).
    pub number: u8,
    /// Short snake_case name.
    pub name: &'static str,
    /// Archetype the form is built from.
    pub technique: Technique,
    /// Damage per hit.
    pub damage: f32,
    /// Breath cost.
    pub breath_cost: f32,
    /// Technique cooldown in ticks.
    pub cooldown: u32,
    /// Higher-numbered form offered after this one completes.
    pub follow_up: Option<u8>,
    /// Ticks the follow-up is offered for.
    pub follow_up_window: u32,
}

const fn form(number: u8, name: &'static str, technique: Technique, damage: f32, breath_cost: f32) -> FormSpec {
    FormSpec {
        number,
        name,
        technique,
        damage,
        breath_cost,
        cooldown: 30,
        follow_up: None,
        follow_up_window: 0,
    }
}

const fn chained(spec: FormSpec, next: u8, window: u32) -> FormSpec {
    FormSpec {
        cooldown: CHAINED_COOLDOWN,
        follow_up: Some(next),
        follow_up_window: window,
        ..spec
    }
}

// below the total duration of every chained form
const CHAINED_COOLDOWN: u32 = 12;

const TALL_SLASH: HitShape = HitShape::Box {
    half_extents: Vec3::new(0.5, 1.5, 0.75),
};

const WIDE_SLASH: HitShape = HitShape::Box {
    half_extents: Vec3::new(1.5, 0.5, 0.75),
};

const WATER: &[FormSpec] = &[
    form(1, "surface_slash", Technique::SingleSlash { shape: WIDE_SLASH }, 12.0, 10.0),
    chained(
        form(2, "water_wheel", Technique::SingleSlash { shape: TALL_SLASH }, 14.0, 15.0),
        3,
        15,
    ),
    form(3, "flowing_dance", Technique::BlitzDash { interval: 3, count: 4 }, 6.0, 20.0),
    chained(
        form(4, "striking_tide", Technique::DoubleSlash { interval: 4 }, 9.0, 20.0),
        5,
        12,
    ),
    form(5, "striking_tide_turn", Technique::DoubleSlash { interval: 3 }, 11.0, 10.0),
];

const FLAME: &[FormSpec] = &[
    form(1, "unknowing_fire", Technique::BlitzDash { interval: 2, count: 3 }, 14.0, 20.0),
    chained(
        form(2, "rising_sun", Technique::SingleSlash { shape: TALL_SLASH }, 18.0, 20.0),
        3,
        10,
    ),
    form(3, "blazing_universe", Technique::SingleSlash { shape: TALL_SLASH }, 24.0, 25.0),
    form(4, "flame_tiger", Technique::ExpandingWhirl { radius: 1.5, growth: 0.2 }, 20.0, 35.0),
];

const THUNDER: &[FormSpec] = &[
    form(1, "thunderclap", Technique::BlitzDash { interval: 1, count: 6 }, 10.0, 30.0),
    form(2, "rice_spirit", Technique::ExpandingWhirl { radius: 1.0, growth: 0.15 }, 9.0, 20.0),
    form(3, "heat_lightning", Technique::DoubleSlash { interval: 2 }, 8.0, 15.0),
];

const WIND: &[FormSpec] = &[
    form(1, "dust_whirlwind", Technique::ExpandingWhirl { radius: 1.2, growth: 0.25 }, 10.0, 25.0),
    chained(
        form(2, "purifying_claws", Technique::DoubleSlash { interval: 3 }, 9.0, 15.0),
        3,
        15,
    ),
    form(3, "storm_tree", Technique::BlitzDash { interval: 2, count: 5 }, 7.0, 20.0),
];

const STONE: &[FormSpec] = &[
    form(
        1,
        "serpentinite",
        Technique::PiercingThrust {
            length: 4.0,
            rehit_interval: 3,
            max_hits: 3,
        },
        9.0,
        20.0,
    ),
    form(2, "upper_smash", Technique::SingleSlash { shape: TALL_SLASH }, 28.0, 30.0),
    form(
        3,
        "arcs_of_justice",
        Technique::ExpandingWhirl {
            radius: 2.0,
            growth: 0.1,
        },
        16.0,
        35.0,
    ),
];

impl BreathingStyle {
    /// Every style.
    pub const ALL: [Self; 5] = [Self::Water, Self::Flame, Self::Thunder, Self::Wind, Self::Stone];

    /// Lowercase style name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Flame => "flame",
            Self::Thunder => "thunder",
            Self::Wind => "wind",
            Self::Stone => "stone",
        }
    }

    /// The style's forms in number order.
    #[must_use]
    pub const fn forms(self) -> &'static [FormSpec] {
        match self {
            Self::Water => WATER,
            Self::Flame => FLAME,
            Self::Thunder => THUNDER,
            Self::Wind => WIND,
            Self::Stone => STONE,
        }
    }

    /// Look up a form by number.
    #[must_use]
    pub fn form(self, number: u8) -> Option<&'static FormSpec> {
        self.forms().iter().find(|f| f.number == number)
    }

    /// Catalog ID of a form, e.g. `water.surface_slash`.
    #[must_use]
    pub fn move_id(self, form: &FormSpec) -> MoveId {
        MoveId::new(format!("{}.{}", self.name(), form.name))
    }

    /// Build every form. Follow-ups are shared with the forms they point at.
    pub fn definitions(self) -> Result<Vec<Arc<AttackDefinition>>, ConfigError> {
        let mut built: BTreeMap<u8, Arc<AttackDefinition>> = BTreeMap::new();
        // highest first, so follow-ups exist before the forms that chain into them
        for spec in self.forms().iter().rev() {
            let mut builder = spec
                .technique
                .builder(self.move_id(spec))
                .damage(spec.damage)
                .cost(ResourceKind::Breath, spec.breath_cost)
                .cooldown(spec.cooldown, CooldownCategory::TECHNIQUE);
            if let Some(next) = spec.follow_up.filter(|n| *n > spec.number).and_then(|n| built.get(&n)) {
                builder = builder.follow_up(Arc::clone(next), spec.follow_up_window);
            }
            built.insert(spec.number, builder.build_shared()?);
        }
        Ok(built.into_values().collect())
    }
}

impl fmt::Display for BreathingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stamina-paid weapon moves every agent has.
pub fn basic_moves() -> Result<Vec<AttackDefinition>, ConfigError> {
    Ok(vec![
        Technique::SingleSlash {
            shape: HitShape::cube(1.5),
        }
        .builder("basic.slash")
        .damage(8.0)
        .cost(ResourceKind::Stamina, 10.0)
        .cooldown(0, CooldownCategory::BASIC)
        .build()?,
        Technique::SingleSlash { shape: WIDE_SLASH }
            .builder("basic.heavy")
            .timing(10, 6, 14)
            .damage(18.0)
            .knockback_force(1.2)
            .hit_stun(20)
            .cost(ResourceKind::Stamina, 25.0)
            .cooldown(0, CooldownCategory::BASIC)
            .build()?,
        Technique::BlitzDash {
            interval: 2,
            count: 3,
        }
        .builder("basic.dash")
        .damage(4.0)
        .cost(ResourceKind::Stamina, 15.0)
        .cooldown(40, CooldownCategory::DASH)
        .build()?,
    ])
}

/// A catalog holding the basic moves and every form of every style.
///
/// Moves are checked against the pool capacities in `config`.
pub fn standard_catalog(config: &CombatConfig) -> Result<MoveCatalog, ConfigError> {
    let mut catalog = MoveCatalog::with_capacity_limits(config);
    for definition in basic_moves()? {
        catalog.register(definition)?;
    }
    for style in BreathingStyle::ALL {
        for definition in style.definitions()? {
            catalog.register_shared(definition)?;
        }
    }
    info!(moves = catalog.len(), "Standard move catalog built");
    Ok(catalog)
}
