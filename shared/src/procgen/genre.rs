//! Genre presets (§4.2): a fixed set of content-generation parameter
//! bundles, with blending support.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Fantasy,
    SciFi,
    Horror,
    Cyberpunk,
    PostApocalyptic,
}

impl Genre {
    pub const ALL: [Genre; 5] = [
        Genre::Fantasy,
        Genre::SciFi,
        Genre::Horror,
        Genre::Cyberpunk,
        Genre::PostApocalyptic,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Genre::Fantasy => "fantasy",
            Genre::SciFi => "sci-fi",
            Genre::Horror => "horror",
            Genre::Cyberpunk => "cyberpunk",
            Genre::PostApocalyptic => "post-apocalyptic",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Genre> {
        Genre::ALL.into_iter().find(|g| g.tag() == tag)
    }

    /// Ambient weather options this genre can roll from; consulted by the
    /// terrain/quest generators, never from wall-clock or OS randomness.
    pub fn weather_options(&self) -> &'static [&'static str] {
        match self {
            Genre::Fantasy => &["clear", "rain", "fog"],
            Genre::SciFi => &["clear", "ion-storm", "vacuum"],
            Genre::Horror => &["fog", "overcast", "bloodmoon"],
            Genre::Cyberpunk => &["acid-rain", "neon-haze", "smog"],
            Genre::PostApocalyptic => &["dust-storm", "ashfall", "clear"],
        }
    }

    pub fn monster_archetypes(&self) -> &'static [&'static str] {
        match self {
            Genre::Fantasy => &["goblin", "skeleton", "dire_wolf", "troll"],
            Genre::SciFi => &["drone", "xenomorph", "rogue_ai", "void_crawler"],
            Genre::Horror => &["revenant", "stalker", "shade", "abomination"],
            Genre::Cyberpunk => &["enforcer_bot", "street_ganger", "ice_daemon"],
            Genre::PostApocalyptic => &["raider", "mutant", "scavenger_bot"],
        }
    }

    pub fn item_naming_table(&self) -> &'static [&'static str] {
        match self {
            Genre::Fantasy => &["Rusted", "Enchanted", "Ancient", "Runed"],
            Genre::SciFi => &["Plasma", "Quantum", "Ionized", "Synthetic"],
            Genre::Horror => &["Cursed", "Blighted", "Whispering", "Hollow"],
            Genre::Cyberpunk => &["Chrome", "Hacked", "Overclocked", "Black-market"],
            Genre::PostApocalyptic => &["Scavenged", "Patchwork", "Irradiated", "Salvaged"],
        }
    }

    pub fn spell_schools(&self) -> &'static [&'static str] {
        match self {
            Genre::Fantasy => &["evocation", "abjuration", "necromancy"],
            Genre::SciFi => &["ballistics", "nanotech", "gravimetrics"],
            Genre::Horror => &["dread", "corruption", "sanity_warp"],
            Genre::Cyberpunk => &["ice_breaking", "wetware", "emp"],
            Genre::PostApocalyptic => &["chem", "radiation", "scavenging"],
        }
    }

    /// A weight in `[0, 1]` for how much genre `a` dominates a blend with
    /// genre `b`. Blending picks whichever genre's table wins a weighted
    /// coin flip per generated artifact, keeping determinism intact since
    /// the coin flip draws from the caller's seeded RNG.
    pub fn blend_pick<'a>(a: &'a Genre, b: &'a Genre, weight_a: f64, roll: f64) -> &'a Genre {
        if roll < weight_a.clamp(0.0, 1.0) {
            a
        } else {
            b
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_pick_is_deterministic_given_the_same_roll() {
        let a = Genre::Fantasy;
        let b = Genre::Cyberpunk;
        assert_eq!(Genre::blend_pick(&a, &b, 0.5, 0.1), &a);
        assert_eq!(Genre::blend_pick(&a, &b, 0.5, 0.9), &b);
    }

    #[test]
    fn blend_pick_weight_extremes_always_pick_one_side() {
        let a = Genre::Horror;
        let b = Genre::SciFi;
        for roll in [0.0, 0.25, 0.5, 0.75, 0.999] {
            assert_eq!(Genre::blend_pick(&a, &b, 1.0, roll), &a);
            assert_eq!(Genre::blend_pick(&a, &b, 0.0, roll), &b);
        }
    }
}
