//! Foundational pack preloading for actor-translation converters.
//!
//! The actor-translation converters resolve documents out of a fixed set of
//! foundational packs, so those packs must be loadable before any pack whose
//! mapping uses one of the converters is installed. The preload runs once per
//! process, the first time such a converter is encountered.

/// Converter names that require the foundational packs below.
pub const NPC_TRANSLATOR_CONVERTERS: [&str; 4] = [
    "npc-portrait-path",
    "npc-token-translation",
    "npc-data-translation",
    "npc-item-translation",
];

/// Packs that must be resolvable before an actor-translation converter runs.
pub const NPC_DEPENDENCY_PACKS: [&str; 13] = [
    "pf2e.spells-srd",
    "pf2e.bestiary-ability-glossary-srd",
    "pf2e.conditionitems",
    "pf2e.actionspf2e",
    "pf2e.feats-srd",
    "pf2e.classfeatures",
    "pf2e.ancestryfeatures",
    "pf2e.ancestries",
    "pf2e.heritages",
    "pf2e.classes",
    "pf2e.backgrounds",
    "pf2e.deities",
    "pf2e.equipment-srd",
];
