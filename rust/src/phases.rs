//! Construction phases: canonical order, chapter lookup and inter-phase sequencing.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::graph::PhaseGroup;
use crate::models::{LinkType, Predecessor};

/// One of the 30 construction phases, declared in execution order.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SiteSetup,
    Demolition,
    Earthworks,
    Foundations,
    Structure,
    ExternalWalls,
    Roof,
    Waterproofing,
    InternalWalls,
    ExternalFrames,
    RoughPlumbing,
    RoughElectrical,
    RoughHvac,
    Telecommunications,
    Gas,
    FireSafety,
    Insulation,
    Plastering,
    Screed,
    Flooring,
    WallTiling,
    Ceilings,
    InternalCarpentry,
    Painting,
    FinishPlumbing,
    FinishElectrical,
    FinishHvac,
    Elevators,
    ExternalWorks,
    Cleanup,
}

impl Phase {
    /// Every phase in canonical execution order.
    pub const ALL: [Phase; 30] = [
        Phase::SiteSetup,
        Phase::Demolition,
        Phase::Earthworks,
        Phase::Foundations,
        Phase::Structure,
        Phase::ExternalWalls,
        Phase::Roof,
        Phase::Waterproofing,
        Phase::InternalWalls,
        Phase::ExternalFrames,
        Phase::RoughPlumbing,
        Phase::RoughElectrical,
        Phase::RoughHvac,
        Phase::Telecommunications,
        Phase::Gas,
        Phase::FireSafety,
        Phase::Insulation,
        Phase::Plastering,
        Phase::Screed,
        Phase::Flooring,
        Phase::WallTiling,
        Phase::Ceilings,
        Phase::InternalCarpentry,
        Phase::Painting,
        Phase::FinishPlumbing,
        Phase::FinishElectrical,
        Phase::FinishHvac,
        Phase::Elevators,
        Phase::ExternalWorks,
        Phase::Cleanup,
    ];

    /// Zero-based position in the execution order.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::SiteSetup => "site_setup",
            Phase::Demolition => "demolition",
            Phase::Earthworks => "earthworks",
            Phase::Foundations => "foundations",
            Phase::Structure => "structure",
            Phase::ExternalWalls => "external_walls",
            Phase::Roof => "roof",
            Phase::Waterproofing => "waterproofing",
            Phase::InternalWalls => "internal_walls",
            Phase::ExternalFrames => "external_frames",
            Phase::RoughPlumbing => "rough_plumbing",
            Phase::RoughElectrical => "rough_electrical",
            Phase::RoughHvac => "rough_hvac",
            Phase::Telecommunications => "telecommunications",
            Phase::Gas => "gas",
            Phase::FireSafety => "fire_safety",
            Phase::Insulation => "insulation",
            Phase::Plastering => "plastering",
            Phase::Screed => "screed",
            Phase::Flooring => "flooring",
            Phase::WallTiling => "wall_tiling",
            Phase::Ceilings => "ceilings",
            Phase::InternalCarpentry => "internal_carpentry",
            Phase::Painting => "painting",
            Phase::FinishPlumbing => "finish_plumbing",
            Phase::FinishElectrical => "finish_electrical",
            Phase::FinishHvac => "finish_hvac",
            Phase::Elevators => "elevators",
            Phase::ExternalWorks => "external_works",
            Phase::Cleanup => "cleanup",
        }
    }

    /// Human-readable name used for summary tasks.
    pub fn label(self) -> String {
        let name = self.as_str().replace('_', " ");
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => name,
        }
    }

    /// Name of the labor resource that works this phase.
    pub fn crew_name(self) -> String {
        format!("{} crew", self.label())
    }

    /// Whether multi-floor projects split this phase's articles per floor.
    pub fn is_staggered(self) -> bool {
        matches!(
            self,
            Phase::Structure
                | Phase::ExternalWalls
                | Phase::InternalWalls
                | Phase::RoughPlumbing
                | Phase::RoughElectrical
                | Phase::Plastering
        )
    }

    /// Phase for a WBS chapter: code table first, then chapter-name keywords.
    pub fn from_chapter(code: &str, name: &str) -> Option<Phase> {
        if let Some(key) = chapter_key(code) {
            if let Some((_, phase)) = CHAPTER_PHASES.iter().find(|(c, _)| *c == key) {
                // Masonry chapters cover both envelopes; the name decides
                if *phase == Phase::ExternalWalls && is_interior(name) {
                    return Some(Phase::InternalWalls);
                }
                return Some(*phase);
            }
        }
        let lowered = name.to_lowercase();
        KEYWORD_PHASES
            .iter()
            .find(|(words, _)| words.iter().any(|w| lowered.contains(w)))
            .map(|(_, phase)| *phase)
    }
}

/// Chapter code (two-digit leading segment) to phase.
const CHAPTER_PHASES: [(&str, Phase); 30] = [
    ("01", Phase::SiteSetup),
    ("02", Phase::Demolition),
    ("03", Phase::Earthworks),
    ("04", Phase::Foundations),
    ("05", Phase::Structure),
    ("06", Phase::Structure),
    ("07", Phase::ExternalWalls),
    ("08", Phase::Roof),
    ("09", Phase::Waterproofing),
    ("10", Phase::Insulation),
    ("11", Phase::WallTiling),
    ("12", Phase::Plastering),
    ("13", Phase::Flooring),
    ("14", Phase::Ceilings),
    ("15", Phase::ExternalFrames),
    ("16", Phase::ExternalFrames),
    ("17", Phase::InternalCarpentry),
    ("18", Phase::Painting),
    ("19", Phase::RoughPlumbing),
    ("20", Phase::RoughElectrical),
    ("21", Phase::Telecommunications),
    ("22", Phase::Gas),
    ("23", Phase::RoughHvac),
    ("24", Phase::FireSafety),
    ("25", Phase::Elevators),
    ("26", Phase::FinishPlumbing),
    ("27", Phase::ExternalWorks),
    ("28", Phase::Cleanup),
    ("29", Phase::Screed),
    ("30", Phase::WallTiling),
];

/// Chapter-name keywords (Portuguese and English), checked in order.
const KEYWORD_PHASES: &[(&[&str], Phase)] = &[
    (&["estaleiro", "site setup"], Phase::SiteSetup),
    (&["demoli"], Phase::Demolition),
    (&["movimento de terras", "escava", "earthwork"], Phase::Earthworks),
    (&["funda", "foundation"], Phase::Foundations),
    (&["estrutur", "betão armado", "betao armado", "structur"], Phase::Structure),
    (&["cobertura", "roof"], Phase::Roof),
    (&["impermeabiliza", "waterproof"], Phase::Waterproofing),
    (&["alvenaria interior", "divisórias", "divisorias", "partition"], Phase::InternalWalls),
    (&["alvenaria", "fachada", "masonry"], Phase::ExternalWalls),
    (&["caixilharia", "serralharia", "window"], Phase::ExternalFrames),
    (&["aparelhagem", "luminária", "luminaria", "lighting fixture"], Phase::FinishElectrical),
    (&["equipamentos sanitários", "loiças", "sanitary ware"], Phase::FinishPlumbing),
    (&["climatização final", "unidades interiores"], Phase::FinishHvac),
    (&["águas", "aguas", "esgoto", "drenagem", "plumbing"], Phase::RoughPlumbing),
    (&["elétric", "electric", "eletric"], Phase::RoughElectrical),
    (&["avac", "ventila", "hvac"], Phase::RoughHvac),
    (&["ited", "telecomunica", "telecom"], Phase::Telecommunications),
    (&["gás", "gas"], Phase::Gas),
    (&["incêndio", "incendio", "fire"], Phase::FireSafety),
    (&["isolamento", "insulation"], Phase::Insulation),
    (&["reboco", "estuque", "plaster"], Phase::Plastering),
    (&["betonilha", "screed"], Phase::Screed),
    (&["pavimento", "floor"], Phase::Flooring),
    (&["azulejo", "cerâmic", "ceramic", "tiling"], Phase::WallTiling),
    (&["teto", "tecto", "ceiling"], Phase::Ceilings),
    (&["carpintaria", "carpentry", "portas interiores"], Phase::InternalCarpentry),
    (&["pintura", "painting"], Phase::Painting),
    (&["elevador", "ascensor", "elevator", "lift"], Phase::Elevators),
    (&["arranjos exteriores", "exterior", "paisag", "landscap"], Phase::ExternalWorks),
    (&["limpeza", "cleanup", "cleaning"], Phase::Cleanup),
];

fn is_interior(name: &str) -> bool {
    let lowered = name.to_lowercase();
    ["interior", "divisória", "divisoria", "partition"]
        .iter()
        .any(|w| lowered.contains(w))
}

/// Normalize a chapter code to its two-digit leading segment ("5.1" -> "05").
fn chapter_key(code: &str) -> Option<String> {
    let head = code.trim().split(['.', ' ', '-']).next()?;
    let digits: String = head.chars().filter(|c| c.is_ascii_digit()).collect();
    let number: u32 = digits.parse().ok()?;
    Some(format!("{:02}", number))
}

/// Link each non-empty phase summary to the previous non-empty one.
///
/// Groups must be in canonical order. A phase already gated by a procurement
/// task keeps that gate instead of the sequencing link.
pub fn sequence_phases(groups: &mut [PhaseGroup], procurement_gated: &FxHashSet<Phase>) {
    let mut previous_summary: Option<u32> = None;
    for group in groups.iter_mut() {
        if group.children.is_empty() {
            continue;
        }
        if let Some(prev_uid) = previous_summary {
            if !procurement_gated.contains(&group.phase) {
                group.summary.predecessors.push(Predecessor::new(prev_uid, LinkType::FS, 0));
            }
        }
        previous_summary = Some(group.summary.uid);
    }
}
