//! Constructor → era → power band → performance flow graph.
//!
//! Only the first column (and the constructor→era links) is derived from the
//! results table. The era→power and power→performance links are fixed
//! weights describing how each era's engines map to outcomes.

use serde::Serialize;
use std::collections::HashMap;

use crate::era::{Era, PerEra};
use crate::types::{Constructor, ConstructorId, ConstructorResult, Race, RaceId};

/// A constructor needs strictly more result rows than this to appear in the graph.
pub const MIN_PARTICIPATION: usize = 50;
pub const MAX_MAJOR_CONSTRUCTORS: usize = 8;

const DEFAULT_CONSTRUCTOR_COLOR: &str = "#666";

const CONSTRUCTOR_COLORS: [(&str, &str); 8] = [
    ("Ferrari", "#DC143C"),
    ("McLaren", "#FF8700"),
    ("Williams", "#005AFF"),
    ("Mercedes", "#00D2BE"),
    ("Red Bull", "#0600EF"),
    ("Renault", "#0082FA"),
    ("Lotus", "#FFD700"),
    ("Tyrrell", "#800080"),
];

pub fn constructor_color(name: &str) -> &'static str {
    CONSTRUCTOR_COLORS
        .iter()
        .find(|(team, _)| *team == name)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_CONSTRUCTOR_COLOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerBand {
    Low,
    Medium,
    High,
    Ultra,
}

impl PowerBand {
    pub const ALL: [PowerBand; 4] = [PowerBand::Low, PowerBand::Medium, PowerBand::High, PowerBand::Ultra];

    pub fn node_id(self) -> &'static str {
        match self {
            PowerBand::Low => "low_hp",
            PowerBand::Medium => "med_hp",
            PowerBand::High => "high_hp",
            PowerBand::Ultra => "ultra_hp",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PowerBand::Low => "Low Power\n(300-500 HP)",
            PowerBand::Medium => "Medium Power\n(500-800 HP)",
            PowerBand::High => "High Power\n(800-950 HP)",
            PowerBand::Ultra => "Ultra Power\n(1000+ HP)",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            PowerBand::Low => "#95a5a6",
            PowerBand::Medium => "#f39c12",
            PowerBand::High => "#e67e22",
            PowerBand::Ultra => "#c0392b",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performance {
    Champions,
    Competitive,
    Midfield,
    Backmarkers,
}

impl Performance {
    pub const ALL: [Performance; 4] = [
        Performance::Champions,
        Performance::Competitive,
        Performance::Midfield,
        Performance::Backmarkers,
    ];

    pub fn node_id(self) -> &'static str {
        match self {
            Performance::Champions => "champions",
            Performance::Competitive => "competitive",
            Performance::Midfield => "midfield",
            Performance::Backmarkers => "backmarkers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Performance::Champions => "Championship\nContenders",
            Performance::Competitive => "Competitive\nTeams",
            Performance::Midfield => "Midfield\nRunners",
            Performance::Backmarkers => "Backmarker\nTeams",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Performance::Champions => "#ff1744",
            Performance::Competitive => "#ff5722",
            Performance::Midfield => "#ff9800",
            Performance::Backmarkers => "#ffc107",
        }
    }
}

fn era_node_id(era: Era) -> &'static str {
    match era {
        Era::Early => "early_era",
        Era::V10 => "v10_era",
        Era::V8 => "v8_era",
        Era::Hybrid => "hybrid_era",
    }
}

fn era_label(era: Era) -> String {
    let (start, end) = era.years();
    format!("{}\n({}-{})", era.display_name(), start, end)
}

fn era_phrase(era: Era) -> &'static str {
    match era {
        Era::Early => "early era",
        Era::V10 => "V10 era",
        Era::V8 => "V8 era",
        Era::Hybrid => "hybrid era",
    }
}

/// (from, to, weight, description)
type FixedLink<A, B> = (A, B, f64, &'static str);

const ERA_POWER_LINKS: [FixedLink<Era, PowerBand>; 8] = [
    (Era::Early, PowerBand::Low, 30.0, "Early era: ~350 HP average"),
    (Era::Early, PowerBand::Medium, 10.0, "Early era: Some higher power"),
    (Era::V10, PowerBand::High, 40.0, "V10 era: ~850 HP peak"),
    (Era::V10, PowerBand::Medium, 15.0, "V10 era: Early development"),
    (Era::V8, PowerBand::Medium, 35.0, "V8 era: ~750 HP regulated"),
    (Era::V8, PowerBand::High, 10.0, "V8 era: Peak performance"),
    (Era::Hybrid, PowerBand::Ultra, 45.0, "Hybrid era: 1000+ HP total"),
    (Era::Hybrid, PowerBand::High, 10.0, "Hybrid era: ICE component"),
];

const POWER_PERFORMANCE_LINKS: [FixedLink<PowerBand, Performance>; 10] = [
    (PowerBand::Low, Performance::Competitive, 15.0, "Low power: Still competitive in era"),
    (PowerBand::Low, Performance::Midfield, 20.0, "Low power: Mostly midfield"),
    (PowerBand::Low, Performance::Backmarkers, 10.0, "Low power: Some backmarkers"),
    (PowerBand::Medium, Performance::Champions, 15.0, "Medium power: Championship capable"),
    (PowerBand::Medium, Performance::Competitive, 25.0, "Medium power: Very competitive"),
    (PowerBand::Medium, Performance::Midfield, 15.0, "Medium power: Solid midfield"),
    (PowerBand::High, Performance::Champions, 35.0, "PARADOX: V10 era champions & lap records!"),
    (PowerBand::High, Performance::Competitive, 20.0, "High power: Very competitive"),
    (PowerBand::Ultra, Performance::Champions, 20.0, "Ultra power: Some champions"),
    (PowerBand::Ultra, Performance::Competitive, 25.0, "PARADOX: Most power, but regulated performance!"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorPerformance {
    pub total_points: f64,
    pub race_count: u32,
    pub avg_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorConstructor {
    pub constructor_id: ConstructorId,
    pub name: String,
    pub participation: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorAnalysis {
    pub major_constructors: Vec<MajorConstructor>,
    pub era_races: HashMap<ConstructorId, PerEra<u32>>,
    pub performance: HashMap<ConstructorId, ConstructorPerformance>,
}

/// Column of the flow diagram, serialized as its index (0-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum Stage {
    Constructor,
    Era,
    PowerBand,
    Performance,
}

impl Stage {
    pub fn index(self) -> u8 {
        match self {
            Stage::Constructor => 0,
            Stage::Era => 1,
            Stage::PowerBand => 2,
            Stage::Performance => 3,
        }
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> u8 {
        stage.index()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub id: String,
    pub name: String,
    pub stage: Stage,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_hp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor_id: Option<ConstructorId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowLink {
    pub source: String,
    pub target: String,
    pub value: f64,
    pub desc: String,
    pub paradox: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConstructorFlow {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

impl ConstructorFlow {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stage_nodes(&self, stage: Stage) -> impl Iterator<Item = &FlowNode> {
        self.nodes.iter().filter(move |n| n.stage == stage)
    }
}

/// Participation counts, era race counts and average points per constructor.
pub fn analyze_constructors(
    races: &[Race],
    constructors: &[Constructor],
    results: &[ConstructorResult],
) -> ConstructorAnalysis {
    let mut participation: HashMap<ConstructorId, usize> = HashMap::new();
    let mut performance: HashMap<ConstructorId, ConstructorPerformance> = HashMap::new();
    let mut results_by_race: HashMap<RaceId, Vec<&ConstructorResult>> = HashMap::new();

    for result in results {
        *participation.entry(result.constructor_id).or_insert(0) += 1;
        let perf = performance.entry(result.constructor_id).or_default();
        perf.total_points += result.points.unwrap_or(0.0);
        perf.race_count += 1;
        results_by_race.entry(result.race_id).or_default().push(result);
    }
    for perf in performance.values_mut() {
        perf.avg_points = perf.total_points / f64::from(perf.race_count);
    }

    let mut major: Vec<MajorConstructor> = constructors
        .iter()
        .filter_map(|c| {
            let count = participation.get(&c.constructor_id).copied().unwrap_or(0);
            (count > MIN_PARTICIPATION).then(|| MajorConstructor {
                constructor_id: c.constructor_id,
                name: c.name.clone(),
                participation: count,
            })
        })
        .collect();
    major.sort_by(|a, b| b.participation.cmp(&a.participation));
    major.truncate(MAX_MAJOR_CONSTRUCTORS);

    let mut era_races: HashMap<ConstructorId, PerEra<u32>> = HashMap::new();
    for race in races {
        let era = Era::classify(race.year);
        for result in results_by_race.get(&race.race_id).into_iter().flatten() {
            *era_races.entry(result.constructor_id).or_default().get_mut(era) += 1;
        }
    }

    tracing::info!(
        "major constructors: {:?}",
        major.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );

    ConstructorAnalysis { major_constructors: major, era_races, performance }
}

fn fixed_links() -> impl Iterator<Item = FlowLink> {
    let era_power = ERA_POWER_LINKS.iter().map(|(era, band, value, desc)| FlowLink {
        source: era_node_id(*era).to_string(),
        target: band.node_id().to_string(),
        value: *value,
        desc: (*desc).to_string(),
        paradox: false,
    });
    let power_perf = POWER_PERFORMANCE_LINKS.iter().map(|(band, perf, value, desc)| FlowLink {
        source: band.node_id().to_string(),
        target: perf.node_id().to_string(),
        value: *value,
        desc: (*desc).to_string(),
        paradox: desc.starts_with("PARADOX"),
    });
    era_power.chain(power_perf)
}

/// Builds the four-stage flow graph from an analysis.
///
/// Returns an empty graph when no constructor clears the participation threshold.
pub fn build_flow(analysis: &ConstructorAnalysis) -> ConstructorFlow {
    if analysis.major_constructors.is_empty() {
        tracing::info!("no major constructors; constructor flow is empty");
        return ConstructorFlow::default();
    }

    let mut nodes: Vec<FlowNode> = analysis
        .major_constructors
        .iter()
        .map(|c| FlowNode {
            id: format!("constructor_{}", c.constructor_id),
            name: c.name.clone(),
            stage: Stage::Constructor,
            color: constructor_color(&c.name).to_string(),
            avg_hp: None,
            constructor_id: Some(c.constructor_id),
        })
        .collect();
    nodes.extend(Era::ALL.into_iter().map(|era| FlowNode {
        id: era_node_id(era).to_string(),
        name: era_label(era),
        stage: Stage::Era,
        color: era.color().to_string(),
        avg_hp: Some(era.avg_hp()),
        constructor_id: None,
    }));
    nodes.extend(PowerBand::ALL.into_iter().map(|band| FlowNode {
        id: band.node_id().to_string(),
        name: band.label().to_string(),
        stage: Stage::PowerBand,
        color: band.color().to_string(),
        avg_hp: None,
        constructor_id: None,
    }));
    nodes.extend(Performance::ALL.into_iter().map(|perf| FlowNode {
        id: perf.node_id().to_string(),
        name: perf.label().to_string(),
        stage: Stage::Performance,
        color: perf.color().to_string(),
        avg_hp: None,
        constructor_id: None,
    }));

    let mut links = Vec::new();
    for constructor in &analysis.major_constructors {
        let Some(counts) = analysis.era_races.get(&constructor.constructor_id) else {
            continue;
        };
        for (era, &count) in counts.iter().filter(|(_, n)| **n > 0) {
            links.push(FlowLink {
                source: format!("constructor_{}", constructor.constructor_id),
                target: era_node_id(era).to_string(),
                // sqrt-damped race count
                value: f64::from(count).sqrt() * 3.0,
                desc: format!("{}: {} races in {}", constructor.name, count, era_phrase(era)),
                paradox: false,
            });
        }
    }
    links.extend(fixed_links());

    ConstructorFlow { nodes, links }
}

pub fn constructor_flow(
    races: &[Race],
    constructors: &[Constructor],
    results: &[ConstructorResult],
) -> ConstructorFlow {
    build_flow(&analyze_constructors(races, constructors, results))
}
