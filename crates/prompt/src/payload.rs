//! Chart display payload handed to the text generator

use saju_calendar::{
    element_balance, hidden_stems, stars_for_branch, Element, FourPillarChart, LifeStage, Star,
    Stem, StemBranch, TenGod,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One pillar with its annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarInfo {
    pub chun_kr: String,
    pub chun_hanja: String,
    pub ji_kr: String,
    pub ji_hanja: String,
    /// 십성 of the stem ("일간" for the day stem itself)
    pub ten_god_chun: String,
    /// 십성 of the branch
    pub ten_god_ji: String,
    /// 12운성
    pub woonsung: String,
    /// 지장간
    pub jijangan: Vec<String>,
    /// 신살
    pub sinsal: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicPillars {
    pub year: PillarInfo,
    pub month: PillarInfo,
    pub day: PillarInfo,
    /// `None` when the birth time is unknown
    pub hour: Option<PillarInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartAnalysis {
    /// Ten gods that occur more than once, e.g. "비견 2"
    pub ten_gods_summary: Vec<String>,
    /// e.g. "목(3), 화(2), 토(1), 금(1), 수(1)"
    pub element_balance: String,
    pub special_stars: Vec<String>,
    pub auspicious_stars: Vec<String>,
    pub hour_known: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SajuPayload {
    pub basic: BasicPillars,
    pub analysis: ChartAnalysis,
}

fn pillar_info(chart: &FourPillarChart, pillar: StemBranch, is_day: bool) -> PillarInfo {
    let day_stem: Stem = chart.day_stem();
    let (stem, branch) = (pillar.stem(), pillar.branch());

    PillarInfo {
        chun_kr: stem.korean().to_string(),
        chun_hanja: stem.hanja().to_string(),
        ji_kr: branch.korean().to_string(),
        ji_hanja: branch.hanja().to_string(),
        ten_god_chun: if is_day {
            "일간".to_string()
        } else {
            TenGod::of(day_stem, stem).korean().to_string()
        },
        ten_god_ji: TenGod::of_branch(day_stem, branch).korean().to_string(),
        woonsung: LifeStage::of(day_stem, branch).korean().to_string(),
        jijangan: hidden_stems(branch)
            .into_iter()
            .map(|s| s.korean().to_string())
            .collect(),
        sinsal: stars_for_branch(day_stem, chart.day.branch(), branch)
            .into_iter()
            .map(|s| s.korean().to_string())
            .collect(),
    }
}

/// Build the annotated payload for a chart
pub fn enrich_chart(chart: &FourPillarChart) -> SajuPayload {
    let basic = BasicPillars {
        year: pillar_info(chart, chart.year, false),
        month: pillar_info(chart, chart.month, false),
        day: pillar_info(chart, chart.day, true),
        hour: chart.hour.map(|hour| pillar_info(chart, hour, false)),
    };

    let day_stem = chart.day_stem();
    let mut god_counts: BTreeMap<&'static str, u32> = BTreeMap::new();
    let mut stars: Vec<Star> = Vec::new();
    for (name, pillar) in chart.pillars() {
        let Some(pillar) = pillar else { continue };
        if name != "day" {
            *god_counts.entry(TenGod::of(day_stem, pillar.stem()).korean()).or_default() += 1;
        }
        *god_counts
            .entry(TenGod::of_branch(day_stem, pillar.branch()).korean())
            .or_default() += 1;
        for star in stars_for_branch(day_stem, chart.day.branch(), pillar.branch()) {
            if !stars.contains(&star) {
                stars.push(star);
            }
        }
    }

    let ten_gods_summary = god_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(god, count)| format!("{} {}", god, count))
        .collect();

    let balance = element_balance(chart);
    let element_balance = Element::ALL
        .iter()
        .map(|e| format!("{}({})", e.korean(), balance.get(e).copied().unwrap_or(0)))
        .collect::<Vec<_>>()
        .join(", ");

    let (auspicious, special): (Vec<Star>, Vec<Star>) =
        stars.into_iter().partition(|s| *s == Star::Nobleman);

    SajuPayload {
        basic,
        analysis: ChartAnalysis {
            ten_gods_summary,
            element_balance,
            special_stars: special.iter().map(|s| format!("{}살", s.korean())).collect(),
            auspicious_stars: auspicious.iter().map(|s| s.korean().to_string()).collect(),
            hour_known: chart.hour_known(),
        },
    }
}
