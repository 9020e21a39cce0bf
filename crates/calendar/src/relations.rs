//! Relational tables over a chart: ten gods, twelve stages, hidden stems, stars

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pillar::FourPillarChart;
use crate::sexagenary::{Branch, Element, Stem};

/// 십신: relation of a stem to the day stem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenGod {
    /// 비견
    Companion,
    /// 겁재
    RobWealth,
    /// 식신
    EatingGod,
    /// 상관
    HurtingOfficer,
    /// 편재
    IndirectWealth,
    /// 정재
    DirectWealth,
    /// 편관
    SevenKillings,
    /// 정관
    DirectOfficer,
    /// 편인
    IndirectResource,
    /// 정인
    DirectResource,
}

impl TenGod {
    pub fn korean(self) -> &'static str {
        match self {
            TenGod::Companion => "비견",
            TenGod::RobWealth => "겁재",
            TenGod::EatingGod => "식신",
            TenGod::HurtingOfficer => "상관",
            TenGod::IndirectWealth => "편재",
            TenGod::DirectWealth => "정재",
            TenGod::SevenKillings => "편관",
            TenGod::DirectOfficer => "정관",
            TenGod::IndirectResource => "편인",
            TenGod::DirectResource => "정인",
        }
    }

    /// Ten god of `other` seen from `day_stem`
    pub fn of(day_stem: Stem, other: Stem) -> Self {
        let distance = (i32::from(other.element().index()) - i32::from(day_stem.element().index()))
            .rem_euclid(5);
        let same_polarity = day_stem.polarity() == other.polarity();

        match (distance, same_polarity) {
            // same element
            (0, true) => TenGod::Companion,
            (0, false) => TenGod::RobWealth,
            // day stem generates other
            (1, true) => TenGod::EatingGod,
            (1, false) => TenGod::HurtingOfficer,
            // day stem controls other
            (2, true) => TenGod::IndirectWealth,
            (2, false) => TenGod::DirectWealth,
            // other controls day stem
            (3, true) => TenGod::SevenKillings,
            (3, false) => TenGod::DirectOfficer,
            // other generates day stem
            (_, true) => TenGod::IndirectResource,
            (_, false) => TenGod::DirectResource,
        }
    }

    /// Ten god of a branch, through its main hidden stem
    pub fn of_branch(day_stem: Stem, branch: Branch) -> Self {
        Self::of(day_stem, main_hidden_stem(branch))
    }
}

/// 십이운성
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeStage {
    Birth,
    Bath,
    Crown,
    Office,
    Peak,
    Decline,
    Sickness,
    Death,
    Tomb,
    Extinction,
    Conception,
    Nurture,
}

impl LifeStage {
    const ORDER: [LifeStage; 12] = [
        LifeStage::Birth,
        LifeStage::Bath,
        LifeStage::Crown,
        LifeStage::Office,
        LifeStage::Peak,
        LifeStage::Decline,
        LifeStage::Sickness,
        LifeStage::Death,
        LifeStage::Tomb,
        LifeStage::Extinction,
        LifeStage::Conception,
        LifeStage::Nurture,
    ];

    pub fn korean(self) -> &'static str {
        match self {
            LifeStage::Birth => "장생",
            LifeStage::Bath => "목욕",
            LifeStage::Crown => "관대",
            LifeStage::Office => "건록",
            LifeStage::Peak => "제왕",
            LifeStage::Decline => "쇠",
            LifeStage::Sickness => "병",
            LifeStage::Death => "사",
            LifeStage::Tomb => "묘",
            LifeStage::Extinction => "절",
            LifeStage::Conception => "태",
            LifeStage::Nurture => "양",
        }
    }

    /// Stage of `stem` over `branch`. Yang stems walk forward from their 장생
    /// branch, yin stems backward.
    pub fn of(stem: Stem, branch: Branch) -> Self {
        // 장생 branch per stem, 갑 ..= 계
        const BIRTH_BRANCH: [i32; 10] = [11, 6, 2, 9, 2, 9, 5, 0, 8, 3];

        let start = BIRTH_BRANCH[stem.index() as usize];
        let b = i32::from(branch.index());
        let step = if stem.index() % 2 == 0 {
            (b - start).rem_euclid(12)
        } else {
            (start - b).rem_euclid(12)
        };
        Self::ORDER[step as usize]
    }
}

/// 지장간 per branch, main stem last (by stem index)
const HIDDEN_STEMS: [&[u8]; 12] = [
    &[8, 9],    // 자: 임 계
    &[9, 7, 5], // 축: 계 신 기
    &[4, 2, 0], // 인: 무 병 갑
    &[0, 1],    // 묘: 갑 을
    &[1, 9, 4], // 진: 을 계 무
    &[4, 6, 2], // 사: 무 경 병
    &[2, 5, 3], // 오: 병 기 정
    &[3, 1, 5], // 미: 정 을 기
    &[4, 8, 6], // 신: 무 임 경
    &[6, 7],    // 유: 경 신
    &[7, 3, 4], // 술: 신 정 무
    &[4, 0, 8], // 해: 무 갑 임
];

pub fn hidden_stems(branch: Branch) -> Vec<Stem> {
    HIDDEN_STEMS[branch.index() as usize]
        .iter()
        .map(|i| Stem::from_cycle(i64::from(*i)))
        .collect()
}

pub fn main_hidden_stem(branch: Branch) -> Stem {
    let stems = HIDDEN_STEMS[branch.index() as usize];
    Stem::from_cycle(i64::from(stems[stems.len() - 1]))
}

/// Element counts over every known stem and branch (branches by main hidden stem)
pub fn element_balance(chart: &FourPillarChart) -> BTreeMap<Element, u32> {
    let mut counts: BTreeMap<Element, u32> = Element::ALL.iter().map(|e| (*e, 0)).collect();
    for (_, pillar) in chart.pillars() {
        if let Some(pillar) = pillar {
            *counts.entry(pillar.stem().element()).or_default() += 1;
            *counts.entry(main_hidden_stem(pillar.branch()).element()).or_default() += 1;
        }
    }
    counts
}

/// 신살 detected in a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Star {
    /// 도화
    Peach,
    /// 역마
    Travel,
    /// 화개
    Canopy,
    /// 천을귀인
    Nobleman,
}

impl Star {
    pub fn korean(self) -> &'static str {
        match self {
            Star::Peach => "도화",
            Star::Travel => "역마",
            Star::Canopy => "화개",
            Star::Nobleman => "천을귀인",
        }
    }
}

/// (도화, 역마, 화개) branches for the triad of the day branch
fn triad_stars(day_branch: Branch) -> [u8; 3] {
    match day_branch.index() % 4 {
        // 인오술
        2 => [3, 8, 10],
        // 신자진
        0 => [9, 2, 4],
        // 사유축
        1 => [6, 11, 1],
        // 해묘미
        _ => [0, 5, 7],
    }
}

fn nobleman_branches(day_stem: Stem) -> [u8; 2] {
    match day_stem.index() {
        0 | 4 | 6 => [1, 7],
        1 | 5 => [0, 8],
        2 | 3 => [11, 9],
        8 | 9 => [5, 3],
        _ => [6, 2],
    }
}

/// Stars that `branch` carries for a chart with the given day pillar
pub fn stars_for_branch(day_stem: Stem, day_branch: Branch, branch: Branch) -> Vec<Star> {
    let [peach, travel, canopy] = triad_stars(day_branch);
    let b = branch.index();

    let mut stars = Vec::new();
    if b == peach {
        stars.push(Star::Peach);
    }
    if b == travel {
        stars.push(Star::Travel);
    }
    if b == canopy {
        stars.push(Star::Canopy);
    }
    if nobleman_branches(day_stem).contains(&b) {
        stars.push(Star::Nobleman);
    }
    stars
}
