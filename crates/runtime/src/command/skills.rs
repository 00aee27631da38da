//! Paging over the skills a player could still add to the loadout.

use autofarm_core::{SkillInfo, World};

use crate::hunter::Hunter;

pub const SKILLS_PER_PAGE: usize = 7;

/// One page of selectable skills, sorted by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillPage {
    /// 1-based page actually shown after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub skills: Vec<SkillInfo>,
}

/// Builds page `page` (1-based) of the farmable skills the player knows and
/// has not loaded yet. Out-of-range pages are clamped to the nearest page.
pub fn skill_page(world: &dyn World, hunter: &Hunter, page: usize) -> SkillPage {
    let loadout = hunter.loadout();
    let mut candidates: Vec<SkillInfo> = world
        .known_skills(hunter.id())
        .into_iter()
        .filter(|skill| skill.is_farmable() && !loadout.contains(skill.id))
        .collect();
    candidates.sort_by_cached_key(|skill| skill.name.to_lowercase());

    let total_pages = candidates.len().div_ceil(SKILLS_PER_PAGE);
    let page = page.clamp(1, total_pages.max(1));
    let skills = candidates
        .into_iter()
        .skip((page - 1) * SKILLS_PER_PAGE)
        .take(SKILLS_PER_PAGE)
        .collect();

    SkillPage {
        page,
        total_pages,
        skills,
    }
}
