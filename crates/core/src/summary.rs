//! Traversal of the framework joined with a student's progress records, and
//! the per-area statistics built on top of it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::framework::{self, Area, SubcategoryPath};
use crate::model::{ProgressRecord, Student, StudentId};
use crate::progression::ProgressionLevel;

fn index_records(records: &[ProgressRecord]) -> HashMap<&str, &ProgressRecord> {
    records
        .iter()
        .map(|r| (r.subcategory_id().as_str(), r))
        .collect()
}

//
// ─── PROGRESS TREE ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressTree {
    pub areas: Vec<AreaNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaNode {
    pub id: &'static str,
    pub number: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub stats: LevelStats,
    pub categories: Vec<CategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub id: &'static str,
    pub number: u8,
    pub name: &'static str,
    pub subcategories: Vec<SubcategoryNode>,
}

/// One leaf of the tree with its record state. Missing records render as
/// the default state with no `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategoryNode {
    pub id: &'static str,
    pub code: &'static str,
    pub name: &'static str,
    pub level: ProgressionLevel,
    pub completed: bool,
    pub plan: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressTree {
    /// Join the static framework with `records`. Records for subcategories
    /// outside the tree are ignored.
    #[must_use]
    pub fn build(records: &[ProgressRecord]) -> Self {
        let by_id = index_records(records);
        let areas = framework::areas()
            .iter()
            .map(|area| AreaNode {
                id: area.id,
                number: area.number,
                name: area.name,
                description: area.description,
                color: area.color,
                stats: LevelStats::for_area(area, &by_id),
                categories: area
                    .categories
                    .iter()
                    .map(|category| CategoryNode {
                        id: category.id,
                        number: category.number,
                        name: category.name,
                        subcategories: category
                            .subcategories
                            .iter()
                            .map(|sub| {
                                let record = by_id.get(sub.id);
                                SubcategoryNode {
                                    id: sub.id,
                                    code: sub.code,
                                    name: sub.name,
                                    level: record.map(|r| r.level()).unwrap_or_default(),
                                    completed: record.is_some_and(|r| r.completed()),
                                    plan: record.and_then(|r| r.plan()).map(str::to_owned),
                                    updated_at: record.map(|r| r.updated_at()),
                                }
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Self { areas }
    }
}

//
// ─── STATISTICS ────────────────────────────────────────────────────────────────
//

/// Counts over a set of subcategories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelStats {
    pub total: u32,
    pub completed: u32,
    /// Indexed by `ProgressionLevel::index()`.
    pub by_level: [u32; 4],
    /// 0-100, rounded down.
    pub percent_complete: u8,
    /// Mean level (1.0-4.0) rounded to two decimals; missing records count as level 1.
    pub average_level: f64,
}

impl LevelStats {
    fn collect<'a>(
        paths: impl Iterator<Item = SubcategoryPath>,
        by_id: &HashMap<&str, &'a ProgressRecord>,
    ) -> Self {
        let mut total = 0u32;
        let mut completed = 0u32;
        let mut by_level = [0u32; 4];
        let mut level_sum = 0u32;

        for path in paths {
            let record = by_id.get(path.subcategory.id);
            let level = record.map(|r| r.level()).unwrap_or_default();
            total += 1;
            by_level[level.index()] += 1;
            level_sum += u32::from(level.as_u8());
            if record.is_some_and(|r| r.completed()) {
                completed += 1;
            }
        }

        let percent_complete = if total == 0 {
            0
        } else {
            u8::try_from(completed * 100 / total).unwrap_or(100)
        };
        let average_level = if total == 0 {
            0.0
        } else {
            round2(f64::from(level_sum) / f64::from(total))
        };

        Self {
            total,
            completed,
            by_level,
            percent_complete,
            average_level,
        }
    }

    fn for_area(area: &'static Area, by_id: &HashMap<&str, &ProgressRecord>) -> Self {
        Self::collect(area.subcategories(), by_id)
    }

    #[must_use]
    pub fn count(&self, level: ProgressionLevel) -> u32 {
        self.by_level[level.index()]
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummary {
    pub area_id: &'static str,
    pub area_name: &'static str,
    pub color: &'static str,
    pub stats: LevelStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub overall: LevelStats,
    pub areas: Vec<AreaSummary>,
}

impl StudentSummary {
    #[must_use]
    pub fn build(records: &[ProgressRecord]) -> Self {
        let by_id = index_records(records);
        let areas = framework::areas()
            .iter()
            .map(|area| AreaSummary {
                area_id: area.id,
                area_name: area.name,
                color: area.color,
                stats: LevelStats::for_area(area, &by_id),
            })
            .collect();
        Self {
            overall: LevelStats::collect(framework::subcategories(), &by_id),
            areas,
        }
    }

    #[must_use]
    pub fn area(&self, area_id: &str) -> Option<&AreaSummary> {
        self.areas.iter().find(|a| a.area_id == area_id)
    }
}

//
// ─── CLASS SUMMARY ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRow {
    pub student_id: StudentId,
    pub name: String,
    pub overall: LevelStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaAverage {
    pub area_id: &'static str,
    pub area_name: &'static str,
    /// `None` for a class without students.
    pub average_level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub students: Vec<StudentRow>,
    pub areas: Vec<AreaAverage>,
}

impl ClassSummary {
    #[must_use]
    pub fn build<'a>(entries: impl IntoIterator<Item = (&'a Student, &'a [ProgressRecord])>) -> Self {
        let summaries: Vec<(&Student, StudentSummary)> = entries
            .into_iter()
            .map(|(student, records)| (student, StudentSummary::build(records)))
            .collect();

        let areas = framework::areas()
            .iter()
            .map(|area| {
                let levels: Vec<f64> = summaries
                    .iter()
                    .filter_map(|(_, s)| s.area(area.id).map(|a| a.stats.average_level))
                    .collect();
                let average_level = if levels.is_empty() {
                    None
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let n = levels.len() as f64;
                    Some(round2(levels.iter().sum::<f64>() / n))
                };
                AreaAverage {
                    area_id: area.id,
                    area_name: area.name,
                    average_level,
                }
            })
            .collect();

        let students = summaries
            .into_iter()
            .map(|(student, summary)| StudentRow {
                student_id: student.id(),
                name: student.name().to_owned(),
                overall: summary.overall,
            })
            .collect();

        Self { students, areas }
    }
}

//
// ─── FOCUS ─────────────────────────────────────────────────────────────────────
//

fn needs_focus(record: Option<&&ProgressRecord>) -> bool {
    match record {
        None => true,
        Some(r) => !r.completed() && r.level() < ProgressionLevel::Established,
    }
}

/// For each area, the first `per_area` subcategories in tree order that are
/// not completed and still below `Established`.
#[must_use]
pub fn focus_subcategories(records: &[ProgressRecord], per_area: usize) -> Vec<SubcategoryPath> {
    let by_id = index_records(records);
    framework::areas()
        .iter()
        .flat_map(|area| {
            area.subcategories()
                .filter(|path| needs_focus(by_id.get(path.subcategory.id)))
                .take(per_area)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// A subcategory that several students in a class are working on.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClassFocus {
    pub path: SubcategoryPath,
    pub students: u32,
}

/// Merge per-student focus lists and keep the `limit` most shared items.
/// Ties keep tree order.
#[must_use]
pub fn class_focus<'a>(
    per_student: impl IntoIterator<Item = &'a [ProgressRecord]>,
    per_area: usize,
    limit: usize,
) -> Vec<ClassFocus> {
    let mut counts: HashMap<&'static str, u32> = HashMap::new();
    for records in per_student {
        for path in focus_subcategories(records, per_area) {
            *counts.entry(path.subcategory.id).or_default() += 1;
        }
    }

    let mut focus: Vec<ClassFocus> = framework::subcategories()
        .filter_map(|path| {
            counts.get(path.subcategory.id).map(|&students| ClassFocus { path, students })
        })
        .collect();
    focus.sort_by(|a, b| b.students.cmp(&a.students));
    focus.truncate(limit);
    focus
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::SubcategoryId;
    use crate::model::StudentDraft;
    use crate::time::fixed_now;

    fn record(sub: &str, level: ProgressionLevel, completed: bool) -> ProgressRecord {
        let mut r = ProgressRecord::new(
            StudentId::new(1),
            SubcategoryId::parse(sub).unwrap(),
            fixed_now(),
        );
        r.set_level(level, fixed_now());
        if completed {
            r.toggle_completed(fixed_now());
        }
        r
    }

    #[test]
    fn tree_covers_framework_and_defaults_missing() {
        let records = vec![record("communication.2.3", ProgressionLevel::Established, true)];
        let tree = ProgressTree::build(&records);

        assert_eq!(tree.areas.len(), 8);
        let leaves: usize = tree
            .areas
            .iter()
            .flat_map(|a| &a.categories)
            .map(|c| c.subcategories.len())
            .sum();
        assert_eq!(leaves, framework::subcategory_count());

        let comm = &tree.areas[0];
        let hit = &comm.categories[1].subcategories[2];
        assert_eq!(hit.id, "communication.2.3");
        assert_eq!(hit.level, ProgressionLevel::Established);
        assert!(hit.completed);
        assert!(hit.updated_at.is_some());

        let miss = &comm.categories[0].subcategories[0];
        assert_eq!(miss.level, ProgressionLevel::NotYetDeveloped);
        assert!(!miss.completed);
        assert!(miss.updated_at.is_none());
    }

    #[test]
    fn empty_records_give_level_one_averages() {
        let summary = StudentSummary::build(&[]);
        assert_eq!(summary.overall.total as usize, framework::subcategory_count());
        assert_eq!(summary.overall.completed, 0);
        assert_eq!(summary.overall.percent_complete, 0);
        assert!((summary.overall.average_level - 1.0).abs() < f64::EPSILON);
        assert_eq!(
            summary.overall.count(ProgressionLevel::NotYetDeveloped),
            summary.overall.total
        );
    }

    #[test]
    fn area_stats_count_levels_and_completion() {
        let area = framework::find_area("sensory").unwrap();
        let subs: Vec<_> = area.subcategories().map(|p| p.subcategory.id).collect();
        assert_eq!(subs.len(), 8);

        let records = vec![
            record(subs[0], ProgressionLevel::Generalised, true),
            record(subs[1], ProgressionLevel::Established, false),
            record(subs[2], ProgressionLevel::Developing, true),
        ];
        let summary = StudentSummary::build(&records);
        let stats = &summary.area("sensory").unwrap().stats;

        assert_eq!(stats.total, 8);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.percent_complete, 25);
        assert_eq!(stats.by_level, [5, 1, 1, 1]);
        // (4 + 3 + 2 + 5 * 1) / 8 = 1.75
        assert!((stats.average_level - 1.75).abs() < f64::EPSILON);
    }

    #[test]
    fn percent_rounds_down() {
        let area = framework::find_area("healthy-living").unwrap();
        let first = area.subcategories().next().unwrap();
        let records = vec![record(first.subcategory.id, ProgressionLevel::Developing, true)];
        let summary = StudentSummary::build(&records);
        let stats = &summary.area("healthy-living").unwrap().stats;
        // 1 of 8 = 12.5%
        assert_eq!(stats.total, 8);
        assert_eq!(stats.percent_complete, 12);
    }

    #[test]
    fn focus_skips_completed_and_established() {
        let records = vec![
            record("communication.1.1", ProgressionLevel::Developing, true),
            record("communication.1.2", ProgressionLevel::Established, false),
        ];
        let focus = focus_subcategories(&records, 2);
        assert_eq!(focus.len(), 16);
        assert_eq!(focus[0].subcategory.id, "communication.1.3");
        assert_eq!(focus[1].subcategory.id, "communication.1.4");
        assert_eq!(focus[2].subcategory.id, "social.1.1");
    }

    #[test]
    fn class_summary_averages_areas() {
        let a = StudentDraft {
            name: "Ava".into(),
            ..StudentDraft::default()
        }
        .validate(fixed_now())
        .unwrap()
        .assign_id(StudentId::new(1));
        let b = StudentDraft {
            name: "Ben".into(),
            ..StudentDraft::default()
        }
        .validate(fixed_now())
        .unwrap()
        .assign_id(StudentId::new(2));

        let area = framework::find_area("sensory").unwrap();
        let a_records: Vec<ProgressRecord> = area
            .subcategories()
            .map(|p| record(p.subcategory.id, ProgressionLevel::Generalised, false))
            .collect();
        let b_records: Vec<ProgressRecord> = Vec::new();

        let summary = ClassSummary::build([(&a, a_records.as_slice()), (&b, b_records.as_slice())]);
        assert_eq!(summary.students.len(), 2);
        assert_eq!(summary.students[0].name, "Ava");

        let sensory = summary.areas.iter().find(|x| x.area_id == "sensory").unwrap();
        // (4.0 + 1.0) / 2
        assert_eq!(sensory.average_level, Some(2.5));

        let empty = ClassSummary::build(std::iter::empty());
        assert!(empty.areas.iter().all(|x| x.average_level.is_none()));
    }

    #[test]
    fn class_focus_ranks_shared_items() {
        let done = vec![record("communication.1.1", ProgressionLevel::Developing, true)];
        let fresh: Vec<ProgressRecord> = Vec::new();
        let focus = class_focus([done.as_slice(), fresh.as_slice()], 1, 3);

        assert_eq!(focus.len(), 3);
        assert_eq!(focus[0].path.subcategory.id, "social.1.1");
        assert_eq!(focus[0].students, 2);
        assert_eq!(focus[1].path.subcategory.id, "sensory.1.1");
        assert_eq!(focus[2].path.subcategory.id, "interests.1.1");
    }
}
