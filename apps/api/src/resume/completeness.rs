use serde::Serialize;

use crate::models::resume::ResumeRecord;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Strong,
    Moderate,
    Weak,
    Missing,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SectionHealth {
    pub section: String,
    pub score: f64,
    pub entry_count: usize,
    pub status: SectionStatus,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletenessReport {
    pub overall_score: f64,
    pub sections: Vec<SectionHealth>,
    pub missing_sections: Vec<String>,
}

const SECTION_WEIGHTS: &[(&str, f64)] = &[
    ("personal_info", 0.30),
    ("work_experience", 0.35),
    ("education", 0.20),
    ("skills", 0.15),
];

/// Work entries beyond this add nothing to the score.
const FULL_WORK_ENTRIES: usize = 3;
const FULL_SKILL_ENTRIES: usize = 8;

fn status_for(score: f64) -> SectionStatus {
    match score {
        s if s >= 0.8 => SectionStatus::Strong,
        s if s >= 0.5 => SectionStatus::Moderate,
        s if s >= 0.2 => SectionStatus::Weak,
        _ => SectionStatus::Missing,
    }
}

fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Scores how much of a useful résumé the record holds. Purely informational:
/// a low score never fails a parse.
pub fn compute_completeness_report(record: &ResumeRecord) -> CompletenessReport {
    let mut sections = Vec::with_capacity(SECTION_WEIGHTS.len());
    let mut missing_sections = Vec::new();
    let mut weighted_score_sum = 0.0;

    for (section_key, weight) in SECTION_WEIGHTS {
        let (entry_count, score, recommendations) = match *section_key {
            "personal_info" => score_personal_info(record),
            "work_experience" => score_work_experience(record),
            "education" => score_education(record),
            _ => score_skills(record),
        };

        let score = score.clamp(0.0, 1.0);
        if entry_count == 0 {
            missing_sections.push(section_key.to_string());
        }

        weighted_score_sum += score * weight;
        sections.push(SectionHealth {
            section: section_key.to_string(),
            score,
            entry_count,
            status: if entry_count == 0 {
                SectionStatus::Missing
            } else {
                status_for(score)
            },
            recommendations,
        });
    }

    let total_weight: f64 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();
    CompletenessReport {
        overall_score: (weighted_score_sum / total_weight).clamp(0.0, 1.0),
        sections,
        missing_sections,
    }
}

fn score_personal_info(record: &ResumeRecord) -> (usize, f64, Vec<String>) {
    let p = &record.personal_info;
    let optional = [
        ("phone", &p.phone),
        ("location", &p.location),
        ("summary", &p.summary),
        ("linkedin", &p.linkedin),
        ("github", &p.github),
        ("website", &p.website),
    ];
    let filled = optional
        .iter()
        .filter(|(_, v)| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
        .count();

    let mut recommendations = Vec::new();
    if p.summary.as_deref().map_or(true, |s| s.trim().is_empty()) {
        recommendations.push("Add a short professional summary".to_string());
    }
    if p.linkedin.is_none() && p.github.is_none() && p.website.is_none() {
        recommendations.push("Add a LinkedIn, GitHub or personal website link".to_string());
    }

    // name and email are always present on a valid record
    (1, 0.5 + 0.5 * fraction(filled, optional.len()), recommendations)
}

fn score_work_experience(record: &ResumeRecord) -> (usize, f64, Vec<String>) {
    let entries = &record.work_experience;
    if entries.is_empty() {
        return (
            0,
            0.0,
            vec!["Add at least one work experience entry".to_string()],
        );
    }

    let with_tech = entries
        .iter()
        .filter(|w| w.technologies.as_ref().is_some_and(|t| !t.is_empty()))
        .count();
    let score = 0.7 * fraction(entries.len().min(FULL_WORK_ENTRIES), FULL_WORK_ENTRIES)
        + 0.3 * fraction(with_tech, entries.len());

    let mut recommendations = Vec::new();
    if with_tech < entries.len() {
        recommendations.push(format!(
            "{} work experience entries do not list technologies",
            entries.len() - with_tech
        ));
    }
    if entries.len() < 2 {
        recommendations
            .push("Add more work experience entries to build a complete picture".to_string());
    }
    (entries.len(), score, recommendations)
}

fn score_education(record: &ResumeRecord) -> (usize, f64, Vec<String>) {
    let entries = &record.education;
    if entries.is_empty() {
        return (0, 0.0, vec!["Add your education background".to_string()]);
    }
    let with_major = entries.iter().filter(|e| e.major.is_some()).count();
    let mut recommendations = Vec::new();
    if with_major < entries.len() {
        recommendations.push("Add the field of study to each education entry".to_string());
    }
    (
        entries.len(),
        0.7 + 0.3 * fraction(with_major, entries.len()),
        recommendations,
    )
}

fn score_skills(record: &ResumeRecord) -> (usize, f64, Vec<String>) {
    let count = record.skills.len();
    if count == 0 {
        return (0, 0.0, vec!["Add at least one skill".to_string()]);
    }
    let mut recommendations = Vec::new();
    if count < FULL_SKILL_ENTRIES {
        recommendations.push(format!(
            "List at least {FULL_SKILL_ENTRIES} skills (currently {count})"
        ));
    }
    (
        count,
        fraction(count.min(FULL_SKILL_ENTRIES), FULL_SKILL_ENTRIES),
        recommendations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{
        Education, PersonalInfo, ResumeDraft, Skill, SkillCategory, WorkExperience,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn bare_record() -> ResumeRecord {
        ResumeDraft {
            personal_info: PersonalInfo {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
                location: None,
                summary: None,
                linkedin: None,
                github: None,
                website: None,
            },
            work_experience: vec![],
            education: vec![],
            skills: vec![],
        }
        .into_record(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_minimal_record_reports_missing_sections() {
        let report = compute_completeness_report(&bare_record());
        assert_eq!(
            report.missing_sections,
            vec!["work_experience", "education", "skills"]
        );
        // Only the personal_info floor counts: 0.5 * 0.3
        assert!((report.overall_score - 0.15).abs() < 1e-9);
        assert_eq!(report.sections[0].status, SectionStatus::Moderate);
        assert_eq!(report.sections[1].status, SectionStatus::Missing);
    }

    #[test]
    fn test_full_record_scores_one() {
        let mut r = bare_record();
        let p = &mut r.personal_info;
        for field in [
            &mut p.phone,
            &mut p.location,
            &mut p.summary,
            &mut p.linkedin,
            &mut p.github,
            &mut p.website,
        ] {
            *field = Some("x".to_string());
        }
        for i in 0..3 {
            r.work_experience.push(WorkExperience {
                company: format!("Company {i}"),
                position: "Engineer".to_string(),
                start_date: "2020-01".to_string(),
                end_date: None,
                description: vec!["Built things".to_string()],
                technologies: Some(vec!["Rust".to_string()]),
            });
        }
        r.education.push(Education {
            institution: "University".to_string(),
            degree: "BSc".to_string(),
            major: Some("Mathematics".to_string()),
            start_date: "2014-09".to_string(),
            end_date: None,
            gpa: None,
        });
        for i in 0..8 {
            r.skills.push(Skill {
                category: SkillCategory::Technical,
                name: format!("skill-{i}"),
                level: None,
            });
        }

        let report = compute_completeness_report(&r);
        assert!((report.overall_score - 1.0).abs() < 1e-9);
        assert!(report.missing_sections.is_empty());
        assert!(report
            .sections
            .iter()
            .all(|s| s.status == SectionStatus::Strong));
    }

    #[test]
    fn test_single_work_entry_without_technologies_is_weak() {
        let mut r = bare_record();
        r.work_experience.push(WorkExperience {
            company: "Engines Ltd".to_string(),
            position: "Programmer".to_string(),
            start_date: "1842-01".to_string(),
            end_date: None,
            description: vec!["Notes".to_string()],
            technologies: None,
        });
        let report = compute_completeness_report(&r);
        let work = &report.sections[1];
        assert_eq!(work.entry_count, 1);
        assert!((work.score - 0.7 / 3.0).abs() < 1e-9);
        assert_eq!(work.status, SectionStatus::Weak);
        assert_eq!(work.recommendations.len(), 2);
    }
}
