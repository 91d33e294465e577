use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub struct Criterion {
    pub key: &'static str,
    pub label: &'static str,
}

pub const SCHOOL_CRITERIA: [Criterion; 14] = [
    Criterion { key: "training_partner_quality", label: "Training Partner Quality" },
    Criterion { key: "curriculum_quality", label: "Curriculum Quality" },
    Criterion { key: "coaching_quality", label: "Coaching Quality" },
    Criterion { key: "class_variety", label: "Class Variety" },
    Criterion { key: "schedule", label: "Schedule" },
    Criterion { key: "cleanliness", label: "Cleanliness" },
    Criterion { key: "cost", label: "Cost Value" },
    Criterion { key: "competition_support", label: "Competition Support" },
    Criterion { key: "injury_management", label: "Injury Management" },
    Criterion { key: "vibe_fit", label: "Vibe Fit" },
    Criterion { key: "coach_availability", label: "Coach Availability" },
    Criterion { key: "student_retention", label: "Student Retention" },
    Criterion { key: "conflict_handling", label: "Conflict Handling" },
    Criterion { key: "inclusivity", label: "Inclusivity" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Belt {
    White,
    Blue,
    Purple,
    Brown,
    Black,
    Coral,
    Red,
}

impl Belt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Belt::White => "White Belt",
            Belt::Blue => "Blue Belt",
            Belt::Purple => "Purple Belt",
            Belt::Brown => "Brown Belt",
            Belt::Black => "Black Belt",
            Belt::Coral => "Coral Belt",
            Belt::Red => "Red Belt",
        }
    }
}

impl fmt::Display for Belt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Belt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "White Belt" => Ok(Belt::White),
            "Blue Belt" => Ok(Belt::Blue),
            "Purple Belt" => Ok(Belt::Purple),
            "Brown Belt" => Ok(Belt::Brown),
            "Black Belt" => Ok(Belt::Black),
            "Coral Belt" => Ok(Belt::Coral),
            "Red Belt" => Ok(Belt::Red),
            other => Err(format!(
                "unknown belt rank '{other}' (expected e.g. \"Black Belt\")"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolReview {
    pub id: Uuid,
    pub school_id: Uuid,
    pub training_partner_quality: Option<i16>,
    pub curriculum_quality: Option<i16>,
    pub coaching_quality: Option<i16>,
    pub class_variety: Option<i16>,
    pub schedule: Option<i16>,
    pub cleanliness: Option<i16>,
    pub cost: Option<i16>,
    pub competition_support: Option<i16>,
    pub injury_management: Option<i16>,
    pub vibe_fit: Option<i16>,
    pub coach_availability: Option<i16>,
    pub student_retention: Option<i16>,
    pub conflict_handling: Option<i16>,
    pub inclusivity: Option<i16>,
    pub comment: Option<String>,
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SchoolReview {
    /// Criterion values in `SCHOOL_CRITERIA` order.
    pub fn scores(&self) -> [Option<i16>; SCHOOL_CRITERIA.len()] {
        [
            self.training_partner_quality,
            self.curriculum_quality,
            self.coaching_quality,
            self.class_variety,
            self.schedule,
            self.cleanliness,
            self.cost,
            self.competition_support,
            self.injury_management,
            self.vibe_fit,
            self.coach_availability,
            self.student_retention,
            self.conflict_handling,
            self.inclusivity,
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Instructor {
    pub id: Uuid,
    pub name: String,
    pub belt: Belt,
    pub school_id: Uuid,
    pub school_name: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstructorReview {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub quality: i16,
    pub dedication: i16,
    pub tags: Vec<String>,
    pub comment: Option<String>,
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SchoolReviewInput {
    /// Order matches `SCHOOL_CRITERIA`.
    pub scores: [Option<i16>; SCHOOL_CRITERIA.len()],
    pub comment: Option<String>,
    pub user_email: Option<String>,
    pub source_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InstructorReviewInput {
    pub quality: i16,
    pub dedication: i16,
    pub tags: Vec<String>,
    pub comment: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum FlagTarget {
    SchoolReview(Uuid),
    InstructorReview(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionAverage {
    pub key: &'static str,
    pub average: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaAverages {
    /// One entry per criterion, `SCHOOL_CRITERIA` order.
    pub criteria: Vec<CriterionAverage>,
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructorAverages {
    pub quality: f64,
    pub dedication: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolDetail {
    pub school: School,
    pub reviews: Vec<SchoolReview>,
    pub averages: Option<CriteriaAverages>,
    pub review_count: usize,
    pub instructors: Vec<Instructor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstructorDetail {
    pub instructor: Instructor,
    pub reviews: Vec<InstructorReview>,
    pub averages: InstructorAverages,
    pub review_count: usize,
    pub top_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryStats {
    pub schools: i64,
    pub instructors: i64,
    pub school_reviews: i64,
    pub instructor_reviews: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn belt_round_trips_through_text() {
        for belt in [
            Belt::White,
            Belt::Blue,
            Belt::Purple,
            Belt::Brown,
            Belt::Black,
            Belt::Coral,
            Belt::Red,
        ] {
            assert_eq!(belt.as_str().parse::<Belt>(), Ok(belt));
        }
    }

    #[test]
    fn unknown_belt_is_rejected() {
        assert!("Green Belt".parse::<Belt>().is_err());
    }

    #[test]
    fn criteria_keys_are_distinct() {
        for (i, a) in SCHOOL_CRITERIA.iter().enumerate() {
            for b in &SCHOOL_CRITERIA[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }
}
