use std::fmt::Write;

use crate::models::{InstructorDetail, SchoolDetail, SCHOOL_CRITERIA};
use crate::tags;

pub fn school_report(detail: &SchoolDetail) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", detail.school.name);
    let _ = writeln!(output, "{}", detail.school.location);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall");

    match &detail.averages {
        Some(averages) => {
            let _ = writeln!(
                output,
                "{:.1} / 5 across {} reviews",
                averages.overall, detail.review_count
            );
            let _ = writeln!(output);
            let _ = writeln!(output, "## Ratings Breakdown");
            for (criterion, average) in SCHOOL_CRITERIA.iter().zip(averages.criteria.iter()) {
                if average.observations == 0 {
                    let _ = writeln!(output, "- {}: no scores yet", criterion.label);
                } else {
                    let _ = writeln!(
                        output,
                        "- {}: {:.1} ({} ratings)",
                        criterion.label, average.average, average.observations
                    );
                }
            }
        }
        None => {
            let _ = writeln!(output, "Not yet rated.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Reviews");

    if detail.reviews.is_empty() {
        let _ = writeln!(output, "No reviews yet.");
    } else {
        for review in detail.reviews.iter().take(5) {
            let comment = review.comment.as_deref().unwrap_or("(no comment)");
            let _ = writeln!(
                output,
                "- {}: {}",
                review.created_at.format("%Y-%m-%d"),
                comment
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Instructors");

    if detail.instructors.is_empty() {
        let _ = writeln!(output, "No instructors listed.");
    } else {
        for instructor in &detail.instructors {
            let _ = writeln!(output, "- {} ({})", instructor.name, instructor.belt);
        }
    }

    output
}

pub fn instructor_report(detail: &InstructorDetail) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", detail.instructor.name);
    let _ = writeln!(
        output,
        "{}, {}",
        detail.instructor.belt, detail.instructor.school_name
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Ratings");

    if detail.review_count == 0 {
        let _ = writeln!(output, "Not yet reviewed.");
    } else {
        let _ = writeln!(
            output,
            "Quality {:.1} / 5, Dedication {:.1} / 5 across {} reviews",
            detail.averages.quality, detail.averages.dedication, detail.review_count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Tags");

    let counts = tags::tag_counts(&detail.reviews);
    if counts.is_empty() {
        let _ = writeln!(output, "No tags yet.");
    } else {
        for entry in counts.iter().take(tags::DEFAULT_TOP_TAGS) {
            let _ = writeln!(output, "- {} ({})", entry.tag, entry.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Reviews");

    if detail.reviews.is_empty() {
        let _ = writeln!(output, "No reviews yet.");
    } else {
        for review in detail.reviews.iter().take(5) {
            let comment = review.comment.as_deref().unwrap_or("(no comment)");
            let _ = writeln!(
                output,
                "- {} (Quality {}, Dedication {}): {}",
                review.created_at.format("%Y-%m-%d"),
                review.quality,
                review.dedication,
                comment
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Belt, Instructor, InstructorAverages, School};
    use crate::ratings;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_school() -> School {
        School {
            id: Uuid::new_v4(),
            name: "Test Academy".to_string(),
            location: "Austin, TX".to_string(),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unrated_school_renders_placeholder() {
        let detail = SchoolDetail {
            school: sample_school(),
            reviews: Vec::new(),
            averages: None,
            review_count: 0,
            instructors: Vec::new(),
        };
        let report = school_report(&detail);
        assert!(report.contains("Not yet rated."));
        assert!(report.contains("No reviews yet."));
    }

    #[test]
    fn breakdown_follows_criteria_order() {
        let review = crate::models::SchoolReview {
            id: Uuid::new_v4(),
            school_id: Uuid::new_v4(),
            training_partner_quality: Some(5),
            curriculum_quality: Some(4),
            coaching_quality: None,
            class_variety: None,
            schedule: None,
            cleanliness: None,
            cost: None,
            competition_support: None,
            injury_management: None,
            vibe_fit: None,
            coach_availability: None,
            student_retention: None,
            conflict_handling: None,
            inclusivity: None,
            comment: Some("Solid fundamentals program.".to_string()),
            user_email: None,
            created_at: Utc::now(),
        };
        let reviews = vec![review];
        let averages = ratings::aggregate_school_ratings(&reviews);
        let detail = SchoolDetail {
            school: sample_school(),
            review_count: reviews.len(),
            reviews,
            averages,
            instructors: Vec::new(),
        };

        let report = school_report(&detail);
        let partner = report.find("Training Partner Quality: 5.0").unwrap();
        let curriculum = report.find("Curriculum Quality: 4.0").unwrap();
        let coaching = report.find("Coaching Quality: no scores yet").unwrap();
        assert!(partner < curriculum);
        assert!(curriculum < coaching);
    }

    #[test]
    fn unreviewed_instructor_renders_placeholder() {
        let detail = InstructorDetail {
            instructor: Instructor {
                id: Uuid::new_v4(),
                name: "Jane Doe".to_string(),
                belt: Belt::Brown,
                school_id: Uuid::new_v4(),
                school_name: "Test Academy".to_string(),
                image_url: None,
                created_at: Utc::now(),
            },
            reviews: Vec::new(),
            averages: InstructorAverages {
                quality: 0.0,
                dedication: 0.0,
            },
            review_count: 0,
            top_tags: Vec::new(),
        };
        let report = instructor_report(&detail);
        assert!(report.contains("Not yet reviewed."));
        assert!(report.contains("No tags yet."));
    }
}
