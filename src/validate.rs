use anyhow::bail;

use crate::models::{InstructorReviewInput, SchoolReviewInput, SCHOOL_CRITERIA};

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;
pub const MAX_TAGS: usize = 5;

/// School reviews may skip any criterion, but every present score must be
/// in range and at least one criterion must be scored.
pub fn school_review(input: &SchoolReviewInput) -> anyhow::Result<()> {
    let mut scored = 0usize;

    for (criterion, value) in SCHOOL_CRITERIA.iter().zip(input.scores.iter()) {
        if let Some(score) = value {
            if !(MIN_SCORE..=MAX_SCORE).contains(score) {
                bail!(
                    "{} must be between {MIN_SCORE} and {MAX_SCORE}, got {score}",
                    criterion.key
                );
            }
            scored += 1;
        }
    }

    if scored == 0 {
        bail!("a school review needs at least one scored criterion");
    }

    Ok(())
}

/// Instructor reviews require both scores. Tags are capped at `MAX_TAGS`
/// but are otherwise free text.
pub fn instructor_review(input: &InstructorReviewInput) -> anyhow::Result<()> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&input.quality) {
        bail!(
            "quality must be between {MIN_SCORE} and {MAX_SCORE}, got {}",
            input.quality
        );
    }
    if !(MIN_SCORE..=MAX_SCORE).contains(&input.dedication) {
        bail!(
            "dedication must be between {MIN_SCORE} and {MAX_SCORE}, got {}",
            input.dedication
        );
    }
    if input.tags.len() > MAX_TAGS {
        bail!("at most {MAX_TAGS} tags per review, got {}", input.tags.len());
    }
    if input.tags.iter().any(|tag| tag.trim().is_empty()) {
        bail!("tags must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school_input(entries: &[(usize, i16)]) -> SchoolReviewInput {
        let mut input = SchoolReviewInput::default();
        for &(idx, value) in entries {
            input.scores[idx] = Some(value);
        }
        input
    }

    fn instructor_input(quality: i16, dedication: i16, tags: &[&str]) -> InstructorReviewInput {
        InstructorReviewInput {
            quality,
            dedication,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn school_review_needs_a_score() {
        assert!(school_review(&school_input(&[])).is_err());
        assert!(school_review(&school_input(&[(6, 3)])).is_ok());
    }

    #[test]
    fn school_scores_must_be_in_range() {
        assert!(school_review(&school_input(&[(0, 0)])).is_err());
        assert!(school_review(&school_input(&[(0, 6)])).is_err());
        assert!(school_review(&school_input(&[(0, 1), (13, 5)])).is_ok());
    }

    #[test]
    fn instructor_scores_are_required_and_in_range() {
        assert!(instructor_review(&instructor_input(0, 3, &[])).is_err());
        assert!(instructor_review(&instructor_input(3, 6, &[])).is_err());
        assert!(instructor_review(&instructor_input(1, 5, &[])).is_ok());
    }

    #[test]
    fn tags_are_capped_but_not_vocabulary_checked() {
        assert!(instructor_review(&instructor_input(
            4,
            4,
            &["A", "B", "C", "D", "E", "F"]
        ))
        .is_err());
        // Unknown tags are fine; the vocabulary is a suggestion list.
        assert!(instructor_review(&instructor_input(4, 4, &["Berimbolo Evangelist"])).is_ok());
        assert!(instructor_review(&instructor_input(4, 4, &["  "])).is_err());
    }
}
