use crate::models::{
    CriteriaAverages, CriterionAverage, InstructorAverages, InstructorReview, SchoolReview,
    SCHOOL_CRITERIA,
};

/// Per-criterion and overall averages for a school's reviews.
///
/// Returns `None` for an empty slice ("not yet rated"). A criterion only
/// counts toward the overall average when at least one review scored it;
/// skipped criteria report an average of 0.0 and zero observations.
pub fn aggregate_school_ratings(reviews: &[SchoolReview]) -> Option<CriteriaAverages> {
    if reviews.is_empty() {
        return None;
    }

    let mut sums = [0i64; SCHOOL_CRITERIA.len()];
    let mut counts = [0usize; SCHOOL_CRITERIA.len()];

    for review in reviews {
        for (idx, value) in review.scores().iter().enumerate() {
            if let Some(score) = value {
                sums[idx] += i64::from(*score);
                counts[idx] += 1;
            }
        }
    }

    let mut criteria = Vec::with_capacity(SCHOOL_CRITERIA.len());
    let mut overall_sum = 0.0;
    let mut rated_criteria = 0usize;

    for (idx, criterion) in SCHOOL_CRITERIA.iter().enumerate() {
        let average = if counts[idx] == 0 {
            0.0
        } else {
            sums[idx] as f64 / counts[idx] as f64
        };

        if counts[idx] > 0 {
            overall_sum += average;
            rated_criteria += 1;
        }

        criteria.push(CriterionAverage {
            key: criterion.key,
            average,
            observations: counts[idx],
        });
    }

    let overall = if rated_criteria == 0 {
        0.0
    } else {
        overall_sum / rated_criteria as f64
    };

    Some(CriteriaAverages { criteria, overall })
}

/// Mean quality and dedication across all reviews. Both scores are required
/// on every review, so unlike the school aggregator nothing is filtered; an
/// empty slice yields zeros and the caller distinguishes "unrated" by
/// review count.
pub fn aggregate_instructor_ratings(reviews: &[InstructorReview]) -> InstructorAverages {
    if reviews.is_empty() {
        return InstructorAverages {
            quality: 0.0,
            dedication: 0.0,
        };
    }

    let count = reviews.len() as f64;
    let quality: i64 = reviews.iter().map(|r| i64::from(r.quality)).sum();
    let dedication: i64 = reviews.iter().map(|r| i64::from(r.dedication)).sum();

    InstructorAverages {
        quality: quality as f64 / count,
        dedication: dedication as f64 / count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn school_review(scores: [Option<i16>; SCHOOL_CRITERIA.len()]) -> SchoolReview {
        SchoolReview {
            id: Uuid::new_v4(),
            school_id: Uuid::new_v4(),
            training_partner_quality: scores[0],
            curriculum_quality: scores[1],
            coaching_quality: scores[2],
            class_variety: scores[3],
            schedule: scores[4],
            cleanliness: scores[5],
            cost: scores[6],
            competition_support: scores[7],
            injury_management: scores[8],
            vibe_fit: scores[9],
            coach_availability: scores[10],
            student_retention: scores[11],
            conflict_handling: scores[12],
            inclusivity: scores[13],
            comment: None,
            user_email: None,
            created_at: Utc::now(),
        }
    }

    fn sparse(entries: &[(usize, i16)]) -> [Option<i16>; SCHOOL_CRITERIA.len()] {
        let mut scores = [None; SCHOOL_CRITERIA.len()];
        for &(idx, value) in entries {
            scores[idx] = Some(value);
        }
        scores
    }

    fn instructor_review(quality: i16, dedication: i16) -> InstructorReview {
        InstructorReview {
            id: Uuid::new_v4(),
            instructor_id: Uuid::new_v4(),
            quality,
            dedication,
            tags: Vec::new(),
            comment: None,
            user_email: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_reviews_means_no_rating() {
        assert!(aggregate_school_ratings(&[]).is_none());
    }

    #[test]
    fn uniform_review_averages_to_its_value() {
        let averages =
            aggregate_school_ratings(&[school_review([Some(4); SCHOOL_CRITERIA.len()])]).unwrap();
        for criterion in &averages.criteria {
            assert_eq!(criterion.average, 4.0);
            assert_eq!(criterion.observations, 1);
        }
        assert_eq!(averages.overall, 4.0);
    }

    #[test]
    fn absent_scores_are_excluded_not_zeroed() {
        let reviews = vec![
            school_review(sparse(&[(6, 3)])),
            school_review(sparse(&[(5, 4)])),
        ];
        let averages = aggregate_school_ratings(&reviews).unwrap();
        assert_eq!(averages.criteria[6].key, "cost");
        assert_eq!(averages.criteria[6].average, 3.0);
        assert_eq!(averages.criteria[6].observations, 1);
    }

    #[test]
    fn overall_is_mean_of_criterion_averages() {
        // Criterion 0 observed twice (4, 2 -> 3.0), criterion 1 once (5.0).
        // A mean over the raw values would give (4 + 2 + 5) / 3 instead.
        let reviews = vec![
            school_review(sparse(&[(0, 4), (1, 5)])),
            school_review(sparse(&[(0, 2)])),
        ];
        let averages = aggregate_school_ratings(&reviews).unwrap();
        assert_eq!(averages.criteria[0].average, 3.0);
        assert_eq!(averages.criteria[1].average, 5.0);
        assert_eq!(averages.overall, 4.0);
    }

    #[test]
    fn unobserved_criteria_default_to_zero_and_skip_overall() {
        let reviews = vec![school_review(sparse(&[(2, 5)]))];
        let averages = aggregate_school_ratings(&reviews).unwrap();
        assert_eq!(averages.criteria[2].average, 5.0);
        for (idx, criterion) in averages.criteria.iter().enumerate() {
            if idx != 2 {
                assert_eq!(criterion.average, 0.0);
                assert_eq!(criterion.observations, 0);
            }
        }
        assert_eq!(averages.overall, 5.0);
    }

    #[test]
    fn tolerates_out_of_range_scores() {
        let averages = aggregate_school_ratings(&[school_review(sparse(&[(0, 11)]))]).unwrap();
        assert!(averages.overall.is_finite());
        assert_eq!(averages.criteria[0].average, 11.0);
    }

    #[test]
    fn instructor_averages_empty_input() {
        let averages = aggregate_instructor_ratings(&[]);
        assert_eq!(averages.quality, 0.0);
        assert_eq!(averages.dedication, 0.0);
    }

    #[test]
    fn instructor_averages_are_independent_means() {
        let reviews = vec![instructor_review(5, 1), instructor_review(3, 5)];
        let averages = aggregate_instructor_ratings(&reviews);
        assert_eq!(averages.quality, 4.0);
        assert_eq!(averages.dedication, 3.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let school_reviews = vec![
            school_review(sparse(&[(0, 4), (3, 2)])),
            school_review(sparse(&[(0, 5)])),
        ];
        assert_eq!(
            aggregate_school_ratings(&school_reviews),
            aggregate_school_ratings(&school_reviews)
        );

        let instructor_reviews = vec![instructor_review(4, 4), instructor_review(2, 5)];
        assert_eq!(
            aggregate_instructor_ratings(&instructor_reviews),
            aggregate_instructor_ratings(&instructor_reviews)
        );
    }
}
