use std::collections::HashMap;

use crate::models::{InstructorReview, TagCount};

pub const DEFAULT_TOP_TAGS: usize = 5;

/// Suggestions for input surfaces only. Stored tags are an open string
/// list and are never checked against this vocabulary.
pub const SUGGESTED_TAGS: [&str; 24] = [
    "Patient",
    "Technical",
    "Creative",
    "Intense",
    "Entertaining",
    "Traditional",
    "No-Gi Specialist",
    "Gi Specialist",
    "Competition Focused",
    "Beginner Friendly",
    "Advanced Only",
    "Good with Kids",
    "Explains Well",
    "Hands-On",
    "Encouraging",
    "Demanding",
    "Flexible Schedule",
    "Detail Oriented",
    "Big Picture",
    "Leg Lock Expert",
    "Submission Hunter",
    "Positional Master",
    "Takedown Expert",
    "Guard Player",
];

/// Occurrence counts across all reviews, sorted by count descending.
/// Counts accumulate in first-encounter order and the sort is stable, so
/// equal counts keep the order the tags were first seen in.
pub fn tag_counts(reviews: &[InstructorReview]) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for tag in reviews.iter().flat_map(|r| r.tags.iter()) {
        match slots.get(tag.as_str()) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                slots.insert(tag, counts.len());
                counts.push(TagCount {
                    tag: tag.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

pub fn top_tags(reviews: &[InstructorReview], limit: usize) -> Vec<String> {
    tag_counts(reviews)
        .into_iter()
        .take(limit)
        .map(|entry| entry.tag)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn review_with_tags(tags: &[&str]) -> InstructorReview {
        InstructorReview {
            id: Uuid::new_v4(),
            instructor_id: Uuid::new_v4(),
            quality: 5,
            dedication: 5,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            comment: None,
            user_email: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_input_yields_no_tags() {
        assert!(top_tags(&[], DEFAULT_TOP_TAGS).is_empty());
    }

    #[test]
    fn counts_accumulate_across_reviews() {
        let reviews = vec![
            review_with_tags(&["Technical", "Patient"]),
            review_with_tags(&["Technical"]),
        ];
        let counts = tag_counts(&reviews);
        assert_eq!(
            counts,
            vec![
                TagCount { tag: "Technical".to_string(), count: 2 },
                TagCount { tag: "Patient".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let reviews = vec![
            review_with_tags(&["A", "B"]),
            review_with_tags(&["A"]),
            review_with_tags(&["B", "C"]),
        ];
        assert_eq!(top_tags(&reviews, 2), vec!["A", "B"]);
    }

    #[test]
    fn limit_beyond_distinct_tags_returns_all() {
        let reviews = vec![review_with_tags(&["Creative"])];
        assert_eq!(top_tags(&reviews, 10), vec!["Creative"]);
    }
}
