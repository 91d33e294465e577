use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    Belt, DirectoryStats, FlagTarget, Instructor, InstructorDetail, InstructorReview,
    InstructorReviewInput, School, SchoolDetail, SchoolReview, SchoolReviewInput,
};
use crate::{ratings, tags, validate};

const SCHOOL_COLUMNS: &str = "id, name, location, image_url, created_at";

const SCHOOL_REVIEW_COLUMNS: &str = "id, school_id, training_partner_quality, \
     curriculum_quality, coaching_quality, class_variety, schedule, cleanliness, \
     cost, competition_support, injury_management, vibe_fit, coach_availability, \
     student_retention, conflict_handling, inclusivity, comment, user_email, created_at";

const INSTRUCTOR_COLUMNS: &str = "i.id, i.name, i.belt, i.school_id, \
     s.name AS school_name, i.image_url, i.created_at";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn school_from_row(row: &PgRow) -> School {
    School {
        id: row.get("id"),
        name: row.get("name"),
        location: row.get("location"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
    }
}

fn school_review_from_row(row: &PgRow) -> SchoolReview {
    SchoolReview {
        id: row.get("id"),
        school_id: row.get("school_id"),
        training_partner_quality: row.get("training_partner_quality"),
        curriculum_quality: row.get("curriculum_quality"),
        coaching_quality: row.get("coaching_quality"),
        class_variety: row.get("class_variety"),
        schedule: row.get("schedule"),
        cleanliness: row.get("cleanliness"),
        cost: row.get("cost"),
        competition_support: row.get("competition_support"),
        injury_management: row.get("injury_management"),
        vibe_fit: row.get("vibe_fit"),
        coach_availability: row.get("coach_availability"),
        student_retention: row.get("student_retention"),
        conflict_handling: row.get("conflict_handling"),
        inclusivity: row.get("inclusivity"),
        comment: row.get("comment"),
        user_email: row.get("user_email"),
        created_at: row.get("created_at"),
    }
}

fn instructor_from_row(row: &PgRow) -> anyhow::Result<Instructor> {
    let belt: String = row.get("belt");
    Ok(Instructor {
        id: row.get("id"),
        name: row.get("name"),
        belt: belt.parse().map_err(anyhow::Error::msg)?,
        school_id: row.get("school_id"),
        school_name: row.get("school_name"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
    })
}

fn instructor_review_from_row(row: &PgRow) -> InstructorReview {
    InstructorReview {
        id: row.get("id"),
        instructor_id: row.get("instructor_id"),
        quality: row.get("quality"),
        dedication: row.get("dedication"),
        tags: row.get("tags"),
        comment: row.get("comment"),
        user_email: row.get("user_email"),
        created_at: row.get("created_at"),
    }
}

pub async fn list_schools(pool: &PgPool) -> anyhow::Result<Vec<School>> {
    let rows = sqlx::query(&format!(
        "SELECT {SCHOOL_COLUMNS} FROM dojoboard.schools ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context("failed to list schools")?;

    Ok(rows.iter().map(school_from_row).collect())
}

pub async fn get_school(pool: &PgPool, school_id: Uuid) -> anyhow::Result<School> {
    let row = sqlx::query(&format!(
        "SELECT {SCHOOL_COLUMNS} FROM dojoboard.schools WHERE id = $1"
    ))
    .bind(school_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| anyhow!("no school with id {school_id}"))?;

    Ok(school_from_row(&row))
}

pub async fn fetch_school_reviews(
    pool: &PgPool,
    school_id: Uuid,
) -> anyhow::Result<Vec<SchoolReview>> {
    let rows = sqlx::query(&format!(
        "SELECT {SCHOOL_REVIEW_COLUMNS} FROM dojoboard.school_reviews \
         WHERE school_id = $1 ORDER BY created_at DESC"
    ))
    .bind(school_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch school reviews")?;

    Ok(rows.iter().map(school_review_from_row).collect())
}

pub async fn school_detail(pool: &PgPool, school_id: Uuid) -> anyhow::Result<SchoolDetail> {
    let school = get_school(pool, school_id).await?;
    let reviews = fetch_school_reviews(pool, school_id).await?;
    let averages = ratings::aggregate_school_ratings(&reviews);
    let instructors = instructors_for_school(pool, school_id).await?;

    Ok(SchoolDetail {
        review_count: reviews.len(),
        school,
        reviews,
        averages,
        instructors,
    })
}

pub async fn list_instructors(pool: &PgPool) -> anyhow::Result<Vec<Instructor>> {
    let rows = sqlx::query(&format!(
        "SELECT {INSTRUCTOR_COLUMNS} FROM dojoboard.instructors i \
         JOIN dojoboard.schools s ON s.id = i.school_id \
         ORDER BY i.created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .context("failed to list instructors")?;

    rows.iter().map(instructor_from_row).collect()
}

pub async fn get_instructor(pool: &PgPool, instructor_id: Uuid) -> anyhow::Result<Instructor> {
    let row = sqlx::query(&format!(
        "SELECT {INSTRUCTOR_COLUMNS} FROM dojoboard.instructors i \
         JOIN dojoboard.schools s ON s.id = i.school_id \
         WHERE i.id = $1"
    ))
    .bind(instructor_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| anyhow!("no instructor with id {instructor_id}"))?;

    instructor_from_row(&row)
}

pub async fn instructors_for_school(
    pool: &PgPool,
    school_id: Uuid,
) -> anyhow::Result<Vec<Instructor>> {
    let rows = sqlx::query(&format!(
        "SELECT {INSTRUCTOR_COLUMNS} FROM dojoboard.instructors i \
         JOIN dojoboard.schools s ON s.id = i.school_id \
         WHERE i.school_id = $1 ORDER BY i.name"
    ))
    .bind(school_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch school instructors")?;

    rows.iter().map(instructor_from_row).collect()
}

pub async fn fetch_instructor_reviews(
    pool: &PgPool,
    instructor_id: Uuid,
) -> anyhow::Result<Vec<InstructorReview>> {
    let rows = sqlx::query(
        "SELECT id, instructor_id, quality, dedication, tags, comment, user_email, created_at \
         FROM dojoboard.instructor_reviews \
         WHERE instructor_id = $1 ORDER BY created_at DESC",
    )
    .bind(instructor_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch instructor reviews")?;

    Ok(rows.iter().map(instructor_review_from_row).collect())
}

pub async fn instructor_detail(
    pool: &PgPool,
    instructor_id: Uuid,
) -> anyhow::Result<InstructorDetail> {
    let instructor = get_instructor(pool, instructor_id).await?;
    let reviews = fetch_instructor_reviews(pool, instructor_id).await?;
    let averages = ratings::aggregate_instructor_ratings(&reviews);
    let top_tags = tags::top_tags(&reviews, tags::DEFAULT_TOP_TAGS);

    Ok(InstructorDetail {
        review_count: reviews.len(),
        instructor,
        reviews,
        averages,
        top_tags,
    })
}

pub async fn search_schools(pool: &PgPool, query: &str) -> anyhow::Result<Vec<School>> {
    let pattern = format!("%{query}%");
    let rows = sqlx::query(&format!(
        "SELECT {SCHOOL_COLUMNS} FROM dojoboard.schools \
         WHERE name ILIKE $1 OR location ILIKE $1 ORDER BY name"
    ))
    .bind(&pattern)
    .fetch_all(pool)
    .await
    .context("school search failed")?;

    Ok(rows.iter().map(school_from_row).collect())
}

pub async fn search_instructors(pool: &PgPool, query: &str) -> anyhow::Result<Vec<Instructor>> {
    let pattern = format!("%{query}%");
    let rows = sqlx::query(&format!(
        "SELECT {INSTRUCTOR_COLUMNS} FROM dojoboard.instructors i \
         JOIN dojoboard.schools s ON s.id = i.school_id \
         WHERE i.name ILIKE $1 ORDER BY i.name"
    ))
    .bind(&pattern)
    .fetch_all(pool)
    .await
    .context("instructor search failed")?;

    rows.iter().map(instructor_from_row).collect()
}

pub async fn insert_school(
    pool: &PgPool,
    name: &str,
    location: &str,
    image_url: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO dojoboard.schools (id, name, location, image_url) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(name)
    .bind(location)
    .bind(image_url)
    .execute(pool)
    .await
    .with_context(|| format!("failed to add school '{name}'"))?;

    Ok(id)
}

pub async fn insert_instructor(
    pool: &PgPool,
    name: &str,
    belt: Belt,
    school_id: Uuid,
    image_url: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO dojoboard.instructors (id, name, belt, school_id, image_url) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(name)
    .bind(belt.as_str())
    .bind(school_id)
    .bind(image_url)
    .execute(pool)
    .await
    .with_context(|| format!("failed to add instructor '{name}'"))?;

    Ok(id)
}

/// Returns `None` when a `source_key` collision skipped the insert.
pub async fn insert_school_review(
    pool: &PgPool,
    school_id: Uuid,
    input: &SchoolReviewInput,
) -> anyhow::Result<Option<Uuid>> {
    validate::school_review(input)?;

    let id = Uuid::new_v4();
    let mut query = sqlx::query(
        "INSERT INTO dojoboard.school_reviews \
         (id, school_id, training_partner_quality, curriculum_quality, coaching_quality, \
          class_variety, schedule, cleanliness, cost, competition_support, injury_management, \
          vibe_fit, coach_availability, student_retention, conflict_handling, inclusivity, \
          comment, user_email, source_key) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
          $17, $18, $19) \
         ON CONFLICT (source_key) DO NOTHING",
    )
    .bind(id)
    .bind(school_id);

    for score in input.scores {
        query = query.bind(score);
    }

    let result = query
        .bind(input.comment.as_deref())
        .bind(input.user_email.as_deref())
        .bind(input.source_key.as_deref())
        .execute(pool)
        .await
        .context("failed to submit school review")?;

    Ok((result.rows_affected() > 0).then_some(id))
}

pub async fn insert_instructor_review(
    pool: &PgPool,
    instructor_id: Uuid,
    input: &InstructorReviewInput,
) -> anyhow::Result<Uuid> {
    validate::instructor_review(input)?;

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO dojoboard.instructor_reviews \
         (id, instructor_id, quality, dedication, tags, comment, user_email) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(id)
    .bind(instructor_id)
    .bind(input.quality)
    .bind(input.dedication)
    .bind(&input.tags)
    .bind(input.comment.as_deref())
    .bind(input.user_email.as_deref())
    .execute(pool)
    .await
    .context("failed to submit instructor review")?;

    Ok(id)
}

/// A "report this review" action appends a flag record; the review itself
/// is never touched.
pub async fn insert_review_flag(
    pool: &PgPool,
    target: FlagTarget,
    reason: &str,
) -> anyhow::Result<Uuid> {
    let (school_review_id, instructor_review_id) = match target {
        FlagTarget::SchoolReview(id) => (Some(id), None),
        FlagTarget::InstructorReview(id) => (None, Some(id)),
    };

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO dojoboard.review_flags \
         (id, school_review_id, instructor_review_id, reason) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(school_review_id)
    .bind(instructor_review_id)
    .bind(reason)
    .execute(pool)
    .await
    .context("failed to record review flag")?;

    Ok(id)
}

pub async fn import_school_reviews_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        school_name: String,
        location: String,
        training_partner_quality: Option<i16>,
        curriculum_quality: Option<i16>,
        coaching_quality: Option<i16>,
        class_variety: Option<i16>,
        schedule: Option<i16>,
        cleanliness: Option<i16>,
        cost: Option<i16>,
        competition_support: Option<i16>,
        injury_management: Option<i16>,
        vibe_fit: Option<i16>,
        coach_availability: Option<i16>,
        student_retention: Option<i16>,
        conflict_handling: Option<i16>,
        inclusivity: Option<i16>,
        comment: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;

        let school_id: Uuid = sqlx::query(
            "INSERT INTO dojoboard.schools (id, name, location) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (name) DO UPDATE SET location = EXCLUDED.location \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&row.school_name)
        .bind(&row.location)
        .fetch_one(pool)
        .await?
        .get("id");

        let input = SchoolReviewInput {
            scores: [
                row.training_partner_quality,
                row.curriculum_quality,
                row.coaching_quality,
                row.class_variety,
                row.schedule,
                row.cleanliness,
                row.cost,
                row.competition_support,
                row.injury_management,
                row.vibe_fit,
                row.coach_availability,
                row.student_retention,
                row.conflict_handling,
                row.inclusivity,
            ],
            comment: row.comment,
            user_email: None,
            source_key: Some(
                row.source_key
                    .unwrap_or_else(|| format!("import-{}", Uuid::new_v4())),
            ),
        };

        let outcome = insert_school_review(pool, school_id, &input)
            .await
            .with_context(|| format!("invalid review row for '{}'", row.school_name))?;

        if outcome.is_some() {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn fetch_stats(pool: &PgPool) -> anyhow::Result<DirectoryStats> {
    let row = sqlx::query(
        "SELECT \
         (SELECT COUNT(*) FROM dojoboard.schools) AS schools, \
         (SELECT COUNT(*) FROM dojoboard.instructors) AS instructors, \
         (SELECT COUNT(*) FROM dojoboard.school_reviews) AS school_reviews, \
         (SELECT COUNT(*) FROM dojoboard.instructor_reviews) AS instructor_reviews",
    )
    .fetch_one(pool)
    .await
    .context("failed to fetch directory stats")?;

    Ok(DirectoryStats {
        schools: row.get("schools"),
        instructors: row.get("instructors"),
        school_reviews: row.get("school_reviews"),
        instructor_reviews: row.get("instructor_reviews"),
    })
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let schools = vec![
        (
            Uuid::parse_str("7b1e9c5a-40d2-4f31-9a6e-2f0c8b6d91a4")?,
            "10th Planet Jiu Jitsu",
            "Los Angeles, CA",
            "https://images.unsplash.com/photo-1555597673-b21d5c935865?w=400",
        ),
        (
            Uuid::parse_str("c3f82d17-6e5b-4a09-b7c4-51d2e8a90f36")?,
            "Gracie Barra HQ",
            "Irvine, CA",
            "https://images.unsplash.com/photo-1544367567-0f2fcb009e0b?w=400",
        ),
        (
            Uuid::parse_str("e9a64f20-1c8d-4b75-8d13-7a5b90c4e2d8")?,
            "Atos Jiu Jitsu",
            "San Diego, CA",
            "https://images.unsplash.com/photo-1571019614242-c5c5dee9f50b?w=400",
        ),
    ];

    for (id, name, location, image_url) in schools {
        sqlx::query(
            "INSERT INTO dojoboard.schools (id, name, location, image_url) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (name) DO UPDATE \
             SET location = EXCLUDED.location, image_url = EXCLUDED.image_url",
        )
        .bind(id)
        .bind(name)
        .bind(location)
        .bind(image_url)
        .execute(pool)
        .await?;
    }

    let instructors = vec![
        (
            Uuid::parse_str("4d2a7c91-8f36-4e50-a1b8-c95d30e2f674")?,
            "Eddie Bravo",
            Belt::Black,
            "10th Planet Jiu Jitsu",
            "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400",
        ),
        (
            Uuid::parse_str("91c5e3b8-2d74-4a16-b0f9-6e8a45d1c237")?,
            "Carlos Gracie Jr",
            Belt::Red,
            "Gracie Barra HQ",
            "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=400",
        ),
        (
            Uuid::parse_str("a86f14d9-5b20-4c83-9e67-3d1c72b8e045")?,
            "Andre Galvao",
            Belt::Black,
            "Atos Jiu Jitsu",
            "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?w=400",
        ),
    ];

    for (id, name, belt, school_name, image_url) in instructors {
        let school_id: Uuid = sqlx::query("SELECT id FROM dojoboard.schools WHERE name = $1")
            .bind(school_name)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            "INSERT INTO dojoboard.instructors (id, name, belt, school_id, image_url) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(name)
        .bind(belt.as_str())
        .bind(school_id)
        .bind(image_url)
        .execute(pool)
        .await?;
    }

    let school_reviews = vec![
        (
            "seed-sr-001",
            "10th Planet Jiu Jitsu",
            [
                Some(5),
                Some(5),
                Some(5),
                Some(4),
                Some(4),
                Some(4),
                Some(3),
                Some(5),
                Some(4),
                Some(5),
                Some(4),
                Some(4),
                Some(4),
                Some(5),
            ],
            "Best no-gi room in the city. The rubber guard curriculum is the real deal.",
        ),
        (
            "seed-sr-002",
            "10th Planet Jiu Jitsu",
            [
                Some(4),
                None,
                Some(5),
                None,
                None,
                Some(3),
                None,
                None,
                None,
                Some(5),
                None,
                None,
                None,
                None,
            ],
            "Only dropped in for a week, so I can't speak to cost or schedule, but the partners were great.",
        ),
        (
            "seed-sr-003",
            "Gracie Barra HQ",
            [
                Some(5),
                Some(5),
                Some(5),
                Some(4),
                Some(4),
                Some(5),
                Some(3),
                Some(5),
                Some(4),
                Some(4),
                Some(4),
                Some(5),
                Some(4),
                Some(5),
            ],
            "Structured curriculum and spotless mats. You pay for it, though.",
        ),
        (
            "seed-sr-004",
            "Atos Jiu Jitsu",
            [
                Some(5),
                Some(5),
                Some(5),
                Some(4),
                Some(4),
                Some(5),
                Some(3),
                Some(5),
                Some(4),
                Some(5),
                Some(4),
                Some(5),
                Some(4),
                Some(4),
            ],
            "Competition training at its finest. Bring your cardio.",
        ),
    ];

    for (source_key, school_name, scores, comment) in school_reviews {
        let school_id: Uuid = sqlx::query("SELECT id FROM dojoboard.schools WHERE name = $1")
            .bind(school_name)
            .fetch_one(pool)
            .await?
            .get("id");

        let input = SchoolReviewInput {
            scores,
            comment: Some(comment.to_string()),
            user_email: None,
            source_key: Some(source_key.to_string()),
        };
        insert_school_review(pool, school_id, &input).await?;
    }

    let instructor_reviews = vec![
        (
            Uuid::parse_str("5f30b8c2-7d14-4e96-a258-91c6d0e4b7a3")?,
            "Eddie Bravo",
            5,
            5,
            vec!["Creative", "Entertaining"],
            "Eddie's teaching style is unmatched. His passion for the game is infectious.",
            NaiveDate::from_ymd_opt(2025, 8, 15).context("invalid date")?,
        ),
        (
            Uuid::parse_str("b2d87e41-3a69-4c05-8f12-d47e90a5c186")?,
            "Eddie Bravo",
            5,
            5,
            vec!["Rubber Guard Master", "No-Gi Specialist"],
            "The most dedicated instructor I've ever trained with. Goes down rabbit holes but that's part of the charm.",
            NaiveDate::from_ymd_opt(2025, 7, 22).context("invalid date")?,
        ),
        (
            Uuid::parse_str("68c1f5a7-9e42-4b38-bd90-25a8e7d3c614")?,
            "Carlos Gracie Jr",
            5,
            4,
            vec!["Technical", "Traditional"],
            "Learning from a Gracie is a privilege. Incredibly technical and methodical approach.",
            NaiveDate::from_ymd_opt(2025, 9, 1).context("invalid date")?,
        ),
        (
            Uuid::parse_str("d4a92b06-1f75-4380-96cd-83e5b1f7a429")?,
            "Andre Galvao",
            5,
            5,
            vec!["Intense", "Competition Focused"],
            "Andre's intensity is unreal. If you want to compete, this is your guy.",
            NaiveDate::from_ymd_opt(2025, 8, 28).context("invalid date")?,
        ),
    ];

    for (id, instructor_name, quality, dedication, tags, comment, reviewed_on) in
        instructor_reviews
    {
        let instructor_id: Uuid =
            sqlx::query("SELECT id FROM dojoboard.instructors WHERE name = $1")
                .bind(instructor_name)
                .fetch_one(pool)
                .await?
                .get("id");

        let created_at = reviewed_on
            .and_hms_opt(12, 0, 0)
            .context("invalid time")?
            .and_utc();
        let tags: Vec<String> = tags.into_iter().map(String::from).collect();

        sqlx::query(
            "INSERT INTO dojoboard.instructor_reviews \
             (id, instructor_id, quality, dedication, tags, comment, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(instructor_id)
        .bind(quality as i16)
        .bind(dedication as i16)
        .bind(&tags)
        .bind(comment)
        .bind(created_at)
        .execute(pool)
        .await?;
    }

    Ok(())
}
