use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod db;
mod models;
mod ratings;
mod report;
mod tags;
mod validate;

use crate::models::{Belt, FlagTarget, InstructorReviewInput, SchoolReviewInput, SCHOOL_CRITERIA};

#[derive(Parser)]
#[command(name = "dojoboard")]
#[command(about = "Rate and browse martial arts schools and instructors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// List all schools, newest first
    Schools,
    /// List all instructors, newest first
    Instructors,
    /// Show a school with its rating breakdown
    School {
        id: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Show an instructor with averages and top tags
    Instructor {
        id: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Search schools and instructors by name (and school location)
    #[command(group(
        ArgGroup::new("scope")
            .args(["schools", "instructors"])
            .multiple(false)
    ))]
    Search {
        query: String,
        #[arg(long)]
        schools: bool,
        #[arg(long)]
        instructors: bool,
    },
    /// Add a school to the directory
    AddSchool {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Add an instructor to the directory
    AddInstructor {
        #[arg(long)]
        name: String,
        /// Belt rank, e.g. "Black Belt"
        #[arg(long)]
        belt: Belt,
        #[arg(long)]
        school: Uuid,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Submit a school review
    RateSchool {
        #[arg(long)]
        school: Uuid,
        /// Criterion score as <criterion>=<1-5>, repeatable (e.g. --score cost=3)
        #[arg(long = "score", value_name = "CRITERION=SCORE")]
        scores: Vec<String>,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Submit an instructor review
    RateInstructor {
        #[arg(long)]
        instructor: Uuid,
        #[arg(long)]
        quality: i16,
        #[arg(long)]
        dedication: i16,
        /// Repeatable; see the `tags` command for suggestions
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Report a review for moderation
    #[command(group(
        ArgGroup::new("target")
            .args(["school_review", "instructor_review"])
            .required(true)
            .multiple(false)
    ))]
    FlagReview {
        #[arg(long)]
        school_review: Option<Uuid>,
        #[arg(long)]
        instructor_review: Option<Uuid>,
        #[arg(long)]
        reason: String,
    },
    /// Import school reviews from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("subject")
            .args(["school", "instructor"])
            .required(true)
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        school: Option<Uuid>,
        #[arg(long)]
        instructor: Option<Uuid>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Directory-wide counts
    Stats,
    /// List suggested review tags
    Tags,
}

fn parse_score_assignment(raw: &str) -> anyhow::Result<(usize, i16)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected <criterion>=<score>, got '{raw}'"))?;

    let idx = SCHOOL_CRITERIA
        .iter()
        .position(|criterion| criterion.key == key)
        .ok_or_else(|| {
            let known: Vec<&str> = SCHOOL_CRITERIA.iter().map(|c| c.key).collect();
            anyhow!("unknown criterion '{key}' (one of: {})", known.join(", "))
        })?;

    let score: i16 = value
        .parse()
        .with_context(|| format!("invalid score '{value}' for {key}"))?;

    Ok((idx, score))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the hosted Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Schools => {
            let schools = db::list_schools(&pool).await?;
            if schools.is_empty() {
                println!("No schools yet.");
            } else {
                for school in &schools {
                    println!("- {} ({}) {}", school.name, school.location, school.id);
                }
            }
        }
        Commands::Instructors => {
            let instructors = db::list_instructors(&pool).await?;
            if instructors.is_empty() {
                println!("No instructors yet.");
            } else {
                for instructor in &instructors {
                    println!(
                        "- {} ({}, {}) {}",
                        instructor.name, instructor.belt, instructor.school_name, instructor.id
                    );
                }
            }
        }
        Commands::School { id, json } => {
            let detail = db::school_detail(&pool, id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                println!("{} ({})", detail.school.name, detail.school.location);
                match &detail.averages {
                    Some(averages) => {
                        println!(
                            "Overall {:.1} / 5 across {} reviews",
                            averages.overall, detail.review_count
                        );
                        for (criterion, average) in
                            SCHOOL_CRITERIA.iter().zip(averages.criteria.iter())
                        {
                            if average.observations > 0 {
                                println!("- {}: {:.1}", criterion.label, average.average);
                            }
                        }
                    }
                    None => println!("Not yet rated."),
                }
                if !detail.instructors.is_empty() {
                    println!("Instructors:");
                    for instructor in &detail.instructors {
                        println!("- {} ({})", instructor.name, instructor.belt);
                    }
                }
            }
        }
        Commands::Instructor { id, json } => {
            let detail = db::instructor_detail(&pool, id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                println!(
                    "{} ({}) at {}",
                    detail.instructor.name, detail.instructor.belt, detail.instructor.school_name
                );
                if detail.review_count == 0 {
                    println!("Not yet reviewed.");
                } else {
                    println!(
                        "Quality {:.1} / 5, Dedication {:.1} / 5 across {} reviews",
                        detail.averages.quality, detail.averages.dedication, detail.review_count
                    );
                }
                if !detail.top_tags.is_empty() {
                    println!("Top tags: {}", detail.top_tags.join(", "));
                }
            }
        }
        Commands::Search {
            query,
            schools,
            instructors,
        } => {
            let include_schools = schools || !instructors;
            let include_instructors = instructors || !schools;
            let mut any = false;

            if include_schools {
                let matches = db::search_schools(&pool, &query).await?;
                if !matches.is_empty() {
                    any = true;
                    println!("Schools ({}):", matches.len());
                    for school in &matches {
                        println!("- {} ({}) {}", school.name, school.location, school.id);
                    }
                }
            }
            if include_instructors {
                let matches = db::search_instructors(&pool, &query).await?;
                if !matches.is_empty() {
                    any = true;
                    println!("Instructors ({}):", matches.len());
                    for instructor in &matches {
                        println!(
                            "- {} ({}, {}) {}",
                            instructor.name,
                            instructor.belt,
                            instructor.school_name,
                            instructor.id
                        );
                    }
                }
            }
            if !any {
                println!("No matches for '{query}'.");
            }
        }
        Commands::AddSchool {
            name,
            location,
            image_url,
        } => {
            let id = db::insert_school(&pool, &name, &location, image_url.as_deref()).await?;
            println!("Added school {name} ({id}).");
        }
        Commands::AddInstructor {
            name,
            belt,
            school,
            image_url,
        } => {
            let id =
                db::insert_instructor(&pool, &name, belt, school, image_url.as_deref()).await?;
            println!("Added instructor {name} ({id}).");
        }
        Commands::RateSchool {
            school,
            scores,
            comment,
            email,
        } => {
            let mut input = SchoolReviewInput {
                comment,
                user_email: email,
                ..Default::default()
            };
            for raw in &scores {
                let (idx, score) = parse_score_assignment(raw)?;
                if input.scores[idx].is_some() {
                    anyhow::bail!("criterion '{}' given twice", SCHOOL_CRITERIA[idx].key);
                }
                input.scores[idx] = Some(score);
            }

            match db::insert_school_review(&pool, school, &input).await? {
                Some(id) => println!("Review {id} submitted."),
                None => println!("Review already recorded."),
            }
        }
        Commands::RateInstructor {
            instructor,
            quality,
            dedication,
            tags,
            comment,
            email,
        } => {
            let input = InstructorReviewInput {
                quality,
                dedication,
                tags,
                comment,
                user_email: email,
            };
            let id = db::insert_instructor_review(&pool, instructor, &input).await?;
            println!("Review {id} submitted.");
        }
        Commands::FlagReview {
            school_review,
            instructor_review,
            reason,
        } => {
            let target = school_review
                .map(FlagTarget::SchoolReview)
                .or(instructor_review.map(FlagTarget::InstructorReview))
                .context("a review id is required")?;
            let id = db::insert_review_flag(&pool, target, &reason).await?;
            println!("Flag {id} recorded.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_school_reviews_csv(&pool, &csv).await?;
            println!("Imported {inserted} reviews from {}.", csv.display());
        }
        Commands::Report {
            school,
            instructor,
            out,
        } => {
            let contents = if let Some(id) = school {
                let detail = db::school_detail(&pool, id).await?;
                report::school_report(&detail)
            } else {
                let id = instructor.context("a school or instructor id is required")?;
                let detail = db::instructor_detail(&pool, id).await?;
                report::instructor_report(&detail)
            };
            std::fs::write(&out, contents)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Stats => {
            let stats = db::fetch_stats(&pool).await?;
            println!(
                "{} schools, {} instructors, {} reviews ({} school, {} instructor)",
                stats.schools,
                stats.instructors,
                stats.school_reviews + stats.instructor_reviews,
                stats.school_reviews,
                stats.instructor_reviews
            );
        }
        Commands::Tags => {
            for tag in tags::SUGGESTED_TAGS {
                println!("- {tag}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_score_assignment;

    #[test]
    fn score_assignments_parse_by_criterion_key() {
        assert_eq!(parse_score_assignment("cost=3").unwrap(), (6, 3));
        assert_eq!(
            parse_score_assignment("training_partner_quality=5").unwrap(),
            (0, 5)
        );
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        assert!(parse_score_assignment("cost").is_err());
        assert!(parse_score_assignment("mat_burn=4").is_err());
        assert!(parse_score_assignment("cost=high").is_err());
    }
}
