use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use study_core::model::{
    DATE_FORMAT, GradeDraft, GradeId, Guide, PaperDraft, PaperFilter, PaperId, ShopItemId,
};

use crate::config::normalize_sqlite_url;

#[derive(Parser, Debug)]
#[command(name = "study-tracker")]
#[command(version, about = "Grades, papers, pomodoros and rewards for a student")]
#[command(after_help = "Environment:\n  STUDY_DB_URL, STUDY_LOG (fallback RUST_LOG), STUDY_FOCUS_SECS,\n  STUDY_BREAK_SECS, STUDY_TICK_MS")]
pub struct Cli {
    /// SQLite url or file path; overrides STUDY_DB_URL
    #[arg(long, global = true, value_parser = parse_db_url)]
    db: Option<String>,

    /// tracing filter; overrides STUDY_LOG
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Level, points, streak and dashboard (default)
    Status,

    /// Record an exam grade
    GradeAdd {
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        score: String,
        #[arg(long = "full", default_value = "100")]
        full_score: String,
        /// yyyy-mm-dd, today when omitted
        #[arg(long = "date", default_value = "")]
        exam_date: String,
        #[arg(long = "type", default_value = "测验")]
        exam_type: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Per-subject averages and trends
    Grades,

    /// Grades of one subject, newest first
    GradeShow { subject: String },

    #[command(name = "grade-rm")]
    GradeRemove {
        #[arg(value_parser = parse_grade_id)]
        id: GradeId,
    },

    /// Add a paper to the library
    PaperAdd {
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long = "type", default_value = "练习")]
        paper_type: String,
        /// yyyy-mm-dd, today when omitted
        #[arg(long, default_value = "")]
        date: String,
        #[arg(long)]
        score: Option<String>,
        #[arg(long = "full")]
        full_score: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List papers, optionally filtered
    Papers {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long = "type")]
        paper_type: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },

    #[command(name = "paper-rm")]
    PaperRemove {
        #[arg(value_parser = parse_paper_id)]
        id: PaperId,
    },

    /// Log a study session
    Study,

    /// Set a SMART goal
    Goal {
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        text: Vec<String>,
    },

    /// Run focus/break cycles in the terminal
    Pomodoro {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        cycles: u32,
    },

    Achievements,

    Shop,

    Buy {
        #[arg(value_parser = parse_item)]
        item: ShopItemId,
    },

    /// feynman, review, smart or mindmap
    Guide {
        #[arg(value_parser = parse_guide)]
        guide: Guide,
        /// yyyy-mm-dd, today when omitted
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
    },

    /// Add sample records
    Seed,
}

/// What `main` runs, with form fields gathered into drafts.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    GradeAdd(GradeDraft),
    Grades,
    GradeShow { subject: String },
    GradeRemove(GradeId),
    PaperAdd(PaperDraft),
    Papers(PaperFilter),
    PaperRemove(PaperId),
    Study,
    Goal(String),
    Pomodoro { cycles: u32 },
    Achievements,
    Shop,
    Buy(ShopItemId),
    Guide { guide: Guide, start: Option<NaiveDate> },
    Seed,
}

/// A parsed command line. Flag values override the environment config.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    pub db_url: Option<String>,
    pub log_filter: Option<String>,
}

impl From<Cli> for Invocation {
    fn from(cli: Cli) -> Self {
        let command = match cli.command.unwrap_or(Commands::Status) {
            Commands::Status => Command::Status,
            Commands::GradeAdd {
                subject,
                score,
                full_score,
                exam_date,
                exam_type,
                notes,
            } => Command::GradeAdd(GradeDraft {
                subject,
                score,
                full_score,
                exam_date,
                exam_type,
                notes,
            }),
            Commands::Grades => Command::Grades,
            Commands::GradeShow { subject } => Command::GradeShow { subject },
            Commands::GradeRemove { id } => Command::GradeRemove(id),
            Commands::PaperAdd {
                subject,
                title,
                paper_type,
                date,
                score,
                full_score,
                notes,
            } => Command::PaperAdd(PaperDraft {
                subject,
                title,
                paper_type,
                date,
                score,
                full_score,
                notes,
            }),
            Commands::Papers {
                subject,
                paper_type,
                search,
            } => Command::Papers(PaperFilter {
                subject,
                paper_type,
                search,
            }),
            Commands::PaperRemove { id } => Command::PaperRemove(id),
            Commands::Study => Command::Study,
            Commands::Goal { text } => Command::Goal(text.join(" ")),
            Commands::Pomodoro { cycles } => Command::Pomodoro { cycles },
            Commands::Achievements => Command::Achievements,
            Commands::Shop => Command::Shop,
            Commands::Buy { item } => Command::Buy(item),
            Commands::Guide { guide, start } => Command::Guide { guide, start },
            Commands::Seed => Command::Seed,
        };
        Self {
            command,
            db_url: cli.db,
            log_filter: cli.log,
        }
    }
}

fn parse_db_url(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Err("database url must not be empty".to_string());
    }
    Ok(normalize_sqlite_url(raw.to_string()))
}

fn parse_grade_id(raw: &str) -> Result<GradeId, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn parse_paper_id(raw: &str) -> Result<PaperId, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn parse_item(raw: &str) -> Result<ShopItemId, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn parse_guide(raw: &str) -> Result<Guide, String> {
    Guide::from_key(raw).ok_or_else(|| "expected feynman, review, smart or mindmap".to_string())
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|err| format!("{err}"))
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn parse(args: &[&str]) -> Result<Invocation, clap::Error> {
        Cli::try_parse_from(std::iter::once("study-tracker").chain(args.iter().copied()))
            .map(Invocation::from)
    }

    fn command(args: &[&str]) -> Command {
        parse(args).expect("parse").command
    }

    #[test]
    fn no_arguments_shows_status() {
        assert_eq!(command(&[]), Command::Status);
        assert_eq!(command(&["--log", "debug"]), Command::Status);
    }

    #[test]
    fn help_is_reported_as_display_help() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let err = parse(&["shop", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn global_flags_are_collected_after_the_subcommand() {
        let inv = parse(&["shop", "--db", "sqlite::memory:", "--log", "info"]).expect("parse");
        assert_eq!(inv.command, Command::Shop);
        assert_eq!(inv.db_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(inv.log_filter.as_deref(), Some("info"));
    }

    #[test]
    fn db_path_is_normalized_and_blank_is_rejected() {
        let inv = parse(&["--db", "/tmp/study.sqlite3", "grades"]).expect("parse");
        assert_eq!(inv.db_url.as_deref(), Some("sqlite:///tmp/study.sqlite3"));
        let err = parse(&["--db", " ", "grades"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn grade_add_builds_draft_with_defaults() {
        let Command::GradeAdd(draft) =
            command(&["grade-add", "--subject", "数学", "--score", "88"])
        else {
            panic!("expected grade-add");
        };
        assert_eq!(draft.subject, "数学");
        assert_eq!(draft.score, "88");
        assert_eq!(draft.full_score, "100");
        assert_eq!(draft.exam_type, "测验");
        assert!(draft.exam_date.is_empty());
        assert_eq!(draft.notes, None);
    }

    #[test]
    fn paper_flags_are_scoped_to_their_command() {
        let err = parse(&["grades", "--subject", "x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(
            command(&["papers", "--search", "期中"]),
            Command::Papers(PaperFilter {
                search: Some("期中".into()),
                ..PaperFilter::default()
            })
        );
    }

    #[test]
    fn positional_arguments() {
        assert_eq!(command(&["grade-rm", "17"]), Command::GradeRemove(GradeId::new(17)));
        assert_eq!(command(&["paper-rm", "3"]), Command::PaperRemove(PaperId::new(3)));
        assert_eq!(
            command(&["goal", "每天", "背单词"]),
            Command::Goal("每天 背单词".into())
        );
        assert_eq!(command(&["buy", "study_music"]), Command::Buy(ShopItemId::StudyMusic));
        let err = parse(&["grade-rm"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn goal_text_may_start_with_dashes() {
        assert_eq!(
            command(&["goal", "--每天", "30", "分钟", "-v"]),
            Command::Goal("--每天 30 分钟 -v".into())
        );
        assert_eq!(
            parse(&["goal"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            parse(&["buy", "rocket"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["pomodoro", "--cycles", "0"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["guide", "speedread"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["teleport"]).unwrap_err().kind(),
            ErrorKind::InvalidSubcommand
        );
        assert!(parse(&["shop", "--db"]).is_err());
    }

    #[test]
    fn pomodoro_defaults_to_one_cycle() {
        assert_eq!(command(&["pomodoro"]), Command::Pomodoro { cycles: 1 });
        assert_eq!(
            command(&["pomodoro", "--cycles", "3"]),
            Command::Pomodoro { cycles: 3 }
        );
    }

    #[test]
    fn guide_with_start_date() {
        assert_eq!(
            command(&["guide", "review", "--start", "2025-10-01"]),
            Command::Guide {
                guide: Guide::SpacedRepetition,
                start: NaiveDate::from_ymd_opt(2025, 10, 1),
            }
        );
    }
}
