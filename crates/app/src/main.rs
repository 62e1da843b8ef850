mod args;
mod config;
mod render;

use std::error::Error;
use std::io::Write as _;
use std::time::Duration;

use services::{AppServices, Clock, Notification, StudyTracker, TimerEvent};
use study_core::model::{DATE_FORMAT, GradeDraft, PaperDraft};
use study_core::pomodoro::{Phase, PomodoroEvent};
use clap::Parser as _;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command, Invocation};
use crate::config::{AppConfig, ConfigError, DEFAULT_LOG_FILTER};

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn announce(notes: &[Notification]) {
    for note in notes {
        println!("{}", render::notification(note));
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let Invocation {
        command,
        db_url,
        log_filter,
    } = Invocation::from(Cli::parse());

    let mut config = AppConfig::from_env()?;
    if let Some(url) = db_url {
        config.db_url = url;
    }
    if let Some(filter) = log_filter {
        config.log_filter = filter;
    }
    init_tracing(&config.log_filter);

    ensure_db_dir(&config.db_url)?;
    let services =
        AppServices::new_sqlite(&config.db_url, Clock::default_clock(), config.pomodoro).await?;
    let mut tracker = services.tracker().await?;
    announce(&tracker.open_session().await?.notifications);

    match command {
        Command::Status => print!("{}", render::status(tracker.state())),
        Command::GradeAdd(draft) => {
            let draft = GradeDraft {
                exam_date: date_or_today(draft.exam_date, tracker.clock()),
                ..draft
            };
            let outcome = tracker.add_grade(draft).await?;
            println!("已记录成绩 #{}", outcome.value.id);
            announce(&outcome.notifications);
        }
        Command::Grades => {
            print!(
                "{}",
                render::subject_summaries(&tracker.state().records.subject_summaries())
            );
        }
        Command::GradeShow { subject } => {
            let grades = tracker.state().records.grades_for_subject(&subject);
            print!("{}", render::grades(&subject, &grades));
        }
        Command::GradeRemove(id) => {
            let outcome = tracker.remove_grade(id).await?;
            println!("已删除成绩 #{}", outcome.value.id);
        }
        Command::PaperAdd(draft) => {
            let draft = PaperDraft {
                date: date_or_today(draft.date, tracker.clock()),
                ..draft
            };
            let outcome = tracker.add_paper(draft).await?;
            println!("已添加试卷 #{}", outcome.value.id);
            announce(&outcome.notifications);
        }
        Command::Papers(filter) => {
            print!("{}", render::papers(&tracker.state().records.filter_papers(&filter)));
        }
        Command::PaperRemove(id) => {
            let outcome = tracker.remove_paper(id).await?;
            println!("已删除试卷 #{}", outcome.value.id);
        }
        Command::Study => {
            let outcome = tracker.start_study_session().await?;
            announce(&outcome.notifications);
        }
        Command::Goal(text) => {
            let outcome = tracker.set_goal(&text).await?;
            println!("目标已设定: {}", text.trim());
            announce(&outcome.notifications);
        }
        Command::Pomodoro { cycles } => {
            run_pomodoro(&services, &mut tracker, config.tick, cycles).await?;
        }
        Command::Achievements => {
            print!(
                "{}",
                render::achievements(&tracker.achievements(), &tracker.progress_goals())
            );
        }
        Command::Shop => {
            print!(
                "{}",
                render::shop(&tracker.shop_listings(), tracker.state().user.points())
            );
        }
        Command::Buy(item) => {
            let outcome = tracker.buy_item(item).await?;
            announce(&outcome.notifications);
        }
        Command::Guide { guide, start } => {
            let start = start.unwrap_or_else(|| tracker.clock().today());
            print!("{}", render::guide(guide, start));
        }
        Command::Seed => seed(&mut tracker).await?,
    }
    Ok(())
}

fn date_or_today(raw: String, clock: Clock) -> String {
    if raw.trim().is_empty() {
        clock.today().format(DATE_FORMAT).to_string()
    } else {
        raw
    }
}

/// Run `cycles` focus intervals with breaks in between; Ctrl-C stops early.
async fn run_pomodoro(
    services: &AppServices,
    tracker: &mut StudyTracker,
    tick: Duration,
    cycles: u32,
) -> Result<(), Box<dyn Error>> {
    let (mut timer, mut events) = services.pomodoro_timer(tick);
    let mut focused = 0;
    timer.start();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    TimerEvent::Tick { .. } => {
                        let session = timer.snapshot();
                        let label = match session.phase() {
                            Phase::Focus => "专注",
                            Phase::Break => "休息",
                        };
                        print!("\r{label} {}", session.display());
                        let _ = std::io::stdout().flush();
                    }
                    TimerEvent::Completed(done) => {
                        println!();
                        announce(&tracker.handle_pomodoro_event(done).await?);
                        if done == PomodoroEvent::FocusCompleted {
                            focused += 1;
                            if focused >= cycles {
                                break;
                            }
                        }
                        timer.start();
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("番茄钟已停止");
                break;
            }
        }
    }
    timer.close();
    Ok(())
}

async fn seed(tracker: &mut StudyTracker) -> Result<(), Box<dyn Error>> {
    let grades = [
        ("数学", "92", "2025-09-12", "月考"),
        ("数学", "96", "2025-10-10", "月考"),
        ("英语", "118", "2025-09-20", "期中"),
        ("语文", "105", "2025-09-20", "期中"),
    ];
    for (subject, score, date, kind) in grades {
        let full = if subject == "数学" { "100" } else { "150" };
        let outcome = tracker
            .add_grade(GradeDraft {
                subject: subject.to_string(),
                score: score.to_string(),
                full_score: full.to_string(),
                exam_date: date.to_string(),
                exam_type: kind.to_string(),
                notes: None,
            })
            .await?;
        announce(&outcome.notifications);
    }

    let papers = [
        ("数学", "函数专项练习", "练习", "2025-09-15", Some("45"), Some("50")),
        ("英语", "阅读理解训练", "练习", "2025-09-28", None, None),
    ];
    for (subject, title, kind, date, score, full) in papers {
        let outcome = tracker
            .add_paper(PaperDraft {
                subject: subject.to_string(),
                title: title.to_string(),
                paper_type: kind.to_string(),
                date: date.to_string(),
                score: score.map(str::to_string),
                full_score: full.map(str::to_string),
                notes: None,
            })
            .await?;
        announce(&outcome.notifications);
    }
    println!("seed: 已添加 {} 个成绩, {} 份试卷", grades.len(), papers.len());
    Ok(())
}

/// Make sure the directory of a file-backed database exists; sqlx creates the file.
fn ensure_db_dir(db_url: &str) -> Result<(), Box<dyn Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }
    let path = db_url
        .strip_prefix("sqlite://")
        .map(|rest| rest.split('?').next().unwrap_or(rest))
        .filter(|path| !path.is_empty())
        .ok_or_else(|| ConfigError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
