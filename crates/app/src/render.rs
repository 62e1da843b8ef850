//! Plain-text projections of the tracker state for the terminal.

use std::fmt::Write as _;

use chrono::NaiveDate;
use services::{AchievementView, Notification, RewardReason};
use study_core::model::study_methods::review_plan;
use study_core::model::{
    Activity, AppState, GradeRecord, Guide, PaperRecord, ProgressGoal, ShopListing,
    SubjectSummary,
};

const RECENT_LIMIT: usize = 5;

pub fn notification(note: &Notification) -> String {
    match note {
        Notification::Reward {
            reason,
            experience,
            points,
        } => format!("{}: +{experience} EXP, +{points} 积分", reward_label(*reason)),
        Notification::LevelUp { level, title } => {
            format!("🎉 升级到 Lv.{level} {title}!")
        }
        Notification::AchievementUnlocked {
            name, icon, points, ..
        } => format!("{icon} 解锁成就「{name}」 +{points} 积分"),
        Notification::Purchased { name, price, .. } => {
            format!("已购买 {name} (-{price} 积分)")
        }
        Notification::StreakUpdated { streak_days } => {
            format!("🔥 连续学习 {streak_days} 天")
        }
    }
}

fn reward_label(reason: RewardReason) -> &'static str {
    match reason {
        RewardReason::GradeRecorded => "记录成绩",
        RewardReason::PaperRecorded => "整理试卷",
        RewardReason::StudySession => "学习打卡",
        RewardReason::GoalSet => "设定目标",
        RewardReason::PomodoroCompleted => "完成番茄钟",
    }
}

pub fn status(state: &AppState) -> String {
    let user = &state.user;
    let stats = state.dashboard_stats();
    let mut out = String::new();
    let _ = writeln!(out, "Lv.{} {}", user.level(), user.title());
    let _ = writeln!(
        out,
        "EXP {}/{} ({:.0}%)",
        user.experience(),
        user.experience_required(),
        user.experience_percent()
    );
    let _ = writeln!(out, "积分 {}  连续学习 {} 天", user.points(), user.streak_days());
    let _ = writeln!(
        out,
        "科目 {}  平均分 {}%  学习天数 {}  试卷 {}",
        stats.subject_count, stats.average_score_percent, stats.study_days, stats.paper_count
    );

    let recent = state.records.recent_activities(RECENT_LIMIT);
    if !recent.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "最近活动:");
        for activity in &recent {
            let _ = writeln!(out, "  {}", activity_line(activity));
        }
    }
    out
}

fn activity_line(activity: &Activity) -> String {
    match activity {
        Activity::Grade {
            subject,
            score,
            full_score,
            date,
        } => format!("{date} 📊 {subject} {score}/{full_score}"),
        Activity::Paper {
            subject,
            title,
            date,
        } => format!("{date} 📝 {subject} {title}"),
    }
}

pub fn subject_summaries(summaries: &[SubjectSummary]) -> String {
    if summaries.is_empty() {
        return "还没有成绩记录\n".to_string();
    }
    let mut out = String::new();
    for summary in summaries {
        let trend = summary.trend.map_or("-", |t| t.as_str());
        let _ = writeln!(
            out,
            "{:<8} {:>3} 次  平均 {:>5.1}%  趋势 {trend}",
            summary.subject, summary.count, summary.average_percent
        );
    }
    out
}

pub fn grades(subject: &str, grades: &[&GradeRecord]) -> String {
    if grades.is_empty() {
        return format!("{subject}: 没有成绩记录\n");
    }
    let mut out = String::new();
    let _ = writeln!(out, "{subject}:");
    for grade in grades {
        let _ = write!(
            out,
            "  #{} {} {} {}/{} ({:.1}%)",
            grade.id,
            grade.exam_date,
            grade.exam_type,
            grade.score,
            grade.full_score,
            grade.percent()
        );
        if let Some(notes) = &grade.notes {
            let _ = write!(out, "  {notes}");
        }
        out.push('\n');
    }
    out
}

pub fn papers(papers: &[&PaperRecord]) -> String {
    if papers.is_empty() {
        return "没有匹配的试卷\n".to_string();
    }
    let mut out = String::new();
    for paper in papers {
        let score = paper.percent().map_or_else(
            || "未评分".to_string(),
            |pct| format!("{}/{} ({pct:.1}%)", paper.score, paper.full_score),
        );
        let _ = writeln!(
            out,
            "#{} {} [{}] {} {} {score}",
            paper.id, paper.date, paper.paper_type, paper.subject, paper.title
        );
    }
    out
}

pub fn achievements(board: &[AchievementView], goals: &[ProgressGoal]) -> String {
    let mut out = String::new();
    for view in board {
        let def = view.definition;
        let mark = if view.unlocked { "✓" } else { " " };
        let _ = writeln!(
            out,
            "[{mark}] {} {}  {}",
            def.icon, def.name, def.description
        );
    }
    let _ = writeln!(out);
    for goal in goals {
        let _ = writeln!(
            out,
            "{} {}/{}{} ({:.0}%)",
            goal.name,
            goal.current,
            goal.target,
            goal.unit,
            goal.percent()
        );
    }
    out
}

pub fn shop(listings: &[ShopListing], points: u64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "积分余额 {points}");
    for listing in listings {
        let item = listing.item;
        let state = if listing.purchased {
            "已拥有"
        } else if listing.affordable {
            "可购买"
        } else {
            "积分不足"
        };
        let _ = writeln!(
            out,
            "{} {:<16} {:<8} {:>4} 积分  {state}  {}",
            item.icon,
            item.id.as_str(),
            item.name,
            item.price,
            item.description
        );
    }
    out
}

pub fn guide(guide: Guide, start: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", guide.title());
    for (n, step) in guide.steps().iter().enumerate() {
        let _ = writeln!(out, "  {}. {step}", n + 1);
    }
    if guide == Guide::SpacedRepetition {
        let _ = writeln!(out);
        for step in review_plan(start) {
            let label = if step.review == 0 {
                "学习".to_string()
            } else {
                format!("第{}次复习", step.review)
            };
            let _ = writeln!(out, "  {} 第{}天 {label}", step.date, step.day);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{AchievementId, ShopItemId, UserProgress};

    #[test]
    fn reward_notification_line() {
        let line = notification(&Notification::Reward {
            reason: RewardReason::GradeRecorded,
            experience: 20,
            points: 10,
        });
        assert_eq!(line, "记录成绩: +20 EXP, +10 积分");
    }

    #[test]
    fn achievement_notification_uses_catalog_text() {
        let def = AchievementId::FirstGrade.definition();
        let line = notification(&Notification::AchievementUnlocked {
            id: def.id,
            name: def.name,
            icon: def.icon,
            points: 50,
        });
        assert!(line.contains("初次记录"));
        assert!(line.contains("+50"));
    }

    #[test]
    fn status_shows_level_progress() {
        let state = AppState {
            user: UserProgress::from_persisted(2, 50, 30, 3, None),
            ..AppState::default()
        };
        let text = status(&state);
        assert!(text.starts_with("Lv.2 勤奋生"));
        assert!(text.contains("EXP 50/200 (25%)"));
        assert!(!text.contains("最近活动"));
    }

    #[test]
    fn shop_marks_unaffordable_items() {
        let listings = study_core::model::shop::listings(&Default::default(), 90);
        let text = shop(&listings, 90);
        let music = text
            .lines()
            .find(|l| l.contains(ShopItemId::StudyMusic.as_str()))
            .unwrap();
        assert!(music.contains("可购买"));
        let dark = text
            .lines()
            .find(|l| l.contains(ShopItemId::ThemeDark.as_str()))
            .unwrap();
        assert!(dark.contains("积分不足"));
    }

    #[test]
    fn review_guide_lists_dates() {
        let start = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let text = guide(Guide::SpacedRepetition, start);
        assert!(text.contains("2025-10-30 第30天 第5次复习"));
        assert!(text.contains("2025-10-01 第1天 学习"));
    }
}
