use clap::{Args, Parser, Subcommand, ValueEnum};
use habit_engine::clock::{Clock, FixedClock, SystemClock};
use habit_engine::config::{Config, Overrides, LOG_ENV};
use habit_engine::date::{parse_day_index, parse_month, week_dates, DayIndex};
use habit_engine::engine::{day_state_on, DayState};
use habit_engine::error::HabitError;
use habit_engine::model::{Frequency, Habit, NewHabit, ReminderTime};
use habit_engine::output::{render_progress_bar, render_table, to_json_pretty, Styler};
use habit_engine::schedule::{active_days_to_string, parse_active_days};
use habit_engine::stats::{day_progress, month_calendar, summarize};
use habit_engine::store::JsonStore;
use habit_engine::tracker::HabitTracker;
use serde_json::json;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum FrequencyArg {
    Daily,
    Weekly,
    Monthly,
}

impl FrequencyArg {
    fn to_frequency(self) -> Frequency {
        match self {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Weekly => Frequency::Weekly,
            FrequencyArg::Monthly => Frequency::Monthly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "habit", version, about = "Habit streak tracker")]
struct Cli {
    /// Overrides the store path for this invocation.
    #[arg(long, global = true)]
    store: Option<String>,

    /// Overrides logical "today" (YYYY-MM-DD) for deterministic output/testing.
    #[arg(long, global = true)]
    today: Option<String>,

    /// User whose habits are loaded. A blank value means no session.
    #[arg(long, global = true)]
    user: Option<String>,

    #[arg(long, global = true, value_enum, default_value = "table")]
    format: Format,

    /// Disables ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a habit.
    Add(AddArgs),
    /// All habits with today's state.
    List,
    /// Habits scheduled for today, or another day of this week.
    Today(TodayArgs),
    /// Mark a habit done for today.
    Done(SelectorArgs),
    Delete(SelectorArgs),
    Show(SelectorArgs),
    Stats(StatsArgs),
    /// Month view of completed days.
    Calendar(CalendarArgs),
    /// Dates of the current week, Monday first.
    Week,
    /// Pending reminder notifications.
    Reminders,
}

#[derive(Args, Debug)]
struct AddArgs {
    name: String,

    /// One of: everyday, weekdays, weekends, mon,tue,...,sun
    #[arg(long, default_value = "everyday")]
    days: String,

    /// Reminder time of day, HH:MM
    #[arg(long, default_value = "09:00")]
    reminder: String,

    #[arg(long, default_value = "checkmark")]
    icon: String,

    #[arg(long, value_enum, default_value = "daily")]
    frequency: FrequencyArg,
}

#[derive(Args, Debug)]
struct TodayArgs {
    /// Day of the current week: mon..sun or 0..6 (Monday = 0)
    #[arg(long)]
    day: Option<String>,
}

#[derive(Args, Debug)]
struct SelectorArgs {
    /// Habit selector: id, unique id prefix, or unique name prefix (case-insensitive)
    habit: String,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Optional habit selector
    habit: Option<String>,
}

#[derive(Args, Debug)]
struct CalendarArgs {
    habit: String,

    /// YYYY-MM, defaults to the month containing today
    #[arg(long)]
    month: Option<String>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => e.exit(),
    };

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_env(LOG_ENV)
        .format_timestamp(None)
        .init();

    let exit = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

fn print_json<T: serde::Serialize>(obj: &T) -> Result<(), HabitError> {
    println!("{}", to_json_pretty(obj)?);
    Ok(())
}

fn short_id(habit: &Habit) -> String {
    habit.id.as_str().chars().take(8).collect()
}

fn state_cell(styler: &Styler, state: DayState) -> String {
    match state {
        DayState::DueDone => styler.green(state.as_str()),
        DayState::DueNotDone => styler.yellow(state.as_str()),
        DayState::NotDueToday => styler.gray(state.as_str()),
    }
}

fn run(cli: Cli) -> Result<(), HabitError> {
    let config = Config::from_env(Overrides {
        store: cli.store.clone(),
        today: cli.today.clone(),
        user: cli.user.clone(),
        no_color: cli.no_color,
    })?;

    match config.today {
        Some(day) => execute(cli, &config, FixedClock(day)),
        None => execute(cli, &config, SystemClock),
    }
}

fn execute<C: Clock>(cli: Cli, config: &Config, clock: C) -> Result<(), HabitError> {
    let styler = Styler::new(config.color);
    let store = JsonStore::new(&config.store_path);
    let user_id = config.user_id.clone().unwrap_or_default();
    let reminders = store.reminders_for(user_id.as_str());
    let mut tracker = HabitTracker::new(&store, &reminders, clock, config.user_id.clone());
    tracker.open()?;
    let today = tracker.today();
    let json = cli.format == Format::Json;

    match cli.command {
        Command::Add(args) => {
            let input = NewHabit {
                name: args.name,
                icon_name: args.icon,
                frequency: args.frequency.to_frequency(),
                reminder_time: args.reminder.parse::<ReminderTime>()?,
                active_days: parse_active_days(&args.days)?,
            };
            let habit = tracker.create(input)?;
            if json {
                print_json(&json!({ "habit": habit }))?;
            } else {
                println!(
                    "Added {} ({}) on {} at {}",
                    habit.name,
                    short_id(&habit),
                    active_days_to_string(&habit.active_days),
                    habit.reminder_time
                );
            }
        }
        Command::List => {
            let summaries: Vec<_> = tracker.habits().iter().map(|h| summarize(h, today)).collect();
            if json {
                print_json(&json!({ "date": today, "habits": summaries }))?;
            } else if summaries.is_empty() {
                println!("{}", styler.gray("No habits yet."));
            } else {
                let rows: Vec<Vec<String>> = tracker
                    .habits()
                    .iter()
                    .zip(summaries.iter())
                    .map(|(h, s)| {
                        vec![
                            short_id(h),
                            h.name.clone(),
                            s.schedule.clone(),
                            state_cell(&styler, s.state),
                            s.current_streak.to_string(),
                            s.longest_streak.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    render_table(&["id", "name", "days", "today", "streak", "best"], &rows)
                );
            }
        }
        Command::Today(args) => {
            let day = match args.day.as_deref() {
                Some(d) => parse_day_index(d)?,
                None => DayIndex::of(today),
            };
            let date = week_dates(today)[day.as_usize()];
            let due = tracker.habits_for(day);
            let progress = day_progress(tracker.habits(), date, today);
            if json {
                let habits: Vec<_> = due
                    .iter()
                    .map(|h| {
                        json!({
                            "id": h.id,
                            "name": h.name,
                            "icon_name": h.icon_name,
                            "state": day_state_on(h, date, today),
                            "streak_count": h.streak_count,
                        })
                    })
                    .collect();
                print_json(&json!({
                    "date": date,
                    "day_index": day,
                    "habits": habits,
                    "progress": progress,
                }))?;
            } else {
                println!("{} ({})", date, day.short_name());
                if due.is_empty() {
                    println!("{}", styler.gray("Nothing scheduled."));
                } else {
                    let rows: Vec<Vec<String>> = due
                        .iter()
                        .map(|h| {
                            vec![
                                h.name.clone(),
                                state_cell(&styler, day_state_on(h, date, today)),
                                h.streak_count.to_string(),
                            ]
                        })
                        .collect();
                    println!("{}", render_table(&["name", "state", "streak"], &rows));
                    println!(
                        "{} {}/{}",
                        render_progress_bar(progress.progress, 20),
                        progress.done,
                        progress.due
                    );
                }
            }
        }
        Command::Done(args) => {
            let id = tracker.resolve(&args.habit)?.id.clone();
            let delta = tracker.complete(&id)?;
            let habit = tracker.resolve(id.as_str())?;
            if json {
                print_json(&json!({
                    "habit": habit,
                    "already_done": delta.is_empty(),
                    "changed": delta.field_names(),
                }))?;
            } else if delta.is_empty() {
                println!("Already done today: {}", habit.name);
            } else {
                println!(
                    "{} {} (streak {}, best {})",
                    styler.green("Done:"),
                    habit.name,
                    habit.streak_count,
                    habit.longest_streak
                );
            }
        }
        Command::Delete(args) => {
            let id = tracker.resolve(&args.habit)?.id.clone();
            let habit = tracker.delete(&id)?;
            if json {
                print_json(&json!({ "deleted": habit }))?;
            } else {
                println!("Deleted {} ({})", habit.name, short_id(&habit));
            }
        }
        Command::Show(args) => {
            let habit = tracker.resolve(&args.habit)?;
            let summary = summarize(habit, today);
            if json {
                print_json(&json!({ "habit": habit, "summary": summary }))?;
            } else {
                let rate = summary
                    .completion_rate
                    .map(|r| format!("{:.0}%", r * 100.0))
                    .unwrap_or_else(|| "-".to_string());
                let rows = vec![
                    vec!["id".to_string(), habit.id.to_string()],
                    vec!["icon".to_string(), habit.icon_name.clone()],
                    vec!["frequency".to_string(), habit.frequency.as_str().to_string()],
                    vec!["days".to_string(), summary.schedule.clone()],
                    vec!["reminder".to_string(), habit.reminder_time.to_string()],
                    vec!["today".to_string(), state_cell(&styler, summary.state)],
                    vec!["streak".to_string(), summary.current_streak.to_string()],
                    vec!["best".to_string(), summary.longest_streak.to_string()],
                    vec![
                        "completions".to_string(),
                        format!("{} / {} attempts", summary.total_completions, summary.total_attempts),
                    ],
                    vec!["rate".to_string(), rate],
                    vec!["this month".to_string(), summary.days_done_in_month.to_string()],
                    vec!["created".to_string(), habit.creation_date.to_string()],
                ];
                println!("{}", habit.name);
                println!("{}", render_table(&["field", "value"], &rows));
            }
        }
        Command::Stats(args) => {
            let habits: Vec<&Habit> = match args.habit.as_deref() {
                Some(sel) => vec![tracker.resolve(sel)?],
                None => tracker.habits().iter().collect(),
            };
            let summaries: Vec<_> = habits.iter().map(|h| summarize(h, today)).collect();
            if json {
                print_json(&json!({ "date": today, "stats": summaries }))?;
            } else {
                let rows: Vec<Vec<String>> = summaries
                    .iter()
                    .map(|s| {
                        vec![
                            s.name.clone(),
                            s.current_streak.to_string(),
                            s.longest_streak.to_string(),
                            format!("{}/{}", s.total_completions, s.total_attempts),
                            s.completion_rate
                                .map(|r| format!("{:.0}%", r * 100.0))
                                .unwrap_or_else(|| "-".to_string()),
                            s.days_done_in_month.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    render_table(&["name", "streak", "best", "done", "rate", "month"], &rows)
                );
            }
        }
        Command::Calendar(args) => {
            let habit = tracker.resolve(&args.habit)?;
            let month = match args.month.as_deref() {
                Some(m) => parse_month(m)?,
                None => today,
            };
            let calendar = month_calendar(habit, month);
            if json {
                print_json(&json!({
                    "habit_id": habit.id,
                    "name": habit.name,
                    "calendar": calendar,
                }))?;
            } else {
                println!(
                    "{} {} ({} done)",
                    habit.name,
                    calendar.metadata.first_day.format("%B %Y"),
                    calendar.days_done
                );
                println!(" Mo  Tu  We  Th  Fr  Sa  Su");
                let lead = calendar.metadata.first_day_index.as_usize();
                let mut cells: Vec<String> = vec!["    ".to_string(); lead];
                for day in calendar.days.iter() {
                    let n = format!("{:>3}", day.date.format("%-d").to_string());
                    cells.push(if day.completed {
                        format!("{}*", styler.green(&n))
                    } else {
                        format!("{} ", n)
                    });
                }
                for week in cells.chunks(7) {
                    println!("{}", week.concat().trim_end());
                }
            }
        }
        Command::Week => {
            let dates = week_dates(today);
            if json {
                let days: Vec<_> = dates
                    .iter()
                    .map(|d| {
                        json!({
                            "date": d,
                            "day": DayIndex::of(*d).short_name(),
                            "is_today": *d == today,
                        })
                    })
                    .collect();
                print_json(&json!({ "week": days }))?;
            } else {
                let line = dates
                    .iter()
                    .map(|d| {
                        let cell = format!("{} {}", DayIndex::of(*d).short_name(), d.format("%-d"));
                        if *d == today {
                            styler.green(&cell)
                        } else {
                            cell
                        }
                    })
                    .collect::<Vec<String>>()
                    .join("  ");
                println!("{}", line);
            }
        }
        Command::Reminders => {
            let reminders = store.pending_reminders(&user_id)?;
            if json {
                print_json(&json!({ "reminders": reminders }))?;
            } else if reminders.is_empty() {
                println!("{}", styler.gray("No reminders scheduled."));
            } else {
                let rows: Vec<Vec<String>> = reminders
                    .iter()
                    .map(|r| {
                        let day = DayIndex::from_platform_weekday(r.weekday)
                            .map(|d| d.short_name().to_string())
                            .unwrap_or_else(|_| r.weekday.to_string());
                        vec![r.habit_name.clone(), day, r.time.to_string(), r.identifier.clone()]
                    })
                    .collect();
                println!("{}", render_table(&["habit", "day", "time", "id"], &rows));
            }
        }
    }

    Ok(())
}
