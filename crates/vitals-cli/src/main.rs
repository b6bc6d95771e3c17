use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::{
    env, fs,
    io::{self, Read},
    path::{Path, PathBuf},
};
use vitals_lib::{
    align::{align_with_config, BoundaryFill, SleepStagePolicy},
    config::{load_config, VitalsConfig},
    io::{
        fitbit::{read_json, ActivityDay, HeartRateDay, SleepDay, Spo2Day},
        table::render_table_csv,
        text as text_io,
    },
    metrics::{
        daily::{DailySummary, DashboardStats},
        window::{TimeWindow, WindowStats},
    },
    session::{SessionGate, SessionState},
    signal::{Series, SignalKind},
};

#[derive(Parser)]
#[command(
    name = "vitals",
    version,
    about = "Vitals: align and summarise fitness-tracker day files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TableFormat {
    Csv,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Boundary {
    Extrapolate,
    Hold,
    Leave,
}

impl From<Boundary> for BoundaryFill {
    fn from(value: Boundary) -> Self {
        match value {
            Boundary::Extrapolate => BoundaryFill::Extrapolate,
            Boundary::Hold => BoundaryFill::Hold,
            Boundary::Leave => BoundaryFill::Leave,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SleepStage {
    Snap,
    Raw,
}

impl From<SleepStage> for SleepStagePolicy {
    fn from(value: SleepStage) -> Self {
        match value {
            SleepStage::Snap => SleepStagePolicy::Snap,
            SleepStage::Raw => SleepStagePolicy::Raw,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SessionAction {
    Login,
    Use,
    Reset,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge one day's SpO2, sleep and heart-rate payloads onto a per-minute grid
    Align {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        spo2: Option<PathBuf>,
        #[arg(long)]
        sleep: Option<PathBuf>,
        #[arg(long)]
        heart: Option<PathBuf>,
        #[arg(long, default_value = "csv")]
        format: TableFormat,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        boundary: Option<Boundary>,
        #[arg(long)]
        sleep_stage: Option<SleepStage>,
    },
    /// Summarise one day's activity, sleep and heart-rate payloads as a JSON line
    Daily {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        activity: Option<PathBuf>,
        #[arg(long)]
        sleep: Option<PathBuf>,
        #[arg(long)]
        heart: Option<PathBuf>,
    },
    /// Dashboard statistics over newline-delimited daily summaries (stdin or --input)
    Dashboard {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        days: Option<usize>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Heart-rate and sleep-stage statistics for a time-of-day window
    Window {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        heart: Option<PathBuf>,
        #[arg(long)]
        sleep: Option<PathBuf>,
    },
    /// Apply one transition to a stored usage-gate session
    Session {
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        action: SessionAction,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Align {
            date,
            spo2,
            sleep,
            heart,
            format,
            out,
            config,
            boundary,
            sleep_stage,
        } => cmd_align(
            date,
            spo2.as_deref(),
            sleep.as_deref(),
            heart.as_deref(),
            format,
            out.as_deref(),
            config.as_deref(),
            boundary,
            sleep_stage,
        )?,
        Commands::Daily {
            date,
            activity,
            sleep,
            heart,
        } => cmd_daily(date, activity.as_deref(), sleep.as_deref(), heart.as_deref())?,
        Commands::Dashboard {
            input,
            days,
            config,
        } => cmd_dashboard(input.as_deref(), days, config.as_deref())?,
        Commands::Window {
            date,
            start,
            end,
            heart,
            sleep,
        } => cmd_window(date, &start, &end, heart.as_deref(), sleep.as_deref())?,
        Commands::Session {
            state,
            action,
            password,
            config,
        } => cmd_session(&state, action, password.as_deref(), config.as_deref())?,
    }
    Ok(())
}

fn read_config(path: Option<&Path>) -> Result<VitalsConfig> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(VitalsConfig::default()),
    }
}

fn read_optional<T: serde::de::DeserializeOwned>(path: Option<&Path>) -> Result<Option<T>> {
    path.map(read_json::<T>).transpose()
}

fn spo2_series(path: Option<&Path>) -> Result<Series> {
    match read_optional::<Spo2Day>(path)? {
        Some(day) => Ok(day.series()?),
        None => Ok(Series::new(SignalKind::OxygenSaturation)),
    }
}

fn sleep_series(path: Option<&Path>, date: NaiveDate) -> Result<Series> {
    match read_optional::<SleepDay>(path)? {
        Some(day) => Ok(day.stage_series(date)?),
        None => Ok(Series::new(SignalKind::SleepStage)),
    }
}

fn heart_series(path: Option<&Path>, date: NaiveDate) -> Result<Series> {
    match read_optional::<HeartRateDay>(path)? {
        Some(day) => Ok(day.intraday_series(date)?),
        None => Ok(Series::new(SignalKind::HeartRate)),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_align(
    date: NaiveDate,
    spo2: Option<&Path>,
    sleep: Option<&Path>,
    heart: Option<&Path>,
    format: TableFormat,
    out: Option<&Path>,
    config: Option<&Path>,
    boundary: Option<Boundary>,
    sleep_stage: Option<SleepStage>,
) -> Result<()> {
    let mut cfg = read_config(config)?.align;
    if let Some(boundary) = boundary {
        cfg.boundary = boundary.into();
    }
    if let Some(policy) = sleep_stage {
        cfg.sleep_stage = policy.into();
    }
    let oxygen = spo2_series(spo2)?;
    let stages = sleep_series(sleep, date)?;
    let heart_rate = heart_series(heart, date)?;
    info!(
        "{}: {} SpO2, {} sleep, {} heart-rate sample(s)",
        date,
        oxygen.len(),
        stages.len(),
        heart_rate.len()
    );
    let table = align_with_config(&oxygen, &stages, &heart_rate, &cfg);
    info!("{}: aligned {} minute(s)", date, table.len());

    let rendered = match format {
        TableFormat::Csv => render_table_csv(&table, cfg.sentinel)?,
        TableFormat::Json => serde_json::to_string(&table)? + "\n",
    };
    match out {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn cmd_daily(
    date: NaiveDate,
    activity: Option<&Path>,
    sleep: Option<&Path>,
    heart: Option<&Path>,
) -> Result<()> {
    let activity = read_optional::<ActivityDay>(activity)?;
    let sleep = read_optional::<SleepDay>(sleep)?;
    let heart = read_optional::<HeartRateDay>(heart)?;
    let summary =
        DailySummary::from_records(date, activity.as_ref(), sleep.as_ref(), heart.as_ref());
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_dashboard(input: Option<&Path>, days: Option<usize>, config: Option<&Path>) -> Result<()> {
    let mut cfg = read_config(config)?.dashboard;
    if let Some(days) = days {
        cfg.days_to_show = days;
    }
    cfg.validate()?;
    let summaries: Vec<DailySummary> = match input {
        Some(path) => text_io::read_json_lines(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_json_lines(&buf)?
        }
    };
    info!("loaded {} daily summaries", summaries.len());
    let stats = DashboardStats::compute(&summaries, &cfg);
    println!("{}", serde_json::to_string(&stats)?);
    Ok(())
}

fn cmd_window(
    date: NaiveDate,
    start: &str,
    end: &str,
    heart: Option<&Path>,
    sleep: Option<&Path>,
) -> Result<()> {
    let window = TimeWindow::parse(start, end)?;
    let heart_rate = heart_series(heart, date)?;
    let segments = match read_optional::<SleepDay>(sleep)? {
        Some(day) => day.stage_segments()?,
        None => Vec::new(),
    };
    let stats = WindowStats::compute(window, &heart_rate, &segments);
    println!("{}", serde_json::to_string(&stats)?);
    Ok(())
}

fn cmd_session(
    state_path: &Path,
    action: SessionAction,
    password: Option<&str>,
    config: Option<&Path>,
) -> Result<()> {
    let cfg = read_config(config)?.session;
    let secret = env::var(&cfg.password_env)
        .map_err(|_| anyhow!("{} is not set", cfg.password_env))?;
    let gate = SessionGate::new(secret, cfg.max_uses);
    let state: SessionState = if state_path.exists() {
        let text = fs::read_to_string(state_path)
            .with_context(|| format!("reading {}", state_path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing session state {}", state_path.display()))?
    } else {
        gate.open()
    };
    let next = match action {
        SessionAction::Login => {
            let Some(attempt) = password else {
                bail!("login requires --password");
            };
            gate.authenticate(state, attempt)?
        }
        SessionAction::Use => gate.consume(state)?,
        SessionAction::Reset => gate.reset(state),
    };
    info!(
        "session: authenticated={} uses_remaining={}",
        next.authenticated, next.uses_remaining
    );
    fs::write(state_path, serde_json::to_string_pretty(&next)?)
        .with_context(|| format!("writing {}", state_path.display()))?;
    println!("{}", serde_json::to_string(&next)?);
    Ok(())
}
