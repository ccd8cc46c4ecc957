//! Synthetic activity logs for demos and tests
//!
//! Writes one file per day. A fixed share of users is planted as loyal: they
//! visit a few more than the minimum number of distinct pages on every day.
//! The rest of each file is filled with random visits from the other users.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::entry::{LogEntry, UserId};

pub const PAGES: [&str; 20] = [
    "home",
    "blog",
    "shop",
    "about",
    "contact",
    "profile",
    "dashboard",
    "products",
    "services",
    "faq",
    "support",
    "news",
    "events",
    "gallery",
    "forum",
    "reviews",
    "careers",
    "partners",
    "pricing",
    "testimonials",
];

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub users: u64,
    pub entries_per_day: usize,
    pub loyal_rate: f64,
    pub min_pages: usize,
    pub start_date: NaiveDate,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            users: 10_000,
            entries_per_day: 10_000,
            loyal_rate: 0.18,
            min_pages: 4,
            start_date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap_or_default(),
            seed: None,
        }
    }
}

/// Paths written by the generator and the users planted as loyal.
#[derive(Debug, Clone)]
pub struct GeneratedLogs {
    pub day1: PathBuf,
    pub day2: PathBuf,
    pub loyal_users: BTreeSet<UserId>,
}

/// Write two consecutive daily logs into `dir`.
pub fn generate_log_files(dir: &Path, config: &GeneratorConfig) -> Result<GeneratedLogs> {
    if config.users == 0 {
        anyhow::bail!("generator needs at least one user");
    }
    if config.users > UserId::MAX as u64 {
        anyhow::bail!(
            "user count {} exceeds the largest user id {}",
            config.users,
            UserId::MAX
        );
    }
    if !(0.0..=1.0).contains(&config.loyal_rate) {
        anyhow::bail!("loyal rate must be between 0 and 1, got {}", config.loyal_rate);
    }
    if config.min_pages > PAGES.len() {
        anyhow::bail!(
            "min pages {} exceeds the {} available pages",
            config.min_pages,
            PAGES.len()
        );
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut rng = match config.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let loyal_users = pick_loyal_users(&mut rng, config);

    let second_date = config.start_date.succ_opt().unwrap_or(config.start_date);
    let day1 = write_day(dir, config.start_date, &loyal_users, config, &mut rng)?;
    let day2 = write_day(dir, second_date, &loyal_users, config, &mut rng)?;

    tracing::info!(
        day1 = %day1.display(),
        day2 = %day2.display(),
        loyal = loyal_users.len(),
        "generated log files"
    );

    Ok(GeneratedLogs {
        day1,
        day2,
        loyal_users,
    })
}

fn pick_loyal_users(rng: &mut fastrand::Rng, config: &GeneratorConfig) -> BTreeSet<UserId> {
    let count = ((config.users as f64) * config.loyal_rate).round() as u64;
    let mut loyal = BTreeSet::new();
    while (loyal.len() as u64) < count {
        loyal.insert(random_user(rng, config.users));
    }
    loyal
}

/// Uniform id in `1..=users`; callers have checked `users` fits a `UserId`.
fn random_user(rng: &mut fastrand::Rng, users: u64) -> UserId {
    rng.i64(1..=users as UserId)
}

fn write_day(
    dir: &Path,
    date: NaiveDate,
    loyal_users: &BTreeSet<UserId>,
    config: &GeneratorConfig,
    rng: &mut fastrand::Rng,
) -> Result<PathBuf> {
    let path = dir.join(format!("logs_{}.log", date.format("%Y-%m-%d")));
    let file =
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();

    let mut written = 0usize;
    for &user_id in loyal_users {
        let extra = rng.usize(0..3);
        let count = (config.min_pages + extra).min(PAGES.len());
        let mut pages = PAGES;
        rng.shuffle(&mut pages);
        for page in &pages[..count] {
            write_entry(&mut out, user_id, page, random_time(rng, midnight))?;
            written += 1;
        }
    }

    // Rejection sampling over `1..=users`, skipping planted ids
    if (loyal_users.len() as u64) < config.users {
        while written < config.entries_per_day {
            let user_id = random_user(rng, config.users);
            if loyal_users.contains(&user_id) {
                continue;
            }
            let page = PAGES[rng.usize(..PAGES.len())];
            write_entry(&mut out, user_id, page, random_time(rng, midnight))?;
            written += 1;
        }
    }

    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn random_time(rng: &mut fastrand::Rng, midnight: DateTime<Utc>) -> DateTime<Utc> {
    midnight + Duration::seconds(rng.i64(0..86_400))
}

fn write_entry<W: Write>(
    out: &mut W,
    user_id: UserId,
    page: &str,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    let entry = LogEntry::new(user_id, page, timestamp.fixed_offset());
    serde_json::to_writer(&mut *out, &entry)?;
    out.write_all(b"\n")?;
    Ok(())
}
