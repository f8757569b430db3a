use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use arcana_core::{
    CalendarDay, DailyInsight, IdentitySeed, RevealError, SelectedItem, commit_shuffle,
    reveal_selection, shuffled_affirmation, today_insight,
};
use arcana_store::UserStore;

#[derive(Parser)]
#[command(name = "arcana", about = "Daily engagement engine CLI")]
struct Cli {
    /// User whose state to operate on
    #[arg(long, global = true, default_value = "default")]
    user: String,

    /// Override today's calendar day (YYYY-MM-DD); defaults to the
    /// configured local zone's current day
    #[arg(long, global = true)]
    date: Option<String>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's insight without revealing
    Today,

    /// Reveal the selected item for today
    Reveal {
        /// Item descriptor, e.g. a card position id
        item: String,

        /// The item is premium-gated
        #[arg(long)]
        locked: bool,
    },

    /// Re-draw today's affirmation (limited per day)
    Shuffle,

    /// Show the points balance
    Balance,

    /// Credit points
    Credit {
        amount: i64,
        reason: String,
    },

    /// Spend points
    Spend {
        amount: i64,
        reason: String,
    },

    /// List ledger entries
    History,

    /// Show feature quotas
    Quota,

    /// Show or set the stored birth date
    Profile {
        /// Set the birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<String>,
    },

    /// Show store statistics
    Stats,

    /// Export user state to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Import user state from a JSON file
    Import {
        /// Input file path
        path: PathBuf,
    },
}

fn open_store(cli: &Cli) -> Result<UserStore> {
    let base_dir = std::env::var("ARCANA_DATA_DIR")
        .ok()
        .map(std::path::PathBuf::from);
    UserStore::open(Some(&cli.user), base_dir.as_deref())
        .context("failed to open user store")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Today => cmd_today(&cli),
        Commands::Reveal { item, locked } => cmd_reveal(&cli, item, *locked),
        Commands::Shuffle => cmd_shuffle(&cli),
        Commands::Balance => cmd_balance(&cli),
        Commands::Credit { amount, reason } => cmd_credit(&cli, *amount, reason),
        Commands::Spend { amount, reason } => cmd_spend(&cli, *amount, reason),
        Commands::History => cmd_history(&cli),
        Commands::Quota => cmd_quota(&cli),
        Commands::Profile { birth_date } => cmd_profile(&cli, birth_date.as_deref()),
        Commands::Stats => cmd_stats(&cli),
        Commands::Export { path } => cmd_export(&cli, path),
        Commands::Import { path } => cmd_import(&cli, path),
    }
}

/// Resolve "today": the --date override, or the clock in the configured zone.
fn resolve_today(cli: &Cli, store: &UserStore) -> Result<CalendarDay> {
    match &cli.date {
        Some(text) => text
            .parse()
            .with_context(|| format!("invalid --date '{text}'")),
        None => Ok(store.today()),
    }
}

/// Build the identity seed from the stored profile.
fn load_seed(store: &UserStore) -> Result<IdentitySeed> {
    let mut seed = IdentitySeed::new(store.user_id());
    if let Some(text) = store.store().get_metadata("birth_date")? {
        let birth_date = text
            .parse()
            .with_context(|| format!("stored birth date '{text}' is invalid"))?;
        seed = seed.with_birth_date(birth_date);
    }
    Ok(seed)
}

fn print_insight(insight: &DailyInsight, affirmation_index: usize) {
    println!("day:          {}", insight.day);
    println!("tarot card:   #{}", insight.tarot_card);
    println!("sign:         {}", insight.sign);
    if insight.numerology.fallback {
        println!("numerology:   {} (fallback)", insight.numerology.value);
    } else {
        println!("numerology:   {}", insight.numerology.value);
    }
    println!("affirmation:  #{affirmation_index}");
}

fn stale_state_hint(recorded: CalendarDay, today: CalendarDay) -> anyhow::Error {
    anyhow::anyhow!(
        "stored daily state is dated {recorded}, but today resolves to {today} — \
         the clock may have moved backwards. Nothing was reset; re-run with \
         --date {recorded} or fix the clock."
    )
}

fn cmd_today(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let today = resolve_today(cli, &store)?;
    let seed = load_seed(&store)?;
    let catalog = store.config().catalog()?;
    let record = store.daily_state_or_new(today)?;

    let view = match today_insight(&seed, &record, today, &catalog) {
        Ok(view) => view,
        Err(RevealError::StaleState { recorded, today }) => {
            return Err(stale_state_hint(recorded, today));
        }
        Err(e) => bail!("{e}"),
    };

    // Persist the lazy rollover so later commands see the rolled record.
    if view.record != record {
        store.store().save_daily_state(&view.record)?;
    }

    let affirmation = shuffled_affirmation(
        &seed,
        today,
        view.record.affirmation_shuffles,
        &catalog,
    );
    print_insight(&view.insight, affirmation);
    if view.revealed {
        println!(
            "revealed:     yes ({})",
            view.record.revealed_item_id.as_deref().unwrap_or("?")
        );
    } else {
        println!("revealed:     not yet");
    }
    Ok(())
}

fn cmd_reveal(cli: &Cli, item_id: &str, locked: bool) -> Result<()> {
    let store = open_store(cli)?;
    let today = resolve_today(cli, &store)?;
    let seed = load_seed(&store)?;
    let catalog = store.config().catalog()?;
    let record = store.daily_state_or_new(today)?;
    let mut ledger = store.store().load_ledger()?;
    let quota = if locked {
        store.quota_or_seed("premium_reveal")?
    } else {
        None
    };

    let item = SelectedItem {
        id: item_id.to_string(),
        locked,
    };

    let outcome = match reveal_selection(&seed, &record, today, &item, &mut ledger, quota, &catalog)
    {
        Ok(outcome) => outcome,
        Err(RevealError::AlreadyRevealedToday { insight }) => {
            // Soft path: today's result is fixed, show it.
            println!("already revealed today — showing the fixed result");
            let affirmation =
                shuffled_affirmation(&seed, today, record.affirmation_shuffles, &catalog);
            print_insight(&insight, affirmation);
            return Ok(());
        }
        Err(RevealError::PaymentRequired { cost, balance }) => {
            bail!("this item needs {cost} points (balance {balance}) — earn or credit points first");
        }
        Err(RevealError::StaleState { recorded, today }) => {
            return Err(stale_state_hint(recorded, today));
        }
    };

    let committed = store.store().persist_reveal_txn(
        &outcome.record,
        outcome.spend_entry.as_ref(),
        outcome.quota.as_ref().map(|q| ("premium_reveal", q)),
    )?;
    if !committed {
        // A concurrent process won the race; show what it committed.
        println!("already revealed today — showing the fixed result");
        let affirmation =
            shuffled_affirmation(&seed, today, outcome.record.affirmation_shuffles, &catalog);
        print_insight(&outcome.insight, affirmation);
        return Ok(());
    }

    let affirmation =
        shuffled_affirmation(&seed, today, outcome.record.affirmation_shuffles, &catalog);
    print_insight(&outcome.insight, affirmation);
    if outcome.used_free_unit {
        println!("gating:       free use consumed");
    } else if outcome.points_spent > 0 {
        println!("gating:       {} points spent", outcome.points_spent);
    }
    Ok(())
}

fn cmd_shuffle(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let today = resolve_today(cli, &store)?;
    let seed = load_seed(&store)?;
    let catalog = store.config().catalog()?;
    let record = store.daily_state_or_new(today)?;

    let shuffled = match commit_shuffle(&record, today) {
        Ok(shuffled) => shuffled,
        Err(e) => bail!("{e}"),
    };
    store.store().save_daily_state(&shuffled)?;

    let affirmation = shuffled_affirmation(&seed, today, shuffled.affirmation_shuffles, &catalog);
    println!("affirmation:  #{affirmation}");
    println!(
        "shuffles:     {}/{}",
        shuffled.affirmation_shuffles,
        arcana_core::MAX_AFFIRMATION_SHUFFLES
    );
    Ok(())
}

fn cmd_balance(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let ledger = store.store().load_ledger()?;
    println!("balance:   {}", ledger.balance());
    println!("lifetime:  {}", ledger.lifetime_points());
    Ok(())
}

fn cmd_credit(cli: &Cli, amount: i64, reason: &str) -> Result<()> {
    let store = open_store(cli)?;
    let mut ledger = store.store().load_ledger()?;
    let entry = match ledger.credit(amount, reason) {
        Ok(entry) => entry,
        Err(e) => bail!("{e}"),
    };
    store.store().append_ledger_entry(&entry)?;
    println!("credited {amount} ({reason}). balance: {}", ledger.balance());
    Ok(())
}

fn cmd_spend(cli: &Cli, amount: i64, reason: &str) -> Result<()> {
    let store = open_store(cli)?;
    let mut ledger = store.store().load_ledger()?;
    let entry = match ledger.spend(amount, reason) {
        Ok(entry) => entry,
        Err(e) => bail!("{e}"),
    };
    if !store.store().append_spend_guarded(&entry)? {
        bail!("balance changed concurrently; spend not applied");
    }
    println!("spent {amount} ({reason}). balance: {}", ledger.balance());
    Ok(())
}

fn cmd_history(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let ledger = store.store().load_ledger()?;
    if ledger.entries().is_empty() {
        println!("(no transactions)");
        return Ok(());
    }
    for entry in ledger.entries() {
        println!("{}  {:>6}  {}", entry.timestamp, entry.delta, entry.reason);
    }
    Ok(())
}

fn cmd_quota(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    // Seed any configured features that have no row yet, so the listing
    // reflects what a gated access would actually see.
    let features: Vec<String> = store.config().quotas.keys().cloned().collect();
    for feature in &features {
        store.quota_or_seed(feature)?;
    }

    let quotas = store.store().quotas()?;
    if quotas.is_empty() {
        println!("(no gated features)");
        return Ok(());
    }
    for (feature, quota) in quotas {
        println!(
            "{feature}: {} free use(s) left, then {} points each",
            quota.free_uses_remaining, quota.cost_per_use_after_free
        );
    }
    Ok(())
}

fn cmd_profile(cli: &Cli, birth_date: Option<&str>) -> Result<()> {
    let store = open_store(cli)?;
    if let Some(text) = birth_date {
        let parsed: CalendarDay = text
            .parse()
            .with_context(|| format!("invalid birth date '{text}'"))?;
        store.store().set_metadata("birth_date", &parsed.to_string())?;
        println!("birth date set to {parsed}");
        return Ok(());
    }
    match store.store().get_metadata("birth_date")? {
        Some(date) => println!("birth date:  {date}"),
        None => println!("birth date:  (not set)"),
    }
    Ok(())
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let ledger = store.store().load_ledger()?;
    let record = store.store().load_daily_state()?;
    let db_size = store.store().db_size();

    println!("user:       {}", store.user_id());
    println!("balance:    {}", ledger.balance());
    println!("lifetime:   {}", ledger.lifetime_points());
    println!("entries:    {}", ledger.entries().len());
    match record {
        Some(r) => println!(
            "state:      {} ({})",
            r.last_reset_day,
            if r.revealed_today { "revealed" } else { "pending" }
        ),
        None => println!("state:      (fresh)"),
    }
    println!("db_size:    {:.1}KB", db_size as f64 / 1024.0);
    Ok(())
}

fn cmd_export(cli: &Cli, path: &std::path::Path) -> Result<()> {
    let store = open_store(cli)?;
    store
        .store()
        .export_json_file(path)
        .context("failed to export JSON")?;
    println!("exported to {}", path.display());
    Ok(())
}

fn cmd_import(cli: &Cli, path: &std::path::Path) -> Result<()> {
    let store = open_store(cli)?;
    store
        .store()
        .import_json_file(path)
        .context("failed to import JSON")?;

    let ledger = store.store().load_ledger()?;
    println!(
        "imported from {}. entries={}, balance={}",
        path.display(),
        ledger.entries().len(),
        ledger.balance()
    );
    Ok(())
}
