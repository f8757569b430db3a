//! Per-user store resolution: base directory, `config.toml`, and the
//! high-level handle the CLI works with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};

use arcana_core::{
    CalendarDay, ContentCatalog, DailyStateRecord, FeatureQuota, HoroscopeSign,
    PREMIUM_REVEAL_COST, PREMIUM_REVEAL_FREE_USES,
};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// Default base directory for all arcana storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".arcana")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Keep user ids filesystem-safe: anything outside [A-Za-z0-9._-] becomes '-'.
fn sanitize_user_id(user_id: &str) -> String {
    let cleaned: String = user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

/// Seed values for one gated feature's quota row.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct QuotaSeed {
    pub free_uses: u32,
    pub cost_per_use: i64,
}

/// `config.toml` in the base directory. Every field has a default, so a
/// missing file or a partial file both work.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// The configured local time zone, as minutes east of UTC. Used for
    /// every calendar-day computation so rollover and generation agree.
    pub utc_offset_minutes: i32,
    /// Horoscope sign used when a user has no birth date on file.
    pub default_sign: String,
    /// Size of the external affirmation table the generator indexes into.
    pub affirmation_count: usize,
    pub quotas: BTreeMap<String, QuotaSeed>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let mut quotas = BTreeMap::new();
        quotas.insert(
            "premium_reveal".to_string(),
            QuotaSeed {
                free_uses: PREMIUM_REVEAL_FREE_USES,
                cost_per_use: PREMIUM_REVEAL_COST,
            },
        );
        Self {
            utc_offset_minutes: 0,
            default_sign: "aries".to_string(),
            affirmation_count: 10,
            quotas,
        }
    }
}

impl StoreConfig {
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join("config.toml");
        match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                StoreError::InvalidData(format!("bad config {}: {e}", path.display()))
            }),
            Err(_) => Ok(Self::default()),
        }
    }

    /// The generator-facing view of this config.
    pub fn catalog(&self) -> Result<ContentCatalog> {
        let default_sign: HoroscopeSign = self
            .default_sign
            .parse()
            .map_err(|e| StoreError::InvalidData(format!("bad default_sign: {e}")))?;
        Ok(ContentCatalog {
            affirmation_count: self.affirmation_count,
            default_sign,
        })
    }
}

/// A user's store plus the shared configuration: the handle the CLI
/// operates through.
pub struct UserStore {
    store: Store,
    user_id: String,
    config: StoreConfig,
}

impl UserStore {
    /// Open (creating if needed) the database for `user_id` under
    /// `base_dir`, falling back to the default base directory.
    pub fn open(user_id: Option<&str>, base_dir: Option<&Path>) -> Result<Self> {
        let base = base_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(default_base_dir);
        fs::create_dir_all(&base).map_err(|e| {
            StoreError::InvalidData(format!("cannot create {}: {e}", base.display()))
        })?;

        let config = StoreConfig::load(&base)?;
        let user_id = sanitize_user_id(user_id.unwrap_or("default"));
        let store = Store::open(&base.join(format!("{user_id}.db")))?;

        Ok(Self {
            store,
            user_id,
            config,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Today in the configured local zone.
    pub fn today(&self) -> CalendarDay {
        CalendarDay::today(self.config.utc_offset_minutes)
    }

    /// The persisted daily state, or a fresh `Pending` record created (and
    /// persisted) on first use.
    pub fn daily_state_or_new(&self, today: CalendarDay) -> Result<DailyStateRecord> {
        if let Some(record) = self.store.load_daily_state()? {
            return Ok(record);
        }
        let record = DailyStateRecord::new(today);
        self.store.save_daily_state(&record)?;
        Ok(record)
    }

    /// The quota row for a feature, seeding it from config on first touch.
    pub fn quota_or_seed(&self, feature: &str) -> Result<Option<FeatureQuota>> {
        if let Some(quota) = self.store.load_quota(feature)? {
            return Ok(Some(quota));
        }
        match self.config.quotas.get(feature) {
            Some(seed) => {
                let quota = FeatureQuota::new(seed.free_uses, seed.cost_per_use);
                self.store.save_quota(feature, &quota)?;
                Ok(Some(quota))
            }
            None => Ok(None),
        }
    }
}
