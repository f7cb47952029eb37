use crate::core::leveling::{apply_delta, LedgerEntry, LedgerError, LedgerStore};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// On-disk shape: `{ "<user_id>": xp, ... }`.
///
/// Read loosely so one hand-edited entry can't make the whole file unreadable:
/// bad keys or values are skipped on their own, negatives clamp to zero.
#[derive(Debug, Deserialize, Default)]
#[serde(transparent)]
struct LedgerFile(BTreeMap<String, serde_json::Value>);

/// JSON-file XP ledger. The whole map is rewritten after every mutation.
pub struct JsonLedgerStore {
    path: PathBuf,
    cache: RwLock<BTreeMap<u64, u64>>,
}

impl JsonLedgerStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = load_ledger(&path);
        tracing::info!(path = %path.display(), users = cache.len(), "Loaded XP ledger");
        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    fn persist(&self, entries: &BTreeMap<u64, u64>) -> Result<(), LedgerError> {
        let file = File::create(&self.path)?;
        serde_json::to_writer(file, entries)?;
        Ok(())
    }
}

/// Read the ledger file. Missing or unreadable files give an empty ledger.
pub fn load_ledger(path: &Path) -> BTreeMap<u64, u64> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Can't open XP ledger, starting empty");
            return BTreeMap::new();
        }
    };

    match serde_json::from_reader::<_, LedgerFile>(BufReader::new(file)) {
        Ok(LedgerFile(raw)) => raw
            .into_iter()
            .filter_map(|(key, value)| match parse_entry(&key, &value) {
                Some(entry) => Some(entry),
                None => {
                    tracing::warn!(path = %path.display(), key = %key, value = %value, "Skipping malformed XP ledger entry");
                    None
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Can't parse XP ledger, starting empty");
            BTreeMap::new()
        }
    }
}

/// One `"<user_id>": xp` pair. The id must be a decimal u64 and the XP a
/// whole number; negative totals clamp to zero.
fn parse_entry(key: &str, value: &serde_json::Value) -> Option<(u64, u64)> {
    let user_id = key.trim().parse::<u64>().ok()?;
    let xp = match value.as_u64() {
        Some(xp) => xp,
        None => value.as_i64()?.max(0) as u64,
    };
    Some((user_id, xp))
}

#[async_trait]
impl LedgerStore for JsonLedgerStore {
    async fn get_xp(&self, user_id: u64) -> Result<u64, LedgerError> {
        let cache = self.cache.read().await;
        Ok(cache.get(&user_id).copied().unwrap_or(0))
    }

    async fn adjust_xp(&self, user_id: u64, delta: i64) -> Result<u64, LedgerError> {
        // The write guard covers read, modify and persist so no other adjust
        // can slip in between.
        let mut cache = self.cache.write().await;
        let entry = cache.entry(user_id).or_insert(0);
        *entry = apply_delta(*entry, delta);
        let xp = *entry;
        self.persist(&cache)?;
        Ok(xp)
    }

    async fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let cache = self.cache.read().await;
        Ok(cache
            .iter()
            .map(|(user_id, xp)| LedgerEntry {
                user_id: *user_id,
                xp: *xp,
            })
            .collect())
    }
}
