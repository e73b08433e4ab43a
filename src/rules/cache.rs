//! On-disk cache of the last validated remote payload.
//!
//! Layout per tax year: `tax_data_<year>.json` holds the payload exactly as
//! fetched and `tax_data_<year>.meta.json` holds [`CacheMetadata`]. The
//! metadata file is written last, so an entry without it is never read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::TaxRuleSet;
use super::error::CacheError;
use super::manifest::sha256_hex;
use super::validate::parse_payload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub version: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub checksum: String,
}

impl CacheMetadata {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
pub enum CacheRead {
    Hit {
        rules: TaxRuleSet,
        metadata: CacheMetadata,
    },
    Miss,
    Expired,
    /// The entry was unreadable and has been deleted.
    Corrupt(CacheError),
}

#[derive(Debug, Clone)]
pub struct RuleCache {
    dir: PathBuf,
    ttl: Duration,
}

impl RuleCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn payload_path(&self, year: u32) -> PathBuf {
        self.dir.join(format!("tax_data_{year}.json"))
    }

    fn metadata_path(&self, year: u32) -> PathBuf {
        self.dir.join(format!("tax_data_{year}.meta.json"))
    }

    pub fn read(&self, year: u32) -> CacheRead {
        self.read_at(year, Utc::now())
    }

    pub(crate) fn read_at(&self, year: u32, now: DateTime<Utc>) -> CacheRead {
        let meta_bytes = match fs::read(self.metadata_path(year)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return CacheRead::Miss,
            Err(e) => return self.corrupt(year, CacheError::Io(e)),
        };
        let metadata: CacheMetadata = match serde_json::from_slice(&meta_bytes) {
            Ok(metadata) => metadata,
            Err(e) => return self.corrupt(year, CacheError::Metadata(e)),
        };

        if metadata.is_expired_at(now) {
            debug!(year, version = %metadata.version, "cached rule data expired");
            self.discard(year);
            return CacheRead::Expired;
        }

        let body = match fs::read(self.payload_path(year)) {
            Ok(body) => body,
            Err(e) => return self.corrupt(year, CacheError::Io(e)),
        };
        let computed = sha256_hex(&body);
        if !computed.eq_ignore_ascii_case(&metadata.checksum) {
            return self.corrupt(
                year,
                CacheError::ChecksumMismatch {
                    stored: metadata.checksum,
                    computed,
                },
            );
        }

        match parse_payload(&body, year) {
            Ok(rules) => CacheRead::Hit { rules, metadata },
            Err(e) => self.corrupt(year, CacheError::Invalid(e)),
        }
    }

    pub fn write(
        &self,
        year: u32,
        version: &str,
        body: &[u8],
    ) -> Result<CacheMetadata, CacheError> {
        self.write_at(year, version, body, Utc::now())
    }

    pub(crate) fn write_at(
        &self,
        year: u32,
        version: &str,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<CacheMetadata, CacheError> {
        fs::create_dir_all(&self.dir)?;

        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        let metadata = CacheMetadata {
            version: version.to_string(),
            cached_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            checksum: sha256_hex(body),
        };
        let meta_bytes = serde_json::to_vec_pretty(&metadata)?;

        // Metadata last: it marks the entry complete.
        write_atomic(&self.payload_path(year), body)?;
        write_atomic(&self.metadata_path(year), &meta_bytes)?;

        debug!(year, version, dir = %self.dir.display(), "cached rule data");
        Ok(metadata)
    }

    pub fn invalidate(&self, year: u32) -> Result<(), CacheError> {
        for path in [self.metadata_path(year), self.payload_path(year)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::Io(e)),
            }
        }
        Ok(())
    }

    fn discard(&self, year: u32) {
        if let Err(e) = self.invalidate(year) {
            warn!(year, error = %e, "failed to delete cached rule data");
        }
    }

    fn corrupt(&self, year: u32, error: CacheError) -> CacheRead {
        warn!(year, error = %error, "discarding corrupt rule cache entry");
        self.discard(year);
        CacheRead::Corrupt(error)
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::embedded;
    use tempfile::TempDir;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn payload(version: &str) -> Vec<u8> {
        let mut rules = embedded::load().expect("embedded rules");
        rules.version = version.to_string();
        serde_json::to_vec(&rules).expect("payload")
    }

    #[test]
    fn empty_directory_is_a_miss() {
        let dir = TempDir::new().expect("tempdir");
        let cache = RuleCache::new(dir.path().join("nested"), WEEK);
        assert!(matches!(cache.read(2024), CacheRead::Miss));
    }

    #[test]
    fn written_entry_reads_back() {
        let dir = TempDir::new().expect("tempdir");
        let cache = RuleCache::new(dir.path(), WEEK);
        let metadata = cache.write(2024, "2024.7", &payload("2024.7")).expect("write");
        assert_eq!(metadata.expires_at - metadata.cached_at, TimeDelta::days(7));

        match cache.read(2024) {
            CacheRead::Hit { rules, metadata: read } => {
                assert_eq!(rules.version, "2024.7");
                assert_eq!(read, metadata);
            }
            other => panic!("expected hit, got {other:?}"),
        }
        assert!(!dir.path().join("tax_data_2024.tmp").exists());
    }

    #[test]
    fn expired_entry_is_deleted() {
        let dir = TempDir::new().expect("tempdir");
        let cache = RuleCache::new(dir.path(), WEEK);
        let written = Utc::now() - TimeDelta::days(8);
        cache
            .write_at(2024, "2024.7", &payload("2024.7"), written)
            .expect("write");

        assert!(matches!(cache.read(2024), CacheRead::Expired));
        assert!(!dir.path().join("tax_data_2024.json").exists());
        assert!(matches!(cache.read(2024), CacheRead::Miss));
    }

    #[test]
    fn tampered_payload_is_corrupt_and_removed() {
        let dir = TempDir::new().expect("tempdir");
        let cache = RuleCache::new(dir.path(), WEEK);
        cache.write(2024, "2024.7", &payload("2024.7")).expect("write");
        fs::write(dir.path().join("tax_data_2024.json"), payload("2024.8")).expect("tamper");

        assert!(matches!(
            cache.read(2024),
            CacheRead::Corrupt(CacheError::ChecksumMismatch { .. })
        ));
        assert!(!dir.path().join("tax_data_2024.meta.json").exists());
        assert!(matches!(cache.read(2024), CacheRead::Miss));
    }

    #[test]
    fn unreadable_metadata_is_corrupt() {
        let dir = TempDir::new().expect("tempdir");
        let cache = RuleCache::new(dir.path(), WEEK);
        fs::write(dir.path().join("tax_data_2024.meta.json"), b"{not json").expect("write");
        assert!(matches!(
            cache.read(2024),
            CacheRead::Corrupt(CacheError::Metadata(_))
        ));
    }

    #[test]
    fn invalid_payload_with_matching_checksum_is_corrupt() {
        let dir = TempDir::new().expect("tempdir");
        let cache = RuleCache::new(dir.path(), WEEK);
        let mut rules = embedded::load().expect("embedded rules");
        rules.states.states.clear();
        let body = serde_json::to_vec(&rules).expect("payload");
        cache.write(2024, "2024.9", &body).expect("write");

        assert!(matches!(
            cache.read(2024),
            CacheRead::Corrupt(CacheError::Invalid(_))
        ));
    }

    #[test]
    fn invalidate_tolerates_missing_files() {
        let dir = TempDir::new().expect("tempdir");
        let cache = RuleCache::new(dir.path(), WEEK);
        assert!(cache.invalidate(2024).is_ok());
        cache.write(2024, "2024.7", &payload("2024.7")).expect("write");
        cache.invalidate(2024).expect("invalidate");
        assert!(matches!(cache.read(2024), CacheRead::Miss));
    }
}
