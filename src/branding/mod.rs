// brandforge: Branding state, the single owner of the active profile
//
// All mutation goes through `update`/`reset`, which merge in memory, notify
// subscribers and then write the full profile to the key-value layer. A
// failed write is logged and otherwise ignored: the session keeps working
// and the profile falls back to defaults on the next start.

pub mod kv;
pub mod profile;

use crate::asset::AssetStore;
use kv::KeyValueStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

pub use profile::{BrandingPatch, BrandingProfile, LogoPatch, DEFAULT_FONT};

/// Key under which the profile is persisted.
pub const STORAGE_KEY: &str = "brandforge-branding-info";

/// Handed out when an extraction starts; the result is applied only if the
/// ticket is still the latest when it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionTicket(u64);

pub struct BrandingState {
    kv: Arc<dyn KeyValueStore>,
    current: watch::Sender<BrandingProfile>,
    write_lock: Mutex<()>,
    generation: AtomicU64,
}

impl BrandingState {
    /// Load the persisted profile, or defaults if none is stored or it
    /// cannot be read or parsed.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let profile = match kv.get(STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<BrandingProfile>(&json) {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::warn!("Stored branding profile is unreadable, using defaults: {}", e);
                    BrandingProfile::default()
                }
            },
            Ok(None) => BrandingProfile::default(),
            Err(e) => {
                tracing::warn!("Branding storage unavailable, using defaults: {}", e);
                BrandingProfile::default()
            }
        };

        let (current, _) = watch::channel(profile);
        Self {
            kv,
            current,
            write_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn get_current(&self) -> BrandingProfile {
        self.current.borrow().clone()
    }

    /// Receiver that always holds the latest full profile.
    pub fn subscribe(&self) -> watch::Receiver<BrandingProfile> {
        self.current.subscribe()
    }

    /// Merge `patch` into the current profile and persist the result.
    pub fn update(&self, patch: BrandingPatch) -> BrandingProfile {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if patch.disables_branding() {
            self.invalidate_extractions();
        }
        let next = self.get_current().merged(patch);
        self.commit(next.clone());
        next
    }

    /// Replace the profile with defaults and persist.
    pub fn reset(&self) -> BrandingProfile {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.invalidate_extractions();
        let next = BrandingProfile::default();
        self.commit(next.clone());
        tracing::info!("Branding reset to defaults");
        next
    }

    pub fn begin_extraction(&self) -> ExtractionTicket {
        ExtractionTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Apply an extraction result unless a newer extraction started or
    /// branding was disabled or reset in the meantime.
    pub fn apply_extraction(&self, ticket: ExtractionTicket, patch: BrandingPatch) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = self.generation.load(Ordering::SeqCst);
        if ticket.0 != latest {
            tracing::debug!(ticket = ticket.0, latest, "Dropping stale extraction result");
            return false;
        }
        let next = self.get_current().merged(patch);
        self.commit(next);
        true
    }

    /// Fill in the session copy of a stored logo from the asset store.
    ///
    /// Only the in-memory profile changes; the reference is already durable.
    /// Returns whether logo bytes were attached.
    pub async fn resolve_logo(&self, assets: &AssetStore) -> bool {
        let profile = self.get_current();
        let Some(asset_ref) = profile.logo_ref else {
            return false;
        };
        if profile.logo_data.is_some() {
            return false;
        }

        // Paths are not unique; the id names the exact record.
        let found = match assets.get(&asset_ref.id).await {
            Ok(None) => assets.get_by_path(&asset_ref.virtual_path).await,
            other => other,
        };

        match found {
            Ok(Some(asset)) => {
                let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
                self.current.send_if_modified(move |p| {
                    let same_ref = p.logo_ref.as_ref().is_some_and(|r| r.id == asset_ref.id);
                    if same_ref && p.logo_data.is_none() {
                        p.logo_data = Some(asset.data_url);
                        true
                    } else {
                        false
                    }
                })
            }
            Ok(None) => {
                tracing::warn!(path = %asset_ref.virtual_path, "Stored logo reference points to a missing asset");
                false
            }
            Err(e) => {
                tracing::warn!(path = %asset_ref.virtual_path, "Could not resolve stored logo: {}", e);
                false
            }
        }
    }

    fn invalidate_extractions(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    // Callers hold `write_lock`.
    fn commit(&self, next: BrandingProfile) {
        let json = match serde_json::to_string(&next) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::warn!("Failed to serialize branding profile: {}", e);
                None
            }
        };

        self.current.send_replace(next);

        if let Some(json) = json {
            if let Err(e) = self.kv.set(STORAGE_KEY, &json) {
                tracing::warn!("Failed to persist branding profile: {}", e);
            }
        }
    }
}
