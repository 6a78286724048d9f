use crate::detect::Prober;
use crate::detect::pci::PciBusId;
use crate::error::{Error, Result};
use crate::mode::GraphicsMode;
use crate::root::SystemRoot;
use serde::{Deserialize, Serialize};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

/// Not a managed file: cleanup never touches it.
pub const CACHE_FILE_PATH: &str = "/var/cache/envycontrol/cache.json";
const CACHE_DIR_PATH: &str = "/var/cache/envycontrol";

/// Hardware identity remembered from the last time the Nvidia GPU was visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub nvidia_gpu_pci_bus: PciBusId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl CacheRecord {
    pub fn new(nvidia_gpu_pci_bus: PciBusId) -> Self {
        Self {
            nvidia_gpu_pci_bus,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// The cache file under a [`SystemRoot`].
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: SystemRoot,
}

impl CacheStore {
    pub fn new(root: SystemRoot) -> Self {
        Self { root }
    }

    pub fn file_path(&self) -> PathBuf {
        self.root.path(CACHE_FILE_PATH)
    }

    pub fn exists(&self) -> bool {
        self.root.exists(CACHE_FILE_PATH)
    }

    pub fn load(&self) -> Result<Option<CacheRecord>> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)
            .map_err(|e| Error::Cache(format!("failed to read cache file: {}", e)))?;
        let record: CacheRecord = serde_json::from_str(&data)
            .map_err(|e| Error::Cache(format!("failed to parse cache file: {}", e)))?;
        Ok(Some(record))
    }

    pub fn save(&self, record: &CacheRecord) -> Result<()> {
        std::fs::create_dir_all(self.root.path(CACHE_DIR_PATH))
            .map_err(|e| Error::Cache(format!("failed to create cache dir: {}", e)))?;
        let data = serde_json::to_string_pretty(record)
            .map_err(|e| Error::Cache(format!("failed to serialize cache: {}", e)))?;
        let path = self.file_path();
        std::fs::write(&path, data)
            .map_err(|e| Error::Cache(format!("failed to write cache file: {}", e)))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::Cache(format!("failed to set cache permissions: {}", e)))?;
        log::debug!("Created file {}", CACHE_FILE_PATH);
        Ok(())
    }

    /// Probe the Nvidia GPU and persist its bus ID. Only hybrid mode exposes
    /// the device reliably, so any other mode is refused before probing.
    pub fn create(&self, current: GraphicsMode, prober: &Prober) -> Result<CacheRecord> {
        if current != GraphicsMode::Hybrid {
            return Err(Error::CacheRequiresHybrid);
        }
        let bus = BusResolver::Live.resolve(prober)?;
        let record = CacheRecord::new(bus);
        self.save(&record)?;
        Ok(record)
    }

    /// Remove the cache file and its directory. Missing cache is a no-op.
    pub fn delete(&self) -> Result<bool> {
        let path = self.file_path();
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No cache file at {}", CACHE_FILE_PATH);
                return Ok(false);
            }
            Err(e) => {
                return Err(Error::Cache(format!("failed to remove cache file: {}", e)));
            }
        }

        // Only succeeds when empty; anything else in there isn't ours.
        if let Err(e) = std::fs::remove_dir(self.root.path(CACHE_DIR_PATH)) {
            log::warn!("Could not remove {}: {}", CACHE_DIR_PATH, e);
        }
        log::debug!("Removed file {}", CACHE_FILE_PATH);
        Ok(true)
    }

    /// Raw cache content, or an explicit error line when unreadable.
    pub fn show(&self) -> String {
        std::fs::read_to_string(self.file_path())
            .unwrap_or_else(|_| format!("ERROR: Could not read {}", CACHE_FILE_PATH))
    }
}

/// Where the Nvidia bus ID comes from for the duration of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusResolver {
    /// Probe the hardware each time.
    Live,
    /// Use an identity captured earlier.
    Cached(PciBusId),
    /// No cache and the device isn't trustworthy to probe.
    Unavailable,
}

impl BusResolver {
    /// Pick the resolver for an operation starting in `current` mode.
    ///
    /// Hybrid refreshes the cache from a live probe, since it is the only mode
    /// where the device is reliably visible. Otherwise an existing cache is
    /// used. A missing or unreadable cache refuses lookups without failing
    /// the operation, so `reset` can still run and remove it.
    pub fn for_operation(
        current: GraphicsMode,
        cache: &CacheStore,
        prober: &Prober,
    ) -> Result<Self> {
        if current == GraphicsMode::Hybrid {
            let record = cache.create(current, prober)?;
            return Ok(BusResolver::Cached(record.nvidia_gpu_pci_bus));
        }

        match cache.load() {
            Ok(Some(record)) => {
                log::info!("Using cached Nvidia GPU bus ID {}", record.nvidia_gpu_pci_bus);
                Ok(BusResolver::Cached(record.nvidia_gpu_pci_bus))
            }
            Ok(None) => Ok(BusResolver::Unavailable),
            Err(e) => {
                log::error!("Ignoring unreadable cache: {}", e);
                Ok(BusResolver::Unavailable)
            }
        }
    }

    pub fn resolve(&self, prober: &Prober) -> Result<PciBusId> {
        match self {
            BusResolver::Live => prober.nvidia_pci_bus(),
            BusResolver::Cached(bus) => Ok(*bus),
            BusResolver::Unavailable => Err(Error::NoCachedIdentity),
        }
    }
}
