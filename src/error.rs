use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create file '{path}': {source}")]
    ArtifactWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove file '{path}': {source}")]
    ArtifactRemove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not find Nvidia GPU. Try switching to hybrid mode first!")]
    NoDiscreteGpu,

    #[error("no cache present. Operation requires that the system be in the hybrid Optimus mode")]
    NoCachedIdentity,

    #[error("creating the cache requires that the system be in the hybrid Optimus mode")]
    CacheRequiresHybrid,

    #[error("cache error: {0}")]
    Cache(String),

    #[error("this operation requires root privileges ({operation})")]
    NotRoot { operation: String },

    #[error("command '{program}' failed: {detail}")]
    Command { program: String, detail: String },

    #[error("parse error for '{input}': {detail}")]
    Parse { input: String, detail: String },
}

pub type Result<T> = std::result::Result<T, Error>;
