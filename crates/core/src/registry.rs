//! Line-delimited JSON registry of service descriptors.

use crate::models::ServiceDescriptor;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry file not found: {0}")]
    NotFound(PathBuf),
    #[error("registry {0} contains no usable records")]
    Empty(PathBuf),
    #[error("failed to read registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    services: Vec<ServiceDescriptor>,
}

impl Registry {
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self { services }
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            return Err(RegistryError::NotFound(path.to_path_buf()));
        }
        let io_err = |source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_err)?);
        let registry = Self::from_reader(reader).map_err(io_err)?;
        if registry.is_empty() {
            return Err(RegistryError::Empty(path.to_path_buf()));
        }
        info!(
            "Loaded {} services from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn from_reader<R: BufRead>(mut reader: R) -> std::io::Result<Self> {
        let mut services = Vec::new();
        let mut buf = Vec::new();
        let mut lineno = 0usize;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            lineno += 1;
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!("Skipping non UTF-8 line {}: {}", lineno, e);
                    continue;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ServiceDescriptor>(trimmed) {
                Ok(service) => services.push(service),
                Err(e) => warn!("Skipping invalid JSON on line {}: {} ({})", lineno, trimmed, e),
            }
        }
        Ok(Self { services })
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn prefix(&self, limit: usize) -> &[ServiceDescriptor] {
        &self.services[..limit.min(self.services.len())]
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
