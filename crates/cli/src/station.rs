//! The station a command runs against: its config file and the data it
//! points at.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zpl_labeler_config::{
    ConnectionKind, StationConfig, config_path, load_config, save_config,
};
use zpl_labeler_core::{
    LabelService, Part, PartsCatalog, RedbCounterStore, TemplateRegistry,
};
use zpl_labeler_print_client::PrinterTarget;

/// Labels are generated from on-disk templates into the redb counter store.
pub(crate) type StationService = LabelService<TemplateRegistry, RedbCounterStore>;

pub(crate) struct Station {
    path: PathBuf,
    config: StationConfig,
}

impl Station {
    /// Load the station config. Relative data paths are taken relative to
    /// the config file's directory.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = config_path(explicit);
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let config = load_config(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?
            .rebase(&base);
        Ok(Self { path, config })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn config(&self) -> &StationConfig {
        &self.config
    }

    /// The config exactly as stored, without rebased paths.
    pub(crate) fn stored_config(&self) -> Result<StationConfig> {
        Ok(load_config(&self.path)?)
    }

    pub(crate) fn save(&self, config: &StationConfig) -> Result<()> {
        save_config(&self.path, config)
            .with_context(|| format!("failed to save config {}", self.path.display()))
    }

    pub(crate) fn part(&self, part_number: &str) -> Result<Part> {
        let path = &self.config.parts_catalog;
        let catalog = PartsCatalog::load(path)
            .with_context(|| format!("failed to load parts catalog {}", path.display()))?;
        Ok(catalog.get(part_number)?.clone())
    }

    pub(crate) fn templates(&self) -> Result<TemplateRegistry> {
        let dir = &self.config.templates_dir;
        TemplateRegistry::load_dir(dir)
            .with_context(|| format!("failed to read templates from {}", dir.display()))
    }

    pub(crate) fn store(&self) -> Result<RedbCounterStore> {
        let path = &self.config.counter_db;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        RedbCounterStore::open(path)
            .with_context(|| format!("failed to open counter database {}", path.display()))
    }

    pub(crate) fn service(&self) -> Result<StationService> {
        Ok(LabelService::new(self.templates()?, self.store()?))
    }

    /// The configured printer, validated.
    pub(crate) fn printer(&self) -> Result<PrinterTarget> {
        let p = &self.config.printer;
        p.validate().context("printer is not configured")?;
        let target = match p.kind {
            ConnectionKind::Ip => PrinterTarget::Ip {
                host: p.ip.clone(),
                port: p.port,
            },
            ConnectionKind::Com => PrinterTarget::Serial {
                port: p.com_port.clone(),
                baud: p.baud_rate,
            },
        };
        Ok(target)
    }
}
