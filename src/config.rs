use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::escrow::{EscrowParties, Role};

pub const DEFAULT_CONFIG_FILE: &str = "escrow-migrate.toml";
pub const CONFIG_ENV: &str = "ESCROW_MIGRATE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    pub network: String,
    pub artifacts_dir: PathBuf,
    pub records_dir: PathBuf,
    pub gas: u64,
    pub confirmations_timeout_secs: u64,
    pub from: Option<String>,
    pub profiles: BTreeMap<String, PartyProfile>,
}

/// One named set of party addresses, all optional until merged
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartyProfile {
    pub supplier: Option<String>,
    pub distributor: Option<String>,
    pub carrier: Option<String>,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            network: "development".to_string(),
            artifacts_dir: PathBuf::from("build/contracts"),
            records_dir: PathBuf::from("migration"),
            gas: 3_000_000,
            confirmations_timeout_secs: 60,
            from: None,
            profiles: BTreeMap::new(),
        }
    }
}

impl PartyProfile {
    pub fn get(&self, role: Role) -> Option<&String> {
        match role {
            Role::Supplier => self.supplier.as_ref(),
            Role::Distributor => self.distributor.as_ref(),
            Role::Carrier => self.carrier.as_ref(),
        }
    }

    /// Fill the roles `other` sets, keeping ours where it has none
    pub fn overlay(mut self, other: PartyProfile) -> Self {
        if other.supplier.is_some() {
            self.supplier = other.supplier;
        }
        if other.distributor.is_some() {
            self.distributor = other.distributor;
        }
        if other.carrier.is_some() {
            self.carrier = other.carrier;
        }
        self
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            supplier: lookup("ESCROW_SUPPLIER"),
            distributor: lookup("ESCROW_DISTRIBUTOR"),
            carrier: lookup("ESCROW_CARRIER"),
        }
    }

    pub fn into_parties(self) -> eyre::Result<EscrowParties> {
        let value = |role: Role| {
            self.get(role)
                .cloned()
                .ok_or(eyre::eyre!("no {role} address configured"))
        };
        EscrowParties::parse(
            &value(Role::Supplier)?,
            &value(Role::Distributor)?,
            &value(Role::Carrier)?,
        )
    }
}

impl MigrateConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("{e}:{}", path.to_string_lossy()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("{e}:{}", path.to_string_lossy()))?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// CLI path first, then $ESCROW_MIGRATE_CONFIG, then ./escrow-migrate.toml, else defaults
    pub fn resolve_config(cli_config: Option<PathBuf>) -> eyre::Result<Self> {
        Self::resolve_config_from(cli_config, std::env::var(CONFIG_ENV).ok(), Path::new("."))
    }

    /// Same lookup order with the environment value and working directory passed in
    pub fn resolve_config_from(
        cli_config: Option<PathBuf>,
        env_config: Option<String>,
        work_dir: &Path,
    ) -> eyre::Result<Self> {
        let default_path = work_dir.join(DEFAULT_CONFIG_FILE);
        if let Some(config_path) = cli_config {
            Self::load_from_file(config_path)
        } else if let Some(env_config) = env_config {
            Self::load_from_file(env_config)
        } else if default_path.exists() {
            Self::load_from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge profile, environment and command line values, later ones win
    pub fn resolve_parties(
        &self,
        profile: Option<&str>,
        env: PartyProfile,
        cli: PartyProfile,
    ) -> eyre::Result<EscrowParties> {
        let base = match profile {
            Some(name) => self
                .profiles
                .get(name)
                .cloned()
                .ok_or(eyre::eyre!("profile `{name}` not found in config"))?,
            None => PartyProfile::default(),
        };
        base.overlay(env).overlay(cli).into_parties()
    }
}
