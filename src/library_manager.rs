//! # Library Manager Module
//!
//! ## Purpose
//! Keeps the locations of the rule-library files (reaction rules, formula rules, periodic table)
//! in one place, so the rule provider never hardcodes paths and a library can be swapped
//! for another version without recompiling.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "reactions": "data/reactions.json",
//!   "chemical_rules": "data/chemical_rules.json",
//!   "elements": "data/elements.json"
//! }
//! ```
//!
//! ## Usage
//! ```rust, ignore
//! use ChemLogic::library_manager::LibraryManager;
//!
//! let mut manager = LibraryManager::new();
//! manager.set_reactions("reactions_v2.json")?;
//! let provider = JsonRuleProvider::new(manager.get_config().clone());
//! ```
//! The manager is an ordinary value handed to whoever builds the rule provider;
//! there is no process-wide instance.

use crate::errors::ChemError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// default name of the configuration file
pub const CONFIG_FILE: &str = "chemlogic_config.json";

/// Configuration structure for rule-library file paths.
///
/// # Fields
/// * `reactions` - reaction rules used by forward chaining, path search and identification
/// * `chemical_rules` - formula rules used by calculation-path search
/// * `elements` - periodic table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub reactions: String,
    pub chemical_rules: String,
    pub elements: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            reactions: "data/reactions.json".to_string(),
            chemical_rules: "data/chemical_rules.json".to_string(),
            elements: "data/elements.json".to_string(),
        }
    }
}

/// Loads, saves and updates the library configuration.
#[derive(Debug, Clone)]
pub struct LibraryManager {
    config: LibraryConfig,
    config_file: String,
}

impl LibraryManager {
    /// Creates a manager reading `chemlogic_config.json` in the current directory,
    /// falling back to the default configuration if it is absent or invalid.
    pub fn new() -> Self {
        Self::with_config_file(CONFIG_FILE)
    }

    /// Creates a manager with a custom configuration file path.
    pub fn with_config_file(config_file: &str) -> Self {
        let config = Self::load_config(config_file).unwrap_or_else(|e| {
            warn!("configuration {} is unusable ({}), using defaults", config_file, e);
            LibraryConfig::default()
        });
        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    /// Reads the configuration file; a missing file means the default configuration.
    fn load_config(config_file: &str) -> Result<LibraryConfig, ChemError> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            let config: LibraryConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(LibraryConfig::default())
        }
    }

    /// Writes the configuration back. During tests nothing is written.
    pub fn save_config(&self) -> Result<(), ChemError> {
        #[cfg(test)]
        {
            return Ok(());
        }

        #[cfg(not(test))]
        {
            let content = serde_json::to_string_pretty(&self.config)?;
            fs::write(&self.config_file, content)?;
            Ok(())
        }
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    pub fn reactions_path(&self) -> &str {
        &self.config.reactions
    }

    pub fn chemical_rules_path(&self) -> &str {
        &self.config.chemical_rules
    }

    pub fn elements_path(&self) -> &str {
        &self.config.elements
    }

    fn check_exists(path: &str) -> Result<(), ChemError> {
        if Path::new(path).exists() {
            Ok(())
        } else {
            Err(ChemError::Provider(format!("File does not exist: {}", path)))
        }
    }

    /// Points the reaction library to another file. The file must exist.
    pub fn set_reactions(&mut self, path: &str) -> Result<(), ChemError> {
        Self::check_exists(path)?;
        self.config.reactions = path.to_string();
        self.save_config()
    }

    pub fn set_chemical_rules(&mut self, path: &str) -> Result<(), ChemError> {
        Self::check_exists(path)?;
        self.config.chemical_rules = path.to_string();
        self.save_config()
    }

    pub fn set_elements(&mut self, path: &str) -> Result<(), ChemError> {
        Self::check_exists(path)?;
        self.config.elements = path.to_string();
        self.save_config()
    }

    /// Updates several paths at once: every file and key is validated before anything changes.
    ///
    /// # Arguments
    /// * `updates` - "reactions" | "chemical_rules" | "elements" -> new file path
    pub fn update_libraries(&mut self, updates: HashMap<&str, &str>) -> Result<(), ChemError> {
        for (key, path) in &updates {
            if !matches!(*key, "reactions" | "chemical_rules" | "elements") {
                return Err(ChemError::Provider(format!("Unknown library key: {}", key)));
            }
            Self::check_exists(path)?;
        }
        for (key, path) in updates {
            match key {
                "reactions" => self.config.reactions = path.to_string(),
                "chemical_rules" => self.config.chemical_rules = path.to_string(),
                _ => self.config.elements = path.to_string(),
            }
        }
        self.save_config()
    }

    pub fn get_config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), ChemError> {
        self.config = LibraryConfig::default();
        self.save_config()
    }
}

impl Default for LibraryManager {
    fn default() -> Self {
        Self::new()
    }
}
