//! # Rule Provider
//!
//! ## Purpose
//! Supplies reaction rules, formula (chemical) rules and the periodic table to the reasoning
//! components. The data live in an immutable [`RuleSnapshot`]; components receive it by reference
//! and never see it change while they run. [`JsonRuleProvider::reload`] builds a brand-new snapshot
//! from the library files and swaps it in at once, so a request holding the previous `Arc` keeps
//! a consistent view.
//!
//! ## Library files
//! Rows mirror how the rules are persisted in a relational store:
//! - reactions: `{"id", "type", "description", "reactants_json", "products_json",
//!   "conditions_json", "equation_string"}` where the `*_json` columns are JSON arrays stored
//!   as text
//! - chemical rules: `{"id", "name", "formula", "required_inputs", "output_var", "expression"}`
//!   with `required_inputs` again a JSON array stored as text
//! - elements: `{"mark", "atomic_number", "atomic_mass", "valence"}`
//!
//! Text columns that do not decode are read as empty lists. A missing elements file is replaced
//! by the periodic table bundled with the crate.
use super::rules::{ChemicalRule, ElementData, ReactionRule};
use crate::Chemistry::molmass::builtin_elements;
use crate::errors::ChemError;
use crate::library_manager::LibraryConfig;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// the contract every rule source fulfils
pub trait RuleProvider {
    fn all_reaction_rules(&self) -> Vec<ReactionRule>;
    fn all_chemical_rules(&self) -> Vec<ChemicalRule>;
    fn all_elements(&self) -> BTreeMap<String, ElementData>;
    /// refresh from the backing store, replacing the in-memory snapshot
    fn reload(&mut self) -> Result<(), ChemError>;
}

/// immutable view of the whole rule base at one moment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSnapshot {
    reactions: Vec<ReactionRule>,
    chemical_rules: Vec<ChemicalRule>,
    elements: BTreeMap<String, ElementData>,
}

impl RuleSnapshot {
    pub fn new(
        reactions: Vec<ReactionRule>,
        chemical_rules: Vec<ChemicalRule>,
        elements: BTreeMap<String, ElementData>,
    ) -> Self {
        Self {
            reactions,
            chemical_rules,
            elements,
        }
    }

    /// snapshot with the given reactions and the bundled periodic table
    pub fn with_reactions(reactions: Vec<ReactionRule>) -> Self {
        Self::new(reactions, Vec::new(), builtin_elements())
    }

    pub fn reactions(&self) -> &[ReactionRule] {
        &self.reactions
    }

    pub fn chemical_rules(&self) -> &[ChemicalRule] {
        &self.chemical_rules
    }

    pub fn elements(&self) -> &BTreeMap<String, ElementData> {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty() && self.chemical_rules.is_empty() && self.elements.is_empty()
    }

    /// short report of what was loaded
    pub fn log_summary(&self) {
        info!(
            "rule base: {} reaction rules, {} chemical rules, {} elements",
            self.reactions.len(),
            self.chemical_rules.len(),
            self.elements.len()
        );
        for (i, reaction) in self.reactions.iter().take(5).enumerate() {
            info!("[{}] {}", i + 1, reaction);
        }
        if self.reactions.len() > 5 {
            info!("  ... and {} more reactions", self.reactions.len() - 5);
        }
    }
}

impl RuleProvider for RuleSnapshot {
    fn all_reaction_rules(&self) -> Vec<ReactionRule> {
        self.reactions.clone()
    }
    fn all_chemical_rules(&self) -> Vec<ChemicalRule> {
        self.chemical_rules.clone()
    }
    fn all_elements(&self) -> BTreeMap<String, ElementData> {
        self.elements.clone()
    }
    /// nothing to refresh: the snapshot is its own store
    fn reload(&mut self) -> Result<(), ChemError> {
        Ok(())
    }
}

////////////////////////////////STORED ROWS//////////////////////////////////////////////////
fn safe_json_loads(text: Option<&str>) -> Vec<String> {
    match text {
        Some(text) if !text.trim().is_empty() => serde_json::from_str::<Vec<String>>(text)
            .unwrap_or_else(|e| {
                warn!("cannot decode JSON list '{}': {}", text, e);
                Vec::new()
            }),
        _ => Vec::new(),
    }
}

/// reaction rule as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionRow {
    pub id: Option<u32>,
    #[serde(rename = "type")]
    pub reaction_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub reactants_json: String,
    pub products_json: String,
    #[serde(default)]
    pub conditions_json: Option<String>,
    #[serde(default)]
    pub equation_string: Option<String>,
}

impl From<ReactionRow> for ReactionRule {
    fn from(row: ReactionRow) -> Self {
        Self {
            id: row.id,
            reaction_type: row.reaction_type,
            description: row.description.unwrap_or_default(),
            reactants: safe_json_loads(Some(&row.reactants_json)),
            conditions: safe_json_loads(row.conditions_json.as_deref()),
            products: safe_json_loads(Some(&row.products_json)),
            equation_string: row.equation_string,
        }
    }
}

/// formula rule as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChemicalRuleRow {
    pub id: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub formula: String,
    pub required_inputs: String,
    pub output_var: String,
    pub expression: String,
}

impl From<ChemicalRuleRow> for ChemicalRule {
    fn from(row: ChemicalRuleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            formula: row.formula,
            required_inputs: safe_json_loads(Some(&row.required_inputs)),
            output_var: row.output_var,
            expression: row.expression,
        }
    }
}

/// periodic table row as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRow {
    pub mark: String,
    pub atomic_number: u32,
    pub atomic_mass: f64,
    #[serde(default)]
    pub valence: Value,
}

impl ElementRow {
    fn into_entry(self) -> (String, ElementData) {
        let valence = match self.valence {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        (
            self.mark,
            ElementData {
                atomic_number: self.atomic_number,
                atomic_mass: self.atomic_mass,
                valence,
            },
        )
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(file_name: &str) -> Result<Vec<T>, ChemError> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(ChemError::Provider(format!(
            "File '{}' does not exist",
            file_name
        )));
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str::<Vec<T>>(&content).map_err(|e| {
        let msg = format!(
            "Error parsing '{}' at line {}, column {}: {}",
            file_name,
            e.line(),
            e.column(),
            e
        );
        error!("{}", msg);
        ChemError::Provider(msg)
    })
}

/// builds a snapshot out of the three library files named by the configuration
pub fn load_snapshot(config: &LibraryConfig) -> Result<RuleSnapshot, ChemError> {
    info!("______________LOADING RULE LIBRARIES______________");
    let reactions: Vec<ReactionRule> = read_rows::<ReactionRow>(&config.reactions)?
        .into_iter()
        .map(ReactionRule::from)
        .collect();
    let chemical_rules: Vec<ChemicalRule> = read_rows::<ChemicalRuleRow>(&config.chemical_rules)?
        .into_iter()
        .map(ChemicalRule::from)
        .collect();
    let elements = if Path::new(&config.elements).exists() {
        read_rows::<ElementRow>(&config.elements)?
            .into_iter()
            .map(ElementRow::into_entry)
            .collect()
    } else {
        warn!(
            "elements library '{}' not found, using the bundled periodic table",
            config.elements
        );
        builtin_elements()
    };
    let snapshot = RuleSnapshot::new(reactions, chemical_rules, elements);
    snapshot.log_summary();
    Ok(snapshot)
}

/// rule provider reading JSON library files
#[derive(Debug, Clone)]
pub struct JsonRuleProvider {
    config: LibraryConfig,
    snapshot: Arc<RuleSnapshot>,
}

impl JsonRuleProvider {
    /// Loads the libraries right away. A failure is logged and leaves an empty snapshot:
    /// the reasoning components then answer "not found" / "unknown element".
    pub fn new(config: LibraryConfig) -> Self {
        let mut provider = Self {
            config,
            snapshot: Arc::new(RuleSnapshot::default()),
        };
        if let Err(e) = provider.reload() {
            error!("rule libraries were not loaded: {}", e);
        }
        provider
    }

    /// the snapshot currently published
    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }
}

impl RuleProvider for JsonRuleProvider {
    fn all_reaction_rules(&self) -> Vec<ReactionRule> {
        self.snapshot.all_reaction_rules()
    }
    fn all_chemical_rules(&self) -> Vec<ChemicalRule> {
        self.snapshot.all_chemical_rules()
    }
    fn all_elements(&self) -> BTreeMap<String, ElementData> {
        self.snapshot.all_elements()
    }
    /// on failure the previous snapshot stays published
    fn reload(&mut self) -> Result<(), ChemError> {
        match load_snapshot(&self.config) {
            Ok(snapshot) => {
                self.snapshot = Arc::new(snapshot);
                Ok(())
            }
            Err(e) => {
                error!("reload failed, keeping the previous rule base: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const REACTIONS: &str = r#"[
        {"id": 1, "type": "exchange", "description": "white precipitate",
         "reactants_json": "[\"BaCl2\", \"Na2SO4\"]", "products_json": "[\"BaSO4\", \"NaCl\"]",
         "conditions_json": "[]", "equation_string": "BaCl2 + Na2SO4 -> BaSO4 + 2NaCl"},
        {"id": 2, "type": "decomposition", "description": "",
         "reactants_json": "[\"CaCO3\"]", "products_json": "[\"CaO\", \"CO2\"]",
         "conditions_json": "not json"}
    ]"#;
    const CHEMICAL_RULES: &str = r#"[
        {"id": 1, "name": "density", "formula": "m = D * V", "required_inputs": "[\"D\", \"V\"]",
         "output_var": "m", "expression": "D * V"}
    ]"#;
    const ELEMENTS: &str = r#"[
        {"mark": "H", "atomic_number": 1, "atomic_mass": 1.008, "valence": 1},
        {"mark": "O", "atomic_number": 8, "atomic_mass": 15.999, "valence": "2"}
    ]"#;

    fn temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn config_for(r: &NamedTempFile, c: &NamedTempFile, e: &str) -> LibraryConfig {
        LibraryConfig {
            reactions: r.path().to_str().unwrap().to_string(),
            chemical_rules: c.path().to_str().unwrap().to_string(),
            elements: e.to_string(),
        }
    }

    #[test]
    fn test_load_rows() {
        let r = temp_file(REACTIONS);
        let c = temp_file(CHEMICAL_RULES);
        let e = temp_file(ELEMENTS);
        let provider = JsonRuleProvider::new(config_for(&r, &c, e.path().to_str().unwrap()));

        let reactions = provider.all_reaction_rules();
        assert_eq!(reactions.len(), 2);
        assert_eq!(reactions[0].reactants, vec!["BaCl2", "Na2SO4"]);
        assert_eq!(reactions[0].description, "white precipitate");
        assert_eq!(reactions[0].equation(), "BaCl2 + Na2SO4 -> BaSO4 + 2NaCl");
        // undecodable column reads as an empty list
        assert!(reactions[1].conditions.is_empty());
        assert_eq!(reactions[1].equation(), "CaCO3 -> CaO + CO2");

        let rules = provider.all_chemical_rules();
        assert_eq!(rules[0].required_inputs, vec!["D", "V"]);

        let elements = provider.all_elements();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements["H"].valence, "1");
        assert_eq!(elements["O"].valence, "2");
    }

    #[test]
    fn test_bundled_libraries_load() {
        let snapshot = load_snapshot(&LibraryConfig::default()).unwrap();
        assert!(snapshot.reactions().len() >= 10);
        assert!(!snapshot.chemical_rules().is_empty());
        assert_eq!(snapshot.elements()["Na"].atomic_number, 11);
        assert!(
            snapshot
                .reactions()
                .iter()
                .all(|r| !r.reactants.is_empty() && !r.products.is_empty())
        );
    }

    #[test]
    fn test_missing_elements_file_uses_bundled_table() {
        let r = temp_file(REACTIONS);
        let c = temp_file(CHEMICAL_RULES);
        let provider = JsonRuleProvider::new(config_for(&r, &c, "no_such_elements.json"));
        assert!(provider.all_elements().contains_key("Na"));
    }

    #[test]
    fn test_failed_load_leaves_empty_snapshot() {
        let config = LibraryConfig {
            reactions: "no_such_reactions.json".to_string(),
            chemical_rules: "no_such_rules.json".to_string(),
            elements: "no_such_elements.json".to_string(),
        };
        let provider = JsonRuleProvider::new(config);
        assert!(provider.snapshot().is_empty());
    }

    #[test]
    fn test_reload_publishes_new_snapshot_and_keeps_old_on_failure() {
        let r = temp_file(REACTIONS);
        let c = temp_file(CHEMICAL_RULES);
        let mut provider = JsonRuleProvider::new(config_for(&r, &c, "no_such_elements.json"));
        let before = provider.snapshot();
        assert_eq!(before.reactions().len(), 2);

        // broken file: reload fails, old snapshot stays
        fs::write(r.path(), "[ broken").unwrap();
        assert!(provider.reload().is_err());
        assert_eq!(provider.snapshot().reactions().len(), 2);

        // repaired file with a single reaction
        fs::write(
            r.path(),
            r#"[{"id": 7, "type": "t", "reactants_json": "[\"A\"]", "products_json": "[\"B\"]"}]"#,
        )
        .unwrap();
        provider.reload().unwrap();
        assert_eq!(provider.snapshot().reactions().len(), 1);
        // the Arc taken earlier is untouched
        assert_eq!(before.reactions().len(), 2);
    }
}
