//! In-memory rule entities: reaction rules for forward chaining / path search,
//! formula rules for calculation-path search and periodic-table entries.
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// periodic table entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementData {
    pub atomic_number: u32,
    pub atomic_mass: f64,
    pub valence: String,
}

impl ElementData {
    pub fn new(atomic_number: u32, atomic_mass: f64, valence: &str) -> Self {
        Self {
            atomic_number,
            atomic_mass,
            valence: valence.to_string(),
        }
    }
}

/// A known reaction: when every reactant is present (and, if the caller states conditions,
/// every condition is met) the products become known facts.
/// Whether the rule already fired belongs to the search run, not to the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRule {
    pub id: Option<u32>,
    #[serde(rename = "type")]
    pub reaction_type: String,
    /// observed phenomenon, e.g. "white precipitate"
    pub description: String,
    pub reactants: Vec<String>,
    pub conditions: Vec<String>,
    pub products: Vec<String>,
    pub equation_string: Option<String>,
}

impl ReactionRule {
    pub fn new(
        reaction_type: &str,
        description: &str,
        reactants: &[&str],
        conditions: &[&str],
        products: &[&str],
    ) -> Self {
        let to_vec = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<String>>();
        Self {
            id: None,
            reaction_type: reaction_type.to_string(),
            description: description.to_string(),
            reactants: to_vec(reactants),
            conditions: to_vec(conditions),
            products: to_vec(products),
            equation_string: None,
        }
    }

    /// "A + B [cond1, cond2] -> C + D"
    pub fn summary(&self) -> String {
        let conditions = if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" [{}]", self.conditions.join(", "))
        };
        format!(
            "{}{} -> {}",
            self.reactants.join(" + "),
            conditions,
            self.products.join(" + ")
        )
    }

    /// stored display string, rebuilt from reactants/conditions/products if absent
    pub fn equation(&self) -> String {
        match &self.equation_string {
            Some(eq) if !eq.trim().is_empty() => eq.clone(),
            _ => self.summary(),
        }
    }
}

impl fmt::Display for ReactionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reaction_type, self.summary())
    }
}

/// common interface of every rule taking part in calculation-path search
#[enum_dispatch]
pub trait CalcRule {
    fn name(&self) -> &str;
    /// human readable formula, e.g. "n = m / M"
    fn formula(&self) -> &str;
    fn required_inputs(&self) -> &[String];
    fn output_var(&self) -> &str;
    /// arithmetic expression over the input variable names
    fn expression(&self) -> &str;
    fn is_synthesized(&self) -> bool;
}

/// formula rule loaded from the rule library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalRule {
    pub id: Option<u32>,
    pub name: String,
    pub formula: String,
    pub required_inputs: Vec<String>,
    pub output_var: String,
    pub expression: String,
}

impl CalcRule for ChemicalRule {
    fn name(&self) -> &str {
        &self.name
    }
    fn formula(&self) -> &str {
        &self.formula
    }
    fn required_inputs(&self) -> &[String] {
        &self.required_inputs
    }
    fn output_var(&self) -> &str {
        &self.output_var
    }
    fn expression(&self) -> &str {
        &self.expression
    }
    fn is_synthesized(&self) -> bool {
        false
    }
}

/// formula rule created for a single request (mass/mole/concentration relations of one substance)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomRule {
    pub name: String,
    pub formula: String,
    pub substance: String,
    pub required_inputs: Vec<String>,
    pub output_var: String,
    pub expression: String,
}

impl CalcRule for CustomRule {
    fn name(&self) -> &str {
        &self.name
    }
    fn formula(&self) -> &str {
        &self.formula
    }
    fn required_inputs(&self) -> &[String] {
        &self.required_inputs
    }
    fn output_var(&self) -> &str {
        &self.output_var
    }
    fn expression(&self) -> &str {
        &self.expression
    }
    fn is_synthesized(&self) -> bool {
        true
    }
}

#[enum_dispatch(CalcRule)]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "origin", rename_all = "lowercase")]
pub enum FormulaRule {
    Stored(ChemicalRule),
    Synthesized(CustomRule),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_summary() {
        let r = ReactionRule::new(
            "combination",
            "burns with a blue flame",
            &["H2", "O2"],
            &["t°"],
            &["H2O"],
        );
        assert_eq!(r.summary(), "H2 + O2 [t°] -> H2O");
        assert_eq!(r.equation(), "H2 + O2 [t°] -> H2O");
        let r = ReactionRule::new("exchange", "", &["NaOH", "HCl"], &[], &["NaCl", "H2O"]);
        assert_eq!(r.summary(), "NaOH + HCl -> NaCl + H2O");
    }

    #[test]
    fn test_formula_rule_dispatch() {
        let stored: FormulaRule = ChemicalRule {
            id: Some(1),
            name: "ideal gas moles".to_string(),
            formula: "n = P*V/(R*T)".to_string(),
            required_inputs: vec!["P".into(), "V".into(), "T".into()],
            output_var: "n".to_string(),
            expression: "P*V/(0.082*T)".to_string(),
        }
        .into();
        let custom: FormulaRule = CustomRule {
            name: "mole from mass".to_string(),
            formula: "n = m / M".to_string(),
            substance: "NaCl".to_string(),
            required_inputs: vec!["m_NaCl".into(), "M_NaCl".into()],
            output_var: "n_NaCl".to_string(),
            expression: "m_NaCl / M_NaCl".to_string(),
        }
        .into();
        assert!(!stored.is_synthesized());
        assert!(custom.is_synthesized());
        assert_eq!(stored.output_var(), "n");
        assert_eq!(custom.required_inputs().len(), 2);
        let json = serde_json::to_value(&custom).unwrap();
        assert_eq!(json["origin"], "synthesized");
        assert_eq!(json["output_var"], "n_NaCl");
    }
}
