//! # Forward chaining
//!
//! Starting from a set of known substances, fires every reaction rule whose reactants are all
//! known (and, if the caller stated conditions, whose conditions are all among them), adding the
//! products to the known facts, until a full pass over the rule base adds nothing new.
//! Each rule fires at most once per run. Which rules already fired is kept in a set of rule
//! indices owned by the run, so the same [`RuleSnapshot`] can serve any number of runs.
use crate::RuleBase::provider::RuleSnapshot;
use crate::RuleBase::rules::ReactionRule;
use crate::errors::ChemError;
use log::{debug, info};
use prettytable::{Cell, Row, Table};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// phenomenon / notice used when nothing reacts
pub const NO_REACTION: &str = "no reaction";

/// Splits user input like `"Na + H2O"` (delimiter `'+'`) or `"t°, xt"` (delimiter `','`) into a set
/// of trimmed, non-empty names.
pub fn parse_input_to_set(input: &str, delimiter: char) -> BTreeSet<String> {
    input
        .split(delimiter)
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

/// Can the rule fire on the current facts? The fired-rule bookkeeping is the caller's.
/// Rule conditions are only checked when `check_conditions` is set and the rule has any.
pub fn is_react_available(
    rule: &ReactionRule,
    known_facts: &BTreeSet<String>,
    input_conditions: &BTreeSet<String>,
    check_conditions: bool,
) -> bool {
    if !rule.reactants.iter().all(|r| known_facts.contains(r)) {
        return false;
    }
    if check_conditions
        && !rule.conditions.is_empty()
        && !rule.conditions.iter().all(|c| input_conditions.contains(c))
    {
        return false;
    }
    true
}

/// one fired rule in the trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiredReaction {
    #[serde(rename = "type")]
    pub reaction_type: String,
    pub description: String,
    /// "A + B [cond] -> C"
    pub reaction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    /// summary of the first fired rule, or a notice that nothing reacted
    pub first_reaction: String,
    /// products deduced during the run, sorted
    pub final_products: Vec<String>,
    /// every fact known at the fixpoint, sorted
    pub total_facts: Vec<String>,
    pub initial_reactants: Vec<String>,
    /// number of passes over the rule base, the final idle pass included
    pub iterations: usize,
    pub reactions_used: Vec<FiredReaction>,
    pub summary: String,
}

impl InferenceResult {
    pub fn pretty_print(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("#"),
            Cell::new("Type"),
            Cell::new("Reaction"),
            Cell::new("Phenomenon"),
        ]));
        for (i, fired) in self.reactions_used.iter().enumerate() {
            table.add_row(Row::new(vec![
                Cell::new(&(i + 1).to_string()),
                Cell::new(&fired.reaction_type),
                Cell::new(&fired.reaction),
                Cell::new(&fired.description),
            ]));
        }
        table.printstd();
        println!("Initial reactants: {}", self.initial_reactants.join(", "));
        println!("New products: {}", self.final_products.join(", "));
        println!("All facts: {}", self.total_facts.join(", "));
        println!("{} (passes: {})", self.summary, self.iterations);
    }
}

/// Runs forward chaining over the reaction rules of `snapshot`.
///
/// # Arguments
/// * `initial_reactants` - substances separated by `+`, e.g. `"Na + H2O"`
/// * `conditions` - conditions separated by `,`; empty means "accept any condition"
pub fn run_forward_chaining(
    initial_reactants: &str,
    conditions: &str,
    snapshot: &RuleSnapshot,
) -> Result<InferenceResult, ChemError> {
    let initial = parse_input_to_set(initial_reactants, '+');
    if initial.is_empty() {
        return Err(ChemError::MalformedInput(
            "no initial reactants given".to_string(),
        ));
    }
    let input_conditions = parse_input_to_set(conditions, ',');
    let check_conditions = !input_conditions.is_empty();
    info!(
        "forward chaining from {:?}, conditions {:?}",
        initial, input_conditions
    );

    let rules = snapshot.reactions();
    let mut known_facts = initial.clone();
    let mut deduced: BTreeSet<String> = BTreeSet::new();
    let mut fired: HashSet<usize> = HashSet::new();
    let mut reactions_used: Vec<FiredReaction> = Vec::new();
    let mut iterations = 0;
    let mut something_new = true;

    while something_new {
        something_new = false;
        iterations += 1;
        for (i, rule) in rules.iter().enumerate() {
            if fired.contains(&i)
                || !is_react_available(rule, &known_facts, &input_conditions, check_conditions)
            {
                continue;
            }
            fired.insert(i);
            let summary = rule.summary();
            debug!("pass {}: fired {}", iterations, summary);
            reactions_used.push(FiredReaction {
                reaction_type: rule.reaction_type.clone(),
                description: rule.description.clone(),
                reaction: summary,
            });
            for product in rule.products.iter() {
                if known_facts.insert(product.clone()) {
                    deduced.insert(product.clone());
                    something_new = true;
                }
            }
        }
    }

    let first_reaction = reactions_used
        .first()
        .map(|r| r.reaction.clone())
        .unwrap_or_else(|| NO_REACTION.to_string());
    let summary = format!(
        "{} rules used to deduce {} new products",
        reactions_used.len(),
        deduced.len()
    );
    info!("{}", summary);
    Ok(InferenceResult {
        first_reaction,
        final_products: deduced.into_iter().collect(),
        total_facts: known_facts.into_iter().collect(),
        initial_reactants: initial.into_iter().collect(),
        iterations,
        reactions_used,
        summary,
    })
}
