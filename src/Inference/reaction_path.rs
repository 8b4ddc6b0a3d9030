//! # Reaction path search
//!
//! Forward chaining without condition checks that remembers, for every newly produced substance,
//! the first rule that produced it and stops the moment the target appears. The chain of reactions
//! is then read backwards from the target: take its producing rule, move on to the first reactant
//! of that rule (in declaration order) that was itself produced, repeat until a rule needs only
//! initial substances. With several derived reactants only the first is followed, so the chain is
//! one possible derivation, not necessarily the shortest.
use super::forward_chaining::{is_react_available, parse_input_to_set};
use crate::RuleBase::provider::RuleSnapshot;
use crate::RuleBase::rules::ReactionRule;
use crate::errors::ChemError;
use log::{info, warn};
use prettytable::{Cell, Row, Table};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// a reaction of the found chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStep {
    pub id: Option<u32>,
    #[serde(rename = "type")]
    pub reaction_type: String,
    pub description: String,
    pub reactants: Vec<String>,
    pub conditions: Vec<String>,
    pub products: Vec<String>,
    pub equation_string: String,
}

impl From<&ReactionRule> for PathStep {
    fn from(rule: &ReactionRule) -> Self {
        Self {
            id: rule.id,
            reaction_type: rule.reaction_type.clone(),
            description: rule.description.clone(),
            reactants: rule.reactants.clone(),
            conditions: rule.conditions.clone(),
            products: rule.products.clone(),
            equation_string: rule.equation(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub success: bool,
    pub target: String,
    /// passes over the rule base before the target appeared
    pub path_steps: usize,
    pub path: Vec<PathStep>,
    /// facts known when the search stopped, sorted
    pub known_chemicals: Vec<String>,
    pub error_message: Option<String>,
}

impl PathResult {
    pub fn pretty_print(&self) {
        if !self.success {
            println!(
                "{}",
                self.error_message.as_deref().unwrap_or("path not found")
            );
            println!("Reached: {}", self.known_chemicals.join(", "));
            return;
        }
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Step"),
            Cell::new("Equation"),
            Cell::new("Phenomenon"),
        ]));
        for (i, step) in self.path.iter().enumerate() {
            table.add_row(Row::new(vec![
                Cell::new(&(i + 1).to_string()),
                Cell::new(&step.equation_string),
                Cell::new(&step.description),
            ]));
        }
        table.printstd();
        println!(
            "{} reached after {} passes",
            self.target, self.path_steps
        );
    }
}

/// Walks back from `target` through the producer map. Every visited fact is removed from a
/// working copy of the map, so a cycle in the derivations cannot loop forever.
fn reconstruct_path(
    target: &str,
    path_map: &HashMap<String, usize>,
    rules: &[ReactionRule],
) -> Vec<usize> {
    let mut chain = Vec::new();
    let mut remaining = path_map.clone();
    let mut current = target.to_string();
    while let Some(rule_index) = remaining.remove(&current) {
        chain.push(rule_index);
        let next = rules[rule_index]
            .reactants
            .iter()
            .find(|reactant| path_map.contains_key(*reactant));
        match next {
            Some(reactant) => current = reactant.clone(),
            None => break,
        }
    }
    chain.reverse();
    chain
}

/// Searches a chain of reactions leading from `initial_reactants` (separated by `+`) to `target`.
/// Environmental conditions of the rules are ignored.
pub fn find_reaction_path(
    initial_reactants: &str,
    target: &str,
    snapshot: &RuleSnapshot,
) -> Result<PathResult, ChemError> {
    info!("______________REACTION PATH SEARCH______________");
    let mut known_facts = parse_input_to_set(initial_reactants, '+');
    let target = target.trim().to_string();
    if known_facts.is_empty() {
        return Err(ChemError::MalformedInput(
            "no initial reactants given".to_string(),
        ));
    }
    if target.is_empty() {
        return Err(ChemError::MalformedInput("no target given".to_string()));
    }
    if known_facts.contains(&target) {
        info!("{} is already among the initial substances", target);
        return Ok(PathResult {
            success: true,
            target,
            path_steps: 0,
            path: Vec::new(),
            known_chemicals: known_facts.into_iter().collect(),
            error_message: None,
        });
    }

    let rules = snapshot.reactions();
    let no_conditions = BTreeSet::new();
    let mut path_map: HashMap<String, usize> = HashMap::new();
    let mut fired: HashSet<usize> = HashSet::new();
    let mut iterations = 0;
    let mut target_found = false;
    let mut something_new = true;

    'search: while something_new {
        something_new = false;
        iterations += 1;
        for (i, rule) in rules.iter().enumerate() {
            if fired.contains(&i) || !is_react_available(rule, &known_facts, &no_conditions, false)
            {
                continue;
            }
            fired.insert(i);
            for product in rule.products.iter() {
                if known_facts.insert(product.clone()) {
                    path_map.insert(product.clone(), i);
                    something_new = true;
                    if *product == target {
                        target_found = true;
                        break 'search;
                    }
                }
            }
        }
    }

    if !target_found {
        let message = format!("no reaction path produces '{}'", target);
        warn!("{}", message);
        return Ok(PathResult {
            success: false,
            target,
            path_steps: iterations,
            path: Vec::new(),
            known_chemicals: known_facts.into_iter().collect(),
            error_message: Some(message),
        });
    }

    let path: Vec<PathStep> = reconstruct_path(&target, &path_map, rules)
        .into_iter()
        .map(|i| PathStep::from(&rules[i]))
        .collect();
    info!(
        "path to {} found: {} reactions, {} passes",
        target,
        path.len(),
        iterations
    );
    Ok(PathResult {
        success: true,
        target,
        path_steps: iterations,
        path,
        known_chemicals: known_facts.into_iter().collect(),
        error_message: None,
    })
}
