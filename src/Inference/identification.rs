//! # Identification of unlabelled vials
//!
//! Every vial of the list gets a label (`Vial_1`, `Vial_2`, ... in input order) and the vials are
//! mixed pairwise. The observations form a [`TestMatrix`]; the solver then works in rounds
//! (at most [`MAX_IDENTIFICATION_ROUNDS`]) over the group of vials not yet recognised:
//! - a reference is chosen: the first vial of the group whose profile (the sorted list of what it
//!   shows with every other vial of the group) no other vial of the group shares. Failing that, the
//!   first already recognised vial that gives a phenomenon of its own with at least one vial of the
//!   group. If there is none, the remaining vials cannot be told apart and solving stops;
//! - the reference is mixed with the vials of the group and they are grouped by phenomenon;
//! - the reference and every vial that is alone in its phenomenon group are recognised,
//!   vials sharing a phenomenon form the group of the next round.
use super::forward_chaining::{NO_REACTION, run_forward_chaining};
use crate::RuleBase::provider::RuleSnapshot;
use crate::errors::ChemError;
use log::{info, warn};
use prettytable::{Cell, Row, Table};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const MAX_IDENTIFICATION_ROUNDS: usize = 10;
/// phenomenon of a reaction whose rule does not describe what is seen
pub const UNDESCRIBED_REACTION: &str = "reaction occurs (phenomenon not recorded)";

/// Observations of pairwise mixing. The pair is unordered: (A, B) and (B, A) are the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestMatrix {
    observations: BTreeMap<(String, String), String>,
}

impl TestMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn insert(&mut self, a: &str, b: &str, phenomenon: &str) {
        self.observations
            .insert(Self::key(a, b), phenomenon.to_string());
    }

    pub fn get(&self, a: &str, b: &str) -> Option<&str> {
        self.observations.get(&Self::key(a, b)).map(|s| s.as_str())
    }

    /// observation of the pair, "no reaction" if none was recorded
    pub fn phenomenon(&self, a: &str, b: &str) -> &str {
        self.get(a, b).unwrap_or(NO_REACTION)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(String, String), &String)> {
        self.observations.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestObservation {
    pub chemical_pair: String,
    pub phenomenon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentificationStep {
    pub step: usize,
    pub action: String,
    pub reference_chemical: String,
    pub test_results: Vec<TestObservation>,
    pub identified_in_step: Vec<String>,
    pub remaining_chemicals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentificationResult {
    /// label -> substance
    pub identified_mapping: BTreeMap<String, String>,
    pub unidentified_chemicals: Vec<String>,
    pub identification_steps: Vec<IdentificationStep>,
    pub success: bool,
}

impl IdentificationResult {
    pub fn pretty_print(&self) {
        for step in self.identification_steps.iter() {
            println!("Step {}: {}", step.step, step.action);
            let mut table = Table::new();
            table.add_row(Row::new(vec![Cell::new("Pair"), Cell::new("Phenomenon")]));
            for observation in step.test_results.iter() {
                table.add_row(Row::new(vec![
                    Cell::new(&observation.chemical_pair),
                    Cell::new(&observation.phenomenon),
                ]));
            }
            table.printstd();
        }
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::new("Vial"), Cell::new("Substance")]));
        for (label, substance) in self.identified_mapping.iter() {
            table.add_row(Row::new(vec![Cell::new(label), Cell::new(substance)]));
        }
        table.printstd();
        if !self.unidentified_chemicals.is_empty() {
            println!(
                "Not distinguishable: {}",
                self.unidentified_chemicals.join(", ")
            );
        }
    }
}

/// sorted observations of `substance` with every other member of `group`
fn profile(substance: &str, group: &[String], matrix: &TestMatrix) -> Vec<String> {
    let mut observations: Vec<String> = group
        .iter()
        .filter(|other| other.as_str() != substance)
        .map(|other| matrix.phenomenon(substance, other).to_string())
        .collect();
    observations.sort();
    observations
}

/// phenomenon -> vials, in order of first appearance
fn group_by_phenomenon(
    reference: &str,
    group: &[String],
    matrix: &TestMatrix,
) -> Vec<(String, Vec<String>)> {
    let mut phenomena_groups: Vec<(String, Vec<String>)> = Vec::new();
    for target in group.iter().filter(|s| s.as_str() != reference) {
        let phenomenon = matrix.phenomenon(reference, target).to_string();
        match phenomena_groups.iter_mut().find(|(p, _)| *p == phenomenon) {
            Some((_, members)) => members.push(target.clone()),
            None => phenomena_groups.push((phenomenon, vec![target.clone()])),
        }
    }
    phenomena_groups
}

/// The reagent of the next round: a member of the group no other member can be confused with,
/// otherwise a recognised vial singling out at least one member. The flag tells whether the
/// reagent belongs to the group.
fn choose_reference(
    group: &[String],
    recognised: &[String],
    matrix: &TestMatrix,
) -> Option<(String, bool)> {
    let profiles: Vec<Vec<String>> = group.iter().map(|s| profile(s, group, matrix)).collect();
    let unique = profiles.iter().enumerate().find(|(i, p)| {
        profiles
            .iter()
            .enumerate()
            .all(|(j, other)| j == *i || other != *p)
    });
    if let Some((i, _)) = unique {
        return Some((group[i].clone(), true));
    }
    recognised
        .iter()
        .find(|reagent| {
            group_by_phenomenon(reagent, group, matrix)
                .iter()
                .any(|(_, members)| members.len() == 1)
        })
        .map(|reagent| (reagent.clone(), false))
}

/// keeps the first occurrence of every name
fn distinct_vials<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut vials: Vec<String> = Vec::new();
    for name in names {
        if vials.iter().any(|v| v == name) {
            warn!("{} is listed twice, the duplicate is ignored", name);
        } else {
            vials.push(name.to_string());
        }
    }
    vials
}

/// Deduces which vial holds which substance from the pairwise observations.
/// A name listed more than once stands for a single vial.
pub fn solve_identification_puzzle(
    unknowns: &[String],
    matrix: &TestMatrix,
) -> IdentificationResult {
    let vials = distinct_vials(unknowns.iter().map(|s| s.as_str()));
    let labels: HashMap<&str, String> = vials
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), format!("Vial_{}", i + 1)))
        .collect();
    let tagged = |s: &str| {
        let label = labels.get(s).map(|l| l.as_str()).unwrap_or("?");
        format!("{} ({})", label, s)
    };

    let mut current_group: Vec<String> = vials.clone();
    let mut identified: BTreeMap<String, String> = BTreeMap::new();
    let mut recognised: Vec<String> = Vec::new();
    let mut steps: Vec<IdentificationStep> = Vec::new();
    let mut step_count = 0;

    while !current_group.is_empty() && step_count < MAX_IDENTIFICATION_ROUNDS {
        let Some((reference, from_group)) = choose_reference(&current_group, &recognised, matrix)
        else {
            warn!(
                "{:?} give the same observations with every reagent, they cannot be told apart",
                current_group
            );
            break;
        };
        step_count += 1;

        let phenomena_groups = group_by_phenomenon(&reference, &current_group, matrix);
        let test_results: Vec<TestObservation> = current_group
            .iter()
            .filter(|s| **s != reference)
            .map(|target| TestObservation {
                chemical_pair: format!("{} + {}", tagged(&reference), tagged(target)),
                phenomenon: matrix.phenomenon(&reference, target).to_string(),
            })
            .collect();

        let mut action = if current_group.len() == 1 {
            format!("{} is the last vial left", tagged(&reference))
        } else if from_group {
            format!(
                "{} is used as the reagent for the remaining vials",
                tagged(&reference)
            )
        } else {
            format!(
                "the recognised {} is used as the reagent for the remaining vials",
                tagged(&reference)
            )
        };
        let mut newly_identified = Vec::new();
        let mut next_group = Vec::new();
        for (phenomenon, members) in phenomena_groups {
            if members.len() == 1 {
                action.push_str(&format!(
                    " | {}: '{}' is unique against {}",
                    tagged(&members[0]),
                    phenomenon,
                    tagged(&reference)
                ));
                newly_identified.push(members[0].clone());
            } else {
                next_group.extend(members);
            }
        }

        let in_step: Vec<&String> = if from_group {
            std::iter::once(&reference)
                .chain(newly_identified.iter())
                .collect()
        } else {
            newly_identified.iter().collect()
        };
        for substance in in_step {
            if let Some(label) = labels.get(substance.as_str()) {
                identified.insert(label.clone(), substance.clone());
            }
            recognised.push(substance.clone());
        }
        current_group = next_group;
        info!("round {}: {}", step_count, action);
        steps.push(IdentificationStep {
            step: step_count,
            action,
            reference_chemical: tagged(&reference),
            test_results,
            identified_in_step: newly_identified.iter().map(|s| tagged(s)).collect(),
            remaining_chemicals: current_group.iter().map(|s| tagged(s)).collect(),
        });
    }

    let success = identified.len() == vials.len();
    IdentificationResult {
        identified_mapping: identified,
        unidentified_chemicals: current_group,
        identification_steps: steps,
        success,
    }
}

/// Builds the test matrix by forward chaining on every pair of `unknowns` (no conditions:
/// mixing in a test tube) and solves it. The phenomenon of a pair is the description of the first
/// reaction that fires.
pub fn identify_chemicals(
    unknowns: &[String],
    snapshot: &RuleSnapshot,
) -> Result<IdentificationResult, ChemError> {
    info!("______________IDENTIFICATION______________");
    let clean_list = distinct_vials(
        unknowns
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty()),
    );
    if clean_list.is_empty() {
        return Err(ChemError::MalformedInput(
            "no substances to identify".to_string(),
        ));
    }

    let mut matrix = TestMatrix::new();
    for (i, a) in clean_list.iter().enumerate() {
        for b in clean_list.iter().skip(i + 1) {
            let result = run_forward_chaining(&format!("{} + {}", a, b), "", snapshot)?;
            let phenomenon = match result.reactions_used.first() {
                Some(fired) if !fired.description.trim().is_empty() => fired.description.clone(),
                Some(_) => UNDESCRIBED_REACTION.to_string(),
                None => NO_REACTION.to_string(),
            };
            matrix.insert(a, b, &phenomenon);
        }
    }
    Ok(solve_identification_puzzle(&clean_list, &matrix))
}
