//! # Calculation path
//!
//! Breadth-first search for a chain of formula rules that leads from the known quantities to the
//! wanted one, followed by the step-by-step evaluation of that chain.
//!
//! States are sets of known variable names. A rule is applicable if all its inputs are known and
//! its output is not; applying it adds the output. Every distinct set of variables is visited
//! once, and the search gives up after chains of [`MAX_CALC_STEPS`] rules, so the first chain
//! reaching the target is also a shortest one.
//!
//! For one-substance questions ("what mass of NaCl is 0.1 mol?") the generic quantities
//! `m, n, M, V, C` are renamed to `m_NaCl, n_NaCl, ...`, the molar mass is filled in from the
//! periodic table and four relations of that substance are added to the stored rules:
//! `n = m / M`, `C = n / V`, `n = C * V`, `m = n * M`.
use super::expression::evaluate;
use crate::Chemistry::molmass::calculate_molar_mass;
use crate::RuleBase::provider::RuleSnapshot;
use crate::RuleBase::rules::{CalcRule, CustomRule, FormulaRule};
use crate::errors::ChemError;
use log::{debug, info, warn};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// longest chain of rules the search will try
pub const MAX_CALC_STEPS: usize = 10;
/// quantities that belong to one substance and get the substance tag appended
pub const SUBSTANCE_VARS: [&str; 5] = ["m", "n", "M", "V", "C"];

/// Breadth-first search over sets of known variables.
/// Returns the rules to apply in order, an empty chain if the target is already known,
/// `None` if no chain of at most [`MAX_CALC_STEPS`] rules produces it.
pub fn find_calculation_path(
    known_vars: &BTreeSet<String>,
    target_var: &str,
    rules: &[FormulaRule],
) -> Option<Vec<FormulaRule>> {
    let mut queue: VecDeque<(BTreeSet<String>, Vec<usize>)> = VecDeque::new();
    let mut visited: HashSet<BTreeSet<String>> = HashSet::new();
    queue.push_back((known_vars.clone(), Vec::new()));
    visited.insert(known_vars.clone());

    while let Some((current_vars, current_path)) = queue.pop_front() {
        if current_path.len() >= MAX_CALC_STEPS {
            break;
        }
        if current_vars.contains(target_var) {
            debug!("calculation path of {} rules found", current_path.len());
            return Some(current_path.iter().map(|&i| rules[i].clone()).collect());
        }
        for (i, rule) in rules.iter().enumerate() {
            let applicable = rule
                .required_inputs()
                .iter()
                .all(|v| current_vars.contains(v));
            if !applicable || current_vars.contains(rule.output_var()) {
                continue;
            }
            let mut new_vars = current_vars.clone();
            new_vars.insert(rule.output_var().to_string());
            if visited.insert(new_vars.clone()) {
                let mut new_path = current_path.clone();
                new_path.push(i);
                queue.push_back((new_vars, new_path));
            }
        }
    }
    None
}

/// `"H2SO4(aq)"` -> `"H2SO4aq"`: the formula without anything but letters and digits
pub fn substance_tag(formula: &str) -> String {
    formula.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// `m` -> `m_NaCl` for substance quantities, anything else unchanged
pub fn relabel(var: &str, tag: &str) -> String {
    if SUBSTANCE_VARS.contains(&var) {
        format!("{}_{}", var, tag)
    } else {
        var.to_string()
    }
}

/// the four mass / mole / concentration relations of one substance
pub fn synthesized_rules(formula: &str) -> Vec<FormulaRule> {
    let tag = substance_tag(formula);
    let v = |name: &str| format!("{}_{}", name, tag);
    let make = |name: &str, generic: &str, inputs: [&str; 2], output: &str, op: char| {
        FormulaRule::from(CustomRule {
            name: format!("{} ({})", name, formula),
            formula: generic.to_string(),
            substance: formula.to_string(),
            required_inputs: inputs.iter().map(|i| v(*i)).collect(),
            output_var: v(output),
            expression: format!("{} {} {}", v(inputs[0]), op, v(inputs[1])),
        })
    };
    vec![
        make("mole from mass", "n = m / M", ["m", "M"], "n", '/'),
        make("concentration from mole", "C = n / V", ["n", "V"], "C", '/'),
        make("mole from concentration", "n = C * V", ["C", "V"], "n", '*'),
        make("mass from mole", "m = n * M", ["n", "M"], "m", '*'),
    ]
}

/// one evaluated rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationStep {
    pub step: usize,
    pub rule: String,
    pub formula: String,
    pub expression: String,
    pub output_var: String,
    pub value: f64,
}

/// Evaluates the rules in order, each result extending `env` for the following rules.
/// Steps computed before a failure stay in `steps`.
pub fn execute_path(
    path: &[FormulaRule],
    env: &mut HashMap<String, f64>,
    steps: &mut Vec<CalculationStep>,
) -> Result<(), ChemError> {
    for (i, rule) in path.iter().enumerate() {
        let value = evaluate(rule.expression(), env).map_err(|source| ChemError::Computation {
            step: i + 1,
            rule: rule.name().to_string(),
            source,
        })?;
        debug!("{} = {} = {}", rule.output_var(), rule.expression(), value);
        env.insert(rule.output_var().to_string(), value);
        steps.push(CalculationStep {
            step: i + 1,
            rule: rule.name().to_string(),
            formula: rule.formula().to_string(),
            expression: rule.expression().to_string(),
            output_var: rule.output_var().to_string(),
            value,
        });
    }
    Ok(())
}

/// a one-substance calculation question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// the substance, e.g. "NaCl"
    pub formula: String,
    /// known quantities by generic name, e.g. {"m": 5.844}
    pub known: BTreeMap<String, f64>,
    /// wanted quantity, e.g. "n"
    pub target: String,
}

impl CalculationRequest {
    pub fn new(formula: &str, known: &[(&str, f64)], target: &str) -> Self {
        Self {
            formula: formula.to_string(),
            known: known.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            target: target.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub success: bool,
    pub formula: String,
    /// relabelled target variable, e.g. "n_NaCl"
    pub target_var: String,
    pub value: Option<f64>,
    pub steps: Vec<CalculationStep>,
    pub error_message: Option<String>,
    pub failed_step: Option<usize>,
    pub failed_rule: Option<String>,
}

impl CalculationResult {
    pub fn pretty_print(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Step"),
            Cell::new("Rule"),
            Cell::new("Expression"),
            Cell::new("Result"),
        ]));
        for step in self.steps.iter() {
            table.add_row(Row::new(vec![
                Cell::new(&step.step.to_string()),
                Cell::new(&step.rule),
                Cell::new(&step.expression),
                Cell::new(&format!("{} = {:.6}", step.output_var, step.value)),
            ]));
        }
        table.printstd();
        match (self.value, &self.error_message) {
            (Some(value), _) if self.success => println!("{} = {}", self.target_var, value),
            (_, Some(message)) => println!("{}", message),
            _ => println!("{} was not computed", self.target_var),
        }
    }
}

/// Answers a one-substance question with the stored formula rules of `snapshot`
/// plus the synthesized relations of the substance.
pub fn solve_calculation(
    request: &CalculationRequest,
    snapshot: &RuleSnapshot,
) -> Result<CalculationResult, ChemError> {
    info!("______________CALCULATION______________");
    let formula = request.formula.trim();
    let target = request.target.trim();
    if formula.is_empty() || target.is_empty() {
        return Err(ChemError::MalformedInput(
            "formula and target quantity are required".to_string(),
        ));
    }
    let tag = substance_tag(formula);
    if tag.is_empty() {
        return Err(ChemError::MalformedInput(format!(
            "'{}' is not a chemical formula",
            formula
        )));
    }
    let target_var = relabel(target, &tag);

    let mut env: HashMap<String, f64> = request
        .known
        .iter()
        .map(|(k, v)| (relabel(k.trim(), &tag), *v))
        .collect();
    let molar_mass_var = relabel("M", &tag);
    let mut molar_mass_error = None;
    if !env.contains_key(&molar_mass_var) {
        match calculate_molar_mass(formula, snapshot.elements()) {
            Ok(molar_mass) => {
                env.insert(molar_mass_var, molar_mass);
            }
            Err(e) => {
                warn!("molar mass of {} is unknown: {}", formula, e);
                molar_mass_error = Some(e);
            }
        }
    }

    let mut rules = synthesized_rules(formula);
    rules.extend(
        snapshot
            .chemical_rules()
            .iter()
            .cloned()
            .map(FormulaRule::from),
    );
    let known_vars: BTreeSet<String> = env.keys().cloned().collect();
    info!("known {:?}, wanted {}", known_vars, target_var);

    let Some(path) = find_calculation_path(&known_vars, &target_var, &rules) else {
        if let Some(e) = molar_mass_error {
            return Err(e);
        }
        let message = format!(
            "no chain of at most {} formulas computes {} from {:?}",
            MAX_CALC_STEPS, target_var, known_vars
        );
        warn!("{}", message);
        return Ok(CalculationResult {
            success: false,
            formula: formula.to_string(),
            target_var,
            value: None,
            steps: Vec::new(),
            error_message: Some(message),
            failed_step: None,
            failed_rule: None,
        });
    };

    let mut steps = Vec::new();
    match execute_path(&path, &mut env, &mut steps) {
        Ok(()) => {
            let value = env.get(&target_var).copied();
            info!("{} = {:?} in {} steps", target_var, value, steps.len());
            Ok(CalculationResult {
                success: true,
                formula: formula.to_string(),
                target_var,
                value,
                steps,
                error_message: None,
                failed_step: None,
                failed_rule: None,
            })
        }
        Err(e) => {
            warn!("{}", e);
            let (failed_step, failed_rule) = match &e {
                ChemError::Computation { step, rule, .. } => (Some(*step), Some(rule.clone())),
                _ => (None, None),
            };
            Ok(CalculationResult {
                success: false,
                formula: formula.to_string(),
                target_var,
                value: None,
                steps,
                error_message: Some(e.to_string()),
                failed_step,
                failed_rule,
            })
        }
    }
}
