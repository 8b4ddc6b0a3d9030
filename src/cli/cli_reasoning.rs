use super::cli_main::prompt;
use crate::Chemistry::balancer::balance_equation;
use crate::Inference::calc_path::{CalculationRequest, solve_calculation};
use crate::Inference::forward_chaining::run_forward_chaining;
use crate::Inference::identification::identify_chemicals;
use crate::Inference::reaction_path::find_reaction_path;
use crate::RuleBase::provider::RuleSnapshot;
use std::collections::BTreeMap;

pub fn balance_menu() {
    println!("\n=== Equation balancing ===");
    let equation = prompt("Equation (e.g. Al + O2 -> Al2O3): ");
    match balance_equation(&equation) {
        Ok(result) => result.pretty_print(),
        Err(e) => println!("{}", e),
    }
}

pub fn forward_chaining_menu(snapshot: &RuleSnapshot) {
    println!("\n=== Forward chaining ===");
    let reactants = prompt("Reactants separated by '+': ");
    let conditions = prompt("Conditions separated by ',' (empty: any): ");
    match run_forward_chaining(&reactants, &conditions, snapshot) {
        Ok(result) => result.pretty_print(),
        Err(e) => println!("{}", e),
    }
}

pub fn reaction_path_menu(snapshot: &RuleSnapshot) {
    println!("\n=== Reaction path ===");
    let reactants = prompt("Initial substances separated by '+': ");
    let target = prompt("Target substance: ");
    match find_reaction_path(&reactants, &target, snapshot) {
        Ok(result) => result.pretty_print(),
        Err(e) => println!("{}", e),
    }
}

/// "m = 5.8, V=0.5" -> {"m": 5.8, "V": 0.5}
pub(crate) fn parse_known_values(input: &str) -> Result<BTreeMap<String, f64>, String> {
    let mut known = BTreeMap::new();
    for item in input.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let (name, value) = item
            .split_once('=')
            .ok_or_else(|| format!("'{}' is not of the form name=value", item))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", value.trim()))?;
        known.insert(name.trim().to_string(), value);
    }
    Ok(known)
}

pub fn calculation_menu(snapshot: &RuleSnapshot) {
    println!("\n=== Calculation ===");
    let formula = prompt("Substance formula (e.g. NaCl): ");
    let known = prompt("Known quantities, e.g. m=5.844, V=0.5: ");
    let known = match parse_known_values(&known) {
        Ok(known) => known,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };
    let target = prompt("Wanted quantity (m, n, M, V, C or a formula-rule variable): ");
    let request = CalculationRequest {
        formula,
        known,
        target,
    };
    match solve_calculation(&request, snapshot) {
        Ok(result) => result.pretty_print(),
        Err(e) => println!("{}", e),
    }
}

pub fn identification_menu(snapshot: &RuleSnapshot) {
    println!("\n=== Identification ===");
    let unknowns = prompt("Substances in the vials separated by ',': ");
    let unknowns: Vec<String> = unknowns.split(',').map(|s| s.to_string()).collect();
    match identify_chemicals(&unknowns, snapshot) {
        Ok(result) => result.pretty_print(),
        Err(e) => println!("{}", e),
    }
}
