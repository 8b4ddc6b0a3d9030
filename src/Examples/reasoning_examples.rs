use crate::Chemistry::balancer::balance_equation;
use crate::Chemistry::molmass::{builtin_elements, calculate_molar_mass, parse_formula};
use crate::Inference::calc_path::{CalculationRequest, solve_calculation};
use crate::Inference::forward_chaining::run_forward_chaining;
use crate::Inference::identification::identify_chemicals;
use crate::Inference::reaction_path::find_reaction_path;
use crate::RuleBase::provider::RuleSnapshot;
use crate::RuleBase::rules::{ChemicalRule, ReactionRule};

/// small rule base of school chemistry used by the examples
pub fn demo_rule_base() -> RuleSnapshot {
    let reactions = vec![
        ReactionRule::new(
            "substitution",
            "sodium melts into a ball, gas bubbles",
            &["Na", "H2O"],
            &[],
            &["NaOH", "H2"],
        ),
        ReactionRule::new("combination", "", &["H2", "O2"], &["t°"], &["H2O"]),
        ReactionRule::new(
            "decomposition",
            "",
            &["CaCO3"],
            &["high temperature"],
            &["CaO", "CO2"],
        ),
        ReactionRule::new(
            "combination",
            "heat is released",
            &["CaO", "H2O"],
            &[],
            &["Ca(OH)2"],
        ),
        ReactionRule::new(
            "exchange",
            "white precipitate",
            &["Ca(OH)2", "CO2"],
            &[],
            &["CaCO3", "H2O"],
        ),
        ReactionRule::new(
            "exchange",
            "white precipitate",
            &["BaCl2", "Na2SO4"],
            &[],
            &["BaSO4", "NaCl"],
        ),
        ReactionRule::new(
            "exchange",
            "white precipitate",
            &["BaCl2", "Na2CO3"],
            &[],
            &["BaCO3", "NaCl"],
        ),
        ReactionRule::new(
            "exchange",
            "gas bubbles",
            &["HCl", "Na2CO3"],
            &[],
            &["NaCl", "H2O", "CO2"],
        ),
        ReactionRule::new(
            "exchange",
            "white curdy precipitate",
            &["AgNO3", "NaCl"],
            &[],
            &["AgCl", "NaNO3"],
        ),
    ];
    let chemical_rules = vec![
        ChemicalRule {
            id: Some(1),
            name: "pH from hydrogen ion concentration".to_string(),
            formula: "pH = -log10([H+])".to_string(),
            required_inputs: vec!["C_H".to_string()],
            output_var: "pH".to_string(),
            expression: "-log10(C_H)".to_string(),
        },
        ChemicalRule {
            id: Some(2),
            name: "gas volume at STP".to_string(),
            formula: "V_gas = n * 22.4".to_string(),
            required_inputs: vec!["n_CO2".to_string()],
            output_var: "V_gas".to_string(),
            expression: "n_CO2 * 22.4".to_string(),
        },
    ];
    RuleSnapshot::new(reactions, chemical_rules, builtin_elements())
}

pub fn reasoning_examples(task: usize) {
    let snapshot = demo_rule_base();
    match task {
        0 => {
            match parse_formula("Al2(SO4)3") {
                Ok(composition) => println!("Al2(SO4)3: {:?}", composition),
                Err(e) => println!("{}", e),
            }
            match calculate_molar_mass("Ca(OH)2", snapshot.elements()) {
                Ok(molar_mass) => println!("M(Ca(OH)2) = {} g/mol", molar_mass),
                Err(e) => println!("{}", e),
            }
        }
        1 => {
            for equation in ["H2 + O2 -> H2O", "Al + O2 -> Al2O3", "C3H8 + O2 -> CO2 + H2O"] {
                match balance_equation(equation) {
                    Ok(result) => result.pretty_print(),
                    Err(e) => println!("{}", e),
                }
            }
        }
        2 => match run_forward_chaining("CaCO3 + H2O", "high temperature", &snapshot) {
            Ok(result) => result.pretty_print(),
            Err(e) => println!("{}", e),
        },
        3 => match find_reaction_path("Na + H2O + CaCO3", "Ca(OH)2", &snapshot) {
            Ok(result) => result.pretty_print(),
            Err(e) => println!("{}", e),
        },
        4 => {
            let requests = [
                CalculationRequest::new("CaCO3", &[("m", 10.0)], "n"),
                CalculationRequest::new("CO2", &[("m", 4.4)], "V_gas"),
            ];
            for request in &requests {
                match solve_calculation(request, &snapshot) {
                    Ok(result) => result.pretty_print(),
                    Err(e) => println!("{}", e),
                }
            }
        }
        5 => {
            let unknowns: Vec<String> = ["BaCl2", "Na2SO4", "HCl", "Na2CO3"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            match identify_chemicals(&unknowns, &snapshot) {
                Ok(result) => result.pretty_print(),
                Err(e) => println!("{}", e),
            }
        }
        _ => {
            println!("no such example");
        }
    }
}
