//! # Equation Balancer
//!
//! Iterative integer balancing of an equation like `"Al + O2 -> Al2O3"`.
//! Every iteration looks for the element with the largest left/right discrepancy (ties go to the
//! alphabetically first symbol), takes the first compound containing it on the deficient side and
//! raises its coefficient: straight to the exact value if the missing atoms divide evenly,
//! otherwise by one. Once balanced the coefficients are divided by their GCD.
//! The procedure is deterministic: element maps are ordered, so the same input string always
//! produces the same coefficients and the same history.
use super::molmass::parse_formula;
use crate::errors::ChemError;
use log::{info, warn};
use prettytable::{Cell, Row, Table};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// default cap of balancing iterations
pub const MAX_BALANCE_ITERATIONS: usize = 50;

/// a substance taking part in the equation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compound {
    pub name: String,
    pub coefficient: usize,
    /// derived from `name` once, never changed afterwards
    pub elements: BTreeMap<String, usize>,
}

impl Compound {
    pub fn new(name: &str) -> Result<Self, ChemError> {
        Ok(Self {
            name: name.to_string(),
            coefficient: 1,
            elements: parse_formula(name)?,
        })
    }
    pub fn count_of(&self, element: &str) -> usize {
        self.elements.get(element).copied().unwrap_or(0)
    }
    /// coefficient × count of `element`, or an error once it leaves the i64 range
    pub fn atoms_of(&self, element: &str) -> Result<i64, ChemError> {
        self.count_of(element)
            .checked_mul(self.coefficient)
            .and_then(|total| i64::try_from(total).ok())
            .ok_or_else(|| totals_overflow(&self.to_string()))
    }
}

fn totals_overflow(what: &str) -> ChemError {
    ChemError::MalformedInput(format!(
        "atom totals of '{}' are too large to balance",
        what
    ))
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient > 1 {
            write!(f, "{}{}", self.coefficient, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Reactants,
    Products,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChemicalEquation {
    pub reactants: Vec<Compound>,
    pub products: Vec<Compound>,
}

/// element whose atom counts differ between the two sides
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnbalancedElement {
    pub element: String,
    pub left_count: i64,
    pub right_count: i64,
    pub difference: i64,
}

struct BalancingAction {
    side: Side,
    index: usize,
    element: String,
    new_coefficient: usize,
}

type Totals = BTreeMap<String, i64>;

impl ChemicalEquation {
    pub fn new(reactants: &[&str], products: &[&str]) -> Result<Self, ChemError> {
        Ok(Self {
            reactants: reactants
                .iter()
                .map(|r| Compound::new(r))
                .collect::<Result<_, _>>()?,
            products: products
                .iter()
                .map(|p| Compound::new(p))
                .collect::<Result<_, _>>()?,
        })
    }

    /// "H2 + O2 -> H2O": exactly one arrow, at least one substance on each side
    pub fn parse(equation: &str) -> Result<Self, ChemError> {
        let parts: Vec<&str> = equation.split("->").map(str::trim).collect();
        if parts.len() != 2 {
            return Err(ChemError::MalformedEquation(format!(
                "'{}' must contain exactly one '->'",
                equation
            )));
        }
        let split_side = |side: &str| -> Vec<String> {
            side.split('+')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };
        let reactants = split_side(parts[0]);
        let products = split_side(parts[1]);
        if reactants.is_empty() || products.is_empty() {
            return Err(ChemError::MalformedEquation(format!(
                "'{}' lacks reactants or products",
                equation
            )));
        }
        Ok(Self {
            reactants: reactants
                .iter()
                .map(|r| Compound::new(r))
                .collect::<Result<_, _>>()?,
            products: products
                .iter()
                .map(|p| Compound::new(p))
                .collect::<Result<_, _>>()?,
        })
    }

    fn side(&self, side: Side) -> &[Compound] {
        match side {
            Side::Reactants => &self.reactants,
            Side::Products => &self.products,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<Compound> {
        match side {
            Side::Reactants => &mut self.reactants,
            Side::Products => &mut self.products,
        }
    }

    /// atom totals (coefficient × count) of the left side, the right side, and all elements met
    pub fn element_totals(&self) -> Result<(Totals, Totals, BTreeSet<String>), ChemError> {
        let mut all_elements = BTreeSet::new();
        let mut sum_side = |compounds: &[Compound]| -> Result<Totals, ChemError> {
            let mut totals = Totals::new();
            for compound in compounds {
                for element in compound.elements.keys() {
                    let total = totals.entry(element.clone()).or_insert(0);
                    *total = total
                        .checked_add(compound.atoms_of(element)?)
                        .ok_or_else(|| totals_overflow(&self.to_string()))?;
                    all_elements.insert(element.clone());
                }
            }
            Ok(totals)
        };
        let left = sum_side(&self.reactants)?;
        let right = sum_side(&self.products)?;
        Ok((left, right, all_elements))
    }

    pub fn is_balanced(&self) -> Result<bool, ChemError> {
        Ok(self.unbalanced_details()?.is_empty())
    }

    pub fn unbalanced_details(&self) -> Result<Vec<UnbalancedElement>, ChemError> {
        let (left, right, all_elements) = self.element_totals()?;
        let details = all_elements
            .into_iter()
            .filter_map(|element| {
                let l = left.get(&element).copied().unwrap_or(0);
                let r = right.get(&element).copied().unwrap_or(0);
                (l != r).then(|| UnbalancedElement {
                    element,
                    left_count: l,
                    right_count: r,
                    difference: (l - r).abs(),
                })
            })
            .collect();
        Ok(details)
    }

    pub fn coefficients(&self) -> (Vec<usize>, Vec<usize>) {
        (
            self.reactants.iter().map(|c| c.coefficient).collect(),
            self.products.iter().map(|c| c.coefficient).collect(),
        )
    }

    /// divides all coefficients by their GCD, returns true if anything changed
    pub fn simplify_coefficients(&mut self) -> bool {
        let divisor = self
            .reactants
            .iter()
            .chain(self.products.iter())
            .map(|c| c.coefficient)
            .filter(|&c| c > 0)
            .fold(0, gcd);
        if divisor <= 1 {
            return false;
        }
        for compound in self.reactants.iter_mut().chain(self.products.iter_mut()) {
            compound.coefficient /= divisor;
        }
        true
    }

    fn find_balancing_action(&self) -> Result<Option<BalancingAction>, ChemError> {
        let (left, right, all_elements) = self.element_totals()?;
        // strict comparison over sorted elements: ties go to the first symbol
        let mut max_diff = 0;
        let mut unbalanced_element = None;
        for element in all_elements.iter() {
            let diff = (left.get(element).copied().unwrap_or(0)
                - right.get(element).copied().unwrap_or(0))
            .abs();
            if diff > max_diff {
                max_diff = diff;
                unbalanced_element = Some(element.clone());
            }
        }
        let Some(element) = unbalanced_element else {
            return Ok(None);
        };
        let left_total = left.get(&element).copied().unwrap_or(0);
        let right_total = right.get(&element).copied().unwrap_or(0);
        let (side, required_total) = if left_total < right_total {
            (Side::Reactants, right_total)
        } else {
            (Side::Products, left_total)
        };
        let compounds = self.side(side);
        let Some(index) = compounds
            .iter()
            .position(|c| c.elements.contains_key(&element))
        else {
            return Ok(None);
        };
        let target = &compounds[index];
        let count_in_target = target.count_of(&element);
        let bump = target.coefficient + 1;
        if count_in_target == 0 {
            return Ok(Some(BalancingAction {
                side,
                index,
                element,
                new_coefficient: bump,
            }));
        }
        let mut other_total: i64 = 0;
        for (i, compound) in compounds.iter().enumerate() {
            if i == index {
                continue;
            }
            other_total = other_total
                .checked_add(compound.atoms_of(&element)?)
                .ok_or_else(|| totals_overflow(&self.to_string()))?;
        }
        let needed = required_total - other_total;
        let count = i64::try_from(count_in_target)
            .map_err(|_| totals_overflow(&target.name))?;
        let new_coefficient = if needed > 0 && needed % count == 0 {
            let exact = (needed / count) as usize;
            if exact > target.coefficient { exact } else { bump }
        } else {
            bump
        };
        Ok(Some(BalancingAction {
            side,
            index,
            element,
            new_coefficient,
        }))
    }
}

impl fmt::Display for ChemicalEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |compounds: &[Compound]| {
            compounds
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" + ")
        };
        write!(f, "{} -> {}", join(&self.reactants), join(&self.products))
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceStep {
    pub step: usize,
    pub equation_before: String,
    pub action: String,
    pub equation_after: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceResult {
    pub success: bool,
    pub iterations: usize,
    pub balanced_equation: Option<String>,
    pub error_message: Option<String>,
    pub unbalanced_result: Option<String>,
    pub reactant_coefficients: Vec<usize>,
    pub product_coefficients: Vec<usize>,
    pub balancing_history: Vec<BalanceStep>,
    pub unbalanced_details: Vec<UnbalancedElement>,
}

impl BalanceResult {
    pub fn pretty_print(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Step"),
            Cell::new("Before"),
            Cell::new("Action"),
            Cell::new("After"),
        ]));
        for step in self.balancing_history.iter() {
            table.add_row(Row::new(vec![
                Cell::new(&step.step.to_string()),
                Cell::new(&step.equation_before),
                Cell::new(&step.action),
                Cell::new(&step.equation_after),
            ]));
        }
        table.printstd();
        if let Some(balanced) = &self.balanced_equation {
            println!("Balanced equation: {}", balanced);
        }
        if let Some(message) = &self.error_message {
            println!("{}", message);
            for detail in self.unbalanced_details.iter() {
                println!(
                    "  {}: left {} / right {}",
                    detail.element, detail.left_count, detail.right_count
                );
            }
        }
    }
}

/// balance with the default iteration cap
pub fn balance_equation(equation: &str) -> Result<BalanceResult, ChemError> {
    balance_equation_with_limit(equation, MAX_BALANCE_ITERATIONS)
}

pub fn balance_equation_with_limit(
    equation: &str,
    max_iterations: usize,
) -> Result<BalanceResult, ChemError> {
    let mut known = ChemicalEquation::parse(equation)?;
    info!("______________BALANCING {}______________", known);
    let mut iteration_count = 0;
    let mut history = Vec::new();
    let mut stuck = false;

    while !known.is_balanced()? && iteration_count < max_iterations {
        iteration_count += 1;
        let equation_before = known.to_string();
        let Some(action) = known.find_balancing_action()? else {
            warn!("no unbalanced element could be acted upon in {}", known);
            stuck = true;
            break;
        };
        let compound = &mut known.side_mut(action.side)[action.index];
        let description = format!(
            "Adjust '{}' to balance element '{}' (new coefficient: {})",
            compound.name, action.element, action.new_coefficient
        );
        compound.coefficient = action.new_coefficient;
        history.push(BalanceStep {
            step: iteration_count,
            equation_before,
            action: description,
            equation_after: known.to_string(),
        });
    }

    if known.is_balanced()? {
        let equation_before = known.to_string();
        if known.simplify_coefficients() {
            iteration_count += 1;
            history.push(BalanceStep {
                step: iteration_count,
                equation_before,
                action: "Reduce the coefficients to the smallest integer ratio".to_string(),
                equation_after: known.to_string(),
            });
        }
        info!("balanced: {} in {} steps", known, iteration_count);
        let (reactant_coefficients, product_coefficients) = known.coefficients();
        Ok(BalanceResult {
            success: true,
            iterations: iteration_count,
            balanced_equation: Some(known.to_string()),
            error_message: None,
            unbalanced_result: None,
            reactant_coefficients,
            product_coefficients,
            balancing_history: history,
            unbalanced_details: Vec::new(),
        })
    } else {
        known.simplify_coefficients();
        let error_message = if stuck {
            "No balancing action could be determined for the remaining discrepancy".to_string()
        } else {
            format!(
                "No solution found after {} iterations. Try increasing the iteration limit.",
                max_iterations
            )
        };
        warn!("{}: {}", equation, error_message);
        let (reactant_coefficients, product_coefficients) = known.coefficients();
        Ok(BalanceResult {
            success: false,
            iterations: iteration_count,
            balanced_equation: None,
            error_message: Some(error_message),
            unbalanced_result: Some(known.to_string()),
            reactant_coefficients,
            product_coefficients,
            balancing_history: history,
            unbalanced_details: known.unbalanced_details()?,
        })
    }
}
