/// Module to calculate the atomic composition and molar mass of a chemical formula
///
///  # Examples
/// ```
/// use ChemLogic::Chemistry::molmass::{builtin_elements, calculate_molar_mass, parse_formula};
/// let composition = parse_formula("Al2(SO4)3").unwrap();
/// assert_eq!(composition.get("O"), Some(&12));
/// let molar_mass = calculate_molar_mass("NaCl", &builtin_elements()).unwrap();
/// println!("Molar mass: {:?} g/mol", molar_mass);
/// ```
pub mod molmass;
/// Balancing of chemical equations with integer coefficients.
///
///  # Examples
/// ```
/// use ChemLogic::Chemistry::balancer::balance_equation;
/// let result = balance_equation("H2 + O2 -> H2O").unwrap();
/// assert_eq!(result.balanced_equation.as_deref(), Some("2H2 + O2 -> 2H2O"));
/// ```
pub mod balancer;
/// tests
mod balancer_tests;
