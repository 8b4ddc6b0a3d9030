/// Forward chaining over the reaction rules: what can be obtained from given substances
///
///  # Examples
/// ```
/// use ChemLogic::Inference::forward_chaining::run_forward_chaining;
/// use ChemLogic::RuleBase::provider::RuleSnapshot;
/// use ChemLogic::RuleBase::rules::ReactionRule;
/// let snapshot = RuleSnapshot::with_reactions(vec![
///     ReactionRule::new("decomposition", "", &["CaCO3"], &["high temperature"], &["CaO", "CO2"]),
///     ReactionRule::new("combination", "", &["CaO", "H2O"], &[], &["Ca(OH)2"]),
/// ]);
/// let result = run_forward_chaining("CaCO3 + H2O", "", &snapshot).unwrap();
/// assert_eq!(result.final_products, vec!["CO2", "Ca(OH)2", "CaO"]);
/// ```
pub mod forward_chaining;
/// Chain of reactions leading from given substances to a target substance
pub mod reaction_path;
/// restricted arithmetic for formula rules
pub mod expression;
/// Breadth-first search and evaluation of chains of formula rules
///
///  # Examples
/// ```
/// use ChemLogic::Inference::calc_path::{CalculationRequest, solve_calculation};
/// use ChemLogic::RuleBase::provider::RuleSnapshot;
/// let snapshot = RuleSnapshot::with_reactions(Vec::new());
/// let request = CalculationRequest::new("NaCl", &[("m", 5.844)], "n");
/// let result = solve_calculation(&request, &snapshot).unwrap();
/// assert!(result.success);
/// assert!((result.value.unwrap() - 0.1).abs() < 1e-6);
/// ```
pub mod calc_path;
/// Identification of unlabelled vials from pairwise mixing
pub mod identification;
mod forward_chaining_tests;
