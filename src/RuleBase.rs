/// Reaction rules, formula rules and periodic-table entries as used in memory.
pub mod rules;
/// Rule Provider: immutable snapshots of the rule base and the JSON library loader.
///
///  # Examples
/// ```
/// use ChemLogic::RuleBase::provider::RuleSnapshot;
/// use ChemLogic::RuleBase::rules::ReactionRule;
/// let snapshot = RuleSnapshot::with_reactions(vec![ReactionRule::new(
///     "combination", "", &["H2", "O2"], &[], &["H2O"],
/// )]);
/// assert_eq!(snapshot.reactions().len(), 1);
/// assert!(snapshot.elements().contains_key("O"));
/// ```
pub mod provider;
