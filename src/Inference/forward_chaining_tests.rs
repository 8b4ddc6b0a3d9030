///////////////////////TESTS////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Inference::forward_chaining::{NO_REACTION, parse_input_to_set, run_forward_chaining};
    use crate::Inference::reaction_path::find_reaction_path;
    use crate::RuleBase::provider::RuleSnapshot;
    use crate::RuleBase::rules::ReactionRule;
    use crate::errors::ChemError;
    use std::collections::BTreeSet;

    fn rule_base() -> RuleSnapshot {
        RuleSnapshot::with_reactions(vec![
            ReactionRule::new(
                "substitution",
                "sodium melts, gas bubbles",
                &["Na", "H2O"],
                &[],
                &["NaOH", "H2"],
            ),
            ReactionRule::new("exchange", "", &["NaOH", "CO2"], &[], &["Na2CO3", "H2O"]),
            ReactionRule::new(
                "decomposition",
                "",
                &["CaCO3"],
                &["nhiệt độ cao"],
                &["CaO", "CO2"],
            ),
            ReactionRule::new("combination", "", &["CaO", "H2O"], &[], &["Ca(OH)2"]),
            ReactionRule::new("combination", "", &["H2", "O2"], &["t°"], &["H2O"]),
        ])
    }

    #[test]
    fn test_parse_input_to_set() {
        let set = parse_input_to_set(" Na +H2O + + Na ", '+');
        assert_eq!(
            set,
            BTreeSet::from(["H2O".to_string(), "Na".to_string()])
        );
        assert!(parse_input_to_set("   ", ',').is_empty());
        assert_eq!(parse_input_to_set("t°, xt", ',').len(), 2);
    }

    #[test]
    fn test_chaining_within_one_pass() {
        let result = run_forward_chaining("CaCO3 + H2O", "", &rule_base()).unwrap();
        assert_eq!(result.final_products, vec!["CO2", "Ca(OH)2", "CaO"]);
        assert_eq!(result.initial_reactants, vec!["CaCO3", "H2O"]);
        assert_eq!(result.reactions_used.len(), 2);
        assert_eq!(result.first_reaction, "CaCO3 [nhiệt độ cao] -> CaO + CO2");
        assert_eq!(result.iterations, 2);
        assert_eq!(result.summary, "2 rules used to deduce 3 new products");
    }

    #[test]
    fn test_conditions_unchecked_when_none_given() {
        let result = run_forward_chaining("CaCO3", "", &rule_base()).unwrap();
        assert_eq!(result.reactions_used.len(), 1);
        assert_eq!(result.reactions_used[0].reaction_type, "decomposition");
        assert!(result.total_facts.contains(&"CaO".to_string()));
    }

    #[test]
    fn test_non_matching_conditions_block_the_rule() {
        let result = run_forward_chaining("CaCO3", "xúc tác", &rule_base()).unwrap();
        assert!(result.reactions_used.is_empty());
        assert!(result.final_products.is_empty());
        assert_eq!(result.first_reaction, NO_REACTION);
        assert_eq!(result.iterations, 1);

        let result = run_forward_chaining("CaCO3", "xúc tác, nhiệt độ cao", &rule_base()).unwrap();
        assert_eq!(result.final_products, vec!["CO2", "CaO"]);
    }

    #[test]
    fn test_rules_without_conditions_fire_under_any_conditions() {
        let result = run_forward_chaining("Na + H2O", "t°", &rule_base()).unwrap();
        assert_eq!(result.final_products, vec!["H2", "NaOH"]);
        assert_eq!(result.reactions_used[0].description, "sodium melts, gas bubbles");
    }

    #[test]
    fn test_monotonicity_and_fixpoint() {
        let snapshot = rule_base();
        let result = run_forward_chaining("Na + H2O + CO2", "", &snapshot).unwrap();
        for reactant in ["Na", "H2O", "CO2"] {
            assert!(result.total_facts.contains(&reactant.to_string()));
        }
        assert!(result.total_facts.contains(&"Na2CO3".to_string()));

        let again = run_forward_chaining(&result.total_facts.join(" + "), "", &snapshot).unwrap();
        assert!(again.final_products.is_empty());
        assert_eq!(again.total_facts, result.total_facts);
    }

    #[test]
    fn test_runs_do_not_share_fired_state() {
        let snapshot = rule_base();
        let first = run_forward_chaining("Na + H2O", "", &snapshot).unwrap();
        let second = run_forward_chaining("Na + H2O", "", &snapshot).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.reactions_used.len(), 1);
    }

    #[test]
    fn test_empty_rule_base() {
        let result = run_forward_chaining("Na + H2O", "", &RuleSnapshot::default()).unwrap();
        assert!(result.reactions_used.is_empty());
        assert_eq!(result.total_facts, vec!["H2O", "Na"]);
    }

    #[test]
    fn test_empty_reactants_rejected() {
        assert!(matches!(
            run_forward_chaining(" + ", "", &rule_base()),
            Err(ChemError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_reaction_path_two_steps() {
        let result = find_reaction_path("CaCO3 + Na + H2O", "Na2CO3", &rule_base()).unwrap();
        assert!(result.success);
        assert_eq!(result.path_steps, 2);
        let equations: Vec<&str> = result
            .path
            .iter()
            .map(|step| step.equation_string.as_str())
            .collect();
        assert_eq!(
            equations,
            vec!["Na + H2O -> NaOH + H2", "NaOH + CO2 -> Na2CO3 + H2O"]
        );
        assert!(result.known_chemicals.contains(&"Na2CO3".to_string()));
    }

    #[test]
    fn test_reaction_path_ignores_conditions_and_stops_at_target() {
        let result = find_reaction_path("CaCO3 + H2O", "CaO", &rule_base()).unwrap();
        assert!(result.success);
        assert_eq!(result.path.len(), 1);
        assert_eq!(result.path_steps, 1);
        // the search stopped before CO2 and Ca(OH)2 were produced
        assert_eq!(result.known_chemicals, vec!["CaCO3", "CaO", "H2O"]);
    }

    #[test]
    fn test_reaction_path_target_already_known() {
        let result = find_reaction_path("Na + H2O", "H2O", &rule_base()).unwrap();
        assert!(result.success);
        assert!(result.path.is_empty());
        assert_eq!(result.path_steps, 0);
    }

    #[test]
    fn test_reaction_path_not_found() {
        let result = find_reaction_path("Na + H2O", "Au", &rule_base()).unwrap();
        assert!(!result.success);
        assert!(result.error_message.is_some());
        assert!(result.path.is_empty());
        assert_eq!(result.known_chemicals, vec!["H2", "H2O", "Na", "NaOH"]);
    }

    #[test]
    fn test_reaction_path_rejects_empty_input() {
        assert!(matches!(
            find_reaction_path("Na", "  ", &rule_base()),
            Err(ChemError::MalformedInput(_))
        ));
        assert!(matches!(
            find_reaction_path("", "NaOH", &rule_base()),
            Err(ChemError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_reaction_path_follows_derived_reactants() {
        let snapshot = RuleSnapshot::with_reactions(vec![
            ReactionRule::new("t", "", &["A"], &[], &["B"]),
            ReactionRule::new("t", "", &["B"], &[], &["C"]),
            ReactionRule::new("t", "", &["C"], &[], &["D", "B"]),
        ]);
        let result = find_reaction_path("A", "D", &snapshot).unwrap();
        assert!(result.success);
        assert_eq!(result.path.len(), 3);
        assert_eq!(result.path[0].reactants, vec!["A"]);
    }
}
