///////////////////////TESTS////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Chemistry::balancer::{
        ChemicalEquation, balance_equation, balance_equation_with_limit,
    };
    use crate::errors::ChemError;

    fn assert_atoms_conserved(equation: &ChemicalEquation) {
        let (left, right, all_elements) = equation.element_totals().unwrap();
        for element in all_elements {
            assert_eq!(
                left.get(&element),
                right.get(&element),
                "element {} is not conserved in {}",
                element,
                equation
            );
        }
    }

    #[test]
    fn test_water_synthesis() {
        let result = balance_equation("H2 + O2 -> H2O").unwrap();
        assert!(result.success);
        assert_eq!(result.reactant_coefficients, vec![2, 1]);
        assert_eq!(result.product_coefficients, vec![2]);
        assert_eq!(result.balanced_equation.as_deref(), Some("2H2 + O2 -> 2H2O"));
        assert_eq!(result.balancing_history.len(), 2);
        assert_eq!(result.balancing_history[0].equation_before, "H2 + O2 -> H2O");
        assert_eq!(result.balancing_history[1].equation_after, "2H2 + O2 -> 2H2O");
    }

    #[test]
    fn test_successful_balancing_conserves_atoms() {
        let cases = [
            ("Al + O2 -> Al2O3", vec![4, 3], vec![2]),
            ("CH4 + O2 -> CO2 + H2O", vec![1, 2], vec![1, 2]),
            ("Fe + Cl2 -> FeCl3", vec![2, 3], vec![2]),
            ("H2O -> H2 + O2", vec![2], vec![2, 1]),
        ];
        for (text, reactants, products) in cases {
            let result = balance_equation(text).unwrap();
            assert!(result.success, "{} was not balanced", text);
            assert_eq!(result.reactant_coefficients, reactants, "{}", text);
            assert_eq!(result.product_coefficients, products, "{}", text);

            let mut equation = ChemicalEquation::parse(text).unwrap();
            for (c, k) in equation.reactants.iter_mut().zip(reactants.iter()) {
                c.coefficient = *k;
            }
            for (c, k) in equation.products.iter_mut().zip(products.iter()) {
                c.coefficient = *k;
            }
            assert_atoms_conserved(&equation);
        }
    }

    #[test]
    fn test_balancing_is_deterministic() {
        let first = balance_equation("C3H8 + O2 -> CO2 + H2O").unwrap();
        let second = balance_equation("C3H8 + O2 -> CO2 + H2O").unwrap();
        assert_eq!(first.reactant_coefficients, second.reactant_coefficients);
        assert_eq!(first.product_coefficients, second.product_coefficients);
        assert_eq!(first.balancing_history.len(), second.balancing_history.len());
        assert_eq!(first, second);
    }

    #[test]
    fn test_already_balanced_with_state_marks() {
        let result = balance_equation("CaCO3(s) -> CaO(s) + CO2(g)").unwrap();
        assert!(result.success);
        assert_eq!(result.iterations, 0);
        assert!(result.balancing_history.is_empty());
        assert_eq!(
            result.balanced_equation.as_deref(),
            Some("CaCO3(s) -> CaO(s) + CO2(g)")
        );
    }

    #[test]
    fn test_simplification_leaves_gcd_one() {
        let mut equation = ChemicalEquation::new(&["H2", "O2"], &["H2O"]).unwrap();
        equation.reactants[0].coefficient = 4;
        equation.reactants[1].coefficient = 2;
        equation.products[0].coefficient = 4;
        assert!(equation.simplify_coefficients());
        assert_eq!(equation.coefficients(), (vec![2, 1], vec![2]));
        assert!(!equation.simplify_coefficients());
    }

    #[test]
    fn test_malformed_equations() {
        for text in [
            "H2 + O2",
            "H2 -> H2O -> O2",
            "-> H2O",
            "H2 + O2 ->",
            " + -> H2O",
            "",
        ] {
            match balance_equation(text) {
                Err(ChemError::MalformedEquation(_)) => {}
                other => panic!("'{}' should be malformed, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_no_possible_action() {
        let result = balance_equation("H2 -> O2").unwrap();
        assert!(!result.success);
        assert!(result.error_message.is_some());
        assert_eq!(result.unbalanced_details.len(), 2);
        assert_eq!(result.unbalanced_details[0].element, "H");
        assert_eq!(result.unbalanced_details[0].left_count, 2);
        assert_eq!(result.unbalanced_details[0].right_count, 0);
        assert_eq!(result.unbalanced_result.as_deref(), Some("H2 -> O2"));
    }

    #[test]
    fn test_iteration_cap_reports_partial_history() {
        let result = balance_equation_with_limit("Al + O2 -> Al2O3", 2).unwrap();
        assert!(!result.success);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.balancing_history.len(), 2);
        assert!(!result.unbalanced_details.is_empty());
        assert!(
            result
                .error_message
                .as_deref()
                .unwrap()
                .contains("2 iterations")
        );
    }

    #[test]
    fn test_oversized_atom_counts_are_rejected() {
        for text in [
            "(H10000000000)10000000000 -> H2",
            "H99999999999999999999999 -> H2",
            // fits usize, not the signed totals
            "H18446744073709551615 -> H2",
            // each compound fits, their sum does not
            "H9223372036854775807 + H2 -> H2",
        ] {
            match balance_equation(text) {
                Err(ChemError::MalformedInput(_)) => {}
                other => panic!("'{}' should be rejected, got {:?}", text, other),
            }
        }
    }
}
