//! Module to calculate the atomic composition and molar mass of a chemical formula
//!
//! Parsing is purely syntactic: an uppercase letter starts an element symbol, one lowercase
//! letter may follow, digits after it are the subscript. Parenthesised groups are expanded
//! innermost-first, physical state marks like (s), (l), (g), (aq) are dropped. Symbols are
//! checked against the periodic table only when a molar mass is requested.
use crate::RuleBase::rules::ElementData;
use crate::errors::ChemError;
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static STATE_MARKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([sldgq]|aq)\)").expect("state mark pattern is valid"));

// Define a struct to hold element data
struct Element {
    symbol: &'static str,
    number: u32,
    atomic_mass: f64,
    valence: &'static str,
}

// Define a list of elements and their atomic masses
const ELEMENTS: &[Element] = &[
    Element {
        symbol: "H",
        number: 1,
        atomic_mass: 1.008,
        valence: "1",
    },
    Element {
        symbol: "He",
        number: 2,
        atomic_mass: 4.0026,
        valence: "0",
    },
    Element {
        symbol: "Li",
        number: 3,
        atomic_mass: 6.94,
        valence: "1",
    },
    Element {
        symbol: "Be",
        number: 4,
        atomic_mass: 9.0122,
        valence: "2",
    },
    Element {
        symbol: "B",
        number: 5,
        atomic_mass: 10.81,
        valence: "3",
    },
    Element {
        symbol: "C",
        number: 6,
        atomic_mass: 12.011,
        valence: "2,4",
    },
    Element {
        symbol: "N",
        number: 7,
        atomic_mass: 14.007,
        valence: "1,2,3,4,5",
    },
    Element {
        symbol: "O",
        number: 8,
        atomic_mass: 15.999,
        valence: "2",
    },
    Element {
        symbol: "F",
        number: 9,
        atomic_mass: 18.998,
        valence: "1",
    },
    Element {
        symbol: "Ne",
        number: 10,
        atomic_mass: 20.18,
        valence: "0",
    },
    Element {
        symbol: "Na",
        number: 11,
        atomic_mass: 22.99,
        valence: "1",
    },
    Element {
        symbol: "Mg",
        number: 12,
        atomic_mass: 24.305,
        valence: "2",
    },
    Element {
        symbol: "Al",
        number: 13,
        atomic_mass: 26.98,
        valence: "3",
    },
    Element {
        symbol: "Si",
        number: 14,
        atomic_mass: 28.085,
        valence: "4",
    },
    Element {
        symbol: "P",
        number: 15,
        atomic_mass: 30.974,
        valence: "3,5",
    },
    Element {
        symbol: "S",
        number: 16,
        atomic_mass: 32.065,
        valence: "2,4,6",
    },
    Element {
        symbol: "Cl",
        number: 17,
        atomic_mass: 35.45,
        valence: "1,3,5,7",
    },
    Element {
        symbol: "Ar",
        number: 18,
        atomic_mass: 39.948,
        valence: "0",
    },
    Element {
        symbol: "K",
        number: 19,
        atomic_mass: 39.102,
        valence: "1",
    },
    Element {
        symbol: "Ca",
        number: 20,
        atomic_mass: 40.08,
        valence: "2",
    },
    Element {
        symbol: "Sc",
        number: 21,
        atomic_mass: 44.9559,
        valence: "3",
    },
    Element {
        symbol: "Ti",
        number: 22,
        atomic_mass: 47.867,
        valence: "2,3,4",
    },
    Element {
        symbol: "V",
        number: 23,
        atomic_mass: 50.9415,
        valence: "2,3,4,5",
    },
    Element {
        symbol: "Cr",
        number: 24,
        atomic_mass: 51.9961,
        valence: "2,3,6",
    },
    Element {
        symbol: "Mn",
        number: 25,
        atomic_mass: 54.938,
        valence: "2,4,7",
    },
    Element {
        symbol: "Fe",
        number: 26,
        atomic_mass: 55.845,
        valence: "2,3",
    },
    Element {
        symbol: "Co",
        number: 27,
        atomic_mass: 58.933,
        valence: "2,3",
    },
    Element {
        symbol: "Ni",
        number: 28,
        atomic_mass: 58.69,
        valence: "2,3",
    },
    Element {
        symbol: "Cu",
        number: 29,
        atomic_mass: 63.546,
        valence: "1,2",
    },
    Element {
        symbol: "Zn",
        number: 30,
        atomic_mass: 65.38,
        valence: "2",
    },
    Element {
        symbol: "Ga",
        number: 31,
        atomic_mass: 69.723,
        valence: "3",
    },
    Element {
        symbol: "Ge",
        number: 32,
        atomic_mass: 72.64,
        valence: "2,4",
    },
    Element {
        symbol: "As",
        number: 33,
        atomic_mass: 74.9216,
        valence: "3,5",
    },
    Element {
        symbol: "Se",
        number: 34,
        atomic_mass: 78.96,
        valence: "2,4,6",
    },
    Element {
        symbol: "Br",
        number: 35,
        atomic_mass: 79.904,
        valence: "1,3,5",
    },
    Element {
        symbol: "Kr",
        number: 36,
        atomic_mass: 83.798,
        valence: "0",
    },
    Element {
        symbol: "Rb",
        number: 37,
        atomic_mass: 85.4678,
        valence: "1",
    },
    Element {
        symbol: "Sr",
        number: 38,
        atomic_mass: 87.62,
        valence: "2",
    },
    Element {
        symbol: "Y",
        number: 39,
        atomic_mass: 88.9059,
        valence: "3",
    },
    Element {
        symbol: "Zr",
        number: 40,
        atomic_mass: 91.224,
        valence: "4",
    },
    Element {
        symbol: "Nb",
        number: 41,
        atomic_mass: 92.9064,
        valence: "3,5",
    },
    Element {
        symbol: "Mo",
        number: 42,
        atomic_mass: 95.94,
        valence: "4,6",
    },
    Element {
        symbol: "Tc",
        number: 43,
        atomic_mass: 98.0,
        valence: "4,7",
    },
    Element {
        symbol: "Ru",
        number: 44,
        atomic_mass: 101.07,
        valence: "3,4",
    },
    Element {
        symbol: "Ag",
        number: 47,
        atomic_mass: 107.868,
        valence: "1",
    },
    Element {
        symbol: "Sn",
        number: 50,
        atomic_mass: 118.71,
        valence: "2,4",
    },
    Element {
        symbol: "I",
        number: 53,
        atomic_mass: 126.904,
        valence: "1,5,7",
    },
    Element {
        symbol: "Ba",
        number: 56,
        atomic_mass: 137.327,
        valence: "2",
    },
    Element {
        symbol: "Pt",
        number: 78,
        atomic_mass: 195.084,
        valence: "2,4",
    },
    Element {
        symbol: "Au",
        number: 79,
        atomic_mass: 196.967,
        valence: "1,3",
    },
    Element {
        symbol: "Hg",
        number: 80,
        atomic_mass: 200.59,
        valence: "1,2",
    },
    Element {
        symbol: "Pb",
        number: 82,
        atomic_mass: 207.2,
        valence: "2,4",
    },
];

/// periodic table bundled with the crate, used when no elements library is available
pub fn builtin_elements() -> BTreeMap<String, ElementData> {
    ELEMENTS
        .iter()
        .map(|e| {
            (
                e.symbol.to_string(),
                ElementData::new(e.number, e.atomic_mass, e.valence),
            )
        })
        .collect()
}

fn filter_phases_marks(formula: &str) -> String {
    STATE_MARKS
        .replace_all(formula.trim(), "")
        .replace(char::is_whitespace, "")
}

fn subscript_overflow(digits: &str) -> ChemError {
    ChemError::MalformedInput(format!("atom count {} is too large", digits))
}

/// reads "Xx123" starting at `i`: returns (symbol, subscript if any, position after it)
fn read_element(
    chars: &[char],
    mut i: usize,
) -> Result<(String, Option<usize>, usize), ChemError> {
    let mut symbol = chars[i].to_string();
    i += 1;
    if i < chars.len() && chars[i].is_ascii_lowercase() {
        symbol.push(chars[i]);
        i += 1;
    }
    let start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let subscript = if start < i {
        let digits: String = chars[start..i].iter().collect();
        Some(
            digits
                .parse::<usize>()
                .map_err(|_| subscript_overflow(&digits))?,
        )
    } else {
        None
    };
    Ok((symbol, subscript, i))
}

// (SO4)3 -> S3O12: every count inside the group is multiplied by the group stoichio
fn replicate_group(group: &str, stoichio: usize) -> Result<String, ChemError> {
    let chars: Vec<char> = group.chars().collect();
    let mut processed = String::new();
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_uppercase() {
            i += 1;
            continue;
        }
        let (symbol, subscript, next) = read_element(&chars, i)?;
        let count = subscript
            .unwrap_or(1)
            .checked_mul(stoichio)
            .ok_or_else(|| subscript_overflow(&format!("({}){}", group, stoichio)))?;
        processed.push_str(&symbol);
        if count != 1 {
            processed.push_str(&count.to_string());
        }
        i = next;
    }
    Ok(processed)
}

/// resolves the innermost group again and again until no brackets are left
fn expand_groups(formula: &str) -> Result<String, ChemError> {
    let mut text = formula.to_string();
    while let Some(start) = text.rfind('(') {
        let Some(offset) = text[start..].find(')') else {
            break;
        };
        let end = start + offset;
        let digits: String = text[end + 1..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let stoichio = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<usize>()
                .map_err(|_| subscript_overflow(&digits))?
        };
        let expanded = replicate_group(&text[start + 1..end], stoichio)?;
        text = format!(
            "{}{}{}",
            &text[..start],
            expanded,
            &text[end + 1 + digits.len()..]
        );
    }
    Ok(text.replace(['(', ')'], ""))
}

/// Function to parse a chemical formula and return a map of elements and their counts
/// (sorted by element symbol). Counts that do not fit into `usize` are rejected.
pub fn parse_formula(formula: &str) -> Result<BTreeMap<String, usize>, ChemError> {
    let flat = expand_groups(&filter_phases_marks(formula))?;
    let chars: Vec<char> = flat.chars().collect();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_uppercase() {
            i += 1;
            continue;
        }
        let (symbol, subscript, next) = read_element(&chars, i)?;
        let count = counts.entry(symbol).or_insert(0);
        *count = count
            .checked_add(subscript.unwrap_or(1))
            .ok_or_else(|| subscript_overflow(formula))?;
        i = next;
    }
    debug!("formula {} parsed into {:?}", formula, counts);
    Ok(counts)
}

/// Function to calculate the molar mass of a substance given its chemical formula, g/mol,
/// rounded to 3 decimals
pub fn calculate_molar_mass(
    formula: &str,
    elements: &BTreeMap<String, ElementData>,
) -> Result<f64, ChemError> {
    let counts = parse_formula(formula)?;
    let mut molar_mass = 0.0;
    for (symbol, count) in counts.iter() {
        let element = elements
            .get(symbol)
            .ok_or_else(|| ChemError::UnknownElement {
                symbol: symbol.clone(),
                formula: formula.to_string(),
            })?;
        molar_mass += element.atomic_mass * *count as f64;
    }
    Ok((molar_mass * 1000.0).round() / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(s, c)| (s.to_string(), *c)).collect()
    }

    #[test]
    fn test_parse_formula() {
        assert_eq!(
            parse_formula("C6H8O6").unwrap(),
            counts(&[("C", 6), ("H", 8), ("O", 6)])
        );
        assert_eq!(
            parse_formula("Na(NO3)2").unwrap(),
            counts(&[("Na", 1), ("N", 2), ("O", 6)])
        );
        assert_eq!(parse_formula("H2O").unwrap(), counts(&[("H", 2), ("O", 1)]));
        assert_eq!(
            parse_formula("C5H6OOH").unwrap(),
            counts(&[("C", 5), ("H", 7), ("O", 2)])
        );
    }

    #[test]
    fn test_groups_and_multipliers() {
        assert_eq!(
            parse_formula("Ca(OH)2").unwrap(),
            counts(&[("Ca", 1), ("O", 2), ("H", 2)])
        );
        assert_eq!(
            parse_formula("Al2(SO4)3").unwrap(),
            counts(&[("Al", 2), ("S", 3), ("O", 12)])
        );
        assert_eq!(
            parse_formula("Fe2(SO4)3").unwrap(),
            counts(&[("Fe", 2), ("S", 3), ("O", 12)])
        );
        // nested groups
        assert_eq!(
            parse_formula("Ca3(Fe(CN)6)2").unwrap(),
            counts(&[("Ca", 3), ("Fe", 2), ("C", 12), ("N", 12)])
        );
        // group without multiplier
        assert_eq!(
            parse_formula("C2H5(OH)").unwrap(),
            counts(&[("C", 2), ("H", 6), ("O", 1)])
        );
    }

    #[test]
    fn test_state_marks_are_removed() {
        assert_eq!(
            parse_formula("H2O(l)").unwrap(),
            counts(&[("H", 2), ("O", 1)])
        );
        assert_eq!(
            parse_formula("NaCl(aq)").unwrap(),
            counts(&[("Na", 1), ("Cl", 1)])
        );
        assert_eq!(
            parse_formula(" CaCO3(s) ").unwrap(),
            counts(&[("Ca", 1), ("C", 1), ("O", 3)])
        );
        assert_eq!(parse_formula("O2(g)").unwrap(), counts(&[("O", 2)]));
    }

    #[test]
    fn test_unknown_symbols_are_accepted_syntactically() {
        assert_eq!(
            parse_formula("Xy2Q").unwrap(),
            counts(&[("Xy", 2), ("Q", 1)])
        );
        assert!(parse_formula("").unwrap().is_empty());
    }

    #[test]
    fn test_oversized_counts_are_rejected() {
        // subscript longer than usize
        match parse_formula("H99999999999999999999999") {
            Err(ChemError::MalformedInput(_)) => {}
            other => panic!("expected MalformedInput, got {:?}", other),
        }
        // group multiplier longer than usize
        assert!(matches!(
            parse_formula("(OH)99999999999999999999999"),
            Err(ChemError::MalformedInput(_))
        ));
        // product of subscript and multiplier overflows
        assert!(matches!(
            parse_formula("(H10000000000)10000000000"),
            Err(ChemError::MalformedInput(_))
        ));
        // sum of repeated symbols overflows
        let formula = format!("H{}H{}", usize::MAX, usize::MAX);
        assert!(matches!(
            parse_formula(&formula),
            Err(ChemError::MalformedInput(_))
        ));
        assert!(matches!(
            calculate_molar_mass("(H10000000000)10000000000", &builtin_elements()),
            Err(ChemError::MalformedInput(_))
        ));
        // large but representable counts still parse
        assert_eq!(
            parse_formula("(H1000)1000").unwrap(),
            counts(&[("H", 1_000_000)])
        );
    }

    #[test]
    fn test_flat_formulas_reconstruct_counts() {
        let groups = [("Na", 2usize), ("S", 1), ("O", 4)];
        let formula: String = groups
            .iter()
            .map(|(s, c)| format!("{}{}", s, c))
            .collect();
        assert_eq!(parse_formula(&formula).unwrap(), counts(&groups));

        let groups = [("K", 1usize), ("Mn", 1), ("O", 4)];
        let formula: String = groups
            .iter()
            .map(|(s, c)| format!("{}{}", s, c))
            .collect();
        assert_eq!(parse_formula(&formula).unwrap(), counts(&groups));
    }

    #[test]
    fn test_calculate_molar_mass() {
        let elements = builtin_elements();
        assert_relative_eq!(
            calculate_molar_mass("H2O(g)", &elements).unwrap(),
            18.015,
            epsilon = 1e-2
        );
        assert_relative_eq!(
            calculate_molar_mass("NaCl", &elements).unwrap(),
            58.44,
            epsilon = 1e-2
        );
        assert_relative_eq!(
            calculate_molar_mass("C6H8O6", &elements).unwrap(),
            176.12,
            epsilon = 1e-2
        );
        assert_relative_eq!(
            calculate_molar_mass("Ca(NO3)2", &elements).unwrap(),
            164.093,
            epsilon = 1e-2
        );
    }

    #[test]
    fn test_molar_mass_unknown_element() {
        let elements = builtin_elements();
        match calculate_molar_mass("NaXx", &elements) {
            Err(ChemError::UnknownElement { symbol, formula }) => {
                assert_eq!(symbol, "Xx");
                assert_eq!(formula, "NaXx");
            }
            other => panic!("expected unknown element, got {:?}", other),
        }
        // empty periodic table
        assert!(calculate_molar_mass("H2O", &BTreeMap::new()).is_err());
    }
}
