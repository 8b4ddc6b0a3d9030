use super::cli_examples::examples_menu;
use super::cli_reasoning::{
    balance_menu, calculation_menu, forward_chaining_menu, identification_menu,
    reaction_path_menu,
};
use crate::RuleBase::provider::{JsonRuleProvider, RuleProvider};
use crate::library_manager::LibraryManager;
use std::io::{self, Write};

pub fn run_interactive_menu() {
    let manager = LibraryManager::new();
    let mut provider = JsonRuleProvider::new(manager.get_config().clone());
    loop {
        show_main_menu();
        let choice = get_user_input();
        // every task works on the snapshot published when it starts
        let snapshot = provider.snapshot();
        match choice.trim() {
            "1" => balance_menu(),
            "2" => forward_chaining_menu(&snapshot),
            "3" => reaction_path_menu(&snapshot),
            "4" => calculation_menu(&snapshot),
            "5" => identification_menu(&snapshot),
            "6" => examples_menu(),
            "7" => match provider.reload() {
                Ok(()) => {
                    let snapshot = provider.snapshot();
                    println!(
                        "Reloaded: {} reactions, {} formula rules, {} elements",
                        snapshot.reactions().len(),
                        snapshot.chemical_rules().len(),
                        snapshot.elements().len()
                    );
                }
                Err(e) => println!("Reload failed, previous libraries kept: {}", e),
            },
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
/* colors
Blue (\x1b[34m) - Welcome header text

Yellow (\x1b[33m) - Menu options

Cyan (\x1b[36m) - "Enter your choice:" prompt

Reset (\x1b[0m) - Returns to normal color after each colored section
*/
fn show_main_menu() {
    println!(
        "\x1b[34m\n Welcome to ChemLogic: equation balancing, reaction inference,\n
    calculation chains and identification of unlabelled chemicals \n \x1b[0m"
    );
    println!("\x1b[33m1. Balance an equation\x1b[0m");
    println!("\x1b[33m2. Forward chaining\x1b[0m");
    println!("\x1b[33m3. Reaction path\x1b[0m");
    println!("\x1b[33m4. Calculation\x1b[0m");
    println!("\x1b[33m5. Identification\x1b[0m");
    println!("\x1b[33m6. Examples\x1b[0m");
    println!("\x1b[33m7. Reload rule libraries\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    print!("\x1b[36mEnter your choice: \x1b[0m");
    let _ = io::stdout().flush();
}

/// one line from stdin; empty if it cannot be read
pub(crate) fn get_user_input() -> String {
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        input.clear();
    }
    input
}

/// prints the prompt and reads the answer, trimmed
pub(crate) fn prompt(text: &str) -> String {
    print!("\x1b[36m{}\x1b[0m", text);
    let _ = io::stdout().flush();
    get_user_input().trim().to_string()
}
