use super::cli_main::get_user_input;
use crate::Examples::reasoning_examples::reasoning_examples;
use std::io::{self, Write};

pub fn examples_menu() {
    loop {
        println!("\n=== Examples ===");
        println!("1. Formula parsing and molar mass");
        println!("2. Equation balancing");
        println!("3. Forward chaining");
        println!("4. Reaction path");
        println!("5. Calculation");
        println!("6. Identification");
        println!("0. Back to main menu");
        print!("Enter your choice: ");
        let _ = io::stdout().flush();

        let choice = get_user_input();
        match choice.trim() {
            "1" => reasoning_examples(0),
            "2" => reasoning_examples(1),
            "3" => reasoning_examples(2),
            "4" => reasoning_examples(3),
            "5" => reasoning_examples(4),
            "6" => reasoning_examples(5),
            "0" => break,
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
