/// main loop of the terminal front-end
pub mod cli_main;
/// prompts of the reasoning tasks
pub mod cli_reasoning;
pub mod cli_examples;
