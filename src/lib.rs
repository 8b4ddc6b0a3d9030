#[allow(non_snake_case)]
pub mod Chemistry;
#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Inference;
#[allow(non_snake_case)]
pub mod RuleBase;
pub mod cli;
pub mod errors;
pub mod library_manager;
