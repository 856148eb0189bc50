// Declarative plan / apply / destroy
pub mod declarative;

// Single-space commands
pub mod import;
pub mod show;

// State file maintenance
pub mod state;
