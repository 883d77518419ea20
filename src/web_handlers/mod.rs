pub mod interfaces;

pub use interfaces::{config, run_server, AppState, SubconverterQuery};
