pub mod build;
pub mod core;
pub mod provenance;

pub use crate::provenance::api::{details, get_or_install_with, install, log_details};
