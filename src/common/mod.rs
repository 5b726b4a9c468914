pub mod oracle;
pub mod orders;
pub mod setup;
