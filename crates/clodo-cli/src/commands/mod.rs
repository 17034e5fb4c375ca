pub mod assess;
pub mod clean;
pub mod deploy;
pub mod export;
pub mod import;
pub mod rollback;
pub mod status;
