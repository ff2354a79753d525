pub mod credentials;
pub mod error;
pub mod mod_spec;
pub mod outcome;
pub mod paths;
pub mod plan;
pub mod record;
