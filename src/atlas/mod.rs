pub mod audit;
pub mod config;
pub mod engine;
pub mod fingerprint;
pub mod ids;
pub mod manifest;
pub mod metadata;
pub mod paths;
pub mod region;
pub mod stem_index;
pub mod util;
pub mod warn;
