pub mod external;
pub mod propensity;
pub mod recorder;
pub mod registry;
