pub mod scan;
pub mod search;
pub mod validate;
