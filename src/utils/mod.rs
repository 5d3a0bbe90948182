pub mod paths;
pub mod sorting;
pub mod test_helpers;
