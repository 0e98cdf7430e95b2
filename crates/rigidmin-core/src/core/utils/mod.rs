pub mod numerical;
pub mod vector;
