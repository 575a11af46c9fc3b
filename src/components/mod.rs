pub mod controls;
pub mod ingredients;
