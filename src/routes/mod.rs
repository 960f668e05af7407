pub mod admin;
pub mod restaurant;
pub mod review;
