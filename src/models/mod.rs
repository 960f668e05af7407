pub mod restaurant;
pub mod review;
pub mod user;

pub use restaurant::*;
pub use review::*;
pub use user::*;
