pub mod db_user;
pub mod identity_user;

pub use db_user::*;
pub use identity_user::*;
