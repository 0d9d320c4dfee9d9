pub mod friends;
pub mod permissions;

pub use friends::SocialError;
pub use permissions::{GamePermissions, GameScoped};
