pub mod admin;
pub mod auth;
pub mod contact;
pub mod content;
pub mod resource;

pub use admin::AdminService;
pub use auth::AuthService;
pub use contact::ContactService;
pub use content::{ContentService, SlotLocks};
pub use resource::ResourceService;
