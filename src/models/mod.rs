pub mod about;
pub mod admin;
pub mod contact;
pub mod content;
pub mod home;
pub mod resource;
pub mod text_entry;

pub use about::*;
pub use admin::*;
pub use contact::*;
pub use content::*;
pub use home::*;
pub use resource::*;
pub use text_entry::*;
