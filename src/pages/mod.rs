pub mod federation;
pub mod home;
pub mod not_found;
