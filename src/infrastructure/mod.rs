pub mod directories;
pub mod lifetime;
pub mod logging;
