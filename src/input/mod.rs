pub mod console;
pub mod keyboard;
