pub mod config;
pub mod db;
pub mod play;
pub mod run;
