pub mod kv;
mod profile;
mod steps;
