//! Section payload integration tests

mod native;
mod properties;
mod text;
