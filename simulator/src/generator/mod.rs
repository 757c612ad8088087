pub mod capture;
pub mod profile;
