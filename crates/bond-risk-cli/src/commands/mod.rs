pub mod bond;
pub mod portfolio;
pub mod scenario;
