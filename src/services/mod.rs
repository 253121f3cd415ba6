pub mod meds;

pub use meds::MedService;
