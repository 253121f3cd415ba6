pub mod med_record;
pub mod session;
