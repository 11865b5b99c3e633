pub mod excel;
pub mod users;
