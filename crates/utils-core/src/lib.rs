pub mod calendar;
pub mod links;
pub mod response;
