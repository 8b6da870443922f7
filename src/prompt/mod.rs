pub mod appearance;
pub mod assembler;
pub mod calendar;
pub mod description;
pub mod freeform;
pub mod params;
pub mod tables;
