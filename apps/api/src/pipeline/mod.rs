//! Recruitment processes and interview steps, including the
//! calendar-event linker.

pub mod handlers;
pub mod linker;
