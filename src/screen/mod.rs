pub mod gameplay;
pub mod level_end;
