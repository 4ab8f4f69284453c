pub mod album;
pub mod album_style;
pub mod artist;
pub mod label;
pub mod style;
pub mod track;
