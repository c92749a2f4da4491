pub mod db;
pub mod deck;
