pub mod fitbit;
pub mod table;
pub mod text;
