mod api;
mod health;
mod server;

pub use server::run as http_server;
