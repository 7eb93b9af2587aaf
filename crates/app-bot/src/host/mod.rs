mod server;
mod types;

pub use server::HostServer;
