pub mod external_server;

pub use external_server::ExternalServer;
