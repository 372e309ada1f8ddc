pub mod frankfurter;
pub mod proxy;

// Re-export the two HTTP clients for cleaner imports
pub use frankfurter::FrankfurterProvider;
pub use proxy::ProxyClient;
