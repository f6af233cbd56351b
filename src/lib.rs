pub mod app;
pub mod error;
pub mod experiment;
pub mod measure;
pub mod net;
pub mod sim;
pub mod traffic;

#[cfg(test)]
mod test;
