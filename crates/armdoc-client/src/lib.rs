//! Azure CLI and chat completion clients for armdoc

pub mod ai;
pub mod az;
pub mod compatible;
pub mod error;
pub mod openai;

#[cfg(test)]
mod test_server;
