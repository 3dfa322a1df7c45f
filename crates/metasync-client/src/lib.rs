//! HTTP clients for metadata reconciliation.
//!
//! `CatalogClient` speaks to the remote data catalog's REST API with
//! bearer auth and retrying middleware; `OpenAiClient` wraps the
//! chat-completion endpoint used to generate asset descriptions. Both
//! plug into the traits defined in `metasync-core`.
//!
//! # Example
//!
//! ```no_run
//! use metasync_client::{CatalogClient, ClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::builder("https://catalog.example.com")
//!     .token("my-token")
//!     .build()?;
//! let client = CatalogClient::new(config)?;
//! let collections = client.list_collections().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod openai;
pub mod types;

pub use client::CatalogClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ClientError, Result};
pub use openai::{OpenAiClient, OpenAiConfig};
