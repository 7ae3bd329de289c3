//! Cloud provider abstraction layer
//!
//! The engine depends only on the [`CloudProvider`] trait. Concrete
//! backends live in submodules and are reachable either as pre-built
//! instances or through [`resolve_provider`] by registry name.
//!
//! ```ignore
//! use cloudmirror::config::ProviderOptions;
//! use cloudmirror::provider::resolve_provider;
//!
//! let options = ProviderOptions::typed("google-drive-v3", config);
//! let provider = resolve_provider(&options)?;
//! if provider.poll().await? {
//!     let bytes = provider.download().await?;
//! }
//! ```

pub mod drive;
pub mod factory;
pub mod fs;
pub mod http;
pub mod memory;
pub mod traits;

pub use drive::{DriveApi, DriveConfig, DriveProvider};
pub use factory::{registered_types, resolve_provider};
pub use fs::{FsProvider, FsProviderConfig};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestClient};
pub use memory::{MemoryCalls, MemoryProvider};
pub use traits::CloudProvider;

// vim: ts=4
