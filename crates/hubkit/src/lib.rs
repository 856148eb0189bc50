//! # hubkit
//!
//! Blocking client for the Hugging Face Hub space management API.
//!
//! [`HubClient`] implements [`declarative::SpaceClient`], so it can be
//! handed straight to a [`declarative::Reconciler`]:
//!
//! ```no_run
//! use declarative::{Reconciler, SpaceSpec};
//! use hubkit::HubClient;
//!
//! let client = HubClient::new(std::env::var("HF_TOKEN").ok());
//! let reconciler = Reconciler::new(client);
//!
//! let mut spec = SpaceSpec::new("demo");
//! spec.sdk = Some("gradio".into());
//! let state = reconciler.create(&spec).expect("create failed");
//! println!("created {:?}", state.id);
//! ```
//!
//! ## Endpoints
//!
//! | Operation   | Request                                   |
//! |-------------|-------------------------------------------|
//! | create      | `POST /api/repos/create`                  |
//! | rename      | `POST /api/repos/move`                    |
//! | visibility  | `PUT /api/spaces/{id}/settings`           |
//! | hardware    | `POST /api/spaces/{id}/hardware`          |
//! | storage     | `POST /api/spaces/{id}/storage`           |
//! | sleep time  | `POST /api/spaces/{id}/sleeptime`         |
//! | secrets     | `POST/DELETE/GET /api/spaces/{id}/secrets`   |
//! | variables   | `POST/DELETE/GET /api/spaces/{id}/variables` |
//! | delete      | `DELETE /api/repos/delete`                |
//! | fetch       | `GET /api/spaces/{id}`                    |

pub mod client;
mod error;
mod wire;

pub use client::{DEFAULT_ENDPOINT, HubClient};
