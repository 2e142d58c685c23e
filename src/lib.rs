//! # Runloop
//!
//! A cooperative multi-queue scheduler and lifecycle controller for
//! interactive client applications.
//!
//! This library provides the bootstrap and runtime backbone of a
//! long-lived client process. Work is organized into named dispatch queues
//! drained by a single poll loop, heavy jobs run on a background thread
//! pool, and the process moves through an explicit lifecycle state machine
//! from first argument parsing to final resource teardown.
//!
//! ## Core Problem Solved
//!
//! Interactive clients juggle several kinds of work with different latency
//! needs on one loop thread:
//!
//! - **Input Responsiveness**: input events must not wait behind bulk work
//! - **Frame Pacing**: render-synchronized tasks run once per iteration
//! - **Starvation**: a task that keeps enqueueing work must not monopolize a pass
//! - **Async-Signal Safety**: Ctrl-C and SIGTERM must become an orderly close,
//!   not an abort mid-frame
//! - **Deterministic Shutdown**: subsystems release in a fixed order, exactly once
//!
//! ## Key Features
//!
//! - **Three Dispatch Queues**: `input`, `general`, and `render`, each a
//!   serialized task queue with delayed and repeating tasks
//! - **Generation Rule**: each poll pass runs only tasks enqueued before it
//!   began, so every pass is bounded
//! - **Sampled Clock**: one time sample per pass keeps due-time decisions
//!   consistent and makes tests fully deterministic
//! - **Background Pool**: dedicated OS threads for blocking work, with
//!   results delivered back onto a dispatch queue
//! - **Signal Bridge**: SIGTERM/SIGINT fold into a single deferred close
//! - **Lifecycle State Machine**: `Uninitialized -> Initialized -> Running ->
//!   Stopping -> Terminated`, with typed hooks at the transitions
//!
//! ## Bootstrapping an Application
//!
//! ```rust,ignore
//! use runloop::config::RuntimeConfig;
//! use runloop::infra::{FsResources, NativePlatform, NullConfigStore, NullNetwork,
//!     NullProxy, NullScript};
//! use runloop::runtime::{run_to_exit, Collaborators, LifecycleHooks};
//!
//! fn main() {
//!     runloop::util::init_tracing();
//!
//!     let collaborators = Collaborators {
//!         network: Box::new(NullNetwork),
//!         script: Box::new(NullScript),
//!         config_store: Box::new(NullConfigStore),
//!         resources: Box::new(FsResources::new()),
//!         platform: Box::new(NativePlatform::new()),
//!         proxy: Box::new(NullProxy),
//!     };
//!
//!     let code = run_to_exit(
//!         std::env::args().collect(),
//!         "init.script",
//!         collaborators,
//!         RuntimeConfig::default(),
//!         LifecycleHooks::new().on_close(|| false),
//!     );
//!     std::process::exit(code);
//! }
//! ```
//!
//! For complete examples, see:
//! - `tests/lifecycle_test.rs` - Full lifecycle integration tests
//! - `tests/queue_test.rs` - Dispatch queue scheduling semantics

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling primitives: clock, dispatch queues, background workers.
pub mod core;
/// Configuration models for the poll loop and process startup.
pub mod config;
/// Collaborator implementations for native targets and tests.
pub mod infra;
/// Application lifecycle: controller, hooks, signals, and bootstrap.
pub mod runtime;
/// Shared utilities.
pub mod util;
