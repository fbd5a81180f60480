//! Capability decision engine for RPCC.
//!
//! Access control runs before any operation body. Policy lives in
//! [`Guard`]s, long-lived units registered once with the
//! [`DecisionEngine`] and identified by [`GuardId`].
//!
//! # Decisions
//!
//! A guard returns a [`Decision`]: an [`Outcome`] plus a [`Cacheability`].
//!
//! ```text
//! Outcome       : Granted | Denied | Referred
//! Cacheability  : NeverCache(0) < CacheInObject(1) < CacheInFunction(2)
//! ```
//!
//! | Cacheability | Stored in | Lifetime |
//! |--------------|-----------|----------|
//! | `CacheInFunction` | [`CallContext`] | the current call |
//! | `CacheInObject` | the subject's [`ObjectDecisionCache`] | the subject instance |
//! | `NeverCache` | nowhere | — |
//!
//! # Crate Architecture
//!
//! ```text
//! rpcc-types  (CallId, Principal, Value)
//!     ↑            ↑
//! rpcc-error   rpcc-auth  ◄── THIS CRATE
//! (RpcError)   (DecisionEngine, Guard, Chain, CallContext)
//!     ↑            ↑
//!     rpcc-schema (resolution reads the CallContext)
//!          ↑
//!     rpcc-runtime (Dispatcher wraps operation bodies in DecisionEngine::entry)
//! ```
//!
//! # Perimeter Defense
//!
//! [`DecisionEngine::entry`] runs a body behind a guard. Once one entry
//! point of a call is granted, nested entry points of the same call run
//! without consulting their guards until the outer body exits.

pub mod chain;
mod cache;
mod context;
mod decision;
mod engine;
mod guard;
pub mod guards;
pub mod permission;

pub use cache::ObjectDecisionCache;
pub use chain::{Chain, ChainMode};
pub use context::{CallContext, Extensions};
pub use decision::{Cacheability, Decision, Outcome};
pub use engine::DecisionEngine;
pub use guard::{Guard, GuardId, GuardRef, Subject};
pub use permission::{MemoryPermissionStore, PermissionStore};

pub use rpcc_types::Principal;
