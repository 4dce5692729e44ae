// SPDX-License-Identifier: MIT

//! `shellgate`: a multi-tenant WebSocket gateway for opening interactive
//! shells into container exec sessions, or passively attaching to a
//! container's stdout/stderr, with replay recording and risky-command
//! alerting.

pub mod codec;
pub mod collab;
pub mod command;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipe;
pub mod replay;
pub mod session;
pub mod term;
pub mod transport;
