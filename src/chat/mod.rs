// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat streaming engine
//!
//! Routes assembled SSE events into accumulated assistant messages and
//! drives the request/response lifecycle of each turn.

pub mod accumulator;
pub mod classify;
pub mod controller;
pub mod message;
pub mod observer;
pub mod router;

pub use accumulator::{normalize_duplicated, AccumulatorState};
pub use classify::{ChatError, ErrorKind};
pub use controller::{ChatController, ChatState, ControllerOptions, TurnOutcome, TurnPhase};
pub use message::{ChatMessage, ChatTurnRequest, ResumeRequest, Sender};
pub use observer::{ChatObserver, NoopObserver, ObservedEvent, RecordingObserver};
pub use router::{EventRouter, RouteAction, Routed};
